//! Status lines for the user.
//!
//! Normal status goes to stdout, failures to stderr. Output errors are
//! ignored: there is nowhere left to report them.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

pub const SUCCESS: &str = "✅";
pub const FAILURE: &str = "❌";
pub const NOT_FOUND: &str = "🔍";

pub struct Console {
    out: Box<dyn Write + Send>,
    err: Box<dyn Write + Send>,
}

impl Console {
    pub fn stdio() -> Self {
        Self {
            out: Box::new(io::stdout()),
            err: Box::new(io::stderr()),
        }
    }

    /// Console writing into memory, for tests.
    pub fn capture() -> (Self, Captured) {
        let captured = Captured::default();
        let console = Self {
            out: Box::new(SharedBuf(captured.out.clone())),
            err: Box::new(SharedBuf(captured.err.clone())),
        };
        (console, captured)
    }

    pub fn line(&mut self, text: &str) {
        let _ = writeln!(self.out, "{}", text);
    }

    pub fn success(&mut self, text: &str) {
        self.line(&format!("{} {}", SUCCESS, text));
    }

    pub fn not_found(&mut self, text: &str) {
        self.line(&format!("{} {}", NOT_FOUND, text));
    }

    pub fn error_line(&mut self, text: &str) {
        let _ = writeln!(self.err, "{}", text);
    }

    pub fn failure(&mut self, text: &str) {
        self.error_line(&format!("{} {}", FAILURE, text));
    }

    pub fn flush(&mut self) {
        let _ = self.out.flush();
        let _ = self.err.flush();
    }
}

/// What a captured console has printed so far.
#[derive(Clone, Default)]
pub struct Captured {
    out: Arc<Mutex<Vec<u8>>>,
    err: Arc<Mutex<Vec<u8>>>,
}

impl Captured {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.out.lock().expect("stdout lock")).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.err.lock().expect("stderr lock")).into_owned()
    }
}

struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "capture buffer poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
