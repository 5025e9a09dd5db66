//! Runtime configuration.
//!
//! Every setting has a compiled-in default. Environment variables (also
//! picked up from `.env`) and command-line flags override them; clap reads
//! the environment for the flags, so [`Config::from_args`] only has to fill
//! in what was left unset.

use crate::cli::Args;
use std::path::PathBuf;
use std::time::Duration;

/// Realtime database the tool talks to when nothing else is configured.
pub const DEFAULT_DATABASE_URL: &str = "https://mindease-b9b6f-default-rtdb.firebaseio.com";

/// Service-account key file, relative to the working directory.
pub const DEFAULT_CREDENTIALS_PATH: &str = "service-account.json";

/// Record every operation targets unless `--uid` says otherwise.
pub const DEFAULT_USER_ID: &str = "nWZ2LMtJmRT32LBdhChUKc1l2hE2";

/// Upper bound on startup.
pub const DEFAULT_INIT_TIMEOUT_SECS: u64 = 5;

/// Upper bound on each record operation.
pub const DEFAULT_OP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub credentials_path: PathBuf,
    pub user_id: String,
    pub init_timeout: Duration,
    pub op_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_PATH),
            user_id: DEFAULT_USER_ID.to_string(),
            init_timeout: Duration::from_secs(DEFAULT_INIT_TIMEOUT_SECS),
            op_timeout: Duration::from_secs(DEFAULT_OP_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Build the effective configuration from parsed arguments.
    pub fn from_args(args: &Args) -> Self {
        let mut cfg = Config::default();

        if let Some(url) = &args.database_url {
            cfg.database_url = url.trim_end_matches('/').to_string();
        }
        if let Some(path) = &args.credentials {
            cfg.credentials_path = expand_home(path);
        }
        if let Some(uid) = &args.uid {
            cfg.user_id = uid.clone();
        }
        if let Some(secs) = args.timeout_secs {
            cfg.op_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = args.init_timeout_secs {
            cfg.init_timeout = Duration::from_secs(secs);
        }

        cfg
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
