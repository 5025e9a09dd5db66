use anyhow::Result;
use clap::Parser;
use rtdb_users::bootstrap;
use rtdb_users::config::Config;
use rtdb_users::console::Console;
use rtdb_users::Args;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.debug);

    let cfg = Config::from_args(&args);
    if args.debug {
        eprintln!("[DEBUG] Database: {}", cfg.database_url);
        eprintln!("[DEBUG] Credentials: {}", cfg.credentials_path.display());
        eprintln!("[DEBUG] User: {}", cfg.user_id);
    }

    let rt = Runtime::new()?;
    let mut console = Console::stdio();
    let outcome = rt.block_on(bootstrap::run(&cfg, &args.positional(), &mut console));
    console.flush();

    let code = outcome.exit_code();
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("rtdb_users=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
