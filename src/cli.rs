use clap::Parser;

/// Run one user-record operation against the realtime database
#[derive(Parser, Debug, Clone)]
#[command(
    name = "rtdb-users",
    version,
    about = "Read, create, update or delete users/<uid> in a realtime database"
)]
pub struct Args {
    #[arg(
        value_name = "OPERATION",
        help = "read, create, update, delete or all (default: read)"
    )]
    pub operation: Option<String>,

    #[arg(value_name = "ARGS", help = "create: NAME EMAIL, update: NEW_NAME")]
    pub extra: Vec<String>,

    #[arg(long, env = "RTDB_USER_ID", help = "User id of the target record")]
    pub uid: Option<String>,

    #[arg(
        long,
        env = "RTDB_CREDENTIALS",
        value_name = "PATH",
        help = "Service-account key file"
    )]
    pub credentials: Option<String>,

    #[arg(long, env = "RTDB_DATABASE_URL", value_name = "URL", help = "Database URL")]
    pub database_url: Option<String>,

    #[arg(
        long,
        env = "RTDB_TIMEOUT_SECS",
        value_name = "SECS",
        help = "Per-operation timeout in seconds"
    )]
    pub timeout_secs: Option<u64>,

    #[arg(
        long,
        env = "RTDB_INIT_TIMEOUT_SECS",
        value_name = "SECS",
        help = "Startup timeout in seconds"
    )]
    pub init_timeout_secs: Option<u64>,

    #[arg(long, help = "Debug output")]
    pub debug: bool,
}

impl Args {
    /// Positional words in the order the dispatcher reads them:
    /// the operation first, then its arguments.
    pub fn positional(&self) -> Vec<String> {
        self.operation
            .iter()
            .cloned()
            .chain(self.extra.iter().cloned())
            .collect()
    }
}
