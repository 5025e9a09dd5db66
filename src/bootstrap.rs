//! Startup: credential loading and client construction.

use crate::commands::{self, Outcome};
use crate::config::Config;
use crate::console::Console;
use crate::credentials::ServiceAccountKey;
use crate::error::{DbError, Result};
use crate::store::{DocumentStore, RtdbClient};
use crate::users::Users;
use tracing::debug;

/// An initialized client, owned for the length of one run.
pub struct Session {
    client: RtdbClient,
}

impl Session {
    pub fn store(&self) -> &dyn DocumentStore {
        &self.client
    }

    /// Release the client and its connection pool.
    pub fn close(self) {
        debug!(database = %self.client.base_url(), "Session closed");
        drop(self.client);
    }
}

/// Load the service-account key and build the client, bounded by
/// `config.init_timeout`.
pub async fn initialize(config: &Config) -> Result<Session> {
    let init = async {
        let key = ServiceAccountKey::load(&config.credentials_path).await?;
        debug!(
            client_email = %key.client_email,
            project_id = key.project_id.as_deref().unwrap_or("-"),
            "Loaded service-account key"
        );
        let client = RtdbClient::new(&config.database_url, &key)?;
        Ok::<_, DbError>(Session { client })
    };

    tokio::time::timeout(config.init_timeout, init)
        .await
        .map_err(|_| DbError::Timeout {
            operation: "initialize",
            limit: config.init_timeout,
        })?
}

/// Full run: initialize, dispatch `args`, close.
///
/// Initialization failure ends the run before any operation; every other
/// path prints the closing line.
pub async fn run(config: &Config, args: &[String], console: &mut Console) -> Outcome {
    let session = match initialize(config).await {
        Ok(session) => {
            console.success("Database admin client initialized successfully.");
            session
        }
        Err(e) => {
            console.error_line(&format!("{}", e));
            console.error_line("");
            console.failure("FAILED to initialize database admin client.");
            return Outcome::Failed;
        }
    };

    let outcome = {
        let users = Users::new(session.store(), config.op_timeout);
        commands::dispatch(&users, &config.user_id, args, console).await
    };

    console.line("");
    console.line("Application finished operation.");
    session.close();
    outcome
}
