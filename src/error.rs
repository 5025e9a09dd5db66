//! Error types for the realtime database client.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to the realtime database.
#[derive(Error, Debug)]
pub enum DbError {
    /// Service-account file could not be used
    #[error("Invalid service-account credential: {0}")]
    Credentials(String),

    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Token endpoint rejected the assertion or returned garbage
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Store answered with a non-success status
    #[error("Database error ({status}): {message}")]
    Remote { status: u16, message: String },

    /// Key or path the store would refuse
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Database URL is unusable
    #[error("Invalid database URL: {0}")]
    InvalidUrl(String),

    /// Stored value does not have the user record shape
    #[error("Malformed user record: {0}")]
    MalformedRecord(String),

    /// Bounded wait elapsed before the call completed
    #[error("{operation} timed out after {limit:?}")]
    Timeout {
        operation: &'static str,
        limit: Duration,
    },
}

impl DbError {
    /// Message shown to the user after a failed operation.
    ///
    /// Remote errors show only the store-provided text, like the
    /// failure lines the console prints.
    pub fn user_message(&self) -> String {
        match self {
            DbError::Remote { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, DbError::Timeout { .. })
    }
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DbError>;
