//! rtdb-users - user-record operations against a realtime database
//!
//! This library provides the pieces behind the `rtdb-users` CLI: service
//! account authentication, a REST document store client, and the
//! read/create/update/delete operations on `users/<uid>`.

pub mod auth;
pub mod bootstrap;
pub mod cli;
pub mod commands;
pub mod config;
pub mod console;
pub mod credentials;
pub mod error;
pub mod record;
pub mod store;
#[cfg(test)]
mod test_utils;
pub mod users;

// Re-export Args for the binary
pub use cli::Args;
pub use error::{DbError, Result};
