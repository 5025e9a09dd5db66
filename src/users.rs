//! Operations on the user record at `users/<uid>`.
//!
//! Each operation issues exactly one store call and waits for it at most
//! `timeout`. Nothing is retried; an elapsed wait is reported as
//! [`DbError::Timeout`].

use crate::error::{DbError, Result};
use crate::record::{NewUser, UserRecord, UserUpdate};
use crate::store::{DbPath, DocumentStore};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

pub struct Users<'a> {
    store: &'a dyn DocumentStore,
    timeout: Duration,
}

impl<'a> Users<'a> {
    pub fn new(store: &'a dyn DocumentStore, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Create or overwrite the record. Fields not in the new payload are dropped.
    pub async fn create(&self, uid: &str, name: &str, email: &str) -> Result<()> {
        let path = DbPath::users(uid)?;
        let payload = serde_json::to_value(NewUser::new(name, email))?;
        debug!(%path, "Creating user record");
        self.bounded("create", self.store.set(&path, payload)).await
    }

    /// Fetch the record, `None` when nothing is stored for `uid`.
    pub async fn read(&self, uid: &str) -> Result<Option<UserRecord>> {
        let path = DbPath::users(uid)?;
        debug!(%path, "Reading user record");
        let value = self.bounded("read", self.store.get(&path)).await?;
        UserRecord::decode(value)
    }

    /// Rename the user and stamp `lastUpdated`, leaving other fields alone.
    pub async fn update(&self, uid: &str, new_name: &str) -> Result<()> {
        let path = DbPath::users(uid)?;
        let payload = serde_json::to_value(UserUpdate::rename(new_name))?;
        debug!(%path, "Updating user record");
        self.bounded("update", self.store.update(&path, payload)).await
    }

    /// Remove the whole record.
    pub async fn delete(&self, uid: &str) -> Result<()> {
        let path = DbPath::users(uid)?;
        debug!(%path, "Deleting user record");
        self.bounded("delete", self.store.remove(&path)).await
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| DbError::Timeout {
                operation,
                limit: self.timeout,
            })?
    }
}
