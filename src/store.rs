//! Document store access.
//!
//! [`DocumentStore`] is the seam every record operation goes through.
//! [`RtdbClient`] implements it over the realtime database REST API; tests
//! use the in-memory store from `test_utils`.

use crate::auth::TokenProvider;
use crate::credentials::ServiceAccountKey;
use crate::error::{DbError, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, Response, Url};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Characters the store refuses inside a key.
const FORBIDDEN_KEY_CHARS: [char; 6] = ['.', '$', '#', '[', ']', '/'];

/// Slash-separated location in the store, every segment a valid key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbPath {
    segments: Vec<String>,
}

impl DbPath {
    pub fn new<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(DbError::InvalidPath("path has no segments".to_string()));
        }
        for segment in &segments {
            validate_key(segment)?;
        }
        Ok(Self { segments })
    }

    /// `users/<uid>`
    pub fn users(uid: &str) -> Result<Self> {
        Self::new(["users", uid])
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for DbPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(DbError::InvalidPath("empty key".to_string()));
    }
    if let Some(c) = key
        .chars()
        .find(|c| FORBIDDEN_KEY_CHARS.contains(c) || c.is_ascii_control())
    {
        return Err(DbError::InvalidPath(format!(
            "key {:?} contains forbidden character {:?}",
            key, c
        )));
    }
    Ok(())
}

/// Trait for document stores to allow mocking and abstraction
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Value at `path`, `Value::Null` when nothing is stored there.
    async fn get(&self, path: &DbPath) -> Result<Value>;

    /// Replace everything at `path`.
    async fn set(&self, path: &DbPath, value: Value) -> Result<()>;

    /// Merge the children of `value` into `path`, leaving other children alone.
    async fn update(&self, path: &DbPath, value: Value) -> Result<()>;

    /// Delete everything at `path`.
    async fn remove(&self, path: &DbPath) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct RemoteError {
    error: String,
}

/// REST client for one realtime database.
pub struct RtdbClient {
    http: Client,
    base_url: Url,
    auth: TokenProvider,
}

impl RtdbClient {
    /// Create a client for `database_url` authenticated as the service account.
    pub fn new(database_url: &str, key: &ServiceAccountKey) -> Result<Self> {
        let base_url = parse_database_url(database_url)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("rtdb-users/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        let auth = TokenProvider::new(key, http.clone())?;

        Ok(Self {
            http,
            base_url,
            auth,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn service_account(&self) -> &str {
        self.auth.client_email()
    }

    /// REST endpoint for a path: `<base>/<segments...>.json`
    pub fn endpoint(&self, path: &DbPath) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut parts = url
                .path_segments_mut()
                .map_err(|_| DbError::InvalidUrl(self.base_url.to_string()))?;
            parts.pop_if_empty();
            let (last, init) = path
                .segments()
                .split_last()
                .ok_or_else(|| DbError::InvalidPath("path has no segments".to_string()))?;
            parts.extend(init);
            parts.push(&format!("{}.json", last));
        }
        Ok(url)
    }

    async fn send(&self, method: Method, path: &DbPath, body: Option<Value>) -> Result<Response> {
        let mut url = self.endpoint(path)?;
        if method != Method::GET {
            // Writes return 204 instead of echoing the stored value
            url.query_pairs_mut().append_pair("print", "silent");
        }

        let token = self.auth.access_token().await?;
        debug!(method = %method, path = %path, "Database request");

        let mut request = self.http.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<RemoteError>(&text)
            .map(|e| e.error)
            .unwrap_or_else(|_| {
                if text.is_empty() {
                    status.to_string()
                } else {
                    text
                }
            });
        debug!(status = %status, path = %path, error = %message, "Database request failed");
        Err(DbError::Remote {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl DocumentStore for RtdbClient {
    async fn get(&self, path: &DbPath) -> Result<Value> {
        let response = self.send(Method::GET, path, None).await?;
        Ok(response.json::<Value>().await?)
    }

    async fn set(&self, path: &DbPath, value: Value) -> Result<()> {
        self.send(Method::PUT, path, Some(value)).await?;
        Ok(())
    }

    async fn update(&self, path: &DbPath, value: Value) -> Result<()> {
        self.send(Method::PATCH, path, Some(value)).await?;
        Ok(())
    }

    async fn remove(&self, path: &DbPath) -> Result<()> {
        self.send(Method::DELETE, path, None).await?;
        Ok(())
    }
}

fn parse_database_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DbError::InvalidUrl("URL cannot be empty".into()));
    }
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(DbError::InvalidUrl(
            "URL must start with http:// or https://".into(),
        ));
    }
    Url::parse(trimmed).map_err(|e| DbError::InvalidUrl(format!("{}: {}", trimmed, e)))
}
