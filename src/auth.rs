//! Service-account access tokens.
//!
//! A signed RS256 assertion is exchanged at the key's token endpoint for a
//! short-lived bearer token. The token is cached and reused until shortly
//! before it expires.

use crate::credentials::ServiceAccountKey;
use crate::error::{DbError, Result};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Scopes the database REST API accepts for admin access.
pub const DATABASE_SCOPES: &str =
    "https://www.googleapis.com/auth/firebase.database https://www.googleapis.com/auth/userinfo.email";

const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for each assertion.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Refresh this long before the server-reported expiry.
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub scope: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

struct CachedToken {
    token: SecretString,
    /// Unix seconds
    expires_at: i64,
}

impl CachedToken {
    fn is_expired(&self, now: i64) -> bool {
        now + REFRESH_MARGIN_SECS >= self.expires_at
    }
}

/// Mints and caches access tokens for one service account.
pub struct TokenProvider {
    http: Client,
    client_email: String,
    key_id: Option<String>,
    token_uri: String,
    signing_key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    /// Build a provider from a parsed key. Fails if the private key is not
    /// a usable RSA PEM.
    pub fn new(key: &ServiceAccountKey, http: Client) -> Result<Self> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.expose_secret().as_bytes())
            .map_err(|e| DbError::Credentials(format!("unusable private_key: {}", e)))?;

        Ok(Self {
            http,
            client_email: key.client_email.clone(),
            key_id: key.private_key_id.clone(),
            token_uri: key.token_uri.clone(),
            signing_key,
            cached: Mutex::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    /// Claims for an assertion issued at `now` (Unix seconds).
    pub fn claims(&self, now: i64) -> AssertionClaims {
        AssertionClaims {
            iss: self.client_email.clone(),
            sub: self.client_email.clone(),
            aud: self.token_uri.clone(),
            scope: DATABASE_SCOPES.to_string(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        }
    }

    /// Sign an assertion issued at `now`.
    pub fn sign_assertion(&self, now: i64) -> Result<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key_id.clone();

        encode(&header, &self.claims(now), &self.signing_key)
            .map_err(|e| DbError::Credentials(format!("failed to sign assertion: {}", e)))
    }

    /// Current bearer token, fetching a new one when the cache is empty or stale.
    pub async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now().timestamp();

        if let Some(token) = cached.as_ref() {
            if !token.is_expired(now) {
                return Ok(token.token.expose_secret().to_string());
            }
            debug!("Access token expired, refreshing");
        }

        let fresh = self.fetch_token(now).await?;
        let value = fresh.token.expose_secret().to_string();
        *cached = Some(fresh);
        Ok(value)
    }

    async fn fetch_token(&self, now: i64) -> Result<CachedToken> {
        let assertion = self.sign_assertion(now)?;
        debug!(token_uri = %self.token_uri, client_email = %self.client_email, "Requesting access token");

        let response = self
            .http
            .post(&self.token_uri)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(desc) => format!("{}: {}", err.error, desc),
                    None => err.error,
                },
                Err(_) => format!("token endpoint returned {}", status),
            };
            warn!(status = %status, error = %message, "Token exchange failed");
            return Err(DbError::Auth(message));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| DbError::Auth(format!("unexpected token response: {}", e)))?;

        Ok(CachedToken {
            token: SecretString::from(token.access_token),
            expires_at: now + token.expires_in,
        })
    }
}
