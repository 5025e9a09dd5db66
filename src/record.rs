//! The user record stored at `users/<uid>` and its write payloads.

use crate::error::{DbError, Result};
use chrono::{DateTime, SecondsFormat};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Placeholder the store replaces with its own value at write time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerValue {
    /// Server clock in milliseconds since the Unix epoch
    Timestamp,
}

impl Serialize for ServerValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            ServerValue::Timestamp => map.serialize_entry(".sv", "timestamp")?,
        }
        map.end()
    }
}

/// Stored user record. Every field is optional: nothing validates presence
/// on write, so readers see `None` for whatever was never set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Set by create only
    #[serde(default)]
    pub created_at: Option<i64>,
    /// Set by update only
    #[serde(default)]
    pub last_updated: Option<i64>,
}

impl UserRecord {
    /// Decode the value read at a user path.
    ///
    /// `null` means nothing is stored there. Anything that is not an object,
    /// or an object whose known fields have the wrong type, is malformed.
    pub fn decode(value: Value) -> Result<Option<Self>> {
        match value {
            Value::Null => Ok(None),
            Value::Object(_) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| DbError::MalformedRecord(e.to_string())),
            other => Err(DbError::MalformedRecord(format!(
                "expected an object, found {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Full replacement written by create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub created_at: ServerValue,
}

impl NewUser {
    pub fn new(name: &str, email: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            created_at: ServerValue::Timestamp,
        }
    }
}

/// Partial merge written by update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub name: String,
    pub last_updated: ServerValue,
}

impl UserUpdate {
    pub fn rename(new_name: &str) -> Self {
        Self {
            name: new_name.to_string(),
            last_updated: ServerValue::Timestamp,
        }
    }
}

/// Render a server timestamp (ms since epoch) as RFC 3339 UTC.
pub fn format_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| millis.to_string())
}
