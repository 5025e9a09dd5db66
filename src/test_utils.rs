use crate::error::{DbError, Result};
use crate::store::{DbPath, DocumentStore};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One call seen by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Get(String),
    Set(String),
    Update(String),
    Remove(String),
}

#[derive(Debug)]
struct State {
    root: Value,
    clock: i64,
    calls: Vec<StoreCall>,
    failure: Option<(u16, String)>,
    delay: Option<Duration>,
}

/// In-memory JSON tree with the store's write semantics: `set` replaces,
/// `update` merges children, `remove` deletes, and server timestamps are
/// resolved from a clock that never goes backwards.
#[derive(Clone, Debug)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                root: Value::Object(Map::new()),
                clock: 0,
                calls: Vec::new(),
                failure: None,
                delay: None,
            })),
        }
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().expect("state lock").calls.clone()
    }

    /// Make every following call fail with the given status and message.
    pub fn fail_with(&self, status: u16, message: &str) {
        self.state.lock().expect("state lock").failure = Some((status, message.to_string()));
    }

    /// Delay every following call.
    pub fn delay_by(&self, delay: Duration) {
        self.state.lock().expect("state lock").delay = Some(delay);
    }

    /// Store `value` as-is, bypassing call recording and timestamp resolution.
    pub fn seed(&self, path: &DbPath, value: Value) {
        let mut state = self.state.lock().expect("state lock");
        write_at(&mut state.root, path.segments(), value);
    }

    /// Current value at `path` without recording a call.
    pub fn peek(&self, path: &DbPath) -> Value {
        let state = self.state.lock().expect("state lock");
        read_at(&state.root, path.segments())
    }

    async fn enter(&self, call: StoreCall) -> Result<()> {
        let delay = self.state.lock().expect("state lock").delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().expect("state lock");
        state.calls.push(call);
        match &state.failure {
            Some((status, message)) => Err(DbError::Remote {
                status: *status,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl State {
    fn tick(&mut self) -> i64 {
        self.clock = (self.clock + 1).max(Utc::now().timestamp_millis());
        self.clock
    }

    fn resolve(&mut self, value: Value) -> Value {
        match value {
            Value::Object(map) if is_timestamp_sentinel(&map) => Value::from(self.tick()),
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, self.resolve(v)))
                    .collect(),
            ),
            Value::Array(items) => Value::Array(items.into_iter().map(|v| self.resolve(v)).collect()),
            other => other,
        }
    }
}

fn is_timestamp_sentinel(map: &Map<String, Value>) -> bool {
    map.len() == 1 && map.get(".sv").and_then(Value::as_str) == Some("timestamp")
}

fn read_at(root: &Value, segments: &[String]) -> Value {
    let mut node = root;
    for segment in segments {
        match node.get(segment) {
            Some(child) => node = child,
            None => return Value::Null,
        }
    }
    node.clone()
}

fn write_at(root: &mut Value, segments: &[String], value: Value) {
    let Some((last, init)) = segments.split_last() else {
        *root = value;
        return;
    };

    let mut node = &mut *root;
    for segment in init {
        node = object_mut(node)
            .entry(segment.clone())
            .or_insert(Value::Null);
    }
    let map = object_mut(node);
    if value.is_null() {
        map.remove(last);
    } else {
        map.insert(last.clone(), value);
    }
    prune(root);
}

/// View `node` as an object, replacing it with an empty one if it is not.
fn object_mut(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just made an object"),
    }
}

/// Drop empty objects, the store never keeps them.
fn prune(node: &mut Value) {
    if let Value::Object(map) = node {
        for child in map.values_mut() {
            prune(child);
        }
        map.retain(|_, v| !v.is_null() && !matches!(v, Value::Object(m) if m.is_empty()));
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DbPath) -> Result<Value> {
        self.enter(StoreCall::Get(path.to_string())).await?;
        let state = self.state.lock().expect("state lock");
        Ok(read_at(&state.root, path.segments()))
    }

    async fn set(&self, path: &DbPath, value: Value) -> Result<()> {
        self.enter(StoreCall::Set(path.to_string())).await?;
        let mut state = self.state.lock().expect("state lock");
        let value = state.resolve(value);
        write_at(&mut state.root, path.segments(), value);
        Ok(())
    }

    async fn update(&self, path: &DbPath, value: Value) -> Result<()> {
        self.enter(StoreCall::Update(path.to_string())).await?;
        let Value::Object(children) = value else {
            return Err(DbError::Remote {
                status: 400,
                message: "Invalid data; couldn't parse JSON object.".to_string(),
            });
        };

        let mut state = self.state.lock().expect("state lock");
        for (key, child) in children {
            let child = state.resolve(child);
            let mut segments = path.segments().to_vec();
            segments.push(key);
            write_at(&mut state.root, &segments, child);
        }
        Ok(())
    }

    async fn remove(&self, path: &DbPath) -> Result<()> {
        self.enter(StoreCall::Remove(path.to_string())).await?;
        let mut state = self.state.lock().expect("state lock");
        write_at(&mut state.root, path.segments(), Value::Null);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn users(uid: &str) -> DbPath {
        DbPath::users(uid).unwrap()
    }

    #[tokio::test]
    async fn test_set_replaces_whole_value() {
        let store = MemoryStore::new();
        let path = users("u1");
        store.set(&path, json!({"name": "A", "email": "a@x"})).await.unwrap();
        store.set(&path, json!({"name": "B"})).await.unwrap();
        assert_eq!(store.get(&path).await.unwrap(), json!({"name": "B"}));
    }

    #[tokio::test]
    async fn test_update_merges_children() {
        let store = MemoryStore::new();
        let path = users("u1");
        store.set(&path, json!({"name": "A", "email": "a@x"})).await.unwrap();
        store.update(&path, json!({"name": "B"})).await.unwrap();
        assert_eq!(
            store.get(&path).await.unwrap(),
            json!({"name": "B", "email": "a@x"})
        );
    }

    #[tokio::test]
    async fn test_remove_prunes_empty_parent() {
        let store = MemoryStore::new();
        let path = users("u1");
        store.set(&path, json!({"name": "A"})).await.unwrap();
        store.remove(&path).await.unwrap();
        assert_eq!(store.get(&path).await.unwrap(), Value::Null);
        assert_eq!(store.peek(&DbPath::new(["users"]).unwrap()), Value::Null);
    }

    #[tokio::test]
    async fn test_server_timestamps_resolved_and_increasing() {
        let store = MemoryStore::new();
        let path = users("u1");
        store
            .set(&path, json!({"createdAt": {".sv": "timestamp"}}))
            .await
            .unwrap();
        let first = store.peek(&path)["createdAt"].as_i64().unwrap();
        store
            .update(&path, json!({"lastUpdated": {".sv": "timestamp"}}))
            .await
            .unwrap();
        let second = store.peek(&path)["lastUpdated"].as_i64().unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn test_injected_failure_recorded() {
        let store = MemoryStore::new();
        store.fail_with(401, "Permission denied");
        let err = store.get(&users("u1")).await.unwrap_err();
        assert_eq!(err.user_message(), "Permission denied");
        assert_eq!(store.calls(), vec![StoreCall::Get("users/u1".to_string())]);
    }
}
