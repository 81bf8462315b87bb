use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
}

/// The one external collaborator: a generic asynchronous keyed store.
/// Values are structured JSON; (de)serialization into domain types is the
/// repository's job.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store for tests and embedding without a real backend.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_get_remove_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.get("periods").await.unwrap().is_none());

        store.set("periods", json!([1, 2, 3])).await.unwrap();
        assert_eq!(store.get("periods").await.unwrap(), Some(json!([1, 2, 3])));

        store.remove("periods").await.unwrap();
        assert!(store.get("periods").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_overwrites_existing_value() {
        let store = MemoryStore::new();
        store.set("cycleSettings", json!({"v": 1})).await.unwrap();
        store.set("cycleSettings", json!({"v": 2})).await.unwrap();
        assert_eq!(
            store.get("cycleSettings").await.unwrap(),
            Some(json!({"v": 2}))
        );
    }
}
