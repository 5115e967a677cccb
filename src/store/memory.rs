use super::KeyValueStore;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory store, lost when the process exits
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let store = self.inner.lock().await;
        let value = store.get(key).cloned();
        debug!(key, found = value.is_some(), "Memory store GET");
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut store = self.inner.lock().await;
        debug!(key, "Memory store PUT");
        store.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
