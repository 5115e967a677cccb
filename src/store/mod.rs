pub mod disk;
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

pub use disk::DiskStore;
pub use memory::MemoryStore;

/// Key under which the last successful quote identifier is kept.
pub const QUOTE_ID_KEY: &str = "quote_id";

/// String key/value storage that outlives a session.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn put(&self, key: &str, value: &str) -> Result<()>;
}

/// Opens the disk store under `data_dir`, falling back to memory if that fails.
pub fn open(data_dir: &Path) -> Arc<dyn KeyValueStore> {
    match DiskStore::open(&data_dir.join("local_storage")) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!(error = %e, "Local storage unavailable, values will not persist");
            Arc::new(MemoryStore::new())
        }
    }
}
