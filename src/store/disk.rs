use super::KeyValueStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

const PARTITION: &str = "local_storage";

/// fjall-backed store; every put is synced to disk before returning.
pub struct DiskStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskStore {
    pub fn open(path: &Path) -> Result<Self> {
        let keyspace = fjall::Config::new(path)
            .open()
            .with_context(|| format!("Failed to open local storage at {}", path.display()))?;
        let partition = keyspace
            .open_partition(PARTITION, PartitionCreateOptions::default())
            .context("Failed to open local storage partition")?;
        debug!("Opened local storage at {}", path.display());
        Ok(Self {
            keyspace,
            partition,
        })
    }
}

#[async_trait]
impl KeyValueStore for DiskStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .partition
            .get(key)?
            .map(|bytes| String::from_utf8(bytes.to_vec()))
            .transpose()
            .with_context(|| format!("Stored value for {key} is not UTF-8"))?;
        debug!(key, found = value.is_some(), "Disk store GET");
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.partition.insert(key, value)?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!(key, "Disk store PUT");
        Ok(())
    }
}
