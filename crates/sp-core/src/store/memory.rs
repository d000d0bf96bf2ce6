//! In-memory association store.

use super::{AssociationStore, StoreResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// An association store backed by an in-memory map.
///
/// Used by tests and single-node deployments. `seed_raw` pre-loads raw
/// values (including deliberately corrupt blobs) and the write counter
/// lets tests assert how many read-modify-write cycles a `link` performed.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, String>>,
    writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-loads a raw value without counting it as a write.
    pub async fn seed_raw(&self, key: &str, value: &str) {
        self.data
            .write()
            .await
            .insert(key.to_string(), value.to_string());
    }

    /// Number of `set` calls so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// All keys currently present, for test assertions.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.data.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl AssociationStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.data
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_missing_key_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let store = MemoryStore::new();
        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn seed_raw_does_not_count_as_write() {
        let store = MemoryStore::new();
        store.seed_raw("k", "not json").await;
        assert_eq!(store.write_count(), 0);
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("not json"));
    }
}
