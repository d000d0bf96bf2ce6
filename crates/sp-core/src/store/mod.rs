//! Association Store abstraction.
//!
//! The deployment environment may supply a small key-value store for the
//! association index; some environments have none. The store is injected
//! as a trait object rather than reached through a global, so the
//! degrade-to-no-op behavior lives at one explicit boundary, and a
//! versioned/CAS upgrade can later land at the same seam.

mod error;
mod memory;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;

use async_trait::async_trait;

/// A key-value store holding opaque JSON documents.
///
/// Implementations must be thread-safe. Values are raw JSON strings; the
/// association index owns (de)serialization so a corrupt document can be
/// distinguished from a missing key.
#[async_trait]
pub trait AssociationStore: Send + Sync {
    /// Gets the value at `key`, or `None` when the key has never been set.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Sets the value at `key`, overwriting any existing value.
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn use_store<S: AssociationStore>(store: &S) -> StoreResult<Option<String>> {
        store.set("k", "{\"contacts\":[]}").await?;
        store.get("k").await
    }

    #[tokio::test]
    async fn trait_is_usable_through_generics() {
        let store = MemoryStore::new();
        let value = use_store(&store).await.unwrap();
        assert_eq!(value.as_deref(), Some("{\"contacts\":[]}"));
    }
}
