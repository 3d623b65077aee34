//! No-op snapshot store implementation.

use async_trait::async_trait;
use sales_core::{Result, SnapshotStore};
use tracing::trace;

/// A no-op snapshot store that doesn't store anything.
///
/// `load` always returns `Ok(None)` and `save` always returns `Ok(())`.
/// Useful for disabling persistence.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSnapshotStore;

impl NoopSnapshotStore {
    /// Create a new no-op snapshot store.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SnapshotStore for NoopSnapshotStore {
    async fn save(&self, _name: &str, _contents: &str) -> Result<()> {
        trace!("NoopSnapshotStore: save called, doing nothing");
        Ok(())
    }

    async fn load(&self, _name: &str) -> Result<Option<String>> {
        trace!("NoopSnapshotStore: load called, returning None");
        Ok(None)
    }

    async fn remove(&self, _name: &str) -> Result<bool> {
        trace!("NoopSnapshotStore: remove called, returning false");
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_snapshot_store() {
        let store = NoopSnapshotStore::new();

        store.save("sales_cache", "{}").await.unwrap();
        assert_eq!(store.load("sales_cache").await.unwrap(), None);
        assert!(!store.remove("sales_cache").await.unwrap());
    }
}
