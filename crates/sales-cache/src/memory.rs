//! In-memory snapshot store implementation.

use async_trait::async_trait;
use sales_core::{DataError, Result, SnapshotStore};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Simple in-memory snapshot store for testing and development.
///
/// Snapshots are stored in a `RwLock`-protected `HashMap` and are lost when the store is
/// dropped. An optional quota mimics the capacity limit of browser-style local storage.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    snapshots: RwLock<HashMap<String, String>>,
    quota: Option<usize>,
}

impl InMemorySnapshotStore {
    /// Create a new empty store without a quota.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty store that rejects snapshots larger than `limit` bytes.
    #[must_use]
    pub fn with_quota(limit: usize) -> Self {
        Self {
            snapshots: RwLock::default(),
            quota: Some(limit),
        }
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    #[instrument(skip(self, contents), fields(size = contents.len()))]
    async fn save(&self, name: &str, contents: &str) -> Result<()> {
        if let Some(limit) = self.quota {
            if contents.len() > limit {
                return Err(DataError::QuotaExceeded {
                    required: contents.len(),
                    limit,
                });
            }
        }
        self.snapshots
            .write()
            .await
            .insert(name.to_string(), contents.to_string());
        debug!("Stored snapshot");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn load(&self, name: &str) -> Result<Option<String>> {
        let snapshots = self.snapshots.read().await;
        match snapshots.get(name) {
            Some(contents) => {
                debug!("Snapshot found");
                Ok(Some(contents.clone()))
            }
            None => {
                debug!("No snapshot stored");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self))]
    async fn remove(&self, name: &str) -> Result<bool> {
        Ok(self.snapshots.write().await.remove(name).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_snapshot_store() {
        let store = InMemorySnapshotStore::new();

        // Initially no data
        assert_eq!(store.load("sales_cache").await.unwrap(), None);

        store.save("sales_cache", "{}").await.unwrap();
        assert_eq!(
            store.load("sales_cache").await.unwrap().as_deref(),
            Some("{}")
        );

        assert!(store.remove("sales_cache").await.unwrap());
        assert!(!store.remove("sales_cache").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_snapshot_quota() {
        let store = InMemorySnapshotStore::with_quota(4);
        store.save("small", "1234").await.unwrap();

        let err = store.save("big", "12345").await.unwrap_err();
        assert_eq!(
            err,
            DataError::QuotaExceeded {
                required: 5,
                limit: 4
            }
        );
        assert_eq!(store.load("big").await.unwrap(), None);
    }
}
