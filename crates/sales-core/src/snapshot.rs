//! Snapshot persistence trait.
//!
//! This module defines the [`SnapshotStore`] trait that provides a unified interface for
//! writing serialized cache snapshots to local persistent storage under a fixed name.

use async_trait::async_trait;

use crate::error::Result;

/// Persistent storage for serialized cache snapshots.
///
/// Implementations can store data in various backends (SQLite, in-memory, etc.).
/// Writes that exceed the backend's capacity fail with
/// [`DataError::QuotaExceeded`](crate::DataError::QuotaExceeded).
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Writes `contents` under `name`, replacing any previous snapshot.
    async fn save(&self, name: &str, contents: &str) -> Result<()>;

    /// Reads the snapshot stored under `name`.
    ///
    /// Returns `Ok(Some(contents))` if present, `Ok(None)` if not.
    async fn load(&self, name: &str) -> Result<Option<String>>;

    /// Removes the snapshot stored under `name`.
    ///
    /// Returns true if something was removed.
    async fn remove(&self, name: &str) -> Result<bool>;
}
