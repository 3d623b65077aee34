//! SQLite-based snapshot store implementation.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use sales_core::{DataError, Result, SnapshotStore};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, instrument};

/// SQLite-based store for cache snapshots.
///
/// Snapshots are kept in a single table keyed by name, providing persistence across
/// application restarts. An optional quota bounds the size of any one snapshot.
#[derive(Debug)]
pub struct SqliteSnapshotStore {
    conn: Mutex<Connection>,
    quota: Option<usize>,
}

impl SqliteSnapshotStore {
    /// Create a new SQLite snapshot store at the given path.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or schema creation fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| DataError::Storage(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
            quota: None,
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory SQLite snapshot store.
    ///
    /// Useful for testing; data is lost when the store is dropped.
    ///
    /// # Errors
    /// Returns an error if schema creation fails.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| DataError::Storage(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
            quota: None,
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Reject snapshots larger than `limit` bytes.
    #[must_use]
    pub const fn with_quota(mut self, limit: usize) -> Self {
        self.quota = Some(limit);
        self
    }

    /// Initialize the database schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DataError::Storage(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS cache_snapshots (
                name TEXT PRIMARY KEY,
                contents TEXT NOT NULL,
                saved_at TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| DataError::Storage(e.to_string()))?;

        debug!("SQLite snapshot schema initialized");
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for SqliteSnapshotStore {
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

        let conn = self
            .conn
            .lock()
            .map_err(|e| DataError::Storage(e.to_string()))?;

        conn.execute(
            "INSERT OR REPLACE INTO cache_snapshots (name, contents, saved_at)
             VALUES (?1, ?2, ?3)",
            params![name, contents, Utc::now().to_rfc3339()],
        )
        .map_err(|e| DataError::Storage(e.to_string()))?;

        debug!("Stored snapshot");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn load(&self, name: &str) -> Result<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DataError::Storage(e.to_string()))?;

        let contents = conn
            .query_row(
                "SELECT contents FROM cache_snapshots WHERE name = ?1",
                params![name],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|e| DataError::Storage(e.to_string()))?;

        match &contents {
            Some(_) => debug!("Snapshot found"),
            None => debug!("No snapshot stored"),
        }
        Ok(contents)
    }

    #[instrument(skip(self))]
    async fn remove(&self, name: &str) -> Result<bool> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DataError::Storage(e.to_string()))?;

        let removed = conn
            .execute(
                "DELETE FROM cache_snapshots WHERE name = ?1",
                params![name],
            )
            .map_err(|e| DataError::Storage(e.to_string()))?;

        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_snapshot_initialization() {
        let store = SqliteSnapshotStore::in_memory();
        assert!(store.is_ok());
    }

    #[tokio::test]
    async fn test_sqlite_snapshot_save_load_remove() {
        let store = SqliteSnapshotStore::in_memory().unwrap();

        assert_eq!(store.load("sales_cache").await.unwrap(), None);

        store.save("sales_cache", r#"{"items":[]}"#).await.unwrap();
        store.save("sales_cache", r#"{"items":[1]}"#).await.unwrap();
        assert_eq!(
            store.load("sales_cache").await.unwrap().as_deref(),
            Some(r#"{"items":[1]}"#)
        );

        assert!(store.remove("sales_cache").await.unwrap());
        assert_eq!(store.load("sales_cache").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sqlite_snapshot_quota() {
        let store = SqliteSnapshotStore::in_memory().unwrap().with_quota(8);

        let err = store.save("sales_cache", "0123456789").await.unwrap_err();
        assert!(matches!(err, DataError::QuotaExceeded { required: 10, limit: 8 }));
    }

    #[tokio::test]
    async fn test_sqlite_snapshot_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshots.db");

        {
            let store = SqliteSnapshotStore::new(&path).unwrap();
            store.save("sales_cache", "persisted").await.unwrap();
        }

        let reopened = SqliteSnapshotStore::new(&path).unwrap();
        assert_eq!(
            reopened.load("sales_cache").await.unwrap().as_deref(),
            Some("persisted")
        );
    }
}
