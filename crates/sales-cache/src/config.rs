//! Store configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Limits and default lifetimes for a [`VersionedStore`](crate::VersionedStore).
///
/// Durations are expressed in seconds so the struct deserializes from flat TOML/JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Total estimated size above which cleanup runs.
    pub max_size_bytes: usize,
    /// Entry count above which cleanup runs.
    pub max_items: usize,
    /// Lifetime of day-versioned entries.
    pub daily_ttl_secs: u64,
    /// Lifetime of hour-versioned entries.
    pub hourly_ttl_secs: u64,
    /// Whether the owner should run periodic cleanup.
    pub auto_cleanup: bool,
    /// Period of the background cleanup.
    pub cleanup_interval_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: 50 * 1024 * 1024,
            max_items: 1000,
            daily_ttl_secs: 24 * 60 * 60,
            hourly_ttl_secs: 60 * 60,
            auto_cleanup: true,
            cleanup_interval_secs: 30 * 60,
        }
    }
}

impl StoreConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the size limit.
    #[must_use]
    pub const fn with_max_size(mut self, bytes: usize) -> Self {
        self.max_size_bytes = bytes;
        self
    }

    /// Set the item limit.
    #[must_use]
    pub const fn with_max_items(mut self, items: usize) -> Self {
        self.max_items = items;
        self
    }

    /// Set the lifetime of day-versioned entries.
    #[must_use]
    pub const fn with_daily_ttl(mut self, ttl: Duration) -> Self {
        self.daily_ttl_secs = ttl.as_secs();
        self
    }

    /// Set the lifetime of hour-versioned entries.
    #[must_use]
    pub const fn with_hourly_ttl(mut self, ttl: Duration) -> Self {
        self.hourly_ttl_secs = ttl.as_secs();
        self
    }

    /// Enable or disable periodic cleanup.
    #[must_use]
    pub const fn with_auto_cleanup(mut self, enabled: bool) -> Self {
        self.auto_cleanup = enabled;
        self
    }

    /// Lifetime of day-versioned entries.
    #[must_use]
    pub const fn daily_ttl(&self) -> Duration {
        Duration::from_secs(self.daily_ttl_secs)
    }

    /// Lifetime of hour-versioned entries.
    #[must_use]
    pub const fn hourly_ttl(&self) -> Duration {
        Duration::from_secs(self.hourly_ttl_secs)
    }

    /// Period of the background cleanup.
    #[must_use]
    pub const fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}
