//! Cache keys and version stamps.
//!
//! Cached data is partitioned by a coarse, time-derived [`VersionTag`]. When the calendar
//! day (or hour) rolls over, lookups build keys with the new tag and old entries simply stop
//! being addressed, so nothing has to be invalidated explicitly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A coarse version stamp derived from wall-clock time.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionTag(String);

impl VersionTag {
    /// Day-granularity stamp formatted `YYYYMMDD`.
    #[must_use]
    pub fn daily(now: DateTime<Utc>) -> Self {
        Self(now.format("%Y%m%d").to_string())
    }

    /// Hour-granularity stamp formatted `YYYYMMDDHH`, for volatile data.
    #[must_use]
    pub fn hourly(now: DateTime<Utc>) -> Self {
        Self(now.format("%Y%m%d%H").to_string())
    }

    /// Wraps an explicit version string.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Returns the stamp as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Composite cache key.
///
/// Keys with equal namespace and identifier but different versions never collide.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// Kind of data (e.g. `year-cache`, `metadata`).
    pub namespace: String,
    /// Item within the namespace (e.g. `2024`).
    pub identifier: String,
    /// Version partition.
    pub version: VersionTag,
}

impl CacheKey {
    /// Creates a key.
    #[must_use]
    pub fn new(
        namespace: impl Into<String>,
        identifier: impl Into<String>,
        version: VersionTag,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            identifier: identifier.into(),
            version,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.namespace, self.identifier, self.version)
    }
}
