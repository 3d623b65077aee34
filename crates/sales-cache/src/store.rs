//! Versioned TTL/LRU store.
//!
//! [`VersionedStore`] keeps values under [`CacheKey`]s with an optional time-to-live,
//! tracks how often and how recently each entry is read, and estimates entry sizes from
//! their serialized form. When an insert pushes the store past its configured limits, a
//! two-phase cleanup first drops expired entries and then, only if still over a limit,
//! evicts the least-recently-accessed fifth of what remains.

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use sales_core::{CacheKey, Clock, DataError, Result, SnapshotStore, SystemClock, VersionTag};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::config::StoreConfig;

/// Fraction of entries evicted by the least-recently-accessed sweep.
const LRU_EVICTION_FRACTION: f64 = 0.2;

/// Stored value plus bookkeeping. Never handed out; readers get a clone of `value`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry<V> {
    value: V,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    size_bytes: usize,
    access_count: u64,
    last_accessed_at: DateTime<Utc>,
    /// Insertion order, used to break ties between equal access times.
    #[serde(skip)]
    seq: u64,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

#[derive(Debug)]
struct Inner<V> {
    entries: HashMap<CacheKey, CacheEntry<V>>,
    next_seq: u64,
}

impl<V> Inner<V> {
    fn total_size(&self) -> usize {
        self.entries.values().map(|e| e.size_bytes).sum()
    }

    fn over_limits(&self, config: &StoreConfig) -> bool {
        self.entries.len() > config.max_items || self.total_size() > config.max_size_bytes
    }

    fn insert(&mut self, key: CacheKey, mut entry: CacheEntry<V>) {
        // Replacing a key keeps its original insertion position.
        entry.seq = match self.entries.get(&key) {
            Some(existing) => existing.seq,
            None => {
                self.next_seq += 1;
                self.next_seq
            }
        };
        self.entries.insert(key, entry);
    }

    fn cleanup(&mut self, config: &StoreConfig, now: DateTime<Utc>) -> CleanupReport {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let expired = before - self.entries.len();

        let mut evicted = 0;
        if self.over_limits(config) {
            let mut ranked: Vec<(DateTime<Utc>, u64, CacheKey)> = self
                .entries
                .iter()
                .map(|(key, entry)| (entry.last_accessed_at, entry.seq, key.clone()))
                .collect();
            ranked.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

            let count = ((self.entries.len() as f64 * LRU_EVICTION_FRACTION).floor() as usize).max(1);
            for (_, _, key) in ranked.into_iter().take(count) {
                self.entries.remove(&key);
                evicted += 1;
            }
        }

        CleanupReport { expired, evicted }
    }
}

/// What a cleanup pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Entries removed because their TTL elapsed.
    pub expired: usize,
    /// Entries removed by the least-recently-accessed sweep.
    pub evicted: usize,
}

impl CleanupReport {
    /// Total entries removed.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.expired + self.evicted
    }
}

/// Key and creation time of one entry, as reported by [`StoreStats`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemAge {
    /// The entry's key.
    pub key: CacheKey,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
}

/// Read-only snapshot of store occupancy.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreStats {
    /// Entries currently held, expired or not.
    pub item_count: usize,
    /// Sum of estimated entry sizes in bytes.
    pub total_size: usize,
    /// Entries whose TTL has elapsed but that have not been swept yet.
    pub expired_count: usize,
    /// Mean access count across live entries.
    pub hit_rate: f64,
    /// The entry written first.
    pub oldest_item: Option<ItemAge>,
    /// The entry written last.
    pub newest_item: Option<ItemAge>,
}

/// Serializable form of a store, written to persistent storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot<V> {
    items: Vec<(CacheKey, CacheEntry<V>)>,
    timestamp: DateTime<Utc>,
    version: VersionTag,
}

impl<V> StoreSnapshot<V> {
    /// Number of entries captured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if no entries were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// When the snapshot was taken.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The daily version the snapshot belongs to.
    #[must_use]
    pub const fn version(&self) -> &VersionTag {
        &self.version
    }
}

/// Key/value store with per-entry TTL, access tracking, and size-bounded eviction.
///
/// Reads never fail: a missing or expired entry is simply `None`. All operations take a
/// short internal lock and never hold it across an await point.
#[derive(Debug)]
pub struct VersionedStore<V> {
    inner: Mutex<Inner<V>>,
    config: StoreConfig,
    clock: Arc<dyn Clock>,
}

impl<V: Clone + Serialize> VersionedStore<V> {
    /// Create a store using the system clock.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a store driven by `clock`.
    #[must_use]
    pub fn with_clock(config: StoreConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                next_seq: 0,
            }),
            config,
            clock,
        }
    }

    /// The store's configuration.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The clock driving expiry.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Day-granularity version for the current time.
    #[must_use]
    pub fn daily_version(&self) -> VersionTag {
        VersionTag::daily(self.clock.now())
    }

    /// Hour-granularity version for the current time.
    #[must_use]
    pub fn hourly_version(&self) -> VersionTag {
        VersionTag::hourly(self.clock.now())
    }

    /// Stores `value` under `key`, expiring after `ttl` if given.
    ///
    /// Runs [`cleanup`](Self::cleanup) if the insert leaves the store over its limits.
    pub fn put(&self, key: CacheKey, value: V, ttl: Option<Duration>) {
        let now = self.clock.now();
        let size_bytes = estimate_size(&value);
        let expires_at = ttl.map(|ttl| {
            let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
            now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC)
        });

        let mut inner = self.inner.lock();
        debug!(key = %key, size = %format_size(size_bytes), "Caching entry");
        inner.insert(
            key,
            CacheEntry {
                value,
                created_at: now,
                expires_at,
                size_bytes,
                access_count: 0,
                last_accessed_at: now,
                seq: 0,
            },
        );

        if inner.over_limits(&self.config) {
            warn!(
                items = inner.entries.len(),
                size = %format_size(inner.total_size()),
                "Cache limits exceeded, cleaning up"
            );
            let report = inner.cleanup(&self.config, now);
            debug!(
                expired = report.expired,
                evicted = report.evicted,
                "Cache cleanup finished"
            );
        }
    }

    /// Returns a copy of the value under `key`.
    ///
    /// An expired entry is removed and reported as absent. A hit bumps the entry's access
    /// count and last-access time.
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        if inner.entries.get(key)?.is_expired(now) {
            inner.entries.remove(key);
            debug!(key = %key, "Cache entry expired");
            return None;
        }

        let entry = inner.entries.get_mut(key)?;
        entry.access_count += 1;
        entry.last_accessed_at = now;
        debug!(key = %key, accesses = entry.access_count, "Cache hit");
        Some(entry.value.clone())
    }

    /// Returns true if a live entry exists under `key`, without touching access stats.
    pub fn has(&self, key: &CacheKey) -> bool {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        match inner.entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                inner.entries.remove(key);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Removes the entry under `key`. Returns true if one existed.
    pub fn delete(&self, key: &CacheKey) -> bool {
        let removed = self.inner.lock().entries.remove(key).is_some();
        if removed {
            debug!(key = %key, "Cache entry deleted");
        }
        removed
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
        debug!("Cleared all cache entries");
    }

    /// Drops expired entries, then evicts the least-recently-accessed 20% (at least one)
    /// if the store is still over a limit.
    pub fn cleanup(&self) -> CleanupReport {
        let now = self.clock.now();
        let report = self.inner.lock().cleanup(&self.config, now);
        if report.total() > 0 {
            debug!(
                expired = report.expired,
                evicted = report.evicted,
                "Cache cleanup removed entries"
            );
        }
        report
    }

    /// Number of entries held, including expired ones not yet swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Returns true if the store holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Keys of all held entries, oldest first.
    #[must_use]
    pub fn keys(&self) -> Vec<CacheKey> {
        let inner = self.inner.lock();
        let mut keys: Vec<(u64, CacheKey)> = inner
            .entries
            .iter()
            .map(|(key, entry)| (entry.seq, key.clone()))
            .collect();
        keys.sort_by_key(|(seq, _)| *seq);
        keys.into_iter().map(|(_, key)| key).collect()
    }

    /// Occupancy statistics.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let now = self.clock.now();
        let inner = self.inner.lock();

        let mut total_size = 0;
        let mut expired_count = 0;
        let mut live = 0usize;
        let mut live_accesses = 0u64;
        let mut oldest: Option<(&CacheKey, &CacheEntry<V>)> = None;
        let mut newest: Option<(&CacheKey, &CacheEntry<V>)> = None;

        for (key, entry) in &inner.entries {
            total_size += entry.size_bytes;
            if entry.is_expired(now) {
                expired_count += 1;
            } else {
                live += 1;
                live_accesses += entry.access_count;
            }
            let order = (entry.created_at, entry.seq);
            if oldest.is_none_or(|(_, e)| order < (e.created_at, e.seq)) {
                oldest = Some((key, entry));
            }
            if newest.is_none_or(|(_, e)| order > (e.created_at, e.seq)) {
                newest = Some((key, entry));
            }
        }

        let age = |item: Option<(&CacheKey, &CacheEntry<V>)>| {
            item.map(|(key, entry)| ItemAge {
                key: key.clone(),
                created_at: entry.created_at,
            })
        };

        StoreStats {
            item_count: inner.entries.len(),
            total_size,
            expired_count,
            hit_rate: if live == 0 {
                0.0
            } else {
                live_accesses as f64 / live as f64
            },
            oldest_item: age(oldest),
            newest_item: age(newest),
        }
    }

    /// Captures every held entry in insertion order, tagged with today's version.
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot<V> {
        let now = self.clock.now();
        let inner = self.inner.lock();
        let mut items: Vec<(CacheKey, CacheEntry<V>)> = inner
            .entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect();
        items.sort_by_key(|(_, entry)| entry.seq);
        StoreSnapshot {
            items,
            timestamp: now,
            version: VersionTag::daily(now),
        }
    }
}

impl<V> VersionedStore<V>
where
    V: Clone + Serialize + Send + Sync + 'static,
{
    /// Spawns a task that runs [`cleanup`](Self::cleanup) every `interval`.
    ///
    /// The task stops on its own once the store is dropped; abort the handle to stop it
    /// earlier.
    pub fn spawn_cleanup(store: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let weak = Arc::downgrade(store);
        let period = interval.max(Duration::from_millis(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(store) = weak.upgrade() else {
                    break;
                };
                store.cleanup();
            }
        })
    }
}

impl<V> VersionedStore<V>
where
    V: Clone + Serialize + DeserializeOwned,
{
    /// Writes a snapshot of the store to `sink` under `name`.
    ///
    /// Returns the number of entries written. In-memory state is never modified, even when
    /// the write fails.
    ///
    /// # Errors
    /// Propagates the sink's error, including [`DataError::QuotaExceeded`].
    #[instrument(skip(self, sink))]
    pub async fn persist(&self, sink: &dyn SnapshotStore, name: &str) -> Result<usize> {
        let snapshot = self.snapshot();
        let contents =
            serde_json::to_string(&snapshot).map_err(|e| DataError::Storage(e.to_string()))?;

        match sink.save(name, &contents).await {
            Ok(()) => {
                debug!(
                    items = snapshot.len(),
                    size = %format_size(contents.len()),
                    "Cache snapshot saved"
                );
                Ok(snapshot.len())
            }
            Err(e) => {
                warn!(error = %e, "Failed to save cache snapshot");
                Err(e)
            }
        }
    }

    /// Replaces the store's contents with the snapshot saved under `name`.
    ///
    /// A snapshot from a different day, or one that cannot be parsed, is removed from the
    /// sink and nothing is loaded. Entries that expired while persisted are skipped.
    /// Returns the number of entries loaded.
    ///
    /// # Errors
    /// Propagates read/remove errors from the sink.
    #[instrument(skip(self, sink))]
    pub async fn restore(&self, sink: &dyn SnapshotStore, name: &str) -> Result<usize> {
        let Some(contents) = sink.load(name).await? else {
            return Ok(0);
        };

        let snapshot: StoreSnapshot<V> = match serde_json::from_str(&contents) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable cache snapshot");
                sink.remove(name).await?;
                return Ok(0);
            }
        };

        let now = self.clock.now();
        let current = VersionTag::daily(now);
        if snapshot.version != current {
            debug!(
                stored = %snapshot.version,
                current = %current,
                "Cache snapshot is from an older version, discarding"
            );
            sink.remove(name).await?;
            return Ok(0);
        }

        let mut inner = self.inner.lock();
        inner.entries.clear();
        let mut loaded = 0;
        for (key, entry) in snapshot.items {
            if entry.is_expired(now) {
                continue;
            }
            inner.insert(key, entry);
            loaded += 1;
        }
        if inner.over_limits(&self.config) {
            inner.cleanup(&self.config, now);
        }
        debug!(items = loaded, "Cache snapshot restored");
        Ok(loaded)
    }
}

/// Estimates a value's footprint from its JSON serialization.
fn estimate_size<V: Serialize>(value: &V) -> usize {
    match serde_json::to_vec(value) {
        Ok(bytes) => bytes.len(),
        Err(e) => {
            warn!(error = %e, "Failed to estimate cache entry size");
            0
        }
    }
}

/// Formats a byte count for humans (`0 B`, `1.5 KB`, `48.21 MB`).
#[must_use]
pub fn format_size(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".to_string();
    }
    let bytes = bytes as f64;
    let exponent = ((bytes.ln() / 1024f64.ln()).floor() as usize).min(UNITS.len() - 1);
    let scaled = bytes / 1024f64.powi(exponent as i32);
    let rounded = (scaled * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[exponent])
}
