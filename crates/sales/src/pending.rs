//! In-flight acquisition tracking.
//!
//! [`PendingAcquisitions`] guarantees at most one outstanding retrieval per cache key. The
//! first caller to [`claim`](PendingAcquisitions::claim) a key becomes its fetcher and
//! receives a [`PendingGuard`]; every later caller receives a [`Waiter`] that resolves to
//! the fetcher's result.
//!
//! If the fetcher is dropped before finishing, its guard removes the entry and the waiters
//! observe the closed channel and retry.

use parking_lot::Mutex;
use sales_core::{CacheKey, DataError, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

type Shared<V> = std::result::Result<V, DataError>;
type Sender<V> = Arc<watch::Sender<Option<Shared<V>>>>;

struct Inner<V> {
    entries: HashMap<CacheKey, Sender<V>>,
    /// Bumped by `clear`; fetchers claimed under an older generation do not commit.
    generation: u64,
}

impl<V> Inner<V> {
    fn remove_if_same(&mut self, key: &CacheKey, tx: &Sender<V>) {
        if self
            .entries
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, tx))
        {
            self.entries.remove(key);
        }
    }
}

/// Map of in-flight acquisitions keyed by cache key.
pub struct PendingAcquisitions<V> {
    inner: Mutex<Inner<V>>,
}

impl<V> fmt::Debug for PendingAcquisitions<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("PendingAcquisitions")
            .field("in_flight", &inner.entries.len())
            .field("generation", &inner.generation)
            .finish()
    }
}

impl<V> Default for PendingAcquisitions<V> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                generation: 0,
            }),
        }
    }
}

/// Outcome of [`PendingAcquisitions::claim`].
#[derive(Debug)]
pub enum Claim<'a, V> {
    /// The value was already cached.
    Ready(V),
    /// Another caller is fetching; wait for its result.
    Wait(Waiter<V>),
    /// The caller is now the fetcher and must finish the guard.
    Fetch(PendingGuard<'a, V>),
}

impl<V: Clone> PendingAcquisitions<V> {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins or starts the acquisition for `key`.
    ///
    /// `cached` is consulted under the map lock after confirming no acquisition is in
    /// flight, so a result committed by a fetcher that just finished is never fetched twice.
    pub fn claim(&self, key: &CacheKey, cached: impl FnOnce() -> Option<V>) -> Claim<'_, V> {
        let mut inner = self.inner.lock();

        if let Some(tx) = inner.entries.get(key) {
            return Claim::Wait(Waiter { rx: tx.subscribe() });
        }

        if let Some(value) = cached() {
            return Claim::Ready(value);
        }

        let (tx, _rx) = watch::channel(None);
        let tx = Arc::new(tx);
        inner.entries.insert(key.clone(), Arc::clone(&tx));
        Claim::Fetch(PendingGuard {
            key: key.clone(),
            pending: self,
            tx,
            generation: inner.generation,
            finished: false,
        })
    }

    /// Returns true if an acquisition for `key` is in flight.
    #[must_use]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    /// Keys with an acquisition in flight.
    #[must_use]
    pub fn keys(&self) -> Vec<CacheKey> {
        self.inner.lock().entries.keys().cloned().collect()
    }

    /// Number of acquisitions in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Returns true if nothing is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Forgets every in-flight acquisition.
    ///
    /// Fetchers already running still answer their waiters, but their results are no
    /// longer committed. Returns the number of entries dropped.
    pub fn clear(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        let dropped = inner.entries.len();
        inner.entries.clear();
        dropped
    }
}

/// Handle held by the caller performing an acquisition.
///
/// Dropping it without calling [`finish`](Self::finish) removes the pending entry.
pub struct PendingGuard<'a, V> {
    key: CacheKey,
    pending: &'a PendingAcquisitions<V>,
    tx: Sender<V>,
    generation: u64,
    finished: bool,
}

impl<V> fmt::Debug for PendingGuard<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingGuard")
            .field("key", &self.key)
            .field("generation", &self.generation)
            .field("finished", &self.finished)
            .finish()
    }
}

impl<V: Clone> PendingGuard<'_, V> {
    /// The key being acquired.
    #[must_use]
    pub const fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Publishes `result` to every waiter and removes the pending entry.
    ///
    /// On success `commit` runs first, under the map lock, unless the map was cleared since
    /// the claim. Returns true if `commit` ran.
    pub fn finish(mut self, result: &Result<V>, commit: impl FnOnce(&V)) -> bool {
        let mut inner = self.pending.inner.lock();
        let committed = match result {
            Ok(value) if inner.generation == self.generation => {
                commit(value);
                true
            }
            _ => false,
        };

        // Send before removing so a waiter never sees the entry gone without a result.
        let _ = self.tx.send(Some(result.clone()));
        inner.remove_if_same(&self.key, &self.tx);
        self.finished = true;
        committed
    }
}

impl<V> Drop for PendingGuard<'_, V> {
    fn drop(&mut self) {
        if !self.finished {
            self.pending.inner.lock().remove_if_same(&self.key, &self.tx);
        }
    }
}

/// Handle held by a caller waiting on another caller's acquisition.
#[derive(Debug)]
pub struct Waiter<V> {
    rx: watch::Receiver<Option<Shared<V>>>,
}

impl<V: Clone> Waiter<V> {
    /// Waits for the fetcher's result.
    ///
    /// Returns `None` if the fetcher was dropped without finishing.
    pub async fn wait(mut self) -> Option<Result<V>> {
        loop {
            let current = self.rx.borrow_and_update().clone();
            if let Some(result) = current {
                return Some(result);
            }
            if self.rx.changed().await.is_err() {
                return None;
            }
        }
    }
}
