//! Lazy, de-duplicated acquisition of yearly and monthly sales data.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use futures::future::try_join_all;
use sales_cache::VersionedStore;
use sales_core::{
    AcquisitionUnit, CacheKey, DataError, Dataset, Result, RetrievalSource, Retrieved, VersionTag,
    decode_document, decode_payload,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::pending::{Claim, PendingAcquisitions};

/// Namespace of cached yearly datasets.
pub const YEAR_NAMESPACE: &str = "year-cache";
/// Namespace of cached monthly datasets.
pub const MONTH_NAMESPACE: &str = "month-cache";
/// Namespace of the cached metadata document.
pub const METADATA_NAMESPACE: &str = "metadata";

const METADATA_IDENTIFIER: &str = "main";

/// A value held in the session store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CachedValue {
    /// Decoded records of one acquisition unit.
    Dataset(Dataset),
    /// A free-form JSON document such as the metadata summary.
    Document(Value),
}

impl CachedValue {
    /// Returns the dataset, or a decode error for any other kind of value.
    ///
    /// # Errors
    /// Returns [`DataError::Decode`] if the value is not a dataset.
    pub fn into_dataset(self) -> Result<Dataset> {
        match self {
            Self::Dataset(dataset) => Ok(dataset),
            Self::Document(_) => Err(DataError::Decode("cached value is not a dataset".into())),
        }
    }

    /// Returns the document, or a decode error for any other kind of value.
    ///
    /// # Errors
    /// Returns [`DataError::Decode`] if the value is not a document.
    pub fn into_document(self) -> Result<Value> {
        match self {
            Self::Document(document) => Ok(document),
            Self::Dataset(_) => Err(DataError::Decode("cached value is not a document".into())),
        }
    }
}

/// The store type shared by an acquirer and its session.
pub type SalesStore = VersionedStore<CachedValue>;

/// Acquirer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquirerConfig {
    /// Cache months derived from a yearly payload under their own key.
    pub cache_month_fallback: bool,
}

impl Default for AcquirerConfig {
    fn default() -> Self {
        Self {
            cache_month_fallback: true,
        }
    }
}

impl AcquirerConfig {
    /// Set whether derived months are cached.
    #[must_use]
    pub const fn with_cache_month_fallback(mut self, enabled: bool) -> Self {
        self.cache_month_fallback = enabled;
        self
    }
}

/// Where a unit stands for the current version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitState {
    /// Not cached and not being retrieved.
    Unrequested,
    /// A retrieval is in flight.
    Pending,
    /// Resolvable from cache without network access.
    Cached,
}

/// Acquirer statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcquirerStats {
    /// Year and month units held in the store.
    pub cached_units: usize,
    /// Acquisitions in flight.
    pub pending_units: usize,
    /// Keys of the cached units.
    pub cache_keys: Vec<CacheKey>,
}

/// Fetches acquisition units on demand, at most once per unit and version.
///
/// Cloning is cheap; clones share the source, store, and pending map.
#[derive(Debug, Clone)]
pub struct LazyAcquirer {
    source: Arc<dyn RetrievalSource>,
    store: Arc<SalesStore>,
    pending: Arc<PendingAcquisitions<CachedValue>>,
    config: AcquirerConfig,
}

impl LazyAcquirer {
    /// Create an acquirer reading from `source` and caching into `store`.
    #[must_use]
    pub fn new(
        source: Arc<dyn RetrievalSource>,
        store: Arc<SalesStore>,
        config: AcquirerConfig,
    ) -> Self {
        Self {
            source,
            store,
            pending: Arc::new(PendingAcquisitions::new()),
            config,
        }
    }

    /// The backing store.
    #[must_use]
    pub const fn store(&self) -> &Arc<SalesStore> {
        &self.store
    }

    /// The retrieval source.
    #[must_use]
    pub const fn source(&self) -> &Arc<dyn RetrievalSource> {
        &self.source
    }

    /// The in-flight acquisition map.
    #[must_use]
    pub const fn pending(&self) -> &Arc<PendingAcquisitions<CachedValue>> {
        &self.pending
    }

    /// The acquirer's configuration.
    #[must_use]
    pub const fn config(&self) -> &AcquirerConfig {
        &self.config
    }

    /// Cache key of `unit` under the current daily version.
    #[must_use]
    pub fn unit_key(&self, unit: AcquisitionUnit) -> CacheKey {
        unit_key(unit, self.store.daily_version())
    }

    /// Cache key of the metadata document under the current hourly version.
    #[must_use]
    pub fn metadata_key(&self) -> CacheKey {
        CacheKey::new(
            METADATA_NAMESPACE,
            METADATA_IDENTIFIER,
            self.store.hourly_version(),
        )
    }

    /// Acquires any unit.
    ///
    /// # Errors
    /// See [`acquire_year`](Self::acquire_year) and [`acquire_month`](Self::acquire_month).
    pub async fn acquire(&self, unit: AcquisitionUnit) -> Result<Dataset> {
        match unit {
            AcquisitionUnit::Year(year) => self.acquire_year(year).await,
            AcquisitionUnit::Month(year, month) => self.acquire_month(year, month).await,
        }
    }

    /// Acquires a full year.
    ///
    /// # Errors
    /// Returns [`DataError::RetrievalNotFound`] if the source has no payload for the year,
    /// and propagates retrieval and decode failures. Nothing is cached on failure.
    #[instrument(skip(self))]
    pub async fn acquire_year(&self, year: i32) -> Result<Dataset> {
        let unit = AcquisitionUnit::year(year);
        let version = self.store.daily_version();
        let key = unit_key(unit, version.clone());
        let ttl = self.store.config().daily_ttl();

        let value = self
            .resolve(key, ttl, || async move {
                match self.retrieve_unit(unit, &version).await? {
                    Some(dataset) => {
                        debug!(records = dataset.len(), "Year retrieved");
                        Ok((CachedValue::Dataset(dataset), true))
                    }
                    None => Err(DataError::RetrievalNotFound(unit)),
                }
            })
            .await?;
        value.into_dataset()
    }

    /// Acquires one month.
    ///
    /// Resolution order: the cached month, the cached parent year, the dedicated monthly
    /// payload, and finally the full year filtered to the month.
    ///
    /// # Errors
    /// Returns [`DataError::InvalidParameter`] for a month outside `1..=12`, and propagates
    /// failures of the monthly retrieval or of the yearly fallback.
    #[instrument(skip(self))]
    pub async fn acquire_month(&self, year: i32, month: u32) -> Result<Dataset> {
        let unit = AcquisitionUnit::month(year, month)?;
        let version = self.store.daily_version();
        let key = unit_key(unit, version.clone());
        let ttl = self.store.config().daily_ttl();
        let cache_derived = self.config.cache_month_fallback;

        let value = self
            .resolve(key, ttl, || async move {
                let year_key = unit_key(unit.parent(), version.clone());
                if let Some(CachedValue::Dataset(year_data)) = self.store.get(&year_key) {
                    debug!("Deriving month from cached year");
                    return Ok((CachedValue::Dataset(year_data.subset(unit)), cache_derived));
                }

                match self.retrieve_unit(unit, &version).await? {
                    Some(dataset) => {
                        debug!(records = dataset.len(), "Month retrieved");
                        Ok((CachedValue::Dataset(dataset), true))
                    }
                    None => {
                        warn!(%unit, "No monthly payload, falling back to the full year");
                        let year_data = self.acquire_year(year).await?;
                        Ok((CachedValue::Dataset(year_data.subset(unit)), cache_derived))
                    }
                }
            })
            .await?;
        value.into_dataset()
    }

    /// Acquires several years concurrently and concatenates them in argument order.
    ///
    /// # Errors
    /// Returns the first failure among the years.
    #[instrument(skip(self))]
    pub async fn acquire_years(&self, years: &[i32]) -> Result<Dataset> {
        let parts = try_join_all(years.iter().map(|&year| self.acquire_year(year))).await?;
        Ok(Dataset::concat(&parts))
    }

    /// Acquires the summary metadata document, cached per hour.
    ///
    /// # Errors
    /// Propagates retrieval and decode failures; a missing document is a
    /// [`DataError::RetrievalFailure`].
    #[instrument(skip(self))]
    pub async fn metadata(&self) -> Result<Value> {
        let key = self.metadata_key();
        let version = key.version.clone();
        let ttl = self.store.config().hourly_ttl();

        let value = self
            .resolve(key, ttl, || async move {
                match self.source.retrieve_metadata(&version).await? {
                    Retrieved::Payload(bytes) => {
                        let document = decode_document(&bytes)?;
                        Ok((CachedValue::Document(document), true))
                    }
                    Retrieved::NotFound => Err(DataError::RetrievalFailure(
                        "metadata document not found".into(),
                    )),
                }
            })
            .await?;
        value.into_document()
    }

    /// Starts acquiring `unit` in the background. Failures are logged and discarded.
    pub fn preload(&self, unit: AcquisitionUnit) -> JoinHandle<()> {
        let acquirer = self.clone();
        debug!(%unit, "Preloading");
        tokio::spawn(async move {
            match acquirer.acquire(unit).await {
                Ok(dataset) => debug!(%unit, records = dataset.len(), "Preload finished"),
                Err(e) => warn!(%unit, error = %e, "Preload failed"),
            }
        })
    }

    /// Preloads the month after the one containing `today`.
    pub fn preload_next_month(&self, today: NaiveDate) -> JoinHandle<()> {
        let current = AcquisitionUnit::Month(today.year(), today.month());
        self.preload(current.next())
    }

    /// Where `unit` stands under the current version.
    #[must_use]
    pub fn state(&self, unit: AcquisitionUnit) -> UnitState {
        let version = self.store.daily_version();
        let key = unit_key(unit, version.clone());
        if self.pending.contains(&key) {
            return UnitState::Pending;
        }
        if self.store.has(&key) {
            return UnitState::Cached;
        }
        if matches!(unit, AcquisitionUnit::Month(..))
            && self.store.has(&unit_key(unit.parent(), version))
        {
            return UnitState::Cached;
        }
        UnitState::Unrequested
    }

    /// Cached units and in-flight acquisitions.
    #[must_use]
    pub fn stats(&self) -> AcquirerStats {
        let cache_keys: Vec<CacheKey> = self
            .store
            .keys()
            .into_iter()
            .filter(is_unit_key)
            .collect();
        AcquirerStats {
            cached_units: cache_keys.len(),
            pending_units: self.pending.len(),
            cache_keys,
        }
    }

    /// Drops every cached unit, the cached metadata, and all in-flight entries.
    ///
    /// Acquisitions still running answer their current callers but are not cached.
    pub fn clear(&self) {
        let dropped = self.pending.clear();
        let mut removed = 0usize;
        for key in self.store.keys() {
            if (is_unit_key(&key) || key.namespace == METADATA_NAMESPACE) && self.store.delete(&key)
            {
                removed += 1;
            }
        }
        debug!(pending = dropped, cached = removed, "Acquirer cleared");
    }

    /// Serves `key` from cache, joins an in-flight acquisition, or runs `fetch`.
    ///
    /// `fetch` yields the value and whether it should be cached.
    async fn resolve<F, Fut>(&self, key: CacheKey, ttl: Duration, fetch: F) -> Result<CachedValue>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(CachedValue, bool)>>,
    {
        loop {
            if let Some(value) = self.store.get(&key) {
                debug!(%key, "Cache hit");
                return Ok(value);
            }

            match self.pending.claim(&key, || self.store.get(&key)) {
                Claim::Ready(value) => {
                    debug!(%key, "Cache hit");
                    return Ok(value);
                }
                Claim::Wait(waiter) => {
                    debug!(%key, "Joining in-flight acquisition");
                    match waiter.wait().await {
                        Some(result) => return result,
                        None => {
                            debug!(%key, "In-flight acquisition abandoned, retrying");
                        }
                    }
                }
                Claim::Fetch(guard) => {
                    debug!(%key, "Cache miss, retrieving");
                    let outcome = fetch().await;
                    let cacheable = matches!(outcome, Ok((_, true)));
                    let result = outcome.map(|(value, _)| value);
                    guard.finish(&result, |value| {
                        if cacheable {
                            self.store.put(key.clone(), value.clone(), Some(ttl));
                        }
                    });
                    if let Err(e) = &result {
                        if !e.is_not_found() {
                            warn!(%key, error = %e, "Acquisition failed");
                        }
                    }
                    return result;
                }
            }
        }
    }

    /// Retrieves and decodes `unit`; `None` if the source has no payload.
    async fn retrieve_unit(
        &self,
        unit: AcquisitionUnit,
        version: &VersionTag,
    ) -> Result<Option<Dataset>> {
        match self.source.retrieve(unit, version).await? {
            Retrieved::Payload(bytes) => {
                let dataset = tokio::task::spawn_blocking(move || decode_payload(&bytes))
                    .await
                    .map_err(|e| DataError::Decode(e.to_string()))??;
                Ok(Some(dataset))
            }
            Retrieved::NotFound => {
                debug!(%unit, "Source has no payload");
                Ok(None)
            }
        }
    }
}

fn unit_key(unit: AcquisitionUnit, version: VersionTag) -> CacheKey {
    let namespace = match unit {
        AcquisitionUnit::Year(_) => YEAR_NAMESPACE,
        AcquisitionUnit::Month(..) => MONTH_NAMESPACE,
    };
    CacheKey::new(namespace, unit.to_string(), version)
}

fn is_unit_key(key: &CacheKey) -> bool {
    key.namespace == YEAR_NAMESPACE || key.namespace == MONTH_NAMESPACE
}
