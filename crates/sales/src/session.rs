//! Per-session wiring of store, acquirer, and view.

use std::sync::Arc;

use sales_cache::StoreConfig;
use sales_core::{
    AcquisitionUnit, Clock, DataError, Dataset, Result, RetrievalSource, SnapshotStore,
    SystemClock,
};
use sales_view::{
    DatasetView, FilteredRecords, PaginationInfo, SequenceFactory, ViewConfig, WindowConfig,
    WindowRenderer,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::acquirer::{AcquirerConfig, LazyAcquirer, SalesStore};

/// Name under which the session persists its cache snapshot.
pub const SNAPSHOT_NAME: &str = "sales_cache";

/// Configuration for a [`DashboardSession`].
///
/// Every section is optional when deserialized; missing values take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Store limits and TTLs.
    pub store: StoreConfig,
    /// Acquisition behaviour.
    pub acquirer: AcquirerConfig,
    /// Pagination.
    pub view: ViewConfig,
    /// Windowed rendering.
    pub window: WindowConfig,
}

impl SessionConfig {
    /// Parse a TOML document.
    ///
    /// # Errors
    /// Returns [`DataError::Config`] if the document is not valid TOML or has fields of the
    /// wrong type.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| DataError::Config(e.to_string()))
    }

    /// Set the store configuration.
    #[must_use]
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    /// Set the acquirer configuration.
    #[must_use]
    pub const fn with_acquirer(mut self, acquirer: AcquirerConfig) -> Self {
        self.acquirer = acquirer;
        self
    }

    /// Set the view configuration.
    #[must_use]
    pub const fn with_view(mut self, view: ViewConfig) -> Self {
        self.view = view;
        self
    }

    /// Set the window configuration.
    #[must_use]
    pub const fn with_window(mut self, window: WindowConfig) -> Self {
        self.window = window;
        self
    }
}

/// One user's dashboard: a store, an acquirer filling it, and the view showing the current
/// selection.
///
/// A failed load leaves the view as it was.
pub struct DashboardSession {
    store: Arc<SalesStore>,
    acquirer: LazyAcquirer,
    view: DatasetView,
    snapshots: Arc<dyn SnapshotStore>,
    config: SessionConfig,
    selection: Vec<AcquisitionUnit>,
    cleanup: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for DashboardSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardSession")
            .field("acquirer", &self.acquirer)
            .field("view", &self.view)
            .field("config", &self.config)
            .field("selection", &self.selection)
            .field("cleanup", &self.cleanup.is_some())
            .finish_non_exhaustive()
    }
}

impl DashboardSession {
    /// Create a session using the system clock.
    #[must_use]
    pub fn new(
        source: Arc<dyn RetrievalSource>,
        snapshots: Arc<dyn SnapshotStore>,
        config: SessionConfig,
    ) -> Self {
        Self::with_clock(source, snapshots, config, Arc::new(SystemClock))
    }

    /// Create a session whose store is driven by `clock`.
    #[must_use]
    pub fn with_clock(
        source: Arc<dyn RetrievalSource>,
        snapshots: Arc<dyn SnapshotStore>,
        config: SessionConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = Arc::new(SalesStore::with_clock(config.store.clone(), clock));
        let acquirer = LazyAcquirer::new(source, Arc::clone(&store), config.acquirer);
        let view = DatasetView::new(config.view);
        Self {
            store,
            acquirer,
            view,
            snapshots,
            config,
            selection: Vec::new(),
            cleanup: None,
        }
    }

    /// Starts periodic store cleanup if the store config enables it.
    ///
    /// Must be called from within a tokio runtime. Returns true if a task was started.
    pub fn start_cleanup(&mut self) -> bool {
        if !self.config.store.auto_cleanup || self.cleanup.is_some() {
            return false;
        }
        let interval = self.config.store.cleanup_interval();
        self.cleanup = Some(SalesStore::spawn_cleanup(&self.store, interval));
        debug!(?interval, "Background cleanup started");
        true
    }

    /// Loads one unit into the view.
    ///
    /// # Errors
    /// Propagates the acquisition error; the view keeps its previous contents.
    #[instrument(skip(self), fields(unit = %unit))]
    pub async fn load(&mut self, unit: AcquisitionUnit) -> Result<PaginationInfo> {
        let dataset = self.acquirer.acquire(unit).await;
        self.show(dataset, vec![unit])
    }

    /// Loads several years into the view, concatenated in argument order.
    ///
    /// # Errors
    /// Propagates the first acquisition error; the view keeps its previous contents.
    #[instrument(skip(self))]
    pub async fn load_years(&mut self, years: &[i32]) -> Result<PaginationInfo> {
        let dataset = self.acquirer.acquire_years(years).await;
        let units = years.iter().copied().map(AcquisitionUnit::year).collect();
        self.show(dataset, units)
    }

    fn show(
        &mut self,
        dataset: Result<Dataset>,
        units: Vec<AcquisitionUnit>,
    ) -> Result<PaginationInfo> {
        match dataset {
            Ok(dataset) => {
                info!(records = dataset.len(), "Selection loaded");
                self.view.set_data(dataset.records);
                self.selection = units;
                Ok(self.view.pagination_info())
            }
            Err(e) => {
                warn!(error = %e, "Load failed, keeping previous data");
                Err(e)
            }
        }
    }

    /// The summary metadata document.
    ///
    /// # Errors
    /// Propagates retrieval and decode failures.
    pub async fn metadata(&self) -> Result<Value> {
        self.acquirer.metadata().await
    }

    /// Warms the cache for `unit` in the background.
    pub fn preload(&self, unit: AcquisitionUnit) -> JoinHandle<()> {
        self.acquirer.preload(unit)
    }

    /// Saves the store to the snapshot backend.
    ///
    /// A full backend is logged and reported as zero entries written.
    ///
    /// # Errors
    /// Propagates every other backend error.
    pub async fn persist(&self) -> Result<usize> {
        match self.store.persist(self.snapshots.as_ref(), SNAPSHOT_NAME).await {
            Err(DataError::QuotaExceeded { required, limit }) => {
                warn!(required, limit, "Snapshot quota exceeded, continuing in memory only");
                Ok(0)
            }
            other => other,
        }
    }

    /// Loads the store from the snapshot backend.
    ///
    /// # Errors
    /// Propagates backend read errors.
    pub async fn restore(&self) -> Result<usize> {
        self.store
            .restore(self.snapshots.as_ref(), SNAPSHOT_NAME)
            .await
    }

    /// Forgets all cached and displayed data, including the persisted snapshot.
    ///
    /// # Errors
    /// Propagates the backend error from removing the snapshot.
    #[instrument(skip(self))]
    pub async fn logout(&mut self) -> Result<()> {
        self.acquirer.clear();
        self.store.clear();
        self.view.set_data(Vec::<sales_core::Record>::new());
        self.selection.clear();
        self.snapshots.remove(SNAPSHOT_NAME).await?;
        info!("Session cleared");
        Ok(())
    }

    /// A renderer over the current filtered records, configured from the session.
    ///
    /// The renderer holds a snapshot; build a new one after the view changes.
    pub fn window_renderer<E, F>(
        &self,
        viewport_extent: f64,
        render: F,
    ) -> WindowRenderer<SequenceFactory<FilteredRecords, F, E>>
    where
        F: FnMut(&sales_core::Record, usize) -> E,
    {
        let records = self.view.snapshot();
        let len = sales_view::IndexedSequence::len(&records);
        WindowRenderer::new(
            SequenceFactory::new(records, render),
            len,
            viewport_extent,
            self.config.window,
        )
    }

    /// The view over the current selection.
    #[must_use]
    pub const fn view(&self) -> &DatasetView {
        &self.view
    }

    /// Mutable access to the view for filtering, sorting, and paging.
    pub const fn view_mut(&mut self) -> &mut DatasetView {
        &mut self.view
    }

    /// The session's acquirer.
    #[must_use]
    pub const fn acquirer(&self) -> &LazyAcquirer {
        &self.acquirer
    }

    /// The session's store.
    #[must_use]
    pub const fn store(&self) -> &Arc<SalesStore> {
        &self.store
    }

    /// The session's configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Units currently shown in the view.
    #[must_use]
    pub fn selection(&self) -> &[AcquisitionUnit] {
        &self.selection
    }
}

impl Drop for DashboardSession {
    fn drop(&mut self) {
        if let Some(handle) = self.cleanup.take() {
            handle.abort();
        }
    }
}
