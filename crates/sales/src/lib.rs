#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Progressive data acquisition for sales analytics dashboards.
//!
//! This crate re-exports the core types, store, view, and retrieval sources, and wires them
//! together through [`LazyAcquirer`] and [`DashboardSession`].
//!
//! # Features
//!
//! - `http` - [`HttpSource`] over `reqwest`
//! - `fs` - [`DirectorySource`] over a local directory
//! - `cache-sqlite` - [`SqliteSnapshotStore`] for persisting cache snapshots
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sales::{AcquisitionUnit, DashboardSession, HttpSource, SessionConfig, SqliteSnapshotStore};
//!
//! #[tokio::main]
//! async fn main() -> sales::Result<()> {
//!     let source = Arc::new(HttpSource::new("https://reports.example.com")?);
//!     let snapshots = Arc::new(SqliteSnapshotStore::new("cache.db")?);
//!     let mut session = DashboardSession::new(source, snapshots, SessionConfig::default());
//!
//!     session.restore().await?;
//!     let info = session.load(AcquisitionUnit::month(2024, 3)?).await?;
//!     println!("{} records on {} pages", info.total_items, info.total_pages);
//!
//!     session.view_mut().search("kadikoy", &["store"]);
//!     session.persist().await?;
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use sales_core::*;

// Store and snapshot backends
#[cfg(feature = "cache-sqlite")]
pub use sales_cache::SqliteSnapshotStore;
pub use sales_cache::{
    CleanupReport, InMemorySnapshotStore, NoopSnapshotStore, StoreConfig, StoreStats,
    VersionedStore, format_size,
};

// Views
pub use sales_view::{
    DatasetView, FilteredRecords, IndexedSequence, ItemFactory, PaginationInfo, RenderWindow,
    SequenceFactory, SortOrder, SubscriptionId, ViewConfig, ViewStats, WindowConfig,
    WindowRenderer,
};

// Sources
#[cfg(feature = "fs")]
pub use sales_fs::DirectorySource;
#[cfg(feature = "http")]
pub use sales_http::HttpSource;

/// Lazy, de-duplicated unit acquisition.
pub mod acquirer;
/// In-flight acquisition tracking.
pub mod pending;
/// Per-session wiring.
pub mod session;

pub use acquirer::{AcquirerConfig, AcquirerStats, CachedValue, LazyAcquirer, SalesStore, UnitState};
pub use pending::PendingAcquisitions;
pub use session::{DashboardSession, SNAPSHOT_NAME, SessionConfig};
