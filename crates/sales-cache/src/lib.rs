#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Caching implementations for the sales data pipeline.
//!
//! This crate provides the [`VersionedStore`] and implementations of the [`SnapshotStore`]
//! trait from `sales-core`:
//!
//! - [`SqliteSnapshotStore`] - Persistent SQLite-based snapshots (default, requires `sqlite` feature)
//! - [`InMemorySnapshotStore`] - Simple in-memory snapshots for testing
//! - [`NoopSnapshotStore`] - Snapshot store that doesn't store anything

/// Store configuration.
pub mod config;
/// In-memory snapshot store implementation.
pub mod memory;
/// No-op snapshot store implementation.
pub mod noop;
/// Versioned TTL/LRU store.
pub mod store;

/// SQLite-based snapshot store implementation.
#[cfg(feature = "sqlite")]
pub mod sqlite;

// Re-export the trait for convenience
pub use sales_core::SnapshotStore;

pub use config::StoreConfig;
pub use memory::InMemorySnapshotStore;
pub use noop::NoopSnapshotStore;
pub use store::{CleanupReport, ItemAge, StoreSnapshot, StoreStats, VersionedStore, format_size};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSnapshotStore;
