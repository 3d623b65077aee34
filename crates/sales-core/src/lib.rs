#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for the sales analytics data pipeline.
//!
//! The pipeline runs network/storage → cache → paginator → virtual renderer. This crate holds
//! the vocabulary every stage shares:
//!
//! - [`RetrievalSource`](source::RetrievalSource) - Where compressed payloads come from
//! - [`SnapshotStore`](snapshot::SnapshotStore) - Where cache snapshots are persisted
//! - [`AcquisitionUnit`](unit::AcquisitionUnit) - Year/month retrieval granularity
//! - [`CacheKey`](version::CacheKey) - Version-partitioned cache keys

/// Clock abstraction used for TTLs and version stamps.
pub mod clock;
/// Error types for data operations.
pub mod error;
/// Compressed payload decoding.
pub mod payload;
/// Snapshot persistence trait.
pub mod snapshot;
/// Retrieval collaborator trait and instrumentation.
pub mod source;
/// Records and decoded datasets.
pub mod types;
/// Acquisition unit definitions.
pub mod unit;
/// Cache keys and version stamps.
pub mod version;

// Re-export commonly used items at crate root
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{DataError, Result};
pub use payload::{decode_document, decode_payload};
pub use snapshot::SnapshotStore;
pub use source::{InstrumentedSource, RetrievalSource, Retrieved, SourceMetrics};
pub use types::{Dataset, Record};
pub use unit::AcquisitionUnit;
pub use version::{CacheKey, VersionTag};
