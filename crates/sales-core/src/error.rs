//! Error types for data operations.
//!
//! This module defines [`DataError`] which covers every failure that can occur while
//! retrieving, decoding, caching, or persisting sales data.

use thiserror::Error;

use crate::unit::AcquisitionUnit;

/// Errors that can occur during data operations.
///
/// The type is `Clone` so that a single failed retrieval can be handed to every caller
/// that was waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    /// The source has no payload for the requested unit.
    ///
    /// This is an expected outcome: it triggers the month-to-year fallback or an empty result.
    #[error("No data available for {0}")]
    RetrievalNotFound(AcquisitionUnit),

    /// Network or storage fault while retrieving a payload.
    #[error("Retrieval failed: {0}")]
    RetrievalFailure(String),

    /// The payload could not be decompressed or parsed.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Writing a persistent snapshot would exceed the storage quota.
    #[error("Storage quota exceeded: {required} bytes required, limit is {limit} bytes")]
    QuotaExceeded {
        /// Bytes the write needed.
        required: usize,
        /// Bytes the backend allows.
        limit: usize,
    },

    /// Error interacting with a persistent storage backend.
    #[error("Storage error: {0}")]
    Storage(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Configuration could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The requested feature is not supported by this collaborator.
    #[error("Feature not supported: {0}")]
    NotSupported(String),
}

impl DataError {
    /// Returns true for the expected "nothing there" outcome.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::RetrievalNotFound(_))
    }
}

/// Result type alias using [`DataError`].
pub type Result<T> = std::result::Result<T, DataError>;
