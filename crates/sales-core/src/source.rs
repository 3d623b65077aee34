//! Retrieval collaborator trait.
//!
//! This module defines:
//!
//! - [`RetrievalSource`] - Fetches the compressed payload for an acquisition unit
//! - [`InstrumentedSource`] - Wrapper that records request metrics for any source

use async_trait::async_trait;
use std::fmt::{Debug, Display};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

use crate::{
    error::{DataError, Result},
    unit::AcquisitionUnit,
    version::VersionTag,
};

/// Outcome of a successful round trip to a source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Retrieved {
    /// The raw (still compressed) payload bytes.
    Payload(Vec<u8>),
    /// The source has nothing at this address.
    NotFound,
}

/// Source of compressed payloads.
///
/// Network and storage faults are reported as [`DataError::RetrievalFailure`]; a missing
/// address is the ordinary [`Retrieved::NotFound`] outcome. Sources never retry.
#[async_trait]
pub trait RetrievalSource: Send + Sync + Debug {
    /// Returns the name of this source (e.g. "http").
    fn name(&self) -> &str;

    /// Retrieves the payload for `unit`, tagged with the cache `version`.
    async fn retrieve(&self, unit: AcquisitionUnit, version: &VersionTag) -> Result<Retrieved>;

    /// Retrieves the summary metadata document, tagged with the hourly cache `version`.
    ///
    /// Default implementation reports that the source has no metadata.
    async fn retrieve_metadata(&self, _version: &VersionTag) -> Result<Retrieved> {
        Err(DataError::NotSupported(format!(
            "{} does not serve metadata",
            self.name()
        )))
    }
}

/// Point-in-time copy of an [`InstrumentedSource`]'s counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourceMetrics {
    /// Calls made to the wrapped source.
    pub requests: u64,
    /// Calls answered with [`Retrieved::NotFound`].
    pub not_found: u64,
    /// Calls that returned an error.
    pub failures: u64,
    /// Payload bytes received.
    pub bytes_received: u64,
}

/// A source wrapper that counts every request it forwards.
#[derive(Debug, Default)]
pub struct InstrumentedSource<S> {
    inner: S,
    requests: AtomicU64,
    not_found: AtomicU64,
    failures: AtomicU64,
    bytes_received: AtomicU64,
}

impl<S: RetrievalSource> InstrumentedSource<S> {
    /// Wraps `inner`.
    #[must_use]
    pub const fn new(inner: S) -> Self {
        Self {
            inner,
            requests: AtomicU64::new(0),
            not_found: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
        }
    }

    /// Returns the wrapped source.
    #[must_use]
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    /// Returns the number of requests forwarded so far.
    #[must_use]
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all counters.
    #[must_use]
    pub fn metrics(&self) -> SourceMetrics {
        SourceMetrics {
            requests: self.requests.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
        }
    }

    fn record(&self, subject: &dyn Display, outcome: &Result<Retrieved>) {
        let requests = self.requests.fetch_add(1, Ordering::Relaxed) + 1;
        match outcome {
            Ok(Retrieved::Payload(bytes)) => {
                self.bytes_received
                    .fetch_add(bytes.len() as u64, Ordering::Relaxed);
                debug!(
                    source = self.inner.name(),
                    %subject,
                    bytes = bytes.len(),
                    requests,
                    "Payload received"
                );
            }
            Ok(Retrieved::NotFound) => {
                self.not_found.fetch_add(1, Ordering::Relaxed);
                debug!(source = self.inner.name(), %subject, requests, "Payload not found");
            }
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                warn!(source = self.inner.name(), %subject, error = %e, "Retrieval failed");
            }
        }
    }
}

#[async_trait]
impl<S: RetrievalSource> RetrievalSource for InstrumentedSource<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn retrieve(&self, unit: AcquisitionUnit, version: &VersionTag) -> Result<Retrieved> {
        let outcome = self.inner.retrieve(unit, version).await;
        self.record(&unit, &outcome);
        outcome
    }

    async fn retrieve_metadata(&self, version: &VersionTag) -> Result<Retrieved> {
        let outcome = self.inner.retrieve_metadata(version).await;
        self.record(&"metadata", &outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FixedSource;

    #[async_trait]
    impl RetrievalSource for FixedSource {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn retrieve(
            &self,
            unit: AcquisitionUnit,
            _version: &VersionTag,
        ) -> Result<Retrieved> {
            match unit {
                AcquisitionUnit::Year(2024) => Ok(Retrieved::Payload(vec![0; 16])),
                AcquisitionUnit::Year(_) => Ok(Retrieved::NotFound),
                AcquisitionUnit::Month(..) => {
                    Err(DataError::RetrievalFailure("offline".to_string()))
                }
            }
        }
    }

    #[tokio::test]
    async fn test_instrumented_source_counts() {
        let source = InstrumentedSource::new(FixedSource);
        let version = VersionTag::new("20250101");

        source.retrieve(AcquisitionUnit::Year(2024), &version).await.unwrap();
        source.retrieve(AcquisitionUnit::Year(2023), &version).await.unwrap();
        source
            .retrieve(AcquisitionUnit::Month(2024, 1), &version)
            .await
            .unwrap_err();
        let metadata = source.retrieve_metadata(&version).await;
        assert!(matches!(metadata, Err(DataError::NotSupported(_))));

        let metrics = source.metrics();
        assert_eq!(metrics.requests, 4);
        assert_eq!(metrics.not_found, 1);
        assert_eq!(metrics.failures, 2);
        assert_eq!(metrics.bytes_received, 16);
        assert_eq!(source.name(), "fixed");
    }
}
