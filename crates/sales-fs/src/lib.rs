#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Local directory retrieval source.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sales_core::{AcquisitionUnit, DataError, Result, RetrievalSource, Retrieved, VersionTag};
use tracing::{debug, instrument};

/// Retrieval source that reads payload files from a directory tree.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// Create a source rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the payload file for a unit.
    #[must_use]
    pub fn unit_path(&self, unit: AcquisitionUnit) -> PathBuf {
        match unit {
            AcquisitionUnit::Year(year) => self.root.join(format!("data-{year}.json.gz")),
            AcquisitionUnit::Month(year, month) => self
                .root
                .join("data")
                .join(year.to_string())
                .join(format!("{month:02}.json.gz")),
        }
    }

    /// Path of the metadata document.
    #[must_use]
    pub fn metadata_path(&self) -> PathBuf {
        self.root.join("data-metadata.json")
    }

    async fn read(path: &Path) -> Result<Retrieved> {
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                debug!(bytes = bytes.len(), "Payload read");
                Ok(Retrieved::Payload(bytes))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Payload file missing");
                Ok(Retrieved::NotFound)
            }
            Err(e) => Err(DataError::RetrievalFailure(format!(
                "failed to read {}: {e}",
                path.display()
            ))),
        }
    }
}

#[async_trait]
impl RetrievalSource for DirectorySource {
    fn name(&self) -> &str {
        "directory"
    }

    #[instrument(skip(self, _version), fields(unit = %unit))]
    async fn retrieve(&self, unit: AcquisitionUnit, _version: &VersionTag) -> Result<Retrieved> {
        Self::read(&self.unit_path(unit)).await
    }

    #[instrument(skip(self, _version))]
    async fn retrieve_metadata(&self, _version: &VersionTag) -> Result<Retrieved> {
        Self::read(&self.metadata_path()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version() -> VersionTag {
        VersionTag::new("20240315")
    }

    #[test]
    fn test_unit_paths() {
        let source = DirectorySource::new("/srv/sales");
        assert_eq!(
            source.unit_path(AcquisitionUnit::year(2024)),
            PathBuf::from("/srv/sales/data-2024.json.gz")
        );
        assert_eq!(
            source.unit_path(AcquisitionUnit::month(2024, 3).unwrap()),
            PathBuf::from("/srv/sales/data/2024/03.json.gz")
        );
        assert_eq!(
            source.metadata_path(),
            PathBuf::from("/srv/sales/data-metadata.json")
        );
    }

    #[tokio::test]
    async fn test_retrieve_existing_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data-2024.json.gz"), b"payload").unwrap();
        std::fs::create_dir_all(dir.path().join("data/2024")).unwrap();
        std::fs::write(dir.path().join("data/2024/02.json.gz"), b"feb").unwrap();

        let source = DirectorySource::new(dir.path());

        assert_eq!(
            source
                .retrieve(AcquisitionUnit::year(2024), &version())
                .await
                .unwrap(),
            Retrieved::Payload(b"payload".to_vec())
        );
        assert_eq!(
            source
                .retrieve(AcquisitionUnit::month(2024, 2).unwrap(), &version())
                .await
                .unwrap(),
            Retrieved::Payload(b"feb".to_vec())
        );
        assert_eq!(
            source
                .retrieve(AcquisitionUnit::month(2024, 3).unwrap(), &version())
                .await
                .unwrap(),
            Retrieved::NotFound
        );
        assert_eq!(source.retrieve_metadata(&version()).await.unwrap(), Retrieved::NotFound);
    }

    #[tokio::test]
    async fn test_unreadable_path_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where a file is expected cannot be read as one.
        std::fs::create_dir_all(dir.path().join("data-2024.json.gz")).unwrap();

        let source = DirectorySource::new(dir.path());
        let err = source
            .retrieve(AcquisitionUnit::year(2024), &version())
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::RetrievalFailure(_)));
    }
}
