#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! HTTP retrieval source.
//!
//! # Example
//!
//! ```no_run
//! use sales_core::{AcquisitionUnit, RetrievalSource, VersionTag};
//! use sales_http::HttpSource;
//!
//! # async fn example() -> sales_core::Result<()> {
//! let source = HttpSource::new("https://reports.example.com")?;
//! let retrieved = source
//!     .retrieve(AcquisitionUnit::year(2024), &VersionTag::new("20240315"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use sales_core::{AcquisitionUnit, DataError, Result, RetrievalSource, Retrieved, VersionTag};
use tracing::{debug, instrument};

/// Request timeout applied by [`HttpSource::new`].
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent for HTTP requests.
const USER_AGENT: &str = concat!("sales-http/", env!("CARGO_PKG_VERSION"));

/// Retrieval source backed by a static HTTP host.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    /// Create a source rooted at `base_url` with a default client.
    ///
    /// # Errors
    /// Returns [`DataError::Config`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| DataError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a source rooted at `base_url` that sends requests through `client`.
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// The base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the payload URL for a unit.
    #[must_use]
    pub fn unit_url(&self, unit: AcquisitionUnit, version: &VersionTag) -> String {
        match unit {
            AcquisitionUnit::Year(year) => {
                format!("{}/data-{year}.json.gz?v={version}", self.base_url)
            }
            AcquisitionUnit::Month(year, month) => {
                format!("{}/data/{year}/{month:02}.json.gz?v={version}", self.base_url)
            }
        }
    }

    /// Build the metadata document URL for an hourly version.
    #[must_use]
    pub fn metadata_url(&self, version: &VersionTag) -> String {
        format!("{}/data-metadata.json?v={version}", self.base_url)
    }

    async fn fetch(&self, url: &str) -> Result<Retrieved> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DataError::RetrievalFailure(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!(status = status.as_u16(), "Payload not found");
            return Ok(Retrieved::NotFound);
        }

        if !status.is_success() {
            return Err(DataError::RetrievalFailure(format!("HTTP {status} for {url}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DataError::RetrievalFailure(e.to_string()))?;
        debug!(bytes = bytes.len(), "Payload received");
        Ok(Retrieved::Payload(bytes.to_vec()))
    }
}

#[async_trait]
impl RetrievalSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self), fields(unit = %unit, version = %version))]
    async fn retrieve(&self, unit: AcquisitionUnit, version: &VersionTag) -> Result<Retrieved> {
        let url = self.unit_url(unit, version);
        debug!("Fetching payload: {}", url);
        self.fetch(&url).await
    }

    #[instrument(skip(self))]
    async fn retrieve_metadata(&self, version: &VersionTag) -> Result<Retrieved> {
        let url = self.metadata_url(version);
        debug!("Fetching metadata: {}", url);
        self.fetch(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_unit_urls() {
        let source = HttpSource::new("https://reports.example.com/").unwrap();
        let version = VersionTag::new("20240315");

        assert_eq!(source.base_url(), "https://reports.example.com");
        assert_eq!(
            source.unit_url(AcquisitionUnit::year(2024), &version),
            "https://reports.example.com/data-2024.json.gz?v=20240315"
        );
        assert_eq!(
            source.unit_url(AcquisitionUnit::month(2024, 3).unwrap(), &version),
            "https://reports.example.com/data/2024/03.json.gz?v=20240315"
        );
        assert_eq!(
            source.metadata_url(&VersionTag::new("2024031509")),
            "https://reports.example.com/data-metadata.json?v=2024031509"
        );
    }

    #[test]
    fn test_source_name() {
        let source = HttpSource::new("http://localhost").unwrap();
        assert_eq!(source.name(), "http");
    }

    /// Serves one canned response per accepted connection, chosen by request path.
    async fn serve(listener: TcpListener, connections: usize) {
        for _ in 0..connections {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();

            let response = if path.starts_with("/data-2024.json.gz")
                || path == "/data-metadata.json?v=2024031509"
            {
                "HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello".to_string()
            } else if path.starts_with("/data-2025.json.gz") {
                "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                    .to_string()
            } else {
                "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                    .to_string()
            };
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve(listener, 4));

        let source = HttpSource::new(format!("http://{addr}")).unwrap();
        let version = VersionTag::new("20240315");

        let found = source
            .retrieve(AcquisitionUnit::year(2024), &version)
            .await
            .unwrap();
        assert_eq!(found, Retrieved::Payload(b"hello".to_vec()));

        let failed = source
            .retrieve(AcquisitionUnit::year(2025), &version)
            .await
            .unwrap_err();
        assert!(matches!(failed, DataError::RetrievalFailure(_)));

        let missing = source
            .retrieve(AcquisitionUnit::month(2024, 7).unwrap(), &version)
            .await
            .unwrap();
        assert_eq!(missing, Retrieved::NotFound);

        let metadata = source
            .retrieve_metadata(&VersionTag::new("2024031509"))
            .await
            .unwrap();
        assert_eq!(metadata, Retrieved::Payload(b"hello".to_vec()));

        server.await.unwrap();
    }
}
