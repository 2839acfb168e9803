//! Fetching an image's full-resolution bytes.
//!
//! HTTP(S) payloads are streamed with a size cap; generated images arrive
//! as base64 `data:` URLs and are decoded locally.

use async_trait::async_trait;
use base64::Engine;
use futures_util::StreamExt;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use crate::http::{HttpTimeouts, build_http_client};

use super::DownloadError;

/// Default payload size limit (64 MiB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: u64 = 64 * 1024 * 1024;

/// Fetches the bytes behind an image location.
#[async_trait]
pub trait PayloadFetcher: Send + Sync {
    /// # Errors
    ///
    /// Returns [`DownloadError`] when the payload cannot be obtained.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, DownloadError>;
}

/// Decodes a base64 `data:` URL into its bytes.
///
/// # Errors
///
/// Returns [`DownloadError::InvalidDataUrl`] for non-base64 or malformed
/// data URLs.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, DownloadError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| DownloadError::invalid_data_url("missing data: scheme"))?;
    let (meta, data) = rest
        .split_once(',')
        .ok_or_else(|| DownloadError::invalid_data_url("missing ',' separator"))?;
    if !meta.ends_with(";base64") {
        return Err(DownloadError::invalid_data_url("only base64 data URLs are supported"));
    }
    base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .map_err(|e| DownloadError::invalid_data_url(e.to_string()))
}

/// HTTP payload fetcher used by the exporter and single-image saves.
#[derive(Debug, Clone)]
pub struct HttpPayloadFetcher {
    client: Client,
    max_bytes: u64,
}

impl HttpPayloadFetcher {
    /// Creates a fetcher with the given timeouts and the default size cap.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`reqwest::Error`] if the client cannot be built.
    pub fn new(timeouts: HttpTimeouts) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client("payload", timeouts)?,
            max_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        })
    }

    /// Overrides the payload size cap.
    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

#[async_trait]
impl PayloadFetcher for HttpPayloadFetcher {
    #[instrument(skip(self, url), fields(scheme = tracing::field::Empty))]
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        if url.starts_with("data:") {
            tracing::Span::current().record("scheme", "data");
            return decode_data_url(url);
        }

        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DownloadError::invalid_url(url));
        }
        tracing::Span::current().record("scheme", parsed.scheme());

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }
        if response
            .content_length()
            .is_some_and(|len| len > self.max_bytes)
        {
            return Err(DownloadError::too_large(url, self.max_bytes));
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DownloadError::network(url, e))?;
            if (bytes.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(DownloadError::too_large(url, self.max_bytes));
            }
            bytes.extend_from_slice(&chunk);
        }
        debug!(bytes = bytes.len(), "payload fetched");
        Ok(bytes)
    }
}
