//! Error types for payload fetches and archive export.

use std::path::PathBuf;

use thiserror::Error;

/// Errors fetching or saving one image payload.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout { url: String },

    /// HTTP error response.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus { url: String, status: u16 },

    /// The payload exceeded the configured size limit.
    #[error("payload from {url} exceeds {limit_bytes} bytes")]
    TooLarge { url: String, limit_bytes: u64 },

    /// The URL is neither HTTP(S) nor a base64 `data:` URL.
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// A `data:` URL could not be decoded.
    #[error("invalid data URL: {reason}")]
    InvalidDataUrl { reason: String },

    /// The requested image is not part of the current results.
    #[error("no image with id '{id}' in the current results")]
    UnknownImage { id: String },

    /// File system error writing a saved image.
    #[error("IO error writing to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    /// Creates a network error, classifying timeouts separately.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            return Self::Timeout { url };
        }
        Self::Network { url, source }
    }

    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    pub fn too_large(url: impl Into<String>, limit_bytes: u64) -> Self {
        Self::TooLarge {
            url: url.into(),
            limit_bytes,
        }
    }

    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    pub fn invalid_data_url(reason: impl Into<String>) -> Self {
        Self::InvalidDataUrl {
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors that end one archive export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Every payload fetch failed, so there is nothing to deliver.
    #[error("No images could be downloaded for the ZIP file.")]
    NothingPacked,

    /// Writing the in-memory archive failed.
    #[error("failed to assemble archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Delivering the finished archive failed.
    #[error("failed to save archive to {path}: {source}")]
    Delivery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
