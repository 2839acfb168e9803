//! Shared HTTP client construction policy.
//!
//! Source adapters and the payload fetcher build their clients here so
//! timeouts, compression, and User-Agent stay consistent.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};
use tracing::debug;

use crate::user_agent;

/// Default connect timeout in seconds.
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default read timeout in seconds.
/// Image generation requests can take a while, so this is generous.
pub const READ_TIMEOUT_SECS: u64 = 120;

/// Connect/read timeouts applied to every client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
        }
    }
}

impl HttpTimeouts {
    /// Creates explicit timeouts.
    #[must_use]
    pub fn new(connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        Self {
            connect_timeout_secs,
            read_timeout_secs,
        }
    }
}

/// Builds an HTTP client using the shared project policy.
///
/// `purpose` is only used for tracing.
///
/// # Errors
///
/// Returns the underlying [`reqwest::Error`] when the TLS backend or
/// system configuration prevents client construction.
pub fn build_http_client(purpose: &str, timeouts: HttpTimeouts) -> Result<Client, reqwest::Error> {
    debug!(
        purpose,
        connect_timeout_secs = timeouts.connect_timeout_secs,
        read_timeout_secs = timeouts.read_timeout_secs,
        "building HTTP client"
    );
    ClientBuilder::new()
        .connect_timeout(Duration::from_secs(timeouts.connect_timeout_secs))
        .read_timeout(Duration::from_secs(timeouts.read_timeout_secs))
        .gzip(true)
        .user_agent(user_agent::default_user_agent())
        .build()
}
