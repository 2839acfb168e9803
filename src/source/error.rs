//! Error types for source adapter operations.
//!
//! Messages follow the What/Why/Fix pattern used across the project.

use thiserror::Error;

/// Errors a source adapter can report for one work item.
#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("{source_name} request failed for '{query}': {reason}")]
    Request {
        source_name: String,
        query: String,
        reason: String,
    },

    /// The service answered with a non-success status.
    #[error("Failed to fetch from {source_name} (HTTP {status}) for '{query}'\n  Suggestion: {suggestion}")]
    HttpStatus {
        source_name: String,
        query: String,
        status: u16,
        suggestion: String,
    },

    /// The response body did not match the expected shape.
    #[error("{source_name} returned an unreadable response for '{query}': {reason}")]
    Parse {
        source_name: String,
        query: String,
        reason: String,
    },

    /// The generation model returned no image at all.
    #[error(
        "The image generation model failed to create images for '{query}'.\n  Suggestion: Please try a different search term."
    )]
    NoImages { query: String },

    /// The adapter could not be constructed.
    #[error("{source_name} is not available: {reason}\n  Suggestion: {suggestion}")]
    Configuration {
        source_name: String,
        reason: String,
        suggestion: String,
    },
}

impl AdapterError {
    /// Creates a `Request` error from a transport failure.
    #[must_use]
    pub fn request(source_name: &str, query: &str, error: &reqwest::Error) -> Self {
        let reason = if error.is_timeout() {
            "request timed out".to_string()
        } else {
            error.to_string()
        };
        Self::Request {
            source_name: source_name.to_string(),
            query: query.to_string(),
            reason,
        }
    }

    /// Creates an `HttpStatus` error with a status-specific suggestion.
    #[must_use]
    pub fn http_status(source_name: &str, query: &str, status: u16) -> Self {
        let suggestion = match status {
            400 | 401 | 403 => "Check that the API key for this source is valid",
            429 => "The service is rate limiting requests; wait a moment and retry",
            500..=599 => "The service is having problems; retry later",
            _ => "Check the query and try again",
        };
        Self::HttpStatus {
            source_name: source_name.to_string(),
            query: query.to_string(),
            status,
            suggestion: suggestion.to_string(),
        }
    }

    /// Creates a `Parse` error.
    #[must_use]
    pub fn parse(source_name: &str, query: &str, reason: impl std::fmt::Display) -> Self {
        Self::Parse {
            source_name: source_name.to_string(),
            query: query.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates a `NoImages` error.
    #[must_use]
    pub fn no_images(query: &str) -> Self {
        Self::NoImages {
            query: query.to_string(),
        }
    }

    /// Creates a `Configuration` error.
    #[must_use]
    pub fn configuration(source_name: &str, reason: &str, suggestion: &str) -> Self {
        Self::Configuration {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
            suggestion: suggestion.to_string(),
        }
    }
}
