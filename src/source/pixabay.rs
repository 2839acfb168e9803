//! Pixabay stock-photo search adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::http::{HttpTimeouts, build_http_client};
use crate::image::ImageCandidate;

use super::{AdapterError, ImageSource, underscore_whitespace};

/// Default Pixabay API base URL.
const DEFAULT_BASE_URL: &str = "https://pixabay.com";

const SOURCE_NAME: &str = "Pixabay";

/// Smallest and largest `per_page` the API accepts.
const MIN_PER_PAGE: u32 = 3;
const MAX_PER_PAGE: u32 = 200;

#[derive(Debug, Deserialize)]
struct PixabayResponse {
    #[serde(default)]
    hits: Vec<PixabayHit>,
}

#[derive(Debug, Deserialize)]
struct PixabayHit {
    id: u64,
    #[serde(rename = "largeImageURL")]
    large_image_url: String,
    #[serde(rename = "webformatURL")]
    webformat_url: String,
    #[serde(rename = "imageWidth")]
    image_width: u32,
    #[serde(rename = "imageHeight")]
    image_height: u32,
}

/// Searches Pixabay for photos matching a keyword.
#[derive(Debug, Clone)]
pub struct PixabaySource {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PixabaySource {
    /// Creates an adapter against the public Pixabay API.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the key is empty or the
    /// HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>, timeouts: HttpTimeouts) -> Result<Self, AdapterError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL, timeouts)
    }

    /// Creates an adapter with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the key is empty or the
    /// HTTP client cannot be built.
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeouts: HttpTimeouts,
    ) -> Result<Self, AdapterError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AdapterError::configuration(
                SOURCE_NAME,
                "API key is empty",
                "Set PIXABAY_API_KEY or `pixabay_api_key` in the config file",
            ));
        }
        let client = build_http_client(SOURCE_NAME, timeouts).map_err(|e| {
            AdapterError::configuration(SOURCE_NAME, &e.to_string(), "Check TLS/proxy settings")
        })?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn search_url(&self, query: &str, count: u32) -> String {
        let per_page = count.clamp(MIN_PER_PAGE, MAX_PER_PAGE);
        format!(
            "{}/api/?key={}&q={}&image_type=photo&per_page={per_page}&safesearch=true",
            self.base_url,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(query),
        )
    }
}

#[async_trait]
impl ImageSource for PixabaySource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    #[instrument(skip(self), fields(source = SOURCE_NAME))]
    async fn fetch(&self, query: &str, count: u32) -> Result<Vec<ImageCandidate>, AdapterError> {
        let response = self
            .client
            .get(self.search_url(query, count))
            .send()
            .await
            .map_err(|e| AdapterError::request(SOURCE_NAME, query, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::http_status(SOURCE_NAME, query, status.as_u16()));
        }

        let body: PixabayResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::parse(SOURCE_NAME, query, e))?;
        debug!(hits = body.hits.len(), "Pixabay search returned");

        let prefix = underscore_whitespace(query);
        let limit = usize::try_from(count).unwrap_or(usize::MAX);
        Ok(body
            .hits
            .into_iter()
            .take(limit)
            .map(|hit| ImageCandidate {
                name: format!("{prefix}_{}.jpg", hit.id),
                url: hit.large_image_url,
                thumb_url: hit.webformat_url,
                width: hit.image_width,
                height: hit.image_height,
            })
            .collect())
    }
}
