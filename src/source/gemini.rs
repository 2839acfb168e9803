//! Minimal REST client for the Gemini API (Imagen image generation and
//! text generation with a JSON response schema).

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::http::{HttpTimeouts, build_http_client};

use super::AdapterError;

/// Default Gemini API base URL.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Image generation model.
pub const IMAGE_MODEL: &str = "imagen-4.0-generate-001";

/// Text model used for link collection.
pub const TEXT_MODEL: &str = "gemini-2.5-flash";

const API_KEY_HEADER: &str = "x-goog-api-key";

const SOURCE_NAME: &str = "Gemini";

/// One image returned by the generation model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub mime_type: String,
    /// Base64-encoded image bytes.
    pub base64: String,
}

impl GeneratedImage {
    /// Renders the image as a `data:` URL.
    #[must_use]
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictRequest<'a> {
    instances: [PredictInstance<'a>; 1],
    parameters: PredictParameters<'a>,
}

#[derive(Debug, Serialize)]
struct PredictInstance<'a> {
    prompt: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters<'a> {
    sample_count: u32,
    aspect_ratio: &'a str,
    output_options: OutputOptions<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutputOptions<'a> {
    mime_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ContentCandidate>,
}

#[derive(Debug, Deserialize)]
struct ContentCandidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Thin client over the two Gemini endpoints the sources need.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    /// Creates a client against the public Gemini API.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the key is empty or the
    /// HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>, timeouts: HttpTimeouts) -> Result<Self, AdapterError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL, timeouts)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
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
                "Set GEMINI_API_KEY or `gemini_api_key` in the config file",
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

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/v1beta/models/{model}:{method}", self.base_url)
    }

    async fn post_json(
        &self,
        url: &str,
        body: &impl Serialize,
        query: &str,
    ) -> Result<reqwest::Response, AdapterError> {
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AdapterError::request(SOURCE_NAME, query, &e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::http_status(SOURCE_NAME, query, status.as_u16()));
        }
        Ok(response)
    }

    /// Generates up to `count` images for `prompt`.
    ///
    /// Predictions without image bytes (for example, safety-filtered ones)
    /// are dropped, so the result may be shorter than `count`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] on transport, status, or parse failures.
    #[instrument(skip(self, prompt), fields(model = IMAGE_MODEL))]
    pub async fn generate_images(
        &self,
        prompt: &str,
        count: u32,
        mime_type: &str,
        aspect_ratio: &str,
    ) -> Result<Vec<GeneratedImage>, AdapterError> {
        let request = PredictRequest {
            instances: [PredictInstance { prompt }],
            parameters: PredictParameters {
                sample_count: count,
                aspect_ratio,
                output_options: OutputOptions { mime_type },
            },
        };
        let response = self
            .post_json(&self.model_url(IMAGE_MODEL, "predict"), &request, prompt)
            .await?;
        let body: PredictResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::parse(SOURCE_NAME, prompt, e))?;
        debug!(predictions = body.predictions.len(), "image generation returned");

        Ok(body
            .predictions
            .into_iter()
            .filter_map(|p| {
                let base64 = p.bytes_base64_encoded.filter(|b| !b.is_empty())?;
                Some(GeneratedImage {
                    mime_type: p.mime_type.unwrap_or_else(|| mime_type.to_string()),
                    base64,
                })
            })
            .collect())
    }

    /// Generates text constrained to `response_schema` (JSON mode).
    ///
    /// Returns the concatenated text parts of the first candidate, or an
    /// empty string if the model returned none.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] on transport, status, or parse failures.
    #[instrument(skip(self, prompt, response_schema), fields(model = TEXT_MODEL))]
    pub async fn generate_json_text(
        &self,
        prompt: &str,
        response_schema: Value,
    ) -> Result<String, AdapterError> {
        let request = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": response_schema,
            }
        });
        let response = self
            .post_json(&self.model_url(TEXT_MODEL, "generateContent"), &request, prompt)
            .await?;
        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::parse(SOURCE_NAME, prompt, e))?;

        Ok(body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default())
    }
}
