//! Keyword image generation ("Google" source) built on Imagen.

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::image::ImageCandidate;

use super::{AdapterError, GeminiClient, ImageSource, underscore_whitespace};

/// The generation endpoint returns at most this many images per request.
pub const MAX_IMAGES_PER_REQUEST: u32 = 4;

const OUTPUT_MIME: &str = "image/jpeg";
const ASPECT_RATIO: &str = "16:9";
const IMAGE_WIDTH: u32 = 1024;
const IMAGE_HEIGHT: u32 = 576;
const MAX_NAME_PREFIX_CHARS: usize = 50;

/// Generates photorealistic images for a keyword.
#[derive(Debug, Clone)]
pub struct GoogleImageSource {
    gemini: GeminiClient,
}

impl GoogleImageSource {
    #[must_use]
    pub fn new(gemini: GeminiClient) -> Self {
        Self { gemini }
    }
}

fn prompt_for(query: &str) -> String {
    format!(
        "A high-quality, photorealistic image of: {query}. Cinematic lighting, professional photograph."
    )
}

fn name_prefix(query: &str) -> String {
    underscore_whitespace(query)
        .chars()
        .take(MAX_NAME_PREFIX_CHARS)
        .collect()
}

#[async_trait]
impl ImageSource for GoogleImageSource {
    fn name(&self) -> &str {
        "Google"
    }

    #[instrument(skip(self))]
    async fn fetch(&self, query: &str, count: u32) -> Result<Vec<ImageCandidate>, AdapterError> {
        let prompt = prompt_for(query);
        let mut generated = Vec::new();
        let mut remaining = count;

        while remaining > 0 {
            let batch = remaining.min(MAX_IMAGES_PER_REQUEST);
            let images = self
                .gemini
                .generate_images(&prompt, batch, OUTPUT_MIME, ASPECT_RATIO)
                .await?;
            debug!(requested = batch, received = images.len(), "generation batch done");
            generated.extend(images);
            remaining -= batch;
        }

        if generated.is_empty() {
            return Err(AdapterError::no_images(query));
        }

        let prefix = name_prefix(query);
        Ok(generated
            .into_iter()
            .enumerate()
            .map(|(index, image)| {
                let url = image.data_url();
                ImageCandidate {
                    name: format!("{prefix}_{}.jpeg", index + 1),
                    thumb_url: url.clone(),
                    url,
                    width: IMAGE_WIDTH,
                    height: IMAGE_HEIGHT,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_mentions_query() {
        let prompt = prompt_for("mountain lake");
        assert!(prompt.contains("photorealistic image of: mountain lake."));
    }

    #[test]
    fn test_name_prefix_is_truncated_to_fifty_chars() {
        let long = "word ".repeat(30);
        let prefix = name_prefix(&long);
        assert_eq!(prefix.chars().count(), 50);
        assert!(!prefix.contains(' '));
    }
}
