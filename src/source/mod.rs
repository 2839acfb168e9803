//! Image sources and the adapter contracts the orchestrator drives.
//!
//! # Architecture
//!
//! - [`Source`] - The three user-selectable sources
//! - [`ImageSource`] - Single-phase adapter: query + count → candidates
//! - [`LinkSource`] - Two-phase adapter: link collection, then per-link synthesis
//! - [`SourceRegistry`] - Adapters available for this session
//! - [`PixabaySource`] - Stock photo search
//! - [`GoogleImageSource`] - Image generation from a keyword prompt
//! - [`FootySource`] - Simulated render-page scraping plus player render synthesis

mod error;
mod footy;
mod gemini;
mod google;
mod pixabay;

pub use error::AdapterError;
pub use footy::{FootySource, player_name_from_link};
pub use gemini::{GeminiClient, GeneratedImage};
pub use google::GoogleImageSource;
pub use pixabay::PixabaySource;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::image::ImageCandidate;

/// User-selectable image source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// AI image generation from keywords.
    Google,
    /// Stock-photo keyword search.
    Pixabay,
    /// Two-phase render pipeline for a team's players.
    Footy,
}

impl Source {
    /// Label used in log lines and history records.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::Pixabay => "Pixabay",
            Self::Footy => "Footy Renders",
        }
    }

    /// Stable identifier used on the command line and in config.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Pixabay => "pixabay",
            Self::Footy => "footy",
        }
    }

    /// Whether the source needs link collection and confirmation first.
    #[must_use]
    pub fn is_two_phase(self) -> bool {
        matches!(self, Self::Footy)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "pixabay" => Ok(Self::Pixabay),
            "footy" | "footy renders" => Ok(Self::Footy),
            other => Err(format!(
                "unknown source '{other}'; expected one of: google, pixabay, footy"
            )),
        }
    }
}

/// Single-phase adapter: returns up to `count` candidates for a query.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Human-readable adapter name for logging.
    fn name(&self) -> &str;

    /// Fetches candidates for one work item.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] on transport, HTTP status, or parse failures.
    async fn fetch(&self, query: &str, count: u32) -> Result<Vec<ImageCandidate>, AdapterError>;
}

/// Two-phase adapter: link discovery, then one synthesized image per link.
#[async_trait]
pub trait LinkSource: Send + Sync {
    /// Human-readable adapter name for logging.
    fn name(&self) -> &str;

    /// Collects candidate player links for a team, bounded by `max_pages`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] when the discovery request itself fails.
    async fn collect_links(&self, team: &str, max_pages: u32) -> Result<Vec<String>, AdapterError>;

    /// Synthesizes one image for a link. `Ok(None)` means the service
    /// answered but produced nothing.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] on transport, HTTP status, or parse failures.
    async fn synthesize_one(
        &self,
        link: &str,
        team: &str,
    ) -> Result<Option<ImageCandidate>, AdapterError>;
}

/// Adapters registered for the current session.
///
/// A source without an adapter (for example, missing API key) is simply
/// absent; the orchestrator reports it as unavailable.
#[derive(Default, Clone)]
pub struct SourceRegistry {
    image_sources: HashMap<Source, Arc<dyn ImageSource>>,
    link_source: Option<Arc<dyn LinkSource>>,
}

impl fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.image_sources.keys().map(|s| s.as_str()).collect();
        keys.sort_unstable();
        f.debug_struct("SourceRegistry")
            .field("image_sources", &keys)
            .field("link_source", &self.link_source.as_ref().map(|s| s.name()))
            .finish()
    }
}

impl SourceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a single-phase adapter for `source`.
    pub fn register_image_source(&mut self, source: Source, adapter: Arc<dyn ImageSource>) {
        self.image_sources.insert(source, adapter);
    }

    /// Registers the two-phase adapter.
    pub fn register_link_source(&mut self, adapter: Arc<dyn LinkSource>) {
        self.link_source = Some(adapter);
    }

    /// Builder-style [`Self::register_image_source`].
    #[must_use]
    pub fn with_image_source(mut self, source: Source, adapter: Arc<dyn ImageSource>) -> Self {
        self.register_image_source(source, adapter);
        self
    }

    /// Builder-style [`Self::register_link_source`].
    #[must_use]
    pub fn with_link_source(mut self, adapter: Arc<dyn LinkSource>) -> Self {
        self.register_link_source(adapter);
        self
    }

    /// Returns the single-phase adapter for `source`, if registered.
    #[must_use]
    pub fn image_source(&self, source: Source) -> Option<Arc<dyn ImageSource>> {
        self.image_sources.get(&source).cloned()
    }

    /// Returns the two-phase adapter, if registered.
    #[must_use]
    pub fn link_source(&self) -> Option<Arc<dyn LinkSource>> {
        self.link_source.clone()
    }

    /// Whether `source` can be used in this session.
    #[must_use]
    pub fn is_available(&self, source: Source) -> bool {
        if source.is_two_phase() {
            self.link_source.is_some()
        } else {
            self.image_sources.contains_key(&source)
        }
    }
}

/// Replaces each whitespace run with `_`, as used in generated file names.
pub(crate) fn underscore_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join("_")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct NullSource;

    #[async_trait]
    impl ImageSource for NullSource {
        fn name(&self) -> &str {
            "null"
        }

        async fn fetch(
            &self,
            _query: &str,
            _count: u32,
        ) -> Result<Vec<ImageCandidate>, AdapterError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_source_labels() {
        assert_eq!(Source::Google.label(), "Google");
        assert_eq!(Source::Pixabay.label(), "Pixabay");
        assert_eq!(Source::Footy.label(), "Footy Renders");
    }

    #[test]
    fn test_source_from_str_round_trips_as_str() {
        for source in [Source::Google, Source::Pixabay, Source::Footy] {
            assert_eq!(source.as_str().parse::<Source>().unwrap(), source);
        }
        assert!("bing".parse::<Source>().is_err());
    }

    #[test]
    fn test_only_footy_is_two_phase() {
        assert!(Source::Footy.is_two_phase());
        assert!(!Source::Google.is_two_phase());
        assert!(!Source::Pixabay.is_two_phase());
    }

    #[test]
    fn test_registry_availability() {
        let registry = SourceRegistry::new().with_image_source(Source::Pixabay, Arc::new(NullSource));
        assert!(registry.is_available(Source::Pixabay));
        assert!(!registry.is_available(Source::Google));
        assert!(!registry.is_available(Source::Footy));
        assert!(registry.image_source(Source::Pixabay).is_some());
    }

    #[test]
    fn test_underscore_whitespace_collapses_runs() {
        assert_eq!(underscore_whitespace("red  sports car"), "red_sports_car");
        assert_eq!(underscore_whitespace("cats"), "cats");
    }
}
