//! Image descriptors produced by batch runs.
//!
//! Source adapters return [`ImageCandidate`]s (metadata only, no identity).
//! The batch orchestrator turns each candidate into an [`ImageDescriptor`]
//! by assigning an [`ImageId`] through an [`IdAllocator`], so identifiers
//! never depend on what an adapter happens to return.

use std::fmt;

use serde::Serialize;

/// Opaque identifier of one image in the current result set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    /// Wraps an existing identifier string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Image metadata returned by a source adapter before an id is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    /// Display name, also used as the file/archive entry name.
    pub name: String,
    /// Full-resolution location (HTTP(S) URL or `data:` URL).
    pub url: String,
    /// Thumbnail location.
    pub thumb_url: String,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
}

/// One image in a result set.
///
/// Immutable once created. The size metric is derived from the dimensions
/// and only used for ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageDescriptor {
    /// Identifier assigned by the orchestrator.
    pub id: ImageId,
    /// Display name.
    pub name: String,
    /// Full-resolution location.
    pub url: String,
    /// Thumbnail location.
    pub thumb_url: String,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
}

impl ImageDescriptor {
    /// Builds a descriptor from an adapter candidate.
    #[must_use]
    pub fn from_candidate(id: ImageId, candidate: ImageCandidate) -> Self {
        Self {
            id,
            name: candidate.name,
            url: candidate.url,
            thumb_url: candidate.thumb_url,
            width: candidate.width,
            height: candidate.height,
        }
    }

    /// Pixel area, used for "sort by size".
    #[must_use]
    pub fn size(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Short `WxH` label for listings.
    #[must_use]
    pub fn dimensions(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// Hands out identifiers that stay unique across batches and retries.
///
/// Ids take the form `<batch>-<n>`: the batch counter advances on every
/// [`IdAllocator::next_batch`], the item counter restarts per batch.
#[derive(Debug, Default)]
pub struct IdAllocator {
    batch: u64,
    item: u64,
}

impl IdAllocator {
    /// Creates an allocator starting before the first batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new batch namespace.
    pub fn next_batch(&mut self) {
        self.batch += 1;
        self.item = 0;
    }

    /// Returns the next identifier in the current batch.
    pub fn allocate(&mut self) -> ImageId {
        self.item += 1;
        ImageId(format!("{}-{}", self.batch, self.item))
    }
}
