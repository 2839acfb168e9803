//! Error types for batch orchestration.

use thiserror::Error;

use crate::link_selector::LinkSelectionError;
use crate::source::Source;

/// Input rejected before any network activity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A keyword source got no usable keyword.
    #[error("Please enter at least one keyword.")]
    NoKeywords,

    /// The two-phase source got an empty team.
    #[error("Please enter a team name/URL.")]
    NoTeam,

    /// A count was outside its accepted range.
    #[error("{field} must be between {min} and {max}, got {value}")]
    CountOutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
}

/// Errors that stop a batch from starting or finishing.
///
/// Per-item adapter failures are not errors at this level; they are logged
/// and the batch continues.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The request failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No adapter is registered for the requested source.
    #[error("{requested} is not available in this session\n  Suggestion: {suggestion}")]
    SourceUnavailable {
        requested: Source,
        suggestion: &'static str,
    },

    /// The link selection was handed over in the wrong state.
    #[error(transparent)]
    Selection(#[from] LinkSelectionError),
}

impl BatchError {
    /// Creates a `SourceUnavailable` error with a key-specific suggestion.
    #[must_use]
    pub fn source_unavailable(source: Source) -> Self {
        let suggestion = match source {
            Source::Pixabay => "Set PIXABAY_API_KEY or `pixabay_api_key` in the config file",
            Source::Google | Source::Footy => {
                "Set GEMINI_API_KEY or `gemini_api_key` in the config file"
            }
        };
        Self::SourceUnavailable {
            requested: source,
            suggestion,
        }
    }
}
