//! Batch input and its validation.

use crate::source::Source;

use super::ValidationError;

/// Accepted images-per-keyword range.
pub const MIN_IMAGES_PER_ITEM: u32 = 1;
pub const MAX_IMAGES_PER_ITEM: u32 = 100;
pub const DEFAULT_IMAGES_PER_ITEM: u32 = 5;

/// Accepted page bound for link collection.
pub const MIN_PAGES: u32 = 1;
pub const MAX_PAGES: u32 = 50;
pub const DEFAULT_PAGES: u32 = 3;

/// One user request, as entered.
///
/// For keyword sources `input` is a comma-separated keyword list and
/// `count` is images per keyword. For the two-phase source `input` is the
/// team and `count` bounds the pages scanned for links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub source: Source,
    pub input: String,
    pub count: u32,
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ValidatedRequest {
    Keywords {
        source: Source,
        work_items: Vec<String>,
        per_item_count: u32,
    },
    Team {
        team: String,
        max_pages: u32,
    },
}

impl BatchRequest {
    #[must_use]
    pub fn new(source: Source, input: impl Into<String>, count: u32) -> Self {
        Self {
            source,
            input: input.into(),
            count,
        }
    }

    pub(crate) fn validate(&self) -> Result<ValidatedRequest, ValidationError> {
        if self.source.is_two_phase() {
            let team = self.input.trim();
            if team.is_empty() {
                return Err(ValidationError::NoTeam);
            }
            check_range("max pages", self.count, MIN_PAGES, MAX_PAGES)?;
            return Ok(ValidatedRequest::Team {
                team: team.to_string(),
                max_pages: self.count,
            });
        }

        let work_items = split_work_items(&self.input);
        if work_items.is_empty() {
            return Err(ValidationError::NoKeywords);
        }
        check_range(
            "images per keyword",
            self.count,
            MIN_IMAGES_PER_ITEM,
            MAX_IMAGES_PER_ITEM,
        )?;
        Ok(ValidatedRequest::Keywords {
            source: self.source,
            work_items,
            per_item_count: self.count,
        })
    }
}

/// Splits comma-separated input into trimmed, non-empty work items.
#[must_use]
pub fn split_work_items(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn check_range(field: &'static str, value: u32, min: u32, max: u32) -> Result<(), ValidationError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::CountOutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}
