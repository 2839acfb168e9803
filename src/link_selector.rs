//! Link confirmation step of the two-phase source.
//!
//! ```text
//! Collecting ──begin_selection──▶ AwaitingSelection ──confirm──▶ Confirmed
//!                                        │
//!                                        └──────cancel──────▶ Cancelled
//! ```
//!
//! The state value carries the team string, so the synthesis phase needs
//! nothing but the confirmed [`LinkSelection`].

use thiserror::Error;

/// Invalid state transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {action} while link selection is {state}")]
pub struct LinkSelectionError {
    pub action: &'static str,
    pub state: &'static str,
}

/// Links collected for a team and the user's current choice among them.
///
/// Selection is tracked per position, so duplicate links are independent
/// and confirmation keeps discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSelector {
    team: String,
    links: Vec<String>,
    selected: Vec<bool>,
}

impl LinkSelector {
    /// Creates a selector with every link selected.
    #[must_use]
    pub fn new(team: impl Into<String>, links: Vec<String>) -> Self {
        let selected = vec![true; links.len()];
        Self {
            team: team.into(),
            links,
            selected,
        }
    }

    #[must_use]
    pub fn team(&self) -> &str {
        &self.team
    }

    /// All collected links in discovery order.
    #[must_use]
    pub fn links(&self) -> &[String] {
        &self.links
    }

    #[must_use]
    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.get(index).copied().unwrap_or(false)
    }

    /// Flips the link at `index`; returns the new state, or `None` when
    /// out of range.
    pub fn toggle_index(&mut self, index: usize) -> Option<bool> {
        let slot = self.selected.get_mut(index)?;
        *slot = !*slot;
        Some(*slot)
    }

    /// Flips the first link equal to `link`; returns the new state, or
    /// `None` when the link was never collected.
    pub fn toggle(&mut self, link: &str) -> Option<bool> {
        let index = self.links.iter().position(|l| l == link)?;
        self.toggle_index(index)
    }

    pub fn select_all(&mut self) {
        self.selected.iter_mut().for_each(|s| *s = true);
    }

    pub fn deselect_all(&mut self) {
        self.selected.iter_mut().for_each(|s| *s = false);
    }

    /// Deselects every link containing `pattern`; returns how many changed.
    pub fn deselect_matching(&mut self, pattern: &str) -> usize {
        let mut changed = 0;
        for (link, selected) in self.links.iter().zip(self.selected.iter_mut()) {
            if *selected && link.contains(pattern) {
                *selected = false;
                changed += 1;
            }
        }
        changed
    }

    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.selected.iter().filter(|s| **s).count()
    }

    /// Selected links in discovery order.
    #[must_use]
    pub fn selected_links(&self) -> Vec<String> {
        self.links
            .iter()
            .zip(&self.selected)
            .filter(|(_, selected)| **selected)
            .map(|(link, _)| link.clone())
            .collect()
    }
}

/// State of the link confirmation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkSelection {
    /// Links are being collected for `team`.
    Collecting { team: String },
    /// Waiting for the user to confirm or cancel.
    AwaitingSelection(LinkSelector),
    /// The user confirmed `links` (possibly empty), in discovery order.
    Confirmed { team: String, links: Vec<String> },
    /// The user dismissed the selection.
    Cancelled,
}

impl LinkSelection {
    /// Starts the flow for `team`.
    #[must_use]
    pub fn collecting(team: impl Into<String>) -> Self {
        Self::Collecting { team: team.into() }
    }

    /// Stable label of the current state.
    #[must_use]
    pub fn state_name(&self) -> &'static str {
        match self {
            Self::Collecting { .. } => "collecting",
            Self::AwaitingSelection(_) => "awaiting selection",
            Self::Confirmed { .. } => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }

    fn invalid(&self, action: &'static str) -> LinkSelectionError {
        LinkSelectionError {
            action,
            state: self.state_name(),
        }
    }

    /// `Collecting → AwaitingSelection` with every link pre-selected.
    ///
    /// # Errors
    ///
    /// Returns [`LinkSelectionError`] from any other state.
    pub fn begin_selection(self, links: Vec<String>) -> Result<Self, LinkSelectionError> {
        match self {
            Self::Collecting { team } => Ok(Self::AwaitingSelection(LinkSelector::new(team, links))),
            other => Err(other.invalid("begin selection")),
        }
    }

    /// `AwaitingSelection → Confirmed` with the selected subset.
    ///
    /// # Errors
    ///
    /// Returns [`LinkSelectionError`] from any other state.
    pub fn confirm(self) -> Result<Self, LinkSelectionError> {
        match self {
            Self::AwaitingSelection(selector) => Ok(Self::Confirmed {
                links: selector.selected_links(),
                team: selector.team,
            }),
            other => Err(other.invalid("confirm")),
        }
    }

    /// `AwaitingSelection → Cancelled`.
    ///
    /// # Errors
    ///
    /// Returns [`LinkSelectionError`] from any other state.
    pub fn cancel(self) -> Result<Self, LinkSelectionError> {
        match self {
            Self::AwaitingSelection(_) => Ok(Self::Cancelled),
            other => Err(other.invalid("cancel")),
        }
    }

    /// The selector while awaiting the user's choice.
    #[must_use]
    pub fn selector(&self) -> Option<&LinkSelector> {
        match self {
            Self::AwaitingSelection(selector) => Some(selector),
            _ => None,
        }
    }

    /// Mutable selector while awaiting the user's choice.
    pub fn selector_mut(&mut self) -> Option<&mut LinkSelector> {
        match self {
            Self::AwaitingSelection(selector) => Some(selector),
            _ => None,
        }
    }
}
