//! Result set and selection state for interactive curation.
//!
//! [`Curation`] owns the ordered result set of the latest batch plus the
//! set of ids marked for bulk deletion. The selection only ever references
//! ids that are currently in the result set.

use std::collections::HashSet;

use thiserror::Error;

use crate::image::{ImageDescriptor, ImageId};

/// Errors from curation operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CurationError {
    /// Selection changes require selection mode.
    #[error("selection mode is off\n  Suggestion: enter selection mode before selecting images")]
    NotInSelectionMode,

    /// The id is not part of the current result set.
    #[error("no image with id '{0}' in the current results")]
    UnknownImage(ImageId),
}

/// What happened to a single-item delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The confirmation gate approved and the item was removed.
    Deleted,
    /// The confirmation gate declined; nothing changed.
    Declined,
}

/// Current results plus the bulk-selection state.
#[derive(Debug, Default, Clone)]
pub struct Curation {
    items: Vec<ImageDescriptor>,
    selection_mode: bool,
    selected: HashSet<ImageId>,
}

impl Curation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the result set with a new batch result.
    ///
    /// Always exits selection mode and empties the selection.
    pub fn replace(&mut self, items: Vec<ImageDescriptor>) {
        self.items = items;
        self.exit_selection_mode();
    }

    /// Drops every result and the selection.
    pub fn clear(&mut self) {
        self.replace(Vec::new());
    }

    /// Results in insertion order.
    #[must_use]
    pub fn items(&self) -> &[ImageDescriptor] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Looks up a result by id.
    #[must_use]
    pub fn get(&self, id: &ImageId) -> Option<&ImageDescriptor> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Results in display order.
    ///
    /// With `sort_by_size` the view is ordered by descending pixel area
    /// (ties keep insertion order); the underlying order never changes.
    #[must_use]
    pub fn display_order(&self, sort_by_size: bool) -> Vec<&ImageDescriptor> {
        let mut view: Vec<&ImageDescriptor> = self.items.iter().collect();
        if sort_by_size {
            view.sort_by_key(|item| std::cmp::Reverse(item.size()));
        }
        view
    }

    #[must_use]
    pub fn is_selection_mode(&self) -> bool {
        self.selection_mode
    }

    /// Flips selection mode. Leaving it clears the selection.
    pub fn toggle_selection_mode(&mut self) {
        if self.selection_mode {
            self.exit_selection_mode();
        } else {
            self.selection_mode = true;
        }
    }

    /// Leaves selection mode and clears the selection.
    pub fn exit_selection_mode(&mut self) {
        self.selection_mode = false;
        self.selected.clear();
    }

    /// Flips membership of `id` in the selection and returns whether it is
    /// now selected.
    ///
    /// # Errors
    ///
    /// Returns [`CurationError::NotInSelectionMode`] outside selection mode
    /// and [`CurationError::UnknownImage`] for ids not in the result set.
    pub fn toggle_select(&mut self, id: &ImageId) -> Result<bool, CurationError> {
        if !self.selection_mode {
            return Err(CurationError::NotInSelectionMode);
        }
        if self.get(id).is_none() {
            return Err(CurationError::UnknownImage(id.clone()));
        }
        if self.selected.remove(id) {
            Ok(false)
        } else {
            self.selected.insert(id.clone());
            Ok(true)
        }
    }

    #[must_use]
    pub fn is_selected(&self, id: &ImageId) -> bool {
        self.selected.contains(id)
    }

    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Removes every selected result, clears the selection and exits
    /// selection mode. Returns how many results were removed.
    pub fn delete_selected(&mut self) -> usize {
        let before = self.items.len();
        let selected = std::mem::take(&mut self.selected);
        self.items.retain(|item| !selected.contains(&item.id));
        self.selection_mode = false;
        before - self.items.len()
    }

    /// Removes one result, regardless of selection mode, after `confirm`
    /// approves it.
    ///
    /// The gate is only consulted for ids that exist.
    ///
    /// # Errors
    ///
    /// Returns [`CurationError::UnknownImage`] if `id` is not in the result set.
    pub fn delete_one<F>(&mut self, id: &ImageId, confirm: F) -> Result<DeleteOutcome, CurationError>
    where
        F: FnOnce(&ImageDescriptor) -> bool,
    {
        let Some(index) = self.items.iter().position(|item| &item.id == id) else {
            return Err(CurationError::UnknownImage(id.clone()));
        };
        if !confirm(&self.items[index]) {
            return Ok(DeleteOutcome::Declined);
        }
        self.items.remove(index);
        self.selected.remove(id);
        Ok(DeleteOutcome::Deleted)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn image(id: &str, width: u32, height: u32) -> ImageDescriptor {
        ImageDescriptor {
            id: ImageId::new(id),
            name: format!("{id}.jpg"),
            url: format!("https://img.example/{id}.jpg"),
            thumb_url: format!("https://img.example/{id}_t.jpg"),
            width,
            height,
        }
    }

    fn curation() -> Curation {
        let mut c = Curation::new();
        c.replace(vec![
            image("a", 100, 100),
            image("b", 400, 300),
            image("c", 200, 200),
            image("d", 400, 300),
        ]);
        c
    }

    fn ids(view: &[&ImageDescriptor]) -> Vec<String> {
        view.iter().map(|i| i.id.to_string()).collect()
    }

    #[test]
    fn test_display_order_sorts_descending_and_is_stable() {
        let c = curation();
        assert_eq!(ids(&c.display_order(true)), vec!["b", "d", "c", "a"]);
    }

    #[test]
    fn test_sort_toggle_on_then_off_restores_insertion_order() {
        let c = curation();
        let _sorted = c.display_order(true);
        assert_eq!(ids(&c.display_order(false)), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_toggle_select_requires_selection_mode() {
        let mut c = curation();
        assert_eq!(
            c.toggle_select(&ImageId::new("a")),
            Err(CurationError::NotInSelectionMode)
        );
    }

    #[test]
    fn test_toggle_select_flips_membership() {
        let mut c = curation();
        c.toggle_selection_mode();
        assert_eq!(c.toggle_select(&ImageId::new("a")), Ok(true));
        assert!(c.is_selected(&ImageId::new("a")));
        assert_eq!(c.toggle_select(&ImageId::new("a")), Ok(false));
        assert_eq!(c.selected_count(), 0);
    }

    #[test]
    fn test_toggle_select_unknown_id() {
        let mut c = curation();
        c.toggle_selection_mode();
        assert_eq!(
            c.toggle_select(&ImageId::new("zzz")),
            Err(CurationError::UnknownImage(ImageId::new("zzz")))
        );
    }

    #[test]
    fn test_leaving_selection_mode_clears_selection() {
        let mut c = curation();
        c.toggle_selection_mode();
        c.toggle_select(&ImageId::new("b")).unwrap();
        c.toggle_selection_mode();
        assert!(!c.is_selection_mode());
        assert_eq!(c.selected_count(), 0);
    }

    #[test]
    fn test_delete_selected_removes_and_resets() {
        let mut c = curation();
        c.toggle_selection_mode();
        c.toggle_select(&ImageId::new("a")).unwrap();
        c.toggle_select(&ImageId::new("c")).unwrap();

        assert_eq!(c.delete_selected(), 2);
        assert_eq!(c.selected_count(), 0);
        assert!(!c.is_selection_mode());
        assert_eq!(ids(&c.display_order(false)), vec!["b", "d"]);
    }

    #[test]
    fn test_replace_exits_selection_mode() {
        let mut c = curation();
        c.toggle_selection_mode();
        c.toggle_select(&ImageId::new("a")).unwrap();

        c.replace(vec![image("x", 1, 1)]);

        assert!(!c.is_selection_mode());
        assert_eq!(c.selected_count(), 0);
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_delete_one_declined_leaves_results() {
        let mut c = curation();
        let outcome = c.delete_one(&ImageId::new("b"), |_| false).unwrap();
        assert_eq!(outcome, DeleteOutcome::Declined);
        assert_eq!(c.len(), 4);
    }

    #[test]
    fn test_delete_one_confirmed_prunes_selection() {
        let mut c = curation();
        c.toggle_selection_mode();
        c.toggle_select(&ImageId::new("b")).unwrap();

        let mut asked = None;
        let outcome = c
            .delete_one(&ImageId::new("b"), |item| {
                asked = Some(item.name.clone());
                true
            })
            .unwrap();

        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert_eq!(asked.as_deref(), Some("b.jpg"));
        assert_eq!(c.len(), 3);
        assert!(!c.is_selected(&ImageId::new("b")));
    }

    #[test]
    fn test_delete_one_works_outside_selection_mode() {
        let mut c = curation();
        assert!(!c.is_selection_mode());
        c.delete_one(&ImageId::new("a"), |_| true).unwrap();
        assert!(c.get(&ImageId::new("a")).is_none());
    }

    #[test]
    fn test_delete_one_unknown_does_not_call_gate() {
        let mut c = curation();
        let result = c.delete_one(&ImageId::new("nope"), |_| panic!("gate must not run"));
        assert!(matches!(result, Err(CurationError::UnknownImage(_))));
    }
}
