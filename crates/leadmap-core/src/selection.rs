// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    NoSelection,
    Selected(String),
}

impl Selection {
    pub fn feature_id(&self) -> Option<&str> {
        match self {
            Selection::NoSelection => None,
            Selection::Selected(id) => Some(id),
        }
    }
}

/// The two markers whose visuals must flip after a selection transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionChange {
    pub previous: Option<String>,
    pub current: Option<String>,
}

/// Keeps one selected feature consistent with the caller's selected id, the visible
/// feature list and marker clicks.
///
/// The caller's id is read-only input: it is remembered only so a real change can be
/// told apart from a repeat of the same value.
#[derive(Debug, Clone, Default)]
pub struct SelectionSync {
    state: Selection,
    last_external: Option<String>,
}

impl SelectionSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &Selection {
        &self.state
    }

    pub fn selected(&self) -> Option<&str> {
        self.state.feature_id()
    }

    /// Re-derives the selection for the current visible feature ids.
    ///
    /// - empty list: no selection
    /// - caller id unchanged and current selection still visible: keep it
    /// - caller id visible: select it
    /// - otherwise: select the first visible feature
    pub fn reconcile(&mut self, external: Option<&str>, visible: &[&str]) -> Option<SelectionChange> {
        let external = external.map(str::trim).filter(|id| !id.is_empty());
        let external_changed = external != self.last_external.as_deref();
        if external_changed {
            self.last_external = external.map(String::from);
        }

        let kept = self
            .selected()
            .filter(|current| !external_changed && visible.contains(current));
        let target = if visible.is_empty() {
            None
        } else if let Some(current) = kept {
            Some(current)
        } else {
            match external {
                Some(id) if visible.contains(&id) => Some(id),
                _ => visible.first().copied(),
            }
        };
        let target = target.map(String::from);

        self.transition(target)
    }

    /// A marker click wins over whatever was selected before.
    pub fn click(&mut self, feature_id: &str) -> Option<SelectionChange> {
        self.transition(Some(feature_id.to_string()))
    }

    fn transition(&mut self, target: Option<String>) -> Option<SelectionChange> {
        if self.selected() == target.as_deref() {
            return None;
        }

        let previous = self.selected().map(String::from);
        self.state = match target.clone() {
            Some(id) => Selection::Selected(id),
            None => Selection::NoSelection,
        };
        log::debug!(
            "[Selection] {:?} -> {:?}",
            previous.as_deref(),
            target.as_deref()
        );
        Some(SelectionChange {
            previous,
            current: target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_external_id_falls_back_to_first() {
        let mut sync = SelectionSync::new();
        let change = sync.reconcile(Some("X"), &["A", "B", "C"]).unwrap();
        assert_eq!(change.previous, None);
        assert_eq!(change.current.as_deref(), Some("A"));
    }

    #[test]
    fn test_visible_external_id_is_selected() {
        let mut sync = SelectionSync::new();
        sync.reconcile(Some("B"), &["A", "B", "C"]);
        assert_eq!(sync.selected(), Some("B"));
    }

    #[test]
    fn test_empty_list_clears() {
        let mut sync = SelectionSync::new();
        sync.reconcile(Some("B"), &["A", "B"]);
        let change = sync.reconcile(Some("B"), &[]).unwrap();
        assert_eq!(change.previous.as_deref(), Some("B"));
        assert_eq!(change.current, None);
        assert_eq!(sync.state(), &Selection::NoSelection);
    }

    #[test]
    fn test_click_survives_unchanged_external_id() {
        let mut sync = SelectionSync::new();
        sync.reconcile(Some("A"), &["A", "B", "C"]);
        let change = sync.click("C").unwrap();
        assert_eq!(change.previous.as_deref(), Some("A"));
        assert_eq!(change.current.as_deref(), Some("C"));

        // Same caller id again (e.g. a filter pass): the click stands.
        assert!(sync.reconcile(Some("A"), &["A", "B", "C"]).is_none());
        assert_eq!(sync.selected(), Some("C"));
    }

    #[test]
    fn test_filtered_out_selection_moves_to_first() {
        let mut sync = SelectionSync::new();
        sync.reconcile(Some("C"), &["A", "B", "C"]);
        let change = sync.reconcile(Some("C"), &["B", "A"]).unwrap();
        assert_eq!(change.current.as_deref(), Some("B"));
    }

    #[test]
    fn test_caller_id_set_before_data_is_honoured() {
        let mut sync = SelectionSync::new();
        assert!(sync.reconcile(Some("B"), &[]).is_none());

        let change = sync.reconcile(Some("B"), &["A", "B", "C"]).unwrap();
        assert_eq!(change.previous, None);
        assert_eq!(change.current.as_deref(), Some("B"));
    }

    #[test]
    fn test_filtered_out_click_returns_to_caller_id() {
        let mut sync = SelectionSync::new();
        sync.reconcile(Some("A"), &["A", "B", "C"]);
        sync.click("C");
        sync.reconcile(Some("A"), &["B", "A"]);
        assert_eq!(sync.selected(), Some("A"));
    }

    #[test]
    fn test_repeat_click_is_not_a_change() {
        let mut sync = SelectionSync::new();
        sync.click("A");
        assert!(sync.click("A").is_none());
    }
}
