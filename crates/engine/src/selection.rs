//! Checked-row tracking, one instance per table.

use rustc_hash::FxHashSet;

use crate::row::RowId;

#[derive(Debug, Clone, Default)]
pub struct SelectionManager {
    selected: FxHashSet<RowId>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip a row's checked state; returns the new state.
    pub fn toggle(&mut self, id: RowId) -> bool {
        if self.selected.remove(&id) {
            false
        } else {
            self.selected.insert(id);
            true
        }
    }

    pub fn contains(&self, id: RowId) -> bool {
        self.selected.contains(&id)
    }

    /// Replace the whole selection (association pre-select).
    pub fn replace(&mut self, ids: impl IntoIterator<Item = RowId>) {
        self.selected = ids.into_iter().collect();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Selected ids in ascending id order, for deterministic iteration.
    pub fn ids(&self) -> Vec<RowId> {
        let mut ids: Vec<RowId> = self.selected.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn as_set(&self) -> &FxHashSet<RowId> {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle() {
        let mut sel = SelectionManager::new();
        assert!(sel.toggle(RowId(1)));
        assert!(sel.contains(RowId(1)));
        assert!(!sel.toggle(RowId(1)));
        assert!(sel.is_empty());
    }

    #[test]
    fn test_replace_and_ordered_ids() {
        let mut sel = SelectionManager::new();
        sel.replace([RowId(3), RowId(1), RowId(2)]);
        assert_eq!(sel.ids(), vec![RowId(1), RowId(2), RowId(3)]);
        sel.clear();
        assert!(sel.is_empty());
    }
}
