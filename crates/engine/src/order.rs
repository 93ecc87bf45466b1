//! Dense order numbers for formula rows.
//!
//! The registry is the single source of truth for the id→order index. It is
//! rebuilt once per structural mutation of the formula sequence (add, move,
//! delete-set, load), and the rebuild hands back the old→new permutation so
//! observers holding order-keyed state can translate it.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::row::{FormulaRow, RowId, TableRow};

/// Index from stable row id to the row's current 1-based dense order.
#[derive(Debug, Clone, Default)]
pub struct OrderRegistry {
    index: FxHashMap<RowId, u32>,
}

impl OrderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current order of a row, if it exists.
    pub fn order_of(&self, id: RowId) -> Option<u32> {
        self.index.get(&id).copied()
    }

    pub fn contains(&self, id: RowId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn clear(&mut self) {
        self.index.clear();
    }

    /// Re-enumerate the post-mutation sequence from 1 and return the
    /// old→new mapping for every order value that existed before.
    ///
    /// Rows absent from `rows` map to removed; rows never seen before
    /// (fresh inserts) receive an order but contribute no mapping entry.
    pub fn rebuild(&mut self, rows: &[FormulaRow]) -> OrderMapping {
        let old = std::mem::take(&mut self.index);
        let mut entries = BTreeMap::new();

        for (idx, row) in rows.iter().enumerate() {
            let new_order = idx as u32 + 1;
            self.index.insert(row.id(), new_order);
            if let Some(prev) = old.get(&row.id()) {
                entries.insert(*prev, Some(new_order));
            }
        }
        for (id, prev) in old {
            if !self.index.contains_key(&id) {
                entries.insert(prev, None);
            }
        }

        OrderMapping { entries }
    }
}

/// Old order → new order, or removed (`None`), for one structural change.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderMapping {
    entries: BTreeMap<u32, Option<u32>>,
}

impl OrderMapping {
    /// New order for an old order value; `None` if removed or never known.
    pub fn translate(&self, old: u32) -> Option<u32> {
        self.entries.get(&old).copied().flatten()
    }

    /// True if every surviving order kept its value and nothing was removed.
    pub fn is_identity(&self) -> bool {
        self.entries.iter().all(|(old, new)| *new == Some(*old))
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, Option<u32>)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, *v))
    }

    pub fn removed(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries
            .iter()
            .filter(|(_, v)| v.is_none())
            .map(|(k, _)| *k)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
