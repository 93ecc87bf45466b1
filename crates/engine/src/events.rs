//! Change notifications emitted by board commands.
//!
//! Drivers drain these after each command to know what to re-render, and
//! the tests use them to verify that every structural change announces its
//! order permutation.

use crate::order::OrderMapping;
use crate::row::Table;

#[derive(Debug, Clone, PartialEq)]
pub enum BoardEvent {
    /// A table's row collection or cell contents changed.
    RowsChanged(Table),
    /// Formula order numbers changed; carries the old→new permutation.
    OrdersRemapped(OrderMapping),
    /// A fetched data set replaced both collections.
    DataLoaded,
    /// Selectors and collections were cleared.
    Reset,
}

/// Simple event collector for testing.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<BoardEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = BoardEvent>) {
        self.events.extend(events);
    }

    pub fn events(&self) -> &[BoardEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The remap events, in arrival order.
    pub fn remaps(&self) -> Vec<&OrderMapping> {
        self.events
            .iter()
            .filter_map(|e| match e {
                BoardEvent::OrdersRemapped(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn rows_changed(&self, table: Table) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, BoardEvent::RowsChanged(t) if *t == table))
    }
}
