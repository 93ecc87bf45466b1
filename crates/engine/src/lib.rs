//! `ruleboard-engine` — Ordered-collection consistency engine for the
//! condition/formula rule tables.
//!
//! Pure crate: receives commands and seed data, maintains the dense order
//! numbering and impact-tag referential integrity, exposes snapshots. No
//! IO, no HTTP, no rendering.

pub mod editor;
pub mod error;
pub mod events;
pub mod order;
pub mod remap;
pub mod row;
pub mod ruleboard;
pub mod selection;
pub mod snapshot;
pub mod store;

#[cfg(test)]
pub mod harness;

pub use editor::{EditorCoordinator, EditorState};
pub use error::EditError;
pub use events::{BoardEvent, EventCollector};
pub use order::{OrderMapping, OrderRegistry};
pub use row::{ConditionField, ConditionRow, FormulaField, FormulaRow, RowId, Table};
pub use ruleboard::{ConditionSeed, FormulaSeed, LoadTicket, MoveOutcome, RuleBoard};
pub use selection::SelectionManager;
pub use snapshot::{BoardView, ConditionRowView, FormulaRowView};
pub use store::RowStore;
