//! The single-editor coordinator.
//!
//! Both tables' cell editing and the tag-association flow share one tagged
//! state, so "at most one active session system-wide" is a property of the
//! type rather than a protocol between per-table booleans.

use crate::row::{ConditionField, FormulaField, RowId};

/// What the operator is doing right now, across both tables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditorState {
    #[default]
    Idle,
    EditingCondition {
        row: RowId,
        field: ConditionField,
        draft: String,
    },
    EditingFormula {
        row: RowId,
        field: FormulaField,
        draft: String,
    },
    /// Multi-select linking for one condition's impacted-formula set.
    Associating { condition: RowId },
}

#[derive(Debug, Clone, Default)]
pub struct EditorCoordinator {
    state: EditorState,
}

impl EditorCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, EditorState::Idle)
    }

    /// True if a cell edit session is open on either table.
    pub fn is_editing(&self) -> bool {
        matches!(
            self.state,
            EditorState::EditingCondition { .. } | EditorState::EditingFormula { .. }
        )
    }

    pub fn is_associating(&self) -> bool {
        matches!(self.state, EditorState::Associating { .. })
    }

    /// The condition being associated, if any.
    pub fn associating_condition(&self) -> Option<RowId> {
        match self.state {
            EditorState::Associating { condition } => Some(condition),
            _ => None,
        }
    }

    /// True if the open edit session holds a required field with an empty
    /// draft. Such a session blocks every other session start.
    pub fn holds_incomplete_required(&self) -> bool {
        match &self.state {
            EditorState::EditingCondition { field, draft, .. } => {
                field.is_required() && draft.trim().is_empty()
            }
            EditorState::EditingFormula { field, draft, .. } => {
                field.is_required() && draft.trim().is_empty()
            }
            _ => false,
        }
    }

    pub fn begin_condition_edit(&mut self, row: RowId, field: ConditionField, draft: String) {
        self.state = EditorState::EditingCondition { row, field, draft };
    }

    pub fn begin_formula_edit(&mut self, row: RowId, field: FormulaField, draft: String) {
        self.state = EditorState::EditingFormula { row, field, draft };
    }

    pub fn begin_association(&mut self, condition: RowId) {
        self.state = EditorState::Associating { condition };
    }

    /// Overwrite the in-flight draft. Returns false outside an edit session.
    pub fn set_draft(&mut self, value: String) -> bool {
        match &mut self.state {
            EditorState::EditingCondition { draft, .. }
            | EditorState::EditingFormula { draft, .. } => {
                *draft = value;
                true
            }
            _ => false,
        }
    }

    pub fn to_idle(&mut self) -> EditorState {
        std::mem::take(&mut self.state)
    }

    /// Per-cell flag for rendering: the field being edited on this row.
    pub fn editing_condition_field(&self, row: RowId) -> Option<(ConditionField, &str)> {
        match &self.state {
            EditorState::EditingCondition {
                row: r,
                field,
                draft,
            } if *r == row => Some((*field, draft.as_str())),
            _ => None,
        }
    }

    pub fn editing_formula_field(&self, row: RowId) -> Option<(FormulaField, &str)> {
        match &self.state {
            EditorState::EditingFormula {
                row: r,
                field,
                draft,
            } if *r == row => Some((*field, draft.as_str())),
            _ => None,
        }
    }
}
