//! Read-only render views.
//!
//! The rendering layer consumes these instead of the live stores: each row
//! carries its derived order/tag text plus the per-cell edit and selection
//! flags, so a renderer needs no knowledge of the session rules.

use serde::Serialize;

use crate::remap;
use crate::row::{ConditionField, FormulaField, RowId};
use crate::ruleboard::RuleBoard;

#[derive(Debug, Clone, Serialize)]
pub struct ConditionRowView {
    pub id: RowId,
    pub condition_expr: String,
    pub failure_handling: String,
    /// Derived ascending order-number list.
    pub impact_tags: String,
    /// The field currently being edited on this row, with its draft.
    pub editing: Option<ConditionField>,
    pub draft: Option<String>,
    pub selected: bool,
    /// True while this row's tag list is the association target.
    pub associating: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormulaRowView {
    pub id: RowId,
    pub order: u32,
    pub output_variable: String,
    pub expression: String,
    pub extra1: String,
    pub extra2: String,
    pub editing: Option<FormulaField>,
    pub draft: Option<String>,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardView {
    pub device: Option<String>,
    pub data_type: Option<String>,
    pub conditions: Vec<ConditionRowView>,
    pub formulas: Vec<FormulaRowView>,
    /// False while a cell edit is open: checkboxes render disabled.
    pub selection_enabled: bool,
    pub associating: Option<RowId>,
}

impl BoardView {
    pub fn capture(board: &RuleBoard) -> Self {
        let editor = board.editor();
        let associating = editor.associating_condition();

        let conditions = board
            .conditions()
            .iter()
            .map(|r| {
                let editing = editor.editing_condition_field(r.id);
                ConditionRowView {
                    id: r.id,
                    condition_expr: r.condition_expr.clone(),
                    failure_handling: r.failure_handling.clone(),
                    impact_tags: remap::render_tags(&r.impact, board.orders()),
                    editing: editing.map(|(f, _)| f),
                    draft: editing.map(|(_, d)| d.to_string()),
                    selected: board.condition_selection().contains(r.id),
                    associating: associating == Some(r.id),
                }
            })
            .collect();

        let formulas = board
            .formulas()
            .iter()
            .enumerate()
            .map(|(idx, r)| {
                let editing = editor.editing_formula_field(r.id);
                FormulaRowView {
                    id: r.id,
                    order: idx as u32 + 1,
                    output_variable: r.output_variable.clone(),
                    expression: r.expression.clone(),
                    extra1: r.extra1.clone(),
                    extra2: r.extra2.clone(),
                    editing: editing.map(|(f, _)| f),
                    draft: editing.map(|(_, d)| d.to_string()),
                    selected: board.formula_selection().contains(r.id),
                }
            })
            .collect();

        BoardView {
            device: board.device().map(str::to_string),
            data_type: board.data_type().map(str::to_string),
            conditions,
            formulas,
            selection_enabled: !editor.is_editing(),
            associating,
        }
    }
}

impl RuleBoard {
    pub fn snapshot(&self) -> BoardView {
        BoardView::capture(self)
    }
}
