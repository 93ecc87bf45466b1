//! Operation scripts: one JSON op per line, applied to a rule board.
//!
//! Scripts address rows the way an operator sees them — by 1-based display
//! position (the order number, for formulas). Each op resolves positions to
//! stable ids against the current board before mutating, so a script reads
//! naturally even across deletes and moves.

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;

use ruleboard_engine::{
    ConditionField, EditError, FormulaField, MoveOutcome, RowId, RuleBoard,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptOp {
    AddCondition,
    AddFormula,
    EditCondition { row: u32, field: String, value: String },
    EditFormula { row: u32, field: String, value: String },
    SetExtras { row: u32, extra1: String, extra2: String },
    MoveFormula { row: u32, to: u32 },
    DeleteConditions { rows: Vec<u32> },
    DeleteFormulas { rows: Vec<u32> },
    /// Replace a condition's impact set through an association session.
    Associate { condition: u32, formulas: Vec<u32> },
}

#[derive(Debug)]
pub enum OpError {
    /// No condition row at this display position.
    NoConditionRow(u32),
    /// No formula row at this display position (order).
    NoFormulaRow(u32),
    /// The engine refused the command.
    Engine(EditError),
}

impl fmt::Display for OpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoConditionRow(row) => write!(f, "no condition row at position {row}"),
            Self::NoFormulaRow(row) => write!(f, "no formula row at order {row}"),
            Self::Engine(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for OpError {}

impl From<EditError> for OpError {
    fn from(err: EditError) -> Self {
        OpError::Engine(err)
    }
}

/// Parse a script: one JSON object per line; blank lines and `#` comments
/// are skipped. Returns the 1-based line number alongside any parse error.
pub fn parse_script(text: &str) -> Result<Vec<ScriptOp>, (usize, serde_json::Error)> {
    let mut ops = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(op) => ops.push(op),
            Err(e) => return Err((idx + 1, e)),
        }
    }
    Ok(ops)
}

fn condition_at(board: &RuleBoard, row: u32) -> Result<RowId, OpError> {
    board
        .conditions()
        .get(row.checked_sub(1).ok_or(OpError::NoConditionRow(row))? as usize)
        .map(|r| r.id)
        .ok_or(OpError::NoConditionRow(row))
}

fn formula_at(board: &RuleBoard, order: u32) -> Result<RowId, OpError> {
    board
        .formulas()
        .get(order.checked_sub(1).ok_or(OpError::NoFormulaRow(order))? as usize)
        .map(|r| r.id)
        .ok_or(OpError::NoFormulaRow(order))
}

/// Apply one op. On error the board is left exactly as the engine left it.
pub fn apply(board: &mut RuleBoard, op: ScriptOp) -> Result<(), OpError> {
    match op {
        ScriptOp::AddCondition => {
            board.add_condition();
        }
        ScriptOp::AddFormula => {
            board.add_formula();
        }
        ScriptOp::EditCondition { row, field, value } => {
            let id = condition_at(board, row)?;
            let field: ConditionField = field.parse().map_err(OpError::Engine)?;
            board.start_condition_edit(id, field)?;
            board.set_draft(value)?;
            board.commit_edit()?;
        }
        ScriptOp::EditFormula { row, field, value } => {
            let id = formula_at(board, row)?;
            let field: FormulaField = field.parse().map_err(OpError::Engine)?;
            board.start_formula_edit(id, field)?;
            board.set_draft(value)?;
            board.commit_edit()?;
        }
        ScriptOp::SetExtras { row, extra1, extra2 } => {
            let id = formula_at(board, row)?;
            board.update_extra_fields(id, extra1, extra2)?;
        }
        ScriptOp::MoveFormula { row, to } => {
            let id = formula_at(board, row)?;
            board.move_formula(MoveOutcome {
                row: id,
                target_order: to,
            })?;
        }
        ScriptOp::DeleteConditions { rows } => {
            let ids: Vec<RowId> = rows
                .into_iter()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(|row| condition_at(board, row))
                .collect::<Result<_, _>>()?;
            for id in ids {
                board.toggle_condition_selected(id)?;
            }
            board.delete_selected_conditions()?;
        }
        ScriptOp::DeleteFormulas { rows } => {
            let ids: Vec<RowId> = rows
                .into_iter()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(|order| formula_at(board, order))
                .collect::<Result<_, _>>()?;
            for id in ids {
                board.toggle_formula_selected(id)?;
            }
            board.delete_selected_formulas()?;
        }
        ScriptOp::Associate {
            condition,
            formulas,
        } => {
            let condition = condition_at(board, condition)?;
            let desired: BTreeSet<RowId> = formulas
                .into_iter()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(|order| formula_at(board, order))
                .collect::<Result<_, _>>()?;

            board.start_association(condition)?;
            // The session pre-selects the current impact set; toggle the
            // difference so the confirm writes exactly `desired`.
            let current: BTreeSet<RowId> =
                board.formula_selection().ids().into_iter().collect();
            for id in current.difference(&desired) {
                board.toggle_association_pick(*id)?;
            }
            for id in desired.difference(&current) {
                board.toggle_association_pick(*id)?;
            }
            board.confirm_association()?;
        }
    }
    Ok(())
}
