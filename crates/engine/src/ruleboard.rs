//! The rule board: both tables, the order registry, the editor coordinator,
//! and the per-table selections, behind an imperative command surface.
//!
//! Every command is an atomic step: when it returns, the dense-order and
//! referential-integrity invariants hold. Commands that refuse leave all
//! state untouched.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::editor::{EditorCoordinator, EditorState};
use crate::error::EditError;
use crate::events::BoardEvent;
use crate::order::OrderRegistry;
use crate::remap;
use crate::row::{ConditionField, ConditionRow, FormulaField, FormulaRow, RowId, Table};
use crate::selection::SelectionManager;
use crate::store::RowStore;

/// One fetched condition row, in the wire's textual-tag form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSeed {
    pub condition_expr: String,
    pub failure_handling: String,
    /// Comma-joined order numbers, referencing `FormulaSeed::order` values.
    pub impact_tags: String,
}

/// One fetched formula row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaSeed {
    pub output_variable: String,
    pub expression: String,
    pub order: u32,
    pub extra1: String,
    pub extra2: String,
}

/// Handle for one issued fetch. Only the latest ticket can install data;
/// responses racing in for an older ticket are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Final target position produced by a reorder gesture (1-based order).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub row: RowId,
    pub target_order: u32,
}

#[derive(Debug, Clone, Default)]
pub struct RuleBoard {
    device: Option<String>,
    data_type: Option<String>,
    conditions: RowStore<ConditionRow>,
    formulas: RowStore<FormulaRow>,
    orders: OrderRegistry,
    editor: EditorCoordinator,
    condition_selection: SelectionManager,
    formula_selection: SelectionManager,
    load_seq: u64,
    events: Vec<BoardEvent>,
}

impl RuleBoard {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Selectors and data-set lifecycle
    // =========================================================================

    pub fn set_device(&mut self, device: Option<String>) {
        self.device = device;
    }

    pub fn set_data_type(&mut self, data_type: Option<String>) {
        self.data_type = data_type;
    }

    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    pub fn data_type(&self) -> Option<&str> {
        self.data_type.as_deref()
    }

    /// The device/type pair, once both selectors hold a value.
    pub fn selected_pair(&self) -> Option<(&str, &str)> {
        match (self.device.as_deref(), self.data_type.as_deref()) {
            (Some(d), Some(t)) => Some((d, t)),
            _ => None,
        }
    }

    /// Issue a fetch ticket. Any in-flight session and selection state is
    /// abandoned; the row collections stay visible until data arrives.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.load_seq += 1;
        self.editor.to_idle();
        self.condition_selection.clear();
        self.formula_selection.clear();
        LoadTicket(self.load_seq)
    }

    /// Install a fetched data set. Returns false (and changes nothing) if a
    /// newer ticket has been issued since — the stale response loses.
    pub fn apply_rows(
        &mut self,
        ticket: LoadTicket,
        condition_seeds: Vec<ConditionSeed>,
        formula_seeds: Vec<FormulaSeed>,
    ) -> bool {
        if ticket.0 != self.load_seq {
            return false;
        }

        // Install formulas in declared-order sequence, re-enumerated densely.
        // The declared values also key tag resolution, so a sparse seed
        // numbering still lands on the right rows.
        let mut formula_seeds = formula_seeds;
        formula_seeds.sort_by_key(|s| s.order);

        self.formulas.clear();
        let mut by_order: FxHashMap<u32, RowId> = FxHashMap::default();
        for seed in formula_seeds {
            let FormulaSeed {
                output_variable,
                expression,
                order,
                extra1,
                extra2,
            } = seed;
            let id = self.formulas.add_with(|id| FormulaRow {
                id,
                output_variable,
                expression,
                extra1,
                extra2,
            });
            by_order.entry(order).or_insert(id);
        }
        self.orders.rebuild(self.formulas.rows());

        self.conditions.clear();
        for seed in condition_seeds {
            let ConditionSeed {
                condition_expr,
                failure_handling,
                impact_tags,
            } = seed;
            let impact = remap::resolve_seed_tags(&impact_tags, &by_order);
            self.conditions.add_with(|id| ConditionRow {
                id,
                condition_expr,
                failure_handling,
                impact,
            });
        }

        self.emit(BoardEvent::DataLoaded);
        self.emit(BoardEvent::RowsChanged(Table::Conditions));
        self.emit(BoardEvent::RowsChanged(Table::Formulas));
        true
    }

    /// Clear selectors, collections, and every session. Outstanding fetch
    /// tickets are invalidated as a side effect.
    pub fn reset_all(&mut self) {
        self.device = None;
        self.data_type = None;
        self.load_seq += 1;
        self.conditions.clear();
        self.formulas.clear();
        self.orders.clear();
        self.editor.to_idle();
        self.condition_selection.clear();
        self.formula_selection.clear();
        self.emit(BoardEvent::Reset);
    }

    // =========================================================================
    // Row creation
    // =========================================================================

    pub fn add_condition(&mut self) -> RowId {
        let id = self.conditions.add();
        self.emit(BoardEvent::RowsChanged(Table::Conditions));
        id
    }

    /// Append a formula at order N+1. Prior orders are untouched.
    pub fn add_formula(&mut self) -> RowId {
        let id = self.formulas.add();
        let mapping = self.orders.rebuild(self.formulas.rows());
        debug_assert!(mapping.is_identity());
        self.emit(BoardEvent::RowsChanged(Table::Formulas));
        id
    }

    // =========================================================================
    // Cell editing
    // =========================================================================

    pub fn start_condition_edit(
        &mut self,
        row: RowId,
        field: ConditionField,
    ) -> Result<(), EditError> {
        self.prepare_session_start()?;
        let current = {
            let r = self
                .conditions
                .get(row)
                .ok_or(EditError::UnknownRow(row))?;
            match field {
                ConditionField::ConditionExpr => r.condition_expr.clone(),
                ConditionField::FailureHandling => r.failure_handling.clone(),
            }
        };
        self.editor.begin_condition_edit(row, field, current);
        Ok(())
    }

    pub fn start_formula_edit(&mut self, row: RowId, field: FormulaField) -> Result<(), EditError> {
        self.prepare_session_start()?;
        let current = {
            let r = self.formulas.get(row).ok_or(EditError::UnknownRow(row))?;
            match field {
                FormulaField::OutputVariable => r.output_variable.clone(),
                FormulaField::Expression => r.expression.clone(),
            }
        };
        self.editor.begin_formula_edit(row, field, current);
        Ok(())
    }

    /// Clear the way for a new session: an active association exits
    /// (selection discarded); a committable edit commits as a blur would;
    /// an incomplete required edit refuses to yield.
    fn prepare_session_start(&mut self) -> Result<(), EditError> {
        if self.editor.is_associating() {
            self.exit_association();
            return Ok(());
        }
        if self.editor.is_editing() {
            if self.editor.holds_incomplete_required() {
                return Err(EditError::EditInProgress);
            }
            self.commit_edit()?;
        }
        Ok(())
    }

    /// Overwrite the in-flight draft.
    pub fn set_draft(&mut self, value: impl Into<String>) -> Result<(), EditError> {
        if self.editor.set_draft(value.into()) {
            Ok(())
        } else {
            Err(EditError::NoActiveSession)
        }
    }

    /// The only exit from an edit session (enter/defocus). An empty draft
    /// on a required field is rejected and the session stays open; there is
    /// no separate cancel. Commit outside a session is a no-op.
    pub fn commit_edit(&mut self) -> Result<(), EditError> {
        match self.editor.state().clone() {
            EditorState::Idle | EditorState::Associating { .. } => Ok(()),
            EditorState::EditingCondition { row, field, draft } => {
                if field.is_required() && draft.trim().is_empty() {
                    return Err(EditError::RequiredFieldEmpty {
                        field: field.name(),
                    });
                }
                let r = self
                    .conditions
                    .get_mut(row)
                    .ok_or(EditError::UnknownRow(row))?;
                match field {
                    ConditionField::ConditionExpr => r.condition_expr = draft,
                    ConditionField::FailureHandling => r.failure_handling = draft,
                }
                self.editor.to_idle();
                self.emit(BoardEvent::RowsChanged(Table::Conditions));
                Ok(())
            }
            EditorState::EditingFormula { row, field, draft } => {
                if field.is_required() && draft.trim().is_empty() {
                    return Err(EditError::RequiredFieldEmpty {
                        field: field.name(),
                    });
                }
                let r = self
                    .formulas
                    .get_mut(row)
                    .ok_or(EditError::UnknownRow(row))?;
                match field {
                    FormulaField::OutputVariable => r.output_variable = draft,
                    FormulaField::Expression => r.expression = draft,
                }
                self.editor.to_idle();
                self.emit(BoardEvent::RowsChanged(Table::Formulas));
                Ok(())
            }
        }
    }

    /// Write both free-text extras directly. The secondary dialog that edits
    /// these bypasses the cell edit sessions entirely.
    pub fn update_extra_fields(
        &mut self,
        row: RowId,
        extra1: String,
        extra2: String,
    ) -> Result<(), EditError> {
        let r = self
            .formulas
            .get_mut(row)
            .ok_or(EditError::UnknownRow(row))?;
        r.extra1 = extra1;
        r.extra2 = extra2;
        self.emit(BoardEvent::RowsChanged(Table::Formulas));
        Ok(())
    }

    // =========================================================================
    // Tag association
    // =========================================================================

    /// Enter association for a condition, pre-selecting its current impact
    /// set in the formula table. Re-invoking for the same condition exits
    /// without writing; a different condition switches the session to it.
    pub fn start_association(&mut self, condition: RowId) -> Result<(), EditError> {
        if self.editor.is_editing() {
            return Err(EditError::EditInProgress);
        }
        if self.editor.associating_condition() == Some(condition) {
            self.exit_association();
            return Ok(());
        }
        if self.editor.is_associating() {
            self.exit_association();
        }
        let picks: Vec<RowId> = self
            .conditions
            .get(condition)
            .ok_or(EditError::UnknownRow(condition))?
            .impact
            .iter()
            .copied()
            .collect();
        self.formula_selection.replace(picks);
        self.editor.begin_association(condition);
        Ok(())
    }

    /// Toggle a candidate formula while associating.
    pub fn toggle_association_pick(&mut self, formula: RowId) -> Result<bool, EditError> {
        if !self.editor.is_associating() {
            return Err(EditError::NoActiveSession);
        }
        if !self.formulas.contains(formula) {
            return Err(EditError::UnknownRow(formula));
        }
        Ok(self.formula_selection.toggle(formula))
    }

    /// Write the picked set into the condition and exit. Refused with a
    /// warning when nothing is picked.
    pub fn confirm_association(&mut self) -> Result<(), EditError> {
        let condition = self
            .editor
            .associating_condition()
            .ok_or(EditError::NoActiveSession)?;
        if self.formula_selection.is_empty() {
            return Err(EditError::NothingPicked);
        }
        let impact: BTreeSet<RowId> = self.formula_selection.ids().into_iter().collect();
        let r = self
            .conditions
            .get_mut(condition)
            .ok_or(EditError::UnknownRow(condition))?;
        r.impact = impact;
        self.exit_association();
        self.emit(BoardEvent::RowsChanged(Table::Conditions));
        Ok(())
    }

    fn exit_association(&mut self) {
        self.editor.to_idle();
        self.formula_selection.clear();
    }

    // =========================================================================
    // Selection and batch delete
    // =========================================================================

    pub fn toggle_condition_selected(&mut self, row: RowId) -> Result<bool, EditError> {
        if self.editor.is_editing() {
            return Err(EditError::EditInProgress);
        }
        if !self.conditions.contains(row) {
            return Err(EditError::UnknownRow(row));
        }
        Ok(self.condition_selection.toggle(row))
    }

    /// Checkbox toggle on the formula table. While associating this is the
    /// pick mechanism; while editing it is refused like every selection
    /// change.
    pub fn toggle_formula_selected(&mut self, row: RowId) -> Result<bool, EditError> {
        if self.editor.is_editing() {
            return Err(EditError::EditInProgress);
        }
        if !self.formulas.contains(row) {
            return Err(EditError::UnknownRow(row));
        }
        Ok(self.formula_selection.toggle(row))
    }

    /// Delete checked condition rows. Nothing references condition identity,
    /// so no renumbering follows; an association session targeting a deleted
    /// condition exits with it.
    pub fn delete_selected_conditions(&mut self) -> Result<usize, EditError> {
        if self.editor.is_editing() {
            return Err(EditError::EditInProgress);
        }
        if self.condition_selection.is_empty() {
            return Ok(0);
        }
        if let Some(c) = self.editor.associating_condition() {
            if self.condition_selection.contains(c) {
                self.exit_association();
            }
        }
        let removed = self.conditions.remove_set(self.condition_selection.as_set());
        self.condition_selection.clear();
        self.emit(BoardEvent::RowsChanged(Table::Conditions));
        Ok(removed)
    }

    /// Delete checked formula rows, renumber the survivors from 1, and prune
    /// every condition's impact set — one atomic step, so no observer ever
    /// sees a dangling tag.
    pub fn delete_selected_formulas(&mut self) -> Result<usize, EditError> {
        if self.editor.is_editing() {
            return Err(EditError::EditInProgress);
        }
        if self.editor.is_associating() {
            return Err(EditError::AssociationInProgress);
        }
        if self.formula_selection.is_empty() {
            return Ok(0);
        }
        let removed = self.formulas.remove_set(self.formula_selection.as_set());
        let mapping = self.orders.rebuild(self.formulas.rows());
        let pruned = remap::prune(self.conditions.rows_mut(), &self.orders);
        self.formula_selection.clear();
        self.emit(BoardEvent::RowsChanged(Table::Formulas));
        self.emit(BoardEvent::OrdersRemapped(mapping));
        if pruned {
            self.emit(BoardEvent::RowsChanged(Table::Conditions));
        }
        Ok(removed)
    }

    // =========================================================================
    // Reorder
    // =========================================================================

    /// Apply a drag outcome: relocate the row so it lands at the requested
    /// 1-based order, then re-enumerate. Dropping a row onto its own
    /// position is a no-op. Refused while a cell edit is open (the gesture
    /// layer disables dragging then, and the engine holds the same line).
    pub fn move_formula(&mut self, outcome: MoveOutcome) -> Result<(), EditError> {
        if self.editor.is_editing() {
            return Err(EditError::EditInProgress);
        }
        let Some(from) = self.formulas.position(outcome.row) else {
            return Err(EditError::UnknownRow(outcome.row));
        };
        let target = (outcome.target_order.max(1) as usize - 1).min(self.formulas.len() - 1);
        if from == target {
            return Ok(());
        }
        self.formulas.move_to(outcome.row, target);
        let mapping = self.orders.rebuild(self.formulas.rows());
        self.emit(BoardEvent::RowsChanged(Table::Formulas));
        self.emit(BoardEvent::OrdersRemapped(mapping));
        Ok(())
    }

    // =========================================================================
    // Read access
    // =========================================================================

    pub fn conditions(&self) -> &[ConditionRow] {
        self.conditions.rows()
    }

    pub fn formulas(&self) -> &[FormulaRow] {
        self.formulas.rows()
    }

    pub fn orders(&self) -> &OrderRegistry {
        &self.orders
    }

    pub fn editor(&self) -> &EditorCoordinator {
        &self.editor
    }

    pub fn condition_selection(&self) -> &SelectionManager {
        &self.condition_selection
    }

    pub fn formula_selection(&self) -> &SelectionManager {
        &self.formula_selection
    }

    /// A condition's rendered tag list (ascending order numbers).
    pub fn rendered_tags(&self, condition: RowId) -> Option<String> {
        self.conditions
            .get(condition)
            .map(|r| remap::render_tags(&r.impact, &self.orders))
    }

    /// Serialize the committed state back to the wire's seed form.
    pub fn export_rows(&self) -> (Vec<ConditionSeed>, Vec<FormulaSeed>) {
        let conditions = self
            .conditions
            .rows()
            .iter()
            .map(|r| ConditionSeed {
                condition_expr: r.condition_expr.clone(),
                failure_handling: r.failure_handling.clone(),
                impact_tags: remap::render_tags(&r.impact, &self.orders),
            })
            .collect();
        let formulas = self
            .formulas
            .rows()
            .iter()
            .enumerate()
            .map(|(idx, r)| FormulaSeed {
                output_variable: r.output_variable.clone(),
                expression: r.expression.clone(),
                order: idx as u32 + 1,
                extra1: r.extra1.clone(),
                extra2: r.extra2.clone(),
            })
            .collect();
        (conditions, formulas)
    }

    // =========================================================================
    // Events
    // =========================================================================

    fn emit(&mut self, event: BoardEvent) {
        self.events.push(event);
    }

    /// Drain the notifications accumulated since the last drain.
    pub fn take_events(&mut self) -> Vec<BoardEvent> {
        std::mem::take(&mut self.events)
    }
}
