//! Row identity and the two row kinds.
//!
//! A `RowId` uniquely identifies a row within its table for the lifetime of
//! the data set. Ids are allocated monotonically and never reused, so a
//! deleted row's id can never come back to life and silently re-attach
//! dangling references.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Stable row identity (opaque, never reused after deletion).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowId(pub u64);

impl RowId {
    pub fn from_raw(raw: u64) -> Self {
        RowId(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which of the two tables a row or event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Conditions,
    Formulas,
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Table::Conditions => write!(f, "conditions"),
            Table::Formulas => write!(f, "formulas"),
        }
    }
}

/// A row owned by a `RowStore`.
pub trait TableRow {
    /// Create an empty row with the given identity.
    fn fresh(id: RowId) -> Self;

    fn id(&self) -> RowId;
}

/// A guard row: condition expression, failure handling, impacted formulas.
///
/// `impact` holds stable ids, not order numbers. The comma-joined numeric
/// form the outside world sees is derived from the order registry at
/// render/serialize time, so a skipped remap step cannot exist as a bug
/// class here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionRow {
    pub id: RowId,
    /// Required: must be non-empty to commit an edit.
    pub condition_expr: String,
    /// Optional free text shown when the condition fails.
    pub failure_handling: String,
    /// Impacted formula rows, by stable id.
    pub impact: BTreeSet<RowId>,
}

impl TableRow for ConditionRow {
    fn fresh(id: RowId) -> Self {
        Self {
            id,
            condition_expr: String::new(),
            failure_handling: String::new(),
            impact: BTreeSet::new(),
        }
    }

    fn id(&self) -> RowId {
        self.id
    }
}

/// An output row: variable, expression, two free-text extras.
///
/// The row's order number is *not* stored here: it is the row's 1-based
/// position in the formula store, indexed by the `OrderRegistry`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaRow {
    pub id: RowId,
    /// Required: must be non-empty to commit an edit.
    pub output_variable: String,
    /// Optional formula body.
    pub expression: String,
    /// Free-text pair, written outside any edit session.
    pub extra1: String,
    pub extra2: String,
}

impl TableRow for FormulaRow {
    fn fresh(id: RowId) -> Self {
        Self {
            id,
            output_variable: String::new(),
            expression: String::new(),
            extra1: String::new(),
            extra2: String::new(),
        }
    }

    fn id(&self) -> RowId {
        self.id
    }
}

/// Editable cells of a condition row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionField {
    ConditionExpr,
    FailureHandling,
}

impl ConditionField {
    /// True if an empty committed value is rejected.
    pub fn is_required(&self) -> bool {
        matches!(self, ConditionField::ConditionExpr)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ConditionField::ConditionExpr => "condition_expr",
            ConditionField::FailureHandling => "failure_handling",
        }
    }
}

impl std::str::FromStr for ConditionField {
    type Err = crate::error::EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "condition_expr" => Ok(ConditionField::ConditionExpr),
            "failure_handling" => Ok(ConditionField::FailureHandling),
            other => Err(crate::error::EditError::InvalidField(other.to_string())),
        }
    }
}

/// Editable cells of a formula row.
///
/// The extras are deliberately absent: they are written through
/// `RuleBoard::update_extra_fields`, not through an edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaField {
    OutputVariable,
    Expression,
}

impl FormulaField {
    pub fn is_required(&self) -> bool {
        matches!(self, FormulaField::OutputVariable)
    }

    pub fn name(&self) -> &'static str {
        match self {
            FormulaField::OutputVariable => "output_variable",
            FormulaField::Expression => "expression",
        }
    }
}

impl std::str::FromStr for FormulaField {
    type Err = crate::error::EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "output_variable" => Ok(FormulaField::OutputVariable),
            "expression" => Ok(FormulaField::Expression),
            other => Err(crate::error::EditError::InvalidField(other.to_string())),
        }
    }
}
