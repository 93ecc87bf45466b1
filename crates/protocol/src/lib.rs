//! Rule service protocol — v1 frozen wire format.
//!
//! Canonical JSON types for the three endpoints the rule editor talks to.
//! Every response body is wrapped in a `{"result": ...}` envelope; row
//! seeds travel as positional tuples, not objects. The wire format is
//! frozen: changes require a version bump in `PROTOCOL_VERSION` and
//! backward-compatibility handling.
//!
//! # Endpoints
//!
//! - `GET  /formula` → `Envelope<CatalogResult>` — device and data-type
//!   catalogs as code→label maps.
//! - `POST /formula` (`RowsQuery`) → `Envelope<RowsResult>` — the seed rows
//!   for one device/type pair.
//! - `POST /formula/submit` (`SubmitRequest`) → `Envelope<SubmitResult>`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Current protocol version. Increment for breaking changes.
pub const PROTOCOL_VERSION: u32 = 1;

/// Response envelope shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub result: T,
}

// =============================================================================
// Catalog
// =============================================================================

/// Device and data-type catalogs, code → display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogResult {
    pub device: BTreeMap<String, String>,
    #[serde(rename = "type")]
    pub data_type: BTreeMap<String, String>,
}

// =============================================================================
// Rows
// =============================================================================

/// Body of the rows query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowsQuery {
    pub device: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

/// One condition row on the wire:
/// `(condition_expr, failure_handling, impact_tags_text)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionTuple(pub String, pub String, pub String);

/// One formula row on the wire:
/// `(output_variable, expression, order, extra1, extra2)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaTuple(pub String, pub String, pub u32, pub String, pub String);

/// Seed rows for one device/type pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowsResult {
    #[serde(default)]
    pub if_symbols: Vec<ConditionTuple>,
    #[serde(default)]
    pub formulas: Vec<FormulaTuple>,
}

// =============================================================================
// Submit
// =============================================================================

/// Body of the submit call: the edited data set in seed form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub device: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub if_symbols: Vec<ConditionTuple>,
    pub formulas: Vec<FormulaTuple>,
}

/// Submit acknowledgment. No contract beyond success/failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResult {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_parses_the_service_shape() {
        let json = r#"{
            "result": {
                "device": {"d1": "Press 7", "d2": "Mill 2"},
                "type": {"t1": "vibration"}
            }
        }"#;
        let envelope: Envelope<CatalogResult> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.result.device["d1"], "Press 7");
        assert_eq!(envelope.result.data_type["t1"], "vibration");
    }

    #[test]
    fn rows_parse_as_positional_tuples() {
        // Formula tuples carry a bare number in third position; condition
        // tuples are all strings. Both shapes are frozen.
        let json = r#"{
            "result": {
                "if_symbols": [["x > 3", "halt", "1,2"]],
                "formulas": [["out", "x * 2", 1, "trend", "trends"], ["y", "", 2, "", ""]]
            }
        }"#;
        let envelope: Envelope<RowsResult> = serde_json::from_str(json).unwrap();
        let rows = envelope.result;
        assert_eq!(rows.if_symbols[0].2, "1,2");
        assert_eq!(rows.formulas[0].2, 1);
        assert_eq!(rows.formulas[1].0, "y");
    }

    #[test]
    fn rows_fields_default_when_absent() {
        let envelope: Envelope<RowsResult> = serde_json::from_str(r#"{"result": {}}"#).unwrap();
        assert!(envelope.result.if_symbols.is_empty());
        assert!(envelope.result.formulas.is_empty());
    }

    #[test]
    fn query_uses_the_reserved_type_key() {
        let query = RowsQuery {
            device: "d1".into(),
            data_type: "t1".into(),
        };
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json, serde_json::json!({"device": "d1", "type": "t1"}));
    }

    #[test]
    fn submit_round_trips() {
        let request = SubmitRequest {
            device: "d1".into(),
            data_type: "t1".into(),
            if_symbols: vec![ConditionTuple("x > 0".into(), String::new(), "1".into())],
            formulas: vec![FormulaTuple(
                "out".into(),
                "x".into(),
                1,
                String::new(),
                String::new(),
            )],
        };
        let json = serde_json::to_string(&request).unwrap();
        let back: SubmitRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, request);
    }
}
