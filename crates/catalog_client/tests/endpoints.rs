// Endpoint tests against a mock rule service.
// Run with: cargo test -p ruleboard-catalog-client --test endpoints

use httpmock::prelude::*;
use serde_json::json;

use ruleboard_catalog_client::{CatalogClient, ClientError};
use ruleboard_protocol::{ConditionTuple, FormulaTuple, SubmitRequest};

#[test]
fn fetch_catalog_unwraps_the_envelope() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/formula");
        then.status(200).json_body(json!({
            "result": {
                "device": {"d1": "Press 7"},
                "type": {"t1": "vibration", "t2": "temperature"}
            }
        }));
    });

    let client = CatalogClient::new(server.base_url());
    let catalog = client.fetch_catalog().unwrap();

    mock.assert();
    assert_eq!(catalog.device["d1"], "Press 7");
    assert_eq!(catalog.data_type.len(), 2);
}

#[test]
fn fetch_rows_posts_the_pair_and_parses_tuples() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/formula")
            .json_body(json!({"device": "d1", "type": "t1"}));
        then.status(200).json_body(json!({
            "result": {
                "if_symbols": [["x > 3", "halt", "1,2"]],
                "formulas": [
                    ["out", "x * 2", 1, "", ""],
                    ["y", "", 2, "trend", "trends"]
                ]
            }
        }));
    });

    let client = CatalogClient::new(server.base_url());
    let rows = client.fetch_rows("d1", "t1").unwrap();

    mock.assert();
    assert_eq!(rows.if_symbols.len(), 1);
    assert_eq!(rows.if_symbols[0].2, "1,2");
    assert_eq!(rows.formulas[1].2, 2);
    assert_eq!(rows.formulas[1].3, "trend");
}

#[test]
fn submit_posts_the_edited_set() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/formula/submit")
            .body_includes(r#""device":"d1""#);
        then.status(200).json_body(json!({"result": {"ok": true}}));
    });

    let client = CatalogClient::new(server.base_url());
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
    client.submit(&request).unwrap();
    mock.assert();
}

#[test]
fn submit_failure_ack_is_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/formula/submit");
        then.status(200)
            .json_body(json!({"result": {"ok": false, "message": "duplicate variable"}}));
    });

    let client = CatalogClient::new(server.base_url());
    let request = SubmitRequest {
        device: "d1".into(),
        data_type: "t1".into(),
        if_symbols: vec![],
        formulas: vec![],
    };
    let err = client.submit(&request).unwrap_err();
    assert!(matches!(err, ClientError::Rejected(msg) if msg == "duplicate variable"));
}

#[test]
fn http_errors_carry_the_status() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/formula");
        then.status(500).body("boom");
    });

    let client = CatalogClient::new(server.base_url());
    match client.fetch_catalog() {
        Err(ClientError::Http(500, body)) => assert_eq!(body, "boom"),
        other => panic!("expected Http(500), got {:?}", other.err()),
    }
}

#[test]
fn bad_request_maps_to_validation() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/formula");
        then.status(400).body("unknown device");
    });

    let client = CatalogClient::new(server.base_url());
    match client.fetch_rows("nope", "t1") {
        Err(ClientError::Validation(msg)) => assert_eq!(msg, "unknown device"),
        other => panic!("expected Validation, got {:?}", other.err()),
    }
}
