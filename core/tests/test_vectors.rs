//! Verify response classification against the JSON vectors in `test-vectors/`.
//!
//! Each case describes a simulated response and the expected outcome. Cases
//! run twice: through `parse_response` directly, and through `rest_call` with
//! a scripted transport to check the audit level.

mod common;

use std::sync::Arc;

use avatax_core::{ApiResponse, HttpResponse, LogLevel, RestCall};
use common::{client, MemorySink, ScriptedTransport};
use serde_json::Value;

fn simulated_response(case: &Value) -> HttpResponse {
    let mut headers = vec![(
        "content-type".to_string(),
        case["content_type"].as_str().unwrap().to_string(),
    )];
    if let Some(length) = case["content_length"].as_str() {
        headers.push(("content-length".to_string(), length.to_string()));
    }
    HttpResponse {
        status: case["status"].as_u64().unwrap() as u16,
        headers,
        body: case["body"].as_str().unwrap().as_bytes().to_vec(),
    }
}

fn parse_level(s: &str) -> LogLevel {
    match s {
        "info" => LogLevel::Info,
        "error" => LogLevel::Error,
        other => panic!("unknown level: {other}"),
    }
}

#[tokio::test]
async fn classification_vectors() {
    let raw = include_str!("../../test-vectors/classification.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let expected = &case["expected"];
        let response = simulated_response(case);

        let transport = Arc::new(ScriptedTransport::with_response(response.clone()));
        let sink = Arc::new(MemorySink::default());
        let dispatcher = client(transport, sink.clone(), |b| b);

        // Verify classification
        let parsed = dispatcher.parse_response::<Value>(&response);
        match expected["outcome"].as_str().unwrap() {
            "empty" => assert!(parsed.unwrap().is_empty(), "{name}: empty"),
            "text" => {
                let parsed = parsed.unwrap();
                assert_eq!(parsed.text(), expected["text"].as_str(), "{name}: text");
            }
            "data" => match parsed.unwrap() {
                ApiResponse::Data(data) => assert_eq!(data, expected["data"], "{name}: data"),
                other => panic!("{name}: expected data, got {other:?}"),
            },
            "service_error" => {
                let err = parsed.unwrap_err();
                let want = &expected["error"];
                assert_eq!(err.message, want["message"].as_str().unwrap(), "{name}: message");
                assert_eq!(err.code, want["code"].as_str().unwrap(), "{name}: code");
                assert_eq!(err.target.as_deref(), want["target"].as_str(), "{name}: target");
                assert_eq!(err.details, want["details"], "{name}: details");
            }
            "format_error" => {
                let err = parsed.unwrap_err();
                assert_eq!(err.code, "FormatException", "{name}: code");
            }
            other => panic!("{name}: unknown outcome: {other}"),
        }

        // Verify dispatch outcome and audit level
        let result = dispatcher.rest_call::<Value>(RestCall::get("/vector")).await;
        let is_failure = matches!(
            expected["outcome"].as_str().unwrap(),
            "service_error" | "format_error"
        );
        assert_eq!(result.is_err(), is_failure, "{name}: dispatch outcome");
        let lines = sink.lines();
        assert_eq!(lines.len(), 1, "{name}: audit lines");
        assert_eq!(
            lines[0].0,
            parse_level(expected["level"].as_str().unwrap()),
            "{name}: audit level"
        );
    }
}
