#![allow(dead_code)]

use dispute_gate_core::{
    handle_validate_request, read_gate_file, Bindings, EvaluationResult, GateDefinition,
};
use serde_json::Value as Json;

pub fn load_gate(name: &str) -> GateDefinition {
    let path = format!("{}/gates/{}.gate.json", env!("CARGO_MANIFEST_DIR"), name);
    read_gate_file(&path).unwrap_or_else(|e| panic!("loading {}: {}", path, e))
}

pub fn bindings(json: Json) -> Bindings {
    Bindings::from_json(&json).unwrap()
}

pub fn run(gate: &GateDefinition, params: Json, mocks: Json) -> EvaluationResult {
    handle_validate_request(gate, &bindings(params), &bindings(mocks)).unwrap()
}

/// Asserts the outcome the monitor suite expects: no exceptions, and an alert
/// only when `should_fire`.
pub fn assert_alert(result: &EvaluationResult, should_fire: bool) {
    let report = result.trace_lines().join("\n");
    assert!(
        result.exceptions.is_empty(),
        "unexpected exceptions {:?}\n{}",
        result.exceptions,
        report
    );
    assert_eq!(!result.failed.is_empty(), should_fire, "failed: {:?}\n{}", result.failed, report);
}
