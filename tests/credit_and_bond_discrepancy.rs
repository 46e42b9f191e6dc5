mod common;

use common::{assert_alert, load_gate, run};
use dispute_gate_core::{format_trace, Violation};
use serde_json::{json, Value as Json};

const GATE: &str = "credit_and_bond_discrepancy";
const FIRST: &str = "0x49277EE36A024120Ee218127354c4a3591dc90A9";
const SECOND: &str = "0xc96775081bcA132B0E7cbECDd0B58d9Ec07Fdaa4";

fn params() -> Json {
    json!({"disputeGame": "0x0000000000000000000000000000000000000000"})
}

fn scope() -> Json {
    // 39 hex digits, as the monitor suite supplies it; only non-emptiness matters.
    json!(["0x000000000000000000000000000000000000000"])
}

#[test]
fn test_wrong_bond_amount_fires() {
    let gate = load_gate(GATE);
    let result = run(
        &gate,
        params(),
        json!({
            "addressesInTrace": scope(),
            "delayedWeth": "0x0000000000000000000000000000000000000000",
            "creditCalls": [[FIRST], [SECOND]],
            "unlocks": [[FIRST, 1000000], [SECOND, 1000000]],
            "withdraws": [],
            "withdrawList": [],
            "winnersAndBonds": [[FIRST, 1000000], [SECOND, 900000]]
        }),
    );
    assert_alert(&result, true);
    assert_eq!(result.failed.len(), 1);
    let violations = result.failed[0].violations();
    assert_eq!(violations.len(), 1);
    assert!(matches!(&violations[0], Violation::AmountMismatch { settlement, .. } if settlement == "unlock"));
}

#[test]
fn test_missing_unlock_fires() {
    let gate = load_gate(GATE);
    let result = run(
        &gate,
        params(),
        json!({
            "addressesInTrace": scope(),
            "delayedWeth": "0x0000000000000000000000000000000000000000",
            "creditCalls": [[FIRST], [SECOND]],
            "unlocks": [[FIRST, 1000000]],
            "withdraws": [],
            "withdrawList": [],
            "winnersAndBonds": [[FIRST, 1000000], [SECOND, 1000000]]
        }),
    );
    assert_alert(&result, true);
    let violations = result.failed[0].violations();
    assert_eq!(violations.len(), 1);
    assert!(matches!(&violations[0], Violation::MissingSettlement { .. }));
    assert!(result.failed[0].message().contains("0xc96775081bca132b0e7cbecdd0b58d9ec07fdaa4"));
}

#[test]
fn test_missing_withdraw_fires() {
    let gate = load_gate(GATE);
    let result = run(
        &gate,
        params(),
        json!({
            "addressesInTrace": scope(),
            "delayedWeth": "0x0000000000000000000000000000000000000000",
            "creditCalls": [[FIRST], [SECOND]],
            "unlocks": [],
            "withdraws": [[FIRST, 1000000]],
            "winnersAndBonds": [],
            "foundUnlocks": []
        }),
    );
    assert_alert(&result, true);
}

#[test]
fn test_missing_withdraw_and_unlock_fires() {
    let gate = load_gate(GATE);
    let result = run(
        &gate,
        params(),
        json!({
            "addressesInTrace": scope(),
            "delayedWeth": "0x0000000000000000000000000000000000000000",
            "creditCalls": [[FIRST], [SECOND]],
            "unlocks": [],
            "withdraws": [],
            "withdrawList": [],
            "winnersAndBonds": []
        }),
    );
    assert_alert(&result, true);
    assert_eq!(result.failed.len(), 1, "one outcome per assertion");
    assert_eq!(result.failed[0].violations().len(), 2);
}

#[test]
fn test_correct_amounts_and_addresses_stay_quiet() {
    let gate = load_gate(GATE);
    let mocks = json!({
        "addressesInTrace": scope(),
        "delayedWeth": "0x0000000000000000000000000000000000000000",
        "creditCalls": [[FIRST], [SECOND]],
        "unlocks": [[FIRST, 1000000], [SECOND, 1000000]],
        "withdraws": [[FIRST, 1000000], [SECOND, 1000000]],
        "winnersAndBonds": [[FIRST, 1000000], [SECOND, 1000000]]
    });
    let first = run(&gate, params(), mocks.clone());
    assert_alert(&first, false);

    let second = run(&gate, params(), mocks);
    assert_eq!(first, second);
    assert!(format_trace(&gate.name, &first.trace).contains("claimant_credit_settled"));
}

#[test]
fn test_no_filter_address_stays_quiet() {
    let gate = load_gate(GATE);
    let result = run(
        &gate,
        params(),
        json!({
            "delayedWeth": "0x0000000000000000000000000000000000000000",
            "creditCalls": [[FIRST], [SECOND]],
            "unlocks": [[FIRST, 1000000]],
            "withdraws": [],
            "withdrawList": [],
            "winnersAndBonds": [[FIRST, 1000000], [SECOND, 1000000]]
        }),
    );
    assert_alert(&result, false);
    assert!(result.trace_lines().iter().any(|l| l.contains("out of scope")));
}

#[test]
fn test_empty_filter_address_list_stays_quiet() {
    let gate = load_gate(GATE);
    let result = run(
        &gate,
        params(),
        json!({"addressesInTrace": [], "creditCalls": [[FIRST]]}),
    );
    assert!(result.is_clean());
}

#[test]
fn test_missing_bond_data_is_an_exception() {
    let gate = load_gate(GATE);
    let result = run(
        &gate,
        params(),
        json!({"addressesInTrace": scope(), "creditCalls": [[FIRST]], "unlocks": [[FIRST, 1]]}),
    );
    assert!(result.failed.is_empty());
    assert_eq!(result.exceptions.len(), 1);
    assert!(result.exceptions[0].message().contains("winnersAndBonds"));
}
