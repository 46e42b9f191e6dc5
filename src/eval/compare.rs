//! Comparison of two amounts.
use super::credit::decided_mode;
use super::error::EvalError;
use super::scope::Scope;
use crate::display::{Trace, TraceStep};
use crate::gate::CompareCheck;
use crate::result::Violation;

pub(crate) fn compare<'a>(
    check: &'a CompareCheck,
    scope: &Scope<'a>,
    trace: &mut Trace,
) -> Result<Vec<Violation>, EvalError> {
    if let Some(selector) = &check.mode {
        if decided_mode(selector, scope, trace)?.is_none() {
            return Ok(Vec::new());
        }
    }
    let lhs = scope.amount(&check.left, trace)?;
    let rhs = scope.amount(&check.right, trace)?;
    let holds = check.op.holds(lhs.cmp(&rhs));
    trace.record(
        TraceStep::Compare,
        format!(
            "{} {} {}: {} vs {} -> {}",
            check.left,
            check.op,
            check.right,
            lhs,
            rhs,
            if holds { "holds" } else { "violated" }
        ),
    );
    if holds {
        return Ok(Vec::new());
    }
    Ok(vec![Violation::Comparison {
        left: check.left.to_string(),
        op: check.op,
        right: check.right.to_string(),
        lhs,
        rhs,
    }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{resolve, Bindings};
    use crate::gate::{Check, GateDefinition};
    use crate::value::U256;
    use rstest::rstest;
    use serde_json::json;

    fn evaluate(assertion: serde_json::Value, mocks: serde_json::Value) -> (Result<Vec<Violation>, EvalError>, Trace) {
        let g: GateDefinition = serde_json::from_value(json!({
            "name": "cmp",
            "assertions": [assertion]
        }))
        .unwrap();
        let ctx = resolve(&Bindings::new(), &Bindings::from_json(&mocks).unwrap());
        let scope = Scope::new(&g, &ctx);
        let Check::Compare(check) = &g.assertions[0].check else { unreachable!() };
        let mut trace = Trace::new();
        let result = compare(check, &scope, &mut trace);
        (result, trace)
    }

    fn balance_check(op: &str) -> serde_json::Value {
        json!({
            "name": "balance",
            "kind": "compare",
            "left": {"ref": "balance"},
            "op": op,
            "right": {"field": {"of": {"ref": "totalCredit"}, "index": 0}}
        })
    }

    fn run(op: &str, left: u64, right: u64) -> Result<Vec<Violation>, EvalError> {
        evaluate(balance_check(op), json!({"balance": left, "totalCredit": [right, 0]})).0
    }

    #[rstest]
    #[case("ge", 100, 100, true)]
    #[case("ge", 99, 100, false)]
    #[case("eq", 5, 5, true)]
    #[case("eq", 5, 6, false)]
    #[case("le", 7, 8, true)]
    #[case("lt", 8, 8, false)]
    fn test_compare_amounts(#[case] op: &str, #[case] left: u64, #[case] right: u64, #[case] holds: bool) {
        let violations = run(op, left, right).unwrap();
        assert_eq!(violations.is_empty(), holds);
    }

    #[test]
    fn test_violation_names_both_sides() {
        let violations = run("ge", 100, 150).unwrap();
        assert_eq!(
            violations,
            vec![Violation::Comparison {
                left: "balance".into(),
                op: crate::gate::CmpOp::Ge,
                right: "totalCredit[0]".into(),
                lhs: U256::from(100),
                rhs: U256::from(150),
            }]
        );
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 1)]
    #[case(2, 1)]
    fn test_undecided_mode_skips_comparison(#[case] mode: u64, #[case] expected: usize) {
        let mut check = balance_check("ge");
        check["mode"] = json!({"ref": "bondDistributionMode"});
        let (result, trace) = evaluate(
            check,
            json!({"bondDistributionMode": mode, "balance": 10, "totalCredit": [500, 1]}),
        );
        assert_eq!(result.unwrap().len(), expected);
        let compared = trace
            .into_entries()
            .iter()
            .any(|e| e.step == TraceStep::Compare);
        assert_eq!(compared, mode != 0);
    }

    #[test]
    fn test_undecided_mode_reads_neither_side() {
        let mut check = balance_check("ge");
        check["mode"] = json!({"ref": "bondDistributionMode"});
        let (result, _) = evaluate(check, json!({"bondDistributionMode": 0}));
        assert!(result.unwrap().is_empty());
    }

    #[test]
    fn test_unknown_mode_raises_before_comparing() {
        let mut check = balance_check("ge");
        check["mode"] = json!({"ref": "bondDistributionMode"});
        let (result, _) = evaluate(
            check,
            json!({"bondDistributionMode": 9, "balance": 10, "totalCredit": [500, 1]}),
        );
        assert_eq!(result.unwrap_err(), EvalError::UnknownMode { value: "9".into() });
    }
}
