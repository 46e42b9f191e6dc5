//! Name lookup and expression evaluation for one request.
//!
//! The context holds what the caller supplied. The scope layers the gate's
//! declared sources over it: a name the caller did not supply is derived
//! from its `derive` expression, or falls back to its declared `default`.

use super::error::EvalError;
use crate::context::EvaluationContext;
use crate::display::{Trace, TraceStep};
use crate::gate::{Expr, GateDefinition};
use crate::value::{checked_add, checked_sub, Value, U256};
use std::borrow::Cow;

pub struct Scope<'a> {
    gate: &'a GateDefinition,
    context: &'a EvaluationContext,
}

impl<'a> Scope<'a> {
    pub fn new(gate: &'a GateDefinition, context: &'a EvaluationContext) -> Self {
        Self { gate, context }
    }

    pub fn context(&self) -> &'a EvaluationContext {
        self.context
    }

    /// Resolves a binding: caller-supplied value, then derivation, then default.
    pub fn lookup(&self, name: &str, trace: &mut Trace) -> Result<Cow<'a, Value>, EvalError> {
        if let Some(entry) = self.context.get(name) {
            trace.record(
                TraceStep::Resolve,
                format!("{} <- {} {}", name, entry.origin.as_str(), entry.value.summary()),
            );
            return Ok(Cow::Borrowed(&entry.value));
        }

        if let Some(decl) = self.gate.source(name) {
            if let Some(expr) = &decl.derive {
                let value = self.eval(expr, trace)?.into_owned();
                trace.record(
                    TraceStep::Derive,
                    format!("{} = {} -> {}", name, expr, value.summary()),
                );
                return Ok(Cow::Owned(value));
            }
            if let Some(default) = &decl.default {
                trace.record(
                    TraceStep::Resolve,
                    format!("{} <- default {}", name, default.summary()),
                );
                return Ok(Cow::Borrowed(default));
            }
        }

        trace.record(TraceStep::Resolve, format!("{} is not bound", name));
        Err(EvalError::MissingBinding { name: name.to_string() })
    }

    /// Evaluates an expression against the scope.
    ///
    /// Gates are validated before evaluation, so derivations are acyclic and
    /// the recursion through `lookup` terminates.
    pub fn eval(&self, expr: &'a Expr, trace: &mut Trace) -> Result<Cow<'a, Value>, EvalError> {
        let located = |e: EvalError| e.within(&expr.to_string());
        match expr {
            Expr::Ref(name) => self.lookup(name, trace),
            Expr::Lit(value) => Ok(Cow::Borrowed(value)),
            Expr::Field { of, index } => {
                let base = self.eval(of, trace)?;
                project(base, |v| v.index(*index)).map_err(located)
            }
            Expr::Path { of, path } => {
                let base = self.eval(of, trace)?;
                project(base, |v| v.at_path(path)).map_err(located)
            }
            Expr::Pluck { of, path } => {
                let base = self.eval(of, trace)?;
                let plucked = base
                    .items()
                    .and_then(|items| {
                        items
                            .iter()
                            .map(|item| item.at_path(path).cloned())
                            .collect::<Result<Vec<_>, _>>()
                    })
                    .map_err(located)?;
                Ok(Cow::Owned(Value::Sequence(plucked)))
            }
            Expr::Where { of, path, equals } => {
                let base = self.eval(of, trace)?;
                let target = self.eval(equals, trace)?;
                let kept = base
                    .filter(|record| Ok(record.at_path(path)? == target.as_ref()))
                    .map_err(located)?;
                trace.record(
                    TraceStep::Derive,
                    format!(
                        "{} kept {} of {} records",
                        expr,
                        kept.len().unwrap_or(0),
                        base.len().unwrap_or(0)
                    ),
                );
                Ok(Cow::Owned(kept))
            }
            Expr::Sum { of, path } => {
                let base = self.eval(of, trace)?;
                let total = base.sum(path).map_err(located)?;
                Ok(Cow::Owned(Value::Integer(total)))
            }
            Expr::Len(of) => {
                let base = self.eval(of, trace)?;
                let len = base.len().map_err(located)?;
                Ok(Cow::Owned(Value::Integer(U256::from(len))))
            }
            Expr::Add(terms) => {
                let mut total = U256::zero();
                for term in terms {
                    let amount = self.eval(term, trace)?.as_integer().map_err(located)?;
                    total = checked_add(total, amount, "add").map_err(located)?;
                }
                Ok(Cow::Owned(Value::Integer(total)))
            }
            Expr::Sub(lhs, rhs) => {
                let a = self.eval(lhs, trace)?.as_integer().map_err(located)?;
                let b = self.eval(rhs, trace)?.as_integer().map_err(located)?;
                let diff = checked_sub(a, b, "sub").map_err(located)?;
                Ok(Cow::Owned(Value::Integer(diff)))
            }
        }
    }

    /// Evaluates an expression that must produce an amount.
    pub fn amount(&self, expr: &'a Expr, trace: &mut Trace) -> Result<U256, EvalError> {
        self.eval(expr, trace)?
            .as_integer()
            .map_err(|e| e.within(&expr.to_string()))
    }
}

/// Applies an accessor without cloning when the base is borrowed.
fn project<'a, F>(base: Cow<'a, Value>, access: F) -> Result<Cow<'a, Value>, EvalError>
where
    F: for<'v> Fn(&'v Value) -> Result<&'v Value, EvalError>,
{
    match base {
        Cow::Borrowed(v) => access(v).map(Cow::Borrowed),
        Cow::Owned(v) => access(&v).map(|inner| Cow::Owned(inner.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{resolve, Bindings};
    use serde_json::json;

    fn gate(value: serde_json::Value) -> GateDefinition {
        serde_json::from_value(value).unwrap()
    }

    fn mocks(value: serde_json::Value) -> Bindings {
        Bindings::from_json(&value).unwrap()
    }

    fn bond_gate() -> GateDefinition {
        gate(json!({
            "name": "bonds",
            "sources": [
                {"name": "unlocksWithSender", "default": []},
                {"name": "unlockAmounts", "derive": {"pluck": {
                    "of": {"where": {"of": {"ref": "unlocksWithSender"}, "path": [0], "equals": {"ref": "disputeGame"}}},
                    "path": [1, 1]
                }}},
                {"name": "totalUnlocked", "derive": {"sum": {"of": {"ref": "unlockAmounts"}}}}
            ],
            "assertions": []
        }))
    }

    #[test]
    fn test_derived_source_filters_and_plucks() {
        let g = bond_gate();
        let params = mocks(json!({"disputeGame": "0x00000000000000000000000000000000000000AA"}));
        let m = mocks(json!({
            "unlocksWithSender": [
                ["0x00000000000000000000000000000000000000AA", ["0x0000000000000000000000000000000000000001", 200]],
                ["0x00000000000000000000000000000000000000BB", ["0x0000000000000000000000000000000000000002", 900]],
                ["0x00000000000000000000000000000000000000aa", ["0x0000000000000000000000000000000000000003", 100]]
            ]
        }));
        let ctx = resolve(&params, &m);
        let scope = Scope::new(&g, &ctx);
        let mut trace = Trace::new();
        let total = scope.lookup("totalUnlocked", &mut trace).unwrap();
        assert_eq!(total.as_ref(), &Value::int(300));
        assert!(trace
            .into_entries()
            .iter()
            .any(|e| e.step == TraceStep::Derive && e.detail.starts_with("totalUnlocked =")));
    }

    #[test]
    fn test_mock_overrides_derivation() {
        let g = bond_gate();
        let ctx = resolve(&Bindings::new(), &mocks(json!({"unlockAmounts": [0]})));
        let scope = Scope::new(&g, &ctx);
        let mut trace = Trace::new();
        // disputeGame is unbound, but the mocked intermediate means it is never read.
        let total = scope.lookup("totalUnlocked", &mut trace).unwrap();
        assert_eq!(total.as_ref(), &Value::int(0));
    }

    #[test]
    fn test_default_used_when_nothing_supplied() {
        let g = bond_gate();
        let ctx = resolve(&Bindings::new(), &Bindings::new());
        let scope = Scope::new(&g, &ctx);
        let v = scope.lookup("unlocksWithSender", &mut Trace::new()).unwrap();
        assert_eq!(v.as_ref(), &Value::seq([]));
    }

    #[test]
    fn test_missing_inner_binding_surfaces_by_name() {
        let g = bond_gate();
        let ctx = resolve(&Bindings::new(), &Bindings::new());
        let scope = Scope::new(&g, &ctx);
        let err = scope.lookup("unlockAmounts", &mut Trace::new()).unwrap_err();
        assert_eq!(err, EvalError::MissingBinding { name: "disputeGame".into() });
    }

    #[test]
    fn test_field_of_pair_sequence() {
        let g = gate(json!({"name": "g", "assertions": []}));
        let ctx = resolve(&Bindings::new(), &mocks(json!({"totalCredit": [50, 123456]})));
        let scope = Scope::new(&g, &ctx);
        let expr = Expr::field(Expr::reference("totalCredit"), 0);
        assert_eq!(scope.amount(&expr, &mut Trace::new()).unwrap(), U256::from(50));

        let out_of_range = Expr::field(Expr::reference("totalCredit"), 2);
        let err = scope.amount(&out_of_range, &mut Trace::new()).unwrap_err();
        assert!(matches!(err, EvalError::MalformedTuple { index: 2, arity: 2, .. }));
    }

    #[test]
    fn test_sub_underflow_is_overflow_error() {
        let g = gate(json!({"name": "g", "assertions": []}));
        let ctx = resolve(&Bindings::new(), &Bindings::new());
        let scope = Scope::new(&g, &ctx);
        let expr: Expr = serde_json::from_value(json!({"sub": [{"lit": 1}, {"lit": 2}]})).unwrap();
        assert!(matches!(scope.eval(&expr, &mut Trace::new()), Err(EvalError::Overflow { .. })));
    }

    #[test]
    fn test_path_reads_nested_field_without_cloning() {
        let g = gate(json!({"name": "g", "assertions": []}));
        let ctx = resolve(
            &Bindings::new(),
            &mocks(json!({"unlock": ["0x00000000000000000000000000000000000000AA", ["0x0000000000000000000000000000000000000001", 200]]})),
        );
        let scope = Scope::new(&g, &ctx);
        let expr: Expr = serde_json::from_value(json!({"path": {"of": {"ref": "unlock"}, "path": [1, 1]}})).unwrap();
        let value = scope.eval(&expr, &mut Trace::new()).unwrap();
        assert!(matches!(value, Cow::Borrowed(_)));
        assert_eq!(value.as_ref(), &Value::int(200));

        let too_deep: Expr = serde_json::from_value(json!({"path": {"of": {"ref": "unlock"}, "path": [1, 2]}})).unwrap();
        let err = scope.eval(&too_deep, &mut Trace::new()).unwrap_err();
        assert!(matches!(err, EvalError::MalformedTuple { index: 2, arity: 2, .. }));
    }

    #[test]
    fn test_len_counts_elements() {
        let g = gate(json!({"name": "g", "assertions": []}));
        let ctx = resolve(&Bindings::new(), &mocks(json!({"withdrawals": [[100], [100], [50]], "balance": 7})));
        let scope = Scope::new(&g, &ctx);
        let expr: Expr = serde_json::from_value(json!({"len": {"ref": "withdrawals"}})).unwrap();
        assert_eq!(scope.amount(&expr, &mut Trace::new()).unwrap(), U256::from(3));

        let scalar: Expr = serde_json::from_value(json!({"len": {"ref": "balance"}})).unwrap();
        let err = scope.eval(&scalar, &mut Trace::new()).unwrap_err();
        assert!(matches!(err, EvalError::TypeMismatch { expected: "sequence", .. }));
    }
}
