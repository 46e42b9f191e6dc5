//! Runs every assertion of a gate against one evaluation context.
//!
//! The evaluator never aborts part-way: each assertion yields exactly one
//! outcome, and an error raised by one assertion is confined to it.

use super::compare::compare;
use super::credit::{credit_deficit, unlock_consistency};
use super::error::EvalError;
use super::reconcile::reconcile;
use super::scope::Scope;
use crate::context::EvaluationContext;
use crate::display::{Trace, TraceStep};
use crate::gate::{AddressFilter, Assertion, Check, GateDefinition};
use crate::result::{AssertionOutcome, Violation};
use crate::value::Value;
use tracing::{debug, warn};

/// Whether the gate's address filter admits this request.
#[derive(Debug, Clone, PartialEq)]
enum FilterState {
    NotConfigured,
    InScope,
    /// The inspected trace did not touch the subject; filtered assertions hold vacuously.
    OutOfScope,
    Invalid(EvalError),
}

pub struct Evaluator<'a> {
    gate: &'a GateDefinition,
    scope: Scope<'a>,
}

impl<'a> Evaluator<'a> {
    pub fn new(gate: &'a GateDefinition, context: &'a EvaluationContext) -> Self {
        Self {
            gate,
            scope: Scope::new(gate, context),
        }
    }

    /// Evaluates all assertions in declaration order.
    pub fn run(&self, trace: &mut Trace) -> Vec<AssertionOutcome> {
        trace.enter(None);
        let filter = match &self.gate.filter {
            Some(filter) => self.filter_state(filter, trace),
            None => FilterState::NotConfigured,
        };

        let outcomes = self
            .gate
            .assertions
            .iter()
            .map(|assertion| {
                trace.enter(Some(&assertion.name));
                let outcome = self.run_assertion(assertion, &filter, trace);
                trace.record(TraceStep::Outcome, outcome.to_string());
                match &outcome {
                    AssertionOutcome::Errored { cause, .. } => warn!(
                        gate = %self.gate.name,
                        assertion = %assertion.name,
                        category = cause.category(),
                        "assertion raised: {}",
                        cause
                    ),
                    other => debug!(gate = %self.gate.name, "{}", other),
                }
                outcome
            })
            .collect();
        trace.enter(None);
        outcomes
    }

    fn run_assertion(
        &self,
        assertion: &'a Assertion,
        filter: &FilterState,
        trace: &mut Trace,
    ) -> AssertionOutcome {
        let name = assertion.name.clone();
        if assertion.filtered {
            match filter {
                FilterState::OutOfScope => {
                    trace.record(TraceStep::Filter, "out of scope, holds vacuously");
                    return AssertionOutcome::Passed { assertion: name };
                }
                FilterState::Invalid(cause) => {
                    return AssertionOutcome::Errored {
                        assertion: name,
                        cause: cause.clone(),
                    };
                }
                FilterState::NotConfigured | FilterState::InScope => {}
            }
        }

        match self.check(&assertion.check, trace) {
            Ok(violations) if violations.is_empty() => AssertionOutcome::Passed { assertion: name },
            Ok(violations) => AssertionOutcome::Failed {
                assertion: name,
                violations,
            },
            Err(cause) => AssertionOutcome::Errored {
                assertion: name,
                cause,
            },
        }
    }

    fn check(&self, check: &'a Check, trace: &mut Trace) -> Result<Vec<Violation>, EvalError> {
        match check {
            Check::Reconcile(c) => reconcile(c, &self.scope, trace),
            Check::Compare(c) => compare(c, &self.scope, trace),
            Check::CreditDeficit(c) => credit_deficit(c, &self.scope, trace),
            Check::UnlockConsistency(c) => unlock_consistency(c, &self.scope, trace),
            Check::Unsupported { kind } => Err(EvalError::UnknownAssertionKind { kind: kind.clone() }),
        }
    }

    fn filter_state(&self, filter: &AddressFilter, trace: &mut Trace) -> FilterState {
        if let Some(subject) = &filter.subject {
            let shown = self
                .scope
                .context()
                .value(subject)
                .map(Value::to_string)
                .unwrap_or_else(|| "unbound".to_string());
            trace.record(TraceStep::Filter, format!("subject {} = {}", subject, shown));
        }

        let state = match self.scope.lookup(&filter.addresses, trace) {
            Err(EvalError::MissingBinding { name }) if name == filter.addresses => FilterState::OutOfScope,
            // An input of the filter's own derivation is missing.
            Err(other) => FilterState::Invalid(other),
            Ok(value) => match value.as_ref() {
                Value::Sequence(items) if items.is_empty() => FilterState::OutOfScope,
                Value::Sequence(_) => FilterState::InScope,
                other => FilterState::Invalid(EvalError::mismatch(
                    &format!("filter {}", filter.addresses),
                    "sequence",
                    other.kind(),
                )),
            },
        };

        let detail = match &state {
            FilterState::InScope => format!("{} is non-empty, gate in scope", filter.addresses),
            FilterState::OutOfScope => format!("{} is absent or empty, gate out of scope", filter.addresses),
            FilterState::Invalid(cause) => format!("{} is unusable: {}", filter.addresses, cause),
            FilterState::NotConfigured => String::new(),
        };
        trace.record(TraceStep::Filter, detail);
        if state == FilterState::OutOfScope {
            debug!(gate = %self.gate.name, filter = %filter.addresses, "gate out of scope");
        }
        state
    }
}
