//! Folds per-assertion outcomes into the request's verdict.
use super::outcome::AssertionOutcome;
use crate::display::TraceEntry;
use serde::Serialize;

/// The verdict for one request.
///
/// `failed` is the alerting signal. A non-empty `exceptions` means the gate
/// or its data supply is broken and should be fixed rather than alerted on.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub failed: Vec<AssertionOutcome>,
    pub exceptions: Vec<AssertionOutcome>,
    pub trace: Vec<TraceEntry>,
}

impl EvaluationResult {
    /// Both lists empty: the gate holds against the supplied data.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.exceptions.is_empty()
    }

    pub fn trace_lines(&self) -> Vec<String> {
        self.trace.iter().map(|e| e.to_string()).collect()
    }
}

/// Splits outcomes into failures and exceptions, keeping declaration order.
/// Passed outcomes are dropped; the trace is their only evidence.
pub fn aggregate(outcomes: Vec<AssertionOutcome>, trace: Vec<TraceEntry>) -> EvaluationResult {
    let mut result = EvaluationResult {
        trace,
        ..Default::default()
    };
    for outcome in outcomes {
        match outcome {
            AssertionOutcome::Passed { .. } => {}
            failed @ AssertionOutcome::Failed { .. } => result.failed.push(failed),
            errored @ AssertionOutcome::Errored { .. } => result.exceptions.push(errored),
        }
    }
    result
}
