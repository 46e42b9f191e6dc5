use serde::Serialize;
use std::fmt::{self, Write};

/// What kind of step a trace line records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStep {
    Request,
    Filter,
    Resolve,
    Derive,
    Group,
    Match,
    Compare,
    Mode,
    Outcome,
}

impl TraceStep {
    pub fn as_str(self) -> &'static str {
        match self {
            TraceStep::Request => "request",
            TraceStep::Filter => "filter",
            TraceStep::Resolve => "resolve",
            TraceStep::Derive => "derive",
            TraceStep::Group => "group",
            TraceStep::Match => "match",
            TraceStep::Compare => "compare",
            TraceStep::Mode => "mode",
            TraceStep::Outcome => "outcome",
        }
    }
}

/// One line of the execution trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceEntry {
    /// The assertion being evaluated, or `None` for request-level steps.
    pub assertion: Option<String>,
    pub step: TraceStep,
    pub detail: String,
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.assertion {
            Some(name) => write!(f, "[{}] {}: {}", name, self.step.as_str(), self.detail),
            None => write!(f, "{}: {}", self.step.as_str(), self.detail),
        }
    }
}

/// Append-only trace buffer for one evaluation.
#[derive(Debug, Default)]
pub struct Trace {
    entries: Vec<TraceEntry>,
    current: Option<String>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attributes subsequent lines to `assertion` (or to the request when `None`).
    pub fn enter(&mut self, assertion: Option<&str>) {
        self.current = assertion.map(str::to_string);
    }

    pub fn record(&mut self, step: TraceStep, detail: impl Into<String>) {
        self.entries.push(TraceEntry {
            assertion: self.current.clone(),
            step,
            detail: detail.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<TraceEntry> {
        self.entries
    }
}

/// Renders a trace as an indented report, one block per assertion.
pub fn format_trace(gate_name: &str, entries: &[TraceEntry]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "EVALUATION TRACE for gate '{}':", gate_name);
    let _ = writeln!(output, "--------------------------------------------------");

    let mut i = 0;
    while i < entries.len() {
        let owner = &entries[i].assertion;
        let end = entries[i..]
            .iter()
            .position(|e| &e.assertion != owner)
            .map_or(entries.len(), |offset| i + offset);
        let block = &entries[i..end];

        match owner {
            None => {
                for entry in block {
                    let _ = writeln!(output, "{:<8} {}", entry.step.as_str(), entry.detail);
                }
            }
            Some(name) => {
                let _ = writeln!(output, "assertion '{}'", name);
                for (j, entry) in block.iter().enumerate() {
                    let connector = if j == block.len() - 1 { "`--" } else { "|--" };
                    let _ = writeln!(output, "{} {:<8} {}", connector, entry.step.as_str(), entry.detail);
                }
            }
        }
        i = end;
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_follow_current_assertion() {
        let mut trace = Trace::new();
        trace.record(TraceStep::Request, "start");
        trace.enter(Some("balance"));
        trace.record(TraceStep::Compare, "100 >= 50");
        trace.enter(None);
        trace.record(TraceStep::Request, "done");

        let entries = trace.into_entries();
        assert_eq!(entries[0].assertion, None);
        assert_eq!(entries[1].assertion.as_deref(), Some("balance"));
        assert_eq!(entries[1].to_string(), "[balance] compare: 100 >= 50");
        assert_eq!(entries[2].assertion, None);
    }

    #[test]
    fn test_format_trace_groups_by_assertion() {
        let mut trace = Trace::new();
        trace.record(TraceStep::Request, "evaluating 1 assertion");
        trace.enter(Some("balance"));
        trace.record(TraceStep::Resolve, "ethBalanceDisputeGame <- mock (100)");
        trace.record(TraceStep::Outcome, "failed");

        let report = format_trace("eth_deficit", &trace.into_entries());
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[0], "EVALUATION TRACE for gate 'eth_deficit':");
        assert_eq!(lines[2], "request  evaluating 1 assertion");
        assert_eq!(lines[3], "assertion 'balance'");
        assert_eq!(lines[4], "|-- resolve  ethBalanceDisputeGame <- mock (100)");
        assert_eq!(lines[5], "`-- outcome  failed");
    }
}
