//! Structural validation of a gate definition, run once at load time.
use super::check::Check;
use super::definition::GateDefinition;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// The specific category of a structural problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorType {
    EmptyName,
    DuplicateName,
    MissingSettlement,
    /// A record set whose amounts are compared has no amount path.
    MissingAmountPath,
    DerivationCycle,
}

/// A structured report of one problem found in a gate definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The gate element the problem was found on (assertion or source name).
    pub location: String,
    pub error_type: ValidationErrorType,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Checks a gate's shape before any evaluation uses it.
///
/// Like the linter it resembles, it collects every problem instead of
/// stopping at the first.
pub struct Validator<'a> {
    gate: &'a GateDefinition,
}

impl<'a> Validator<'a> {
    pub fn new(gate: &'a GateDefinition) -> Self {
        Self { gate }
    }

    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.gate.name.trim().is_empty() {
            errors.push(ValidationError {
                location: "gate".into(),
                error_type: ValidationErrorType::EmptyName,
                message: "gate name must not be empty".into(),
            });
        }

        self.check_names(&mut errors);
        self.check_reconcile_shapes(&mut errors);
        if let Err(e) = self.derivation_order() {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn check_names(&self, errors: &mut Vec<ValidationError>) {
        let mut seen = HashSet::new();
        for assertion in &self.gate.assertions {
            if assertion.name.trim().is_empty() {
                errors.push(ValidationError {
                    location: format!("assertion ({})", assertion.check.kind()),
                    error_type: ValidationErrorType::EmptyName,
                    message: "assertion name must not be empty".into(),
                });
            } else if !seen.insert(assertion.name.as_str()) {
                errors.push(ValidationError {
                    location: assertion.name.clone(),
                    error_type: ValidationErrorType::DuplicateName,
                    message: "assertion name is declared more than once".into(),
                });
            }
        }

        let mut seen = HashSet::new();
        for source in &self.gate.sources {
            if !seen.insert(source.name.as_str()) {
                errors.push(ValidationError {
                    location: source.name.clone(),
                    error_type: ValidationErrorType::DuplicateName,
                    message: "source is declared more than once".into(),
                });
            }
        }
    }

    fn check_reconcile_shapes(&self, errors: &mut Vec<ValidationError>) {
        for assertion in &self.gate.assertions {
            if let Check::Reconcile(r) = &assertion.check {
                if r.settlements.is_empty() {
                    errors.push(ValidationError {
                        location: assertion.name.clone(),
                        error_type: ValidationErrorType::MissingSettlement,
                        message: "reconcile needs at least one settlement set".into(),
                    });
                }
                if let Some(expected) = r.expected.as_ref().filter(|e| e.amount.is_none()) {
                    errors.push(ValidationError {
                        location: assertion.name.clone(),
                        error_type: ValidationErrorType::MissingAmountPath,
                        message: format!("expected set '{}' has no amount path", expected.label),
                    });
                }
                if r.expected.is_some() {
                    for set in r.settlements.iter().filter(|s| s.amount.is_none()) {
                        errors.push(ValidationError {
                            location: assertion.name.clone(),
                            error_type: ValidationErrorType::MissingAmountPath,
                            message: format!(
                                "settlement set '{}' has no amount path to compare against '{}'",
                                set.label,
                                r.expected.as_ref().map_or("", |e| e.label.as_str())
                            ),
                        });
                    }
                }
            }
        }
    }

    /// Orders derived sources so each comes after the sources it reads.
    /// Fails if the derivations reference each other in a cycle.
    pub fn derivation_order(&self) -> Result<Vec<&'a str>, ValidationError> {
        let mut graph: DiGraph<&str, ()> = DiGraph::new();
        let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();

        for source in &self.gate.sources {
            nodes.entry(source.name.as_str()).or_insert_with(|| graph.add_node(source.name.as_str()));
        }
        for source in &self.gate.sources {
            let Some(derive) = &source.derive else { continue };
            let target = nodes[source.name.as_str()];
            for dep in derive.references() {
                if let Some(&dep_node) = nodes.get(dep) {
                    graph.add_edge(dep_node, target, ());
                }
            }
        }

        toposort(&graph, None)
            .map(|order| order.into_iter().map(|idx| graph[idx]).collect())
            .map_err(|cycle| {
                let name = graph[cycle.node_id()];
                ValidationError {
                    location: name.to_string(),
                    error_type: ValidationErrorType::DerivationCycle,
                    message: format!("derived source '{}' depends on itself", name),
                }
            })
    }
}
