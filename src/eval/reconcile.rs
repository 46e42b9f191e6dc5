//! Keyed reconciliation of claims against settlements.
//!
//! Claims (e.g. `claimCredit` calls) are grouped by key. Every claimed key
//! must be settled by at least one settlement set (an unlock or a withdraw);
//! when a reference set is given (e.g. the winners and their bonds), the
//! settled amount per key must equal the reference amount.

use super::error::EvalError;
use super::scope::Scope;
use crate::display::{Trace, TraceStep};
use crate::gate::{ReconcileCheck, RecordSet};
use crate::result::Violation;
use crate::value::{Grouped, Value};
use std::borrow::Cow;

pub(crate) fn reconcile<'a>(
    check: &'a ReconcileCheck,
    scope: &Scope<'a>,
    trace: &mut Trace,
) -> Result<Vec<Violation>, EvalError> {
    let claims_value = scope.eval(&check.claims.source, trace)?;
    let settlement_values = check
        .settlements
        .iter()
        .map(|set| scope.eval(&set.source, trace))
        .collect::<Result<Vec<Cow<'a, Value>>, _>>()?;
    let expected_value = match &check.expected {
        Some(set) => Some(scope.eval(&set.source, trace)?),
        None => None,
    };

    let claims = group(&check.claims, &claims_value, trace)?;
    let settlements = check
        .settlements
        .iter()
        .zip(&settlement_values)
        .map(|(set, value)| group(set, value, trace).map(|g| (set, g)))
        .collect::<Result<Vec<_>, _>>()?;
    let expected = match (&check.expected, &expected_value) {
        (Some(set), Some(value)) => Some((set, group(set, value, trace)?)),
        _ => None,
    };

    let settlement_labels: Vec<String> = check.settlements.iter().map(|s| s.label.clone()).collect();
    let mut violations = Vec::new();

    for claim in claims.iter() {
        let key = claim.key;
        let matched: Vec<_> = settlements
            .iter()
            .filter_map(|(set, grouped)| grouped.get(key).map(|g| (*set, g)))
            .collect();

        if matched.is_empty() {
            trace.record(
                TraceStep::Match,
                format!("{} {}: no {} found", check.claims.label, key, settlement_labels.join(" or ")),
            );
            violations.push(Violation::MissingSettlement {
                key: key.clone(),
                claim: check.claims.label.clone(),
                settlements: settlement_labels.clone(),
            });
            continue;
        }

        let found: Vec<String> = matched
            .iter()
            .map(|(set, g)| format!("{} x{}", set.label, g.records.len()))
            .collect();
        trace.record(
            TraceStep::Match,
            format!("{} {}: matched {}", check.claims.label, key, found.join(", ")),
        );

        let Some((reference_set, reference)) = &expected else { continue };
        let Some(reference_group) = reference.get(key) else {
            trace.record(
                TraceStep::Match,
                format!("{} {}: no {} recorded", check.claims.label, key, reference_set.label),
            );
            violations.push(Violation::MissingExpected {
                key: key.clone(),
                expected: reference_set.label.clone(),
            });
            continue;
        };

        let expected_amount = reference_group
            .total(amount_path(reference_set))
            .map_err(|e| e.within(&reference_set.source.to_string()))?;

        for (set, settled_group) in matched {
            let settled = settled_group
                .total(amount_path(set))
                .map_err(|e| e.within(&set.source.to_string()))?;
            let agrees = settled == expected_amount;
            trace.record(
                TraceStep::Compare,
                format!(
                    "{} {}: {} {} {} {} {}",
                    check.claims.label,
                    key,
                    set.label,
                    settled,
                    if agrees { "==" } else { "!=" },
                    reference_set.label,
                    expected_amount
                ),
            );
            if !agrees {
                violations.push(Violation::AmountMismatch {
                    key: key.clone(),
                    settlement: set.label.clone(),
                    reference: reference_set.label.clone(),
                    settled,
                    expected: expected_amount,
                });
            }
        }
    }

    Ok(violations)
}

fn amount_path(set: &RecordSet) -> &[usize] {
    set.amount.as_deref().unwrap_or_default()
}

fn group<'v>(set: &RecordSet, value: &'v Value, trace: &mut Trace) -> Result<Grouped<'v>, EvalError> {
    let grouped = value
        .group_by(set.key)
        .map_err(|e| e.within(&set.source.to_string()))?;
    trace.record(
        TraceStep::Group,
        format!(
            "{} ({}) grouped by field {}: {} keys from {} records",
            set.label,
            set.source,
            set.key,
            grouped.len(),
            value.len().unwrap_or(0)
        ),
    );
    Ok(grouped)
}
