//! Mode-gated credit checks.
//!
//! A dispute game pays out either through normal credit or through refund
//! credit, depending on its bond distribution mode. Both checks here first
//! select the authoritative credit figure for the mode; while the mode is
//! still undecided there is nothing to check and the assertion passes.

use super::error::EvalError;
use super::scope::Scope;
use crate::display::{Trace, TraceStep};
use crate::gate::{CreditDeficitCheck, Expr, ModeSelector, UnlockConsistencyCheck};
use crate::result::Violation;
use crate::value::U256;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BondDistributionMode {
    Undecided,
    Normal,
    Refund,
}

impl TryFrom<U256> for BondDistributionMode {
    type Error = EvalError;

    fn try_from(value: U256) -> Result<Self, Self::Error> {
        if value > U256::from(u8::MAX) {
            return Err(EvalError::UnknownMode { value: value.to_string() });
        }
        match value.low_u32() {
            0 => Ok(BondDistributionMode::Undecided),
            1 => Ok(BondDistributionMode::Normal),
            2 => Ok(BondDistributionMode::Refund),
            _ => Err(EvalError::UnknownMode { value: value.to_string() }),
        }
    }
}

impl fmt::Display for BondDistributionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BondDistributionMode::Undecided => "UNDECIDED",
            BondDistributionMode::Normal => "NORMAL",
            BondDistributionMode::Refund => "REFUND",
        })
    }
}

/// Reads the mode behind `selector`. `None` while it is still undecided.
pub(crate) fn decided_mode<'a>(
    selector: &'a Expr,
    scope: &Scope<'a>,
    trace: &mut Trace,
) -> Result<Option<BondDistributionMode>, EvalError> {
    let raw = scope.amount(selector, trace)?;
    let mode = BondDistributionMode::try_from(raw)?;
    if mode == BondDistributionMode::Undecided {
        trace.record(TraceStep::Mode, format!("{} is {}, nothing to check", selector, mode));
        return Ok(None);
    }
    Ok(Some(mode))
}

/// Reads the mode and, once decided, the credit figure it selects.
fn select<'a>(
    selector: &'a ModeSelector,
    scope: &Scope<'a>,
    trace: &mut Trace,
) -> Result<Option<(BondDistributionMode, U256)>, EvalError> {
    let Some(mode) = decided_mode(&selector.selector, scope, trace)? else {
        return Ok(None);
    };
    let credit_expr = match mode {
        BondDistributionMode::Undecided => return Ok(None),
        BondDistributionMode::Normal => &selector.normal,
        BondDistributionMode::Refund => &selector.refund,
    };
    let credit = scope.amount(credit_expr, trace)?;
    trace.record(
        TraceStep::Mode,
        format!("{} selects {} = {}", mode, credit_expr, credit),
    );
    Ok(Some((mode, credit)))
}

pub(crate) fn credit_deficit<'a>(
    check: &'a CreditDeficitCheck,
    scope: &Scope<'a>,
    trace: &mut Trace,
) -> Result<Vec<Violation>, EvalError> {
    let Some((mode, credit)) = select(&check.mode, scope, trace)? else {
        return Ok(Vec::new());
    };
    let total = scope.amount(&check.total, trace)?;
    trace.record(
        TraceStep::Compare,
        format!("{} credit {} against {} = {}", mode, credit, check.total, total),
    );

    let mut violations = Vec::new();
    if credit > total {
        violations.push(Violation::CreditExceedsTotal { mode, credit, total });
    } else if credit.is_zero() && !total.is_zero() {
        violations.push(Violation::CreditClearedWithOutstandingTotal { mode, total });
    }
    Ok(violations)
}

pub(crate) fn unlock_consistency<'a>(
    check: &'a UnlockConsistencyCheck,
    scope: &Scope<'a>,
    trace: &mut Trace,
) -> Result<Vec<Violation>, EvalError> {
    let Some((mode, credit)) = select(&check.mode, scope, trace)? else {
        return Ok(Vec::new());
    };
    let unlocked = scope
        .eval(&check.flag, trace)?
        .as_bool()
        .map_err(|e| e.within(&check.flag.to_string()))?;
    trace.record(
        TraceStep::Compare,
        format!("{} = {}, {} credit {}", check.flag, unlocked, mode, credit),
    );

    if !unlocked && !credit.is_zero() {
        return Ok(vec![Violation::UnlockFlagInconsistent { mode, credit }]);
    }
    Ok(Vec::new())
}
