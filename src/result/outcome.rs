//! Per-assertion verdicts and the violations a failed assertion carries.
use crate::eval::{BondDistributionMode, EvalError};
use crate::gate::CmpOp;
use crate::value::{abs_diff, Value, U256};
use serde::{Serialize, Serializer};
use std::fmt;

fn decimal<S: Serializer>(n: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&n.to_string())
}

fn display<T: fmt::Display, S: Serializer>(v: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(v)
}

/// One concrete breach of an invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Violation {
    /// A claimed key with no entry in any settlement set.
    MissingSettlement {
        key: Value,
        claim: String,
        settlements: Vec<String>,
    },
    /// A settled key that the reference set does not list.
    MissingExpected { key: Value, expected: String },
    AmountMismatch {
        key: Value,
        settlement: String,
        reference: String,
        #[serde(serialize_with = "decimal")]
        settled: U256,
        #[serde(serialize_with = "decimal")]
        expected: U256,
    },
    Comparison {
        left: String,
        op: CmpOp,
        right: String,
        #[serde(serialize_with = "decimal")]
        lhs: U256,
        #[serde(serialize_with = "decimal")]
        rhs: U256,
    },
    CreditExceedsTotal {
        mode: BondDistributionMode,
        #[serde(serialize_with = "decimal")]
        credit: U256,
        #[serde(serialize_with = "decimal")]
        total: U256,
    },
    CreditClearedWithOutstandingTotal {
        mode: BondDistributionMode,
        #[serde(serialize_with = "decimal")]
        total: U256,
    },
    UnlockFlagInconsistent {
        mode: BondDistributionMode,
        #[serde(serialize_with = "decimal")]
        credit: U256,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::MissingSettlement { key, claim, settlements } => {
                write!(f, "no {} found for {} {}", settlements.join(" or "), claim, key)
            }
            Violation::MissingExpected { key, expected } => {
                write!(f, "no {} recorded for {}", expected, key)
            }
            Violation::AmountMismatch { key, settlement, reference, settled, expected } => write!(
                f,
                "{} amount {} for {} does not match {} amount {}",
                settlement, settled, key, reference, expected
            ),
            Violation::Comparison { left, op, right, lhs, rhs } => {
                let gap = abs_diff(*lhs, *rhs);
                let label = match op {
                    CmpOp::Ge | CmpOp::Gt => "shortfall",
                    CmpOp::Le | CmpOp::Lt => "excess",
                    CmpOp::Eq | CmpOp::Ne => "delta",
                };
                write!(
                    f,
                    "expected {} {} {}, got {} vs {} ({} {})",
                    left, op, right, lhs, rhs, label, gap
                )
            }
            Violation::CreditExceedsTotal { mode, credit, total } => write!(
                f,
                "{} credit {} exceeds unlocked total {} (deficit {})",
                mode,
                credit,
                total,
                abs_diff(*credit, *total)
            ),
            Violation::CreditClearedWithOutstandingTotal { mode, total } => write!(
                f,
                "{} credit is zero while unlocked total {} is still outstanding",
                mode, total
            ),
            Violation::UnlockFlagInconsistent { mode, credit } => write!(
                f,
                "credit is not marked unlocked but {} credit is {}",
                mode, credit
            ),
        }
    }
}

/// The verdict for one assertion. Every evaluated assertion yields exactly one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssertionOutcome {
    Passed {
        assertion: String,
    },
    Failed {
        assertion: String,
        violations: Vec<Violation>,
    },
    Errored {
        assertion: String,
        #[serde(serialize_with = "display")]
        cause: EvalError,
    },
}

impl AssertionOutcome {
    pub fn assertion(&self) -> &str {
        match self {
            AssertionOutcome::Passed { assertion }
            | AssertionOutcome::Failed { assertion, .. }
            | AssertionOutcome::Errored { assertion, .. } => assertion,
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, AssertionOutcome::Passed { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, AssertionOutcome::Failed { .. })
    }

    pub fn is_errored(&self) -> bool {
        matches!(self, AssertionOutcome::Errored { .. })
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            AssertionOutcome::Failed { violations, .. } => violations,
            _ => &[],
        }
    }

    /// The failure or error text; empty for a passed assertion.
    pub fn message(&self) -> String {
        match self {
            AssertionOutcome::Passed { .. } => String::new(),
            AssertionOutcome::Failed { violations, .. } => violations
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join("; "),
            AssertionOutcome::Errored { cause, .. } => cause.to_string(),
        }
    }
}

impl fmt::Display for AssertionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssertionOutcome::Passed { assertion } => write!(f, "{}: passed", assertion),
            AssertionOutcome::Failed { assertion, .. } => {
                write!(f, "{}: failed: {}", assertion, self.message())
            }
            AssertionOutcome::Errored { assertion, cause } => {
                write!(f, "{}: error ({}): {}", assertion, cause.category(), cause)
            }
        }
    }
}
