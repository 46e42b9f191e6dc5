//! Assertion kinds and their arguments.

use super::expr::Expr;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use std::fmt;

/// A named invariant check within a gate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawAssertion")]
pub struct Assertion {
    pub name: String,
    pub description: Option<String>,
    /// Whether the gate's address filter applies to this assertion.
    pub filtered: bool,
    pub check: Check,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Check {
    Reconcile(ReconcileCheck),
    Compare(CompareCheck),
    CreditDeficit(CreditDeficitCheck),
    UnlockConsistency(UnlockConsistencyCheck),
    /// A kind this engine does not implement. Loads fine and evaluates to an
    /// exception, so one stale assertion does not take down the whole gate.
    #[serde(skip)]
    Unsupported { kind: String },
}

impl Check {
    const KNOWN_KINDS: [&'static str; 4] =
        ["reconcile", "compare", "credit_deficit", "unlock_consistency"];

    pub fn kind(&self) -> &str {
        match self {
            Check::Reconcile(_) => "reconcile",
            Check::Compare(_) => "compare",
            Check::CreditDeficit(_) => "credit_deficit",
            Check::UnlockConsistency(_) => "unlock_consistency",
            Check::Unsupported { kind } => kind,
        }
    }

    /// Expressions read by this check, for dependency analysis.
    pub fn expressions(&self) -> Vec<&Expr> {
        match self {
            Check::Reconcile(c) => {
                let mut exprs = vec![&c.claims.source];
                exprs.extend(c.settlements.iter().map(|s| &s.source));
                exprs.extend(c.expected.iter().map(|e| &e.source));
                exprs
            }
            Check::Compare(c) => {
                let mut exprs = vec![&c.left, &c.right];
                exprs.extend(c.mode.as_ref());
                exprs
            }
            Check::CreditDeficit(c) => vec![&c.mode.selector, &c.mode.normal, &c.mode.refund, &c.total],
            Check::UnlockConsistency(c) => vec![&c.mode.selector, &c.mode.normal, &c.mode.refund, &c.flag],
            Check::Unsupported { .. } => Vec::new(),
        }
    }
}

/// A keyed set of records, e.g. `unlocks` keyed by recipient address.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecordSet {
    /// Name used in failure messages ("unlock", "withdraw", "bond").
    pub label: String,
    pub source: Expr,
    /// Field holding the grouping key.
    #[serde(default)]
    pub key: usize,
    /// Path to the amount inside each record, if the set carries amounts.
    #[serde(default)]
    pub amount: Option<Vec<usize>>,
}

/// Every key in `claims` must be settled by at least one of `settlements`;
/// when `expected` is given, settled amounts must match it per key.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReconcileCheck {
    pub claims: RecordSet,
    pub settlements: Vec<RecordSet>,
    #[serde(default)]
    pub expected: Option<RecordSet>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn holds(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            CmpOp::Eq => ordering == Equal,
            CmpOp::Ne => ordering != Equal,
            CmpOp::Lt => ordering == Less,
            CmpOp::Le => ordering != Greater,
            CmpOp::Gt => ordering == Greater,
            CmpOp::Ge => ordering != Less,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// `left op right` over two amounts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompareCheck {
    pub left: Expr,
    pub op: CmpOp,
    pub right: Expr,
    /// Bond distribution mode selector. While it reads UNDECIDED the
    /// comparison holds without reading either side.
    #[serde(default)]
    pub mode: Option<Expr>,
}

/// Picks the authoritative credit figure from the bond distribution mode.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModeSelector {
    pub selector: Expr,
    pub normal: Expr,
    pub refund: Expr,
}

/// Selected credit must not exceed the unlocked total, and must not be
/// cleared while the unlocked total is still outstanding.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreditDeficitCheck {
    pub mode: ModeSelector,
    pub total: Expr,
}

/// A recipient that has not unlocked credit cannot hold a non-zero selected credit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UnlockConsistencyCheck {
    pub mode: ModeSelector,
    pub flag: Expr,
}

fn default_filtered() -> bool {
    true
}

#[derive(Deserialize)]
struct RawAssertion {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default = "default_filtered")]
    filtered: bool,
    kind: String,
    #[serde(flatten)]
    args: Map<String, Json>,
}

impl TryFrom<RawAssertion> for Assertion {
    type Error = String;

    fn try_from(raw: RawAssertion) -> Result<Self, Self::Error> {
        let check = if Check::KNOWN_KINDS.contains(&raw.kind.as_str()) {
            let mut tagged = raw.args;
            tagged.insert("kind".to_string(), Json::String(raw.kind.clone()));
            serde_json::from_value(Json::Object(tagged))
                .map_err(|e| format!("assertion '{}' ({}): {}", raw.name, raw.kind, e))?
        } else {
            Check::Unsupported { kind: raw.kind }
        };
        Ok(Assertion {
            name: raw.name,
            description: raw.description,
            filtered: raw.filtered,
            check,
        })
    }
}
