//! Assertion evaluation.
//!
//! `Scope` resolves names and evaluates expressions; the check modules turn
//! evaluated data into violations; `Evaluator` drives a whole gate.
pub mod credit;
pub mod error;
pub mod evaluator;
pub mod scope;

mod compare;
mod reconcile;

pub use credit::BondDistributionMode;
pub use error::EvalError;
pub use evaluator::Evaluator;
pub use scope::Scope;
