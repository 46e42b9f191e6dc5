//! Assertion outcomes and their aggregation into a request verdict.
pub mod aggregator;
pub mod outcome;

pub use aggregator::{aggregate, EvaluationResult};
pub use outcome::{AssertionOutcome, Violation};
