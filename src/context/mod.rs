//! Builds the per-request lookup context from parameters and mocks.
pub mod resolver;

pub use resolver::{resolve, BindingError, Bindings, Entry, EvaluationContext, Origin};
