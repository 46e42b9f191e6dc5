//! Defines the error types raised while evaluating a single assertion.
use thiserror::Error;

/// Why one assertion could not reach a verdict.
///
/// These never abort a request. The evaluator turns each one into an
/// `Errored` outcome for the assertion that raised it and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("binding '{name}' is not present in the evaluation context")]
    MissingBinding { name: String },
    #[error("type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("malformed record in {context}: no field {index} in a record of arity {arity}")]
    MalformedTuple {
        context: String,
        index: usize,
        arity: usize,
    },
    #[error("arithmetic overflow in {context}")]
    Overflow { context: String },
    #[error("unknown bond distribution mode {value}")]
    UnknownMode { value: String },
    #[error("unknown assertion kind '{kind}'")]
    UnknownAssertionKind { kind: String },
}

impl EvalError {
    pub(crate) fn mismatch(context: &str, expected: &'static str, found: &'static str) -> Self {
        EvalError::TypeMismatch {
            context: context.to_string(),
            expected,
            found,
        }
    }

    /// Prefixes the error's location with the expression that was being evaluated.
    pub fn within(self, outer: &str) -> Self {
        let wrap = |inner: String| format!("{}: {}", outer, inner);
        match self {
            EvalError::TypeMismatch { context, expected, found } => EvalError::TypeMismatch {
                context: wrap(context),
                expected,
                found,
            },
            EvalError::MalformedTuple { context, index, arity } => EvalError::MalformedTuple {
                context: wrap(context),
                index,
                arity,
            },
            EvalError::Overflow { context } => EvalError::Overflow { context: wrap(context) },
            other => other,
        }
    }

    /// Stable category name, used in logs and exported results.
    pub fn category(&self) -> &'static str {
        match self {
            EvalError::MissingBinding { .. } => "MissingBinding",
            EvalError::TypeMismatch { .. } => "TypeMismatch",
            EvalError::MalformedTuple { .. } => "MalformedTuple",
            EvalError::Overflow { .. } => "Overflow",
            EvalError::UnknownMode { .. } => "UnknownMode",
            EvalError::UnknownAssertionKind { .. } => "UnknownAssertionKind",
        }
    }
}
