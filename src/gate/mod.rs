//! Gate definitions: what to check, over which bindings, and how they are loaded.
//!
//! A gate is externally authored configuration. It is parsed and validated
//! once, then shared read-only by every evaluation that uses it.

pub use self::check::{
    Assertion, Check, CmpOp, CompareCheck, CreditDeficitCheck, ModeSelector, ReconcileCheck,
    RecordSet, UnlockConsistencyCheck,
};
pub use self::definition::{AddressFilter, GateDefinition, SourceDecl};
pub use self::expr::Expr;
pub use self::loader::{read_gate_file, GateError};
pub use self::registry::GateRegistry;
pub use self::validator::{ValidationError, ValidationErrorType, Validator};

mod check;
mod definition;
mod expr;
mod loader;
mod registry;
mod validator;
