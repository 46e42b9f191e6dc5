// Crate root: a gate evaluation engine for dispute-game accounting invariants.
// A gate is a declarative set of assertions over named bindings (contract
// reads, decoded calls and events). The engine evaluates a gate against
// caller-supplied parameters and mocks and splits the outcome into
// failures, exceptions and an execution trace.

pub mod config;
pub mod context;
pub mod display;
pub mod eval;
pub mod gate;
pub mod request;
pub mod result;
pub mod value;

pub use config::{ConfigError, EngineConfig};
pub use context::{resolve, BindingError, Bindings, EvaluationContext};
pub use display::{format_trace, TraceEntry, TraceStep};
pub use eval::{BondDistributionMode, EvalError, Evaluator};
pub use gate::{read_gate_file, GateDefinition, GateError, GateRegistry};
pub use request::{handle_validate_request, Engine, EvaluationRequest, RequestError};
pub use result::{aggregate, AssertionOutcome, EvaluationResult, Violation};
pub use value::{Address, Value, ValueError, U256};
