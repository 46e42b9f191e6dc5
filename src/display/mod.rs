//! Human-readable evaluation traces.
pub mod trace;

pub use trace::{format_trace, Trace, TraceEntry, TraceStep};
