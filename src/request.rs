//! Request entry points.
//!
//! `handle_validate_request` evaluates one gate against one set of
//! parameters and mocks. `Engine` adds configuration, gates served by name,
//! and parallel evaluation of independent requests.

use crate::config::EngineConfig;
use crate::context::{resolve, BindingError, Bindings};
use crate::display::{Trace, TraceStep};
use crate::eval::Evaluator;
use crate::gate::{GateDefinition, GateError, GateRegistry};
use crate::result::{aggregate, EvaluationResult};
use crate::value::Value;
use rayon::prelude::*;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors that prevent a request from being evaluated at all.
///
/// Distinct from assertion exceptions, which are reported inside an
/// `EvaluationResult`.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("invalid gate: {0}")]
    InvalidGate(#[from] GateError),
    #[error("invalid binding: {0}")]
    InvalidBinding(#[from] BindingError),
    #[error("binding '{name}' has {len} elements, limit is {limit}")]
    BindingTooLarge {
        name: String,
        len: usize,
        limit: usize,
    },
    #[error("no gate named '{name}' is loaded")]
    UnknownGate { name: String },
}

/// Evaluates `gate` against the supplied parameters and mocks.
///
/// Returns `Err` only when the request cannot be evaluated. A well-formed
/// gate with missing or odd data still yields `Ok`, with the problems
/// reported as assertion exceptions.
pub fn handle_validate_request(
    gate: &GateDefinition,
    params: &Bindings,
    mocks: &Bindings,
) -> Result<EvaluationResult, RequestError> {
    gate.validate()?;

    let mut trace = Trace::new();
    trace.record(
        TraceStep::Request,
        format!(
            "gate '{}' with {} assertions, {} params, {} mocks",
            gate.name,
            gate.assertions.len(),
            params.len(),
            mocks.len()
        ),
    );
    let supplied = |name: &str| params.get(name).is_some() || mocks.get(name).is_some();
    for expected in &gate.params {
        if !supplied(expected) {
            trace.record(TraceStep::Request, format!("parameter {} not supplied", expected));
        }
    }
    let undeclared: Vec<&str> = gate
        .referenced_bindings()
        .into_iter()
        .filter(|name| !supplied(*name) && gate.source(name).is_none())
        .collect();
    if !undeclared.is_empty() {
        trace.record(
            TraceStep::Request,
            format!("bindings neither supplied nor declared: {}", undeclared.join(", ")),
        );
    }

    let context = resolve(params, mocks);
    let outcomes = Evaluator::new(gate, &context).run(&mut trace);
    let result = aggregate(outcomes, trace.into_entries());

    info!(
        gate = %gate.name,
        failed = result.failed.len(),
        exceptions = result.exceptions.len(),
        trace_lines = result.trace.len(),
        "evaluated gate"
    );
    Ok(result)
}

/// One unit of batch work.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub gate: Arc<GateDefinition>,
    pub params: Bindings,
    pub mocks: Bindings,
}

pub struct Engine {
    config: EngineConfig,
    registry: Option<GateRegistry>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            registry: None,
        }
    }

    /// Builds an engine and, when `gates_dir` is configured, loads its gates.
    pub fn open(config: EngineConfig) -> Result<Self, GateError> {
        let registry = match &config.gates_dir {
            Some(dir) => Some(GateRegistry::open(dir.clone())?),
            None => None,
        };
        Ok(Self { config, registry })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> Option<&GateRegistry> {
        self.registry.as_ref()
    }

    pub fn evaluate(
        &self,
        gate: &GateDefinition,
        params: &Bindings,
        mocks: &Bindings,
    ) -> Result<EvaluationResult, RequestError> {
        self.check_limits(params)?;
        self.check_limits(mocks)?;
        handle_validate_request(gate, params, mocks)
    }

    /// Evaluates a gate from the registry by name.
    pub fn evaluate_named(
        &self,
        name: &str,
        params: &Bindings,
        mocks: &Bindings,
    ) -> Result<EvaluationResult, RequestError> {
        let gate = self
            .registry
            .as_ref()
            .and_then(|r| r.get(name))
            .ok_or_else(|| RequestError::UnknownGate { name: name.to_string() })?;
        self.evaluate(&gate, params, mocks)
    }

    /// Evaluates with parameters and mocks given as raw JSON objects.
    pub fn evaluate_json(
        &self,
        gate: &GateDefinition,
        params: &serde_json::Value,
        mocks: &serde_json::Value,
    ) -> Result<EvaluationResult, RequestError> {
        let params = Bindings::from_json(params)?;
        let mocks = Bindings::from_json(mocks)?;
        self.evaluate(gate, &params, &mocks)
    }

    /// Evaluates independent requests in parallel. Results are in input order.
    pub fn evaluate_batch(
        &self,
        requests: &[EvaluationRequest],
    ) -> Vec<Result<EvaluationResult, RequestError>> {
        requests
            .par_iter()
            .map(|r| self.evaluate(&r.gate, &r.params, &r.mocks))
            .collect()
    }

    fn check_limits(&self, bindings: &Bindings) -> Result<(), RequestError> {
        let Some(limit) = self.config.max_binding_len else {
            return Ok(());
        };
        for (name, value) in bindings.iter() {
            if let Value::Sequence(items) = value {
                if items.len() > limit {
                    return Err(RequestError::BindingTooLarge {
                        name: name.clone(),
                        len: items.len(),
                        limit,
                    });
                }
            }
        }
        Ok(())
    }
}
