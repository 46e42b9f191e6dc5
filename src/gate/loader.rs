//! Reads gate definitions from disk.
use super::definition::GateDefinition;
use super::validator::{ValidationError, Validator};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GateError {
    #[error("failed to read gate file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse gate definition: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("gate '{gate}' is structurally invalid: {}", format_errors(.errors))]
    Invalid {
        gate: String,
        errors: Vec<ValidationError>,
    },
    #[error("gate '{name}' is declared by both '{first}' and '{second}'")]
    DuplicateGate {
        name: String,
        first: String,
        second: String,
    },
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ")
}

impl GateDefinition {
    /// Parses and validates a gate from its JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, GateError> {
        let gate: GateDefinition = serde_json::from_str(text)?;
        gate.validate()?;
        Ok(gate)
    }

    pub fn validate(&self) -> Result<(), GateError> {
        Validator::new(self).validate().map_err(|errors| GateError::Invalid {
            gate: self.name.clone(),
            errors,
        })
    }
}

/// Loads and validates a gate definition file.
pub fn read_gate_file(path: impl AsRef<Path>) -> Result<GateDefinition, GateError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| GateError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let gate = GateDefinition::from_json_str(&text)?;
    tracing::debug!(gate = %gate.name, path = %path.display(), assertions = gate.assertions.len(), "loaded gate");
    Ok(gate)
}
