//! Defines the `GateDefinition`: filter, declared sources and assertions.

use super::check::Assertion;
use super::expr::Expr;
use crate::value::Value;
use serde::Deserialize;
use std::collections::BTreeSet;

/// An immutable invariant definition, identified by name.
///
/// Loaded once and shared read-only across evaluations.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GateDefinition {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Parameter names the caller is expected to supply.
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub filter: Option<AddressFilter>,
    #[serde(default)]
    pub sources: Vec<SourceDecl>,
    pub assertions: Vec<Assertion>,
}

/// Restricts a gate to blocks whose execution trace touched the monitored contract.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AddressFilter {
    /// Binding holding the addresses seen in the inspected trace.
    pub addresses: String,
    /// Binding naming the monitored contract. Only echoed into the trace.
    #[serde(default)]
    pub subject: Option<String>,
}

/// A declared binding.
///
/// Callers may supply it directly. Otherwise it is computed from `derive`,
/// or falls back to `default` (what a live fetch yields when nothing happened).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceDecl {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub derive: Option<Expr>,
    #[serde(default)]
    pub default: Option<Value>,
}

impl GateDefinition {
    pub fn source(&self, name: &str) -> Option<&SourceDecl> {
        self.sources.iter().find(|s| s.name == name)
    }

    pub fn assertion(&self, name: &str) -> Option<&Assertion> {
        self.assertions.iter().find(|a| a.name == name)
    }

    /// Every binding name the gate can read, including the filter binding.
    pub fn referenced_bindings(&self) -> BTreeSet<&str> {
        let mut names: BTreeSet<&str> = self
            .assertions
            .iter()
            .flat_map(|a| a.check.expressions())
            .chain(self.sources.iter().filter_map(|s| s.derive.as_ref()))
            .flat_map(|e| e.references())
            .collect();
        if let Some(filter) = &self.filter {
            names.insert(filter.addresses.as_str());
        }
        names
    }
}
