//! A shared cache of loaded gate definitions.
use super::definition::GateDefinition;
use super::loader::{read_gate_file, GateError};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

const GATE_SUFFIX: &str = ".gate.json";

/// Holds every gate found under one directory.
///
/// Readers get an `Arc` snapshot of a definition. `reload` builds a complete
/// new map before swapping it in, so a request holding a definition never
/// observes a half-refreshed cache.
#[derive(Debug)]
pub struct GateRegistry {
    dir: PathBuf,
    gates: RwLock<Arc<HashMap<String, Arc<GateDefinition>>>>,
}

impl GateRegistry {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, GateError> {
        let dir = dir.into();
        let gates = load_dir(&dir)?;
        Ok(Self {
            dir,
            gates: RwLock::new(Arc::new(gates)),
        })
    }

    pub fn get(&self, name: &str) -> Option<Arc<GateDefinition>> {
        self.snapshot().get(name).cloned()
    }

    /// Gate names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.snapshot().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Re-reads the directory. On error the previous contents stay in place.
    pub fn reload(&self) -> Result<usize, GateError> {
        let fresh = Arc::new(load_dir(&self.dir)?);
        let count = fresh.len();
        // A poisoned lock still holds a complete map.
        let mut slot = self.gates.write().unwrap_or_else(|e| e.into_inner());
        *slot = fresh;
        tracing::info!(dir = %self.dir.display(), gates = count, "gate registry reloaded");
        Ok(count)
    }

    fn snapshot(&self) -> Arc<HashMap<String, Arc<GateDefinition>>> {
        self.gates.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

fn load_dir(dir: &Path) -> Result<HashMap<String, Arc<GateDefinition>>, GateError> {
    let io_err = |source| GateError::Io {
        path: dir.display().to_string(),
        source,
    };
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_gate = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(GATE_SUFFIX));
        if is_gate {
            paths.push(path);
        }
    }
    paths.sort();

    let mut gates = HashMap::with_capacity(paths.len());
    let mut origins: HashMap<String, PathBuf> = HashMap::with_capacity(paths.len());
    for path in paths {
        let gate = read_gate_file(&path)?;
        if let Some(first) = origins.get(&gate.name) {
            return Err(GateError::DuplicateGate {
                name: gate.name,
                first: first.display().to_string(),
                second: path.display().to_string(),
            });
        }
        origins.insert(gate.name.clone(), path);
        gates.insert(gate.name.clone(), Arc::new(gate));
    }
    Ok(gates)
}
