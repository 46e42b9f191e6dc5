//! Merges parameters and mocks into one immutable lookup context.
use crate::value::{Value, ValueError};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// A named set of values supplied by the caller (parameters or mocks).
///
/// Ordered by name so anything derived from it is reproducible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings(BTreeMap<String, Value>);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    #[error("bindings must be a JSON object")]
    NotAnObject,
    #[error("binding '{name}': {source}")]
    Value {
        name: String,
        #[source]
        source: ValueError,
    },
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes a JSON object of raw values, e.g. a mock file.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, BindingError> {
        let object = json.as_object().ok_or(BindingError::NotAnObject)?;
        object
            .iter()
            .map(|(name, raw)| {
                Value::from_json(raw)
                    .map(|v| (name.clone(), v))
                    .map_err(|source| BindingError::Value { name: name.clone(), source })
            })
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map(Bindings)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Bindings(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Where a context entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Param,
    Mock,
}

impl Origin {
    pub fn as_str(self) -> &'static str {
        match self {
            Origin::Param => "param",
            Origin::Mock => "mock",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub value: Value,
    pub origin: Origin,
}

/// The merged namespace one evaluation reads from. Never mutated after
/// `resolve` returns, and never shared between requests.
#[derive(Debug, Clone, Default)]
pub struct EvaluationContext {
    entries: HashMap<String, Entry>,
}

impl EvaluationContext {
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.entries.get(name).map(|e| &e.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Binding names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Builds the context for one request. A mock shadows a parameter of the
/// same name. Names that neither side supplies are not an error here; they
/// surface as `MissingBinding` on first use inside an assertion.
pub fn resolve(params: &Bindings, mocks: &Bindings) -> EvaluationContext {
    let mut entries = HashMap::with_capacity(params.len() + mocks.len());
    for (name, value) in params.iter() {
        entries.insert(name.clone(), Entry { value: value.clone(), origin: Origin::Param });
    }
    for (name, value) in mocks.iter() {
        entries.insert(name.clone(), Entry { value: value.clone(), origin: Origin::Mock });
    }
    EvaluationContext { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mock_overrides_param() {
        let mut params = Bindings::new();
        params.insert("disputeGame", 1u64).insert("honestChallenger", 2u64);
        let mut mocks = Bindings::new();
        mocks.insert("disputeGame", 9u64);

        let ctx = resolve(&params, &mocks);
        let entry = ctx.get("disputeGame").unwrap();
        assert_eq!(entry.value, Value::int(9));
        assert_eq!(entry.origin, Origin::Mock);
        assert_eq!(ctx.get("honestChallenger").unwrap().origin, Origin::Param);
        assert_eq!(ctx.names(), vec!["disputeGame", "honestChallenger"]);
    }

    #[test]
    fn test_unknown_names_are_simply_absent() {
        let ctx = resolve(&Bindings::new(), &Bindings::new());
        assert!(ctx.value("unlocks").is_none());
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_from_json_normalizes_each_binding() {
        let b = Bindings::from_json(&json!({
            "bondDistributionMode": 1,
            "totalCredit": [50, 123456],
            "hasUnlockedCredit": true
        }))
        .unwrap();
        assert_eq!(b.get("bondDistributionMode"), Some(&Value::int(1)));
        assert_eq!(b.get("totalCredit").unwrap().kind(), "sequence");
        assert_eq!(b.get("hasUnlockedCredit"), Some(&Value::Boolean(true)));
    }

    #[test]
    fn test_from_json_names_the_bad_binding() {
        let err = Bindings::from_json(&json!({"claimCredit": -5})).unwrap_err();
        assert!(err.to_string().starts_with("binding 'claimCredit'"), "{}", err);
        assert_eq!(Bindings::from_json(&json!([1])), Err(BindingError::NotAnObject));
    }
}
