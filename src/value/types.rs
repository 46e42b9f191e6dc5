//! The tagged value that every binding, parameter and mock resolves to.

use ethereum_types::{H160, U256};
use serde::{Serialize, Serializer};
use std::fmt;

/// A 20-byte account identifier. Stored as raw bytes, so two addresses that
/// differ only in hex letter case are the same value.
pub type Address = H160;

/// The atomic unit of data in the engine.
///
/// Sequences are the top-level lists a data source returns (call traces,
/// event logs). Tuples are the records inside them. Indexed access works on
/// both, so a pair such as `(amount, timestamp)` can be read either way.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Integer(U256),
    Address(Address),
    Boolean(bool),
    Bytes(Vec<u8>),
    /// Any string input that is not hex-encoded.
    Text(String),
    Sequence(Vec<Value>),
    Tuple(Vec<Value>),
}

impl Value {
    pub fn int(n: u64) -> Self {
        Value::Integer(U256::from(n))
    }

    pub fn seq(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Sequence(items.into_iter().collect())
    }

    pub fn tuple(fields: impl IntoIterator<Item = Value>) -> Self {
        Value::Tuple(fields.into_iter().collect())
    }

    /// The shape name used in type-mismatch reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Address(_) => "address",
            Value::Boolean(_) => "boolean",
            Value::Bytes(_) => "bytes",
            Value::Text(_) => "text",
            Value::Sequence(_) => "sequence",
            Value::Tuple(_) => "tuple",
        }
    }

    /// Short description for trace lines: scalars in full, collections by size.
    pub fn summary(&self) -> String {
        match self {
            Value::Sequence(items) => format!("sequence[{}]", items.len()),
            Value::Tuple(fields) if fields.len() > 4 => format!("tuple[{}]", fields.len()),
            other => other.to_string(),
        }
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::int(n)
    }
}

impl From<U256> for Value {
    fn from(n: U256) -> Self {
        Value::Integer(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Address> for Value {
    fn from(a: Address) -> Self {
        Value::Address(a)
    }
}

pub(crate) fn format_address(addr: &Address) -> String {
    format!("0x{}", hex::encode(addr.as_bytes()))
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Address(a) => f.write_str(&format_address(a)),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Sequence(items) => {
                f.write_str("[")?;
                write_joined(f, items)?;
                f.write_str("]")
            }
            Value::Tuple(fields) => {
                f.write_str("(")?;
                write_joined(f, fields)?;
                f.write_str(")")
            }
        }
    }
}

// Integers serialize as decimal strings so amounts above 2^53 survive JSON consumers.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Integer(n) => serializer.serialize_str(&n.to_string()),
            Value::Address(a) => serializer.serialize_str(&format_address(a)),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Bytes(b) => serializer.serialize_str(&format!("0x{}", hex::encode(b))),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Sequence(items) | Value::Tuple(items) => items.serialize(serializer),
        }
    }
}
