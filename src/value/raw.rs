//! Normalizes loosely typed JSON input into `Value`.
//!
//! Mocks and parameters arrive as untyped JSON (strings for addresses, bare
//! numbers for amounts, nested arrays for records). Normalization happens once
//! here, at the resolver boundary, so the evaluator only sees tagged values.

use super::types::{Address, Value};
use ethereum_types::U256;
use serde::{Deserialize, Deserializer};
use serde_json::Value as Json;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("null is not a supported value")]
    Null,
    #[error("number {0} is not a non-negative integer")]
    UnsupportedNumber(String),
    #[error("objects are not supported; records must be arrays")]
    Object,
    #[error("integer literal '{0}' does not fit in 256 bits")]
    IntegerTooLarge(String),
}

impl Value {
    /// Converts a top-level JSON value. Arrays at this level become sequences
    /// and arrays nested inside them become tuples.
    pub fn from_json(json: &Json) -> Result<Value, ValueError> {
        convert(json, 0)
    }
}

fn convert(json: &Json, depth: usize) -> Result<Value, ValueError> {
    match json {
        Json::Null => Err(ValueError::Null),
        Json::Bool(b) => Ok(Value::Boolean(*b)),
        Json::Number(n) => parse_number(&n.to_string()),
        Json::String(s) => parse_string(s),
        Json::Array(items) => {
            let converted = items
                .iter()
                .map(|item| convert(item, depth + 1))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(if depth == 0 {
                Value::Sequence(converted)
            } else {
                Value::Tuple(converted)
            })
        }
        Json::Object(_) => Err(ValueError::Object),
    }
}

/// `literal` is the number exactly as written in the input.
fn parse_number(literal: &str) -> Result<Value, ValueError> {
    if literal.is_empty() || !literal.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValueError::UnsupportedNumber(literal.to_string()));
    }
    U256::from_dec_str(literal)
        .map(Value::Integer)
        .map_err(|_| ValueError::IntegerTooLarge(literal.to_string()))
}

fn parse_string(s: &str) -> Result<Value, ValueError> {
    if let Some(digits) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(parse_hex(digits));
        }
        return Ok(Value::Text(s.to_string()));
    }
    if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
        return U256::from_dec_str(s)
            .map(Value::Integer)
            .map_err(|_| ValueError::IntegerTooLarge(s.to_string()));
    }
    Ok(Value::Text(s.to_string()))
}

fn parse_hex(digits: &str) -> Value {
    // Odd-length quantities get a leading zero nibble.
    let padded = if digits.len() % 2 == 1 {
        format!("0{}", digits)
    } else {
        digits.to_string()
    };
    // Digits are validated by the caller.
    let bytes = hex::decode(&padded).unwrap_or_default();
    if digits.len() == 40 {
        Value::Address(Address::from_slice(&bytes))
    } else {
        Value::Bytes(bytes)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = Json::deserialize(deserializer)?;
        Value::from_json(&json).map_err(serde::de::Error::custom)
    }
}
