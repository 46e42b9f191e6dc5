//! Typed accessors, arithmetic and sequence operations over `Value`.
//!
//! Every operation checks the shape it expects and reports a classified
//! `EvalError` on mismatch, so a badly shaped mock becomes an assertion
//! exception rather than a panic.

use super::types::{Address, Value};
use crate::eval::EvalError;
use ethereum_types::U256;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::collections::HashMap;

impl Value {
    pub fn as_integer(&self) -> Result<U256, EvalError> {
        match self {
            Value::Integer(n) => Ok(*n),
            other => Err(EvalError::mismatch("integer operand", "integer", other.kind())),
        }
    }

    pub fn as_address(&self) -> Result<Address, EvalError> {
        match self {
            Value::Address(a) => Ok(*a),
            other => Err(EvalError::mismatch("address operand", "address", other.kind())),
        }
    }

    pub fn as_bool(&self) -> Result<bool, EvalError> {
        match self {
            Value::Boolean(b) => Ok(*b),
            other => Err(EvalError::mismatch("boolean operand", "boolean", other.kind())),
        }
    }

    /// The elements of a sequence.
    pub fn items(&self) -> Result<&[Value], EvalError> {
        match self {
            Value::Sequence(items) => Ok(items),
            other => Err(EvalError::mismatch("sequence operand", "sequence", other.kind())),
        }
    }

    pub fn len(&self) -> Result<usize, EvalError> {
        match self {
            Value::Sequence(items) | Value::Tuple(items) => Ok(items.len()),
            other => Err(EvalError::mismatch("len", "sequence", other.kind())),
        }
    }

    /// Indexed access into a sequence or tuple.
    pub fn index(&self, index: usize) -> Result<&Value, EvalError> {
        match self {
            Value::Sequence(items) | Value::Tuple(items) => {
                items.get(index).ok_or_else(|| EvalError::MalformedTuple {
                    context: "index".to_string(),
                    index,
                    arity: items.len(),
                })
            }
            other => Err(EvalError::mismatch("index", "tuple", other.kind())),
        }
    }

    /// Follows a chain of indices into nested records, e.g. `[1, 1]` reaches
    /// the amount in `(sender, (recipient, amount))`.
    pub fn at_path(&self, path: &[usize]) -> Result<&Value, EvalError> {
        path.iter().try_fold(self, |current, &i| current.index(i))
    }

    /// Keeps the elements of a sequence for which the predicate holds.
    pub fn filter<F>(&self, mut predicate: F) -> Result<Value, EvalError>
    where
        F: FnMut(&Value) -> Result<bool, EvalError>,
    {
        let mut kept = Vec::new();
        for item in self.items()? {
            if predicate(item)? {
                kept.push(item.clone());
            }
        }
        Ok(Value::Sequence(kept))
    }

    /// Sums a sequence of integers, or of records through `path`.
    pub fn sum(&self, path: &[usize]) -> Result<U256, EvalError> {
        self.items()?.iter().try_fold(U256::zero(), |acc, item| {
            let amount = item.at_path(path)?.as_integer()?;
            checked_add(acc, amount, "sum")
        })
    }

    /// Groups the records of a sequence by the field at `key_field`.
    pub fn group_by(&self, key_field: usize) -> Result<Grouped<'_>, EvalError> {
        let mut grouped = Grouped::default();
        for record in self.items()? {
            let key = record.index(key_field)?;
            grouped.push(key, record);
        }
        Ok(grouped)
    }

    /// Ordering between two amounts. Only integers are ordered.
    pub fn compare(&self, other: &Value) -> Result<Ordering, EvalError> {
        Ok(self.as_integer()?.cmp(&other.as_integer()?))
    }
}

pub fn checked_add(a: U256, b: U256, context: &str) -> Result<U256, EvalError> {
    a.checked_add(b).ok_or_else(|| EvalError::Overflow { context: context.to_string() })
}

pub fn checked_sub(a: U256, b: U256, context: &str) -> Result<U256, EvalError> {
    a.checked_sub(b).ok_or_else(|| EvalError::Overflow { context: context.to_string() })
}

pub fn abs_diff(a: U256, b: U256) -> U256 {
    if a >= b { a - b } else { b - a }
}

/// One key and the records that carry it, in input order.
#[derive(Debug, Clone)]
pub struct Group<'a> {
    pub key: &'a Value,
    pub records: SmallVec<[&'a Value; 2]>,
}

impl<'a> Group<'a> {
    /// Total of the amount found at `path` in every record of the group.
    pub fn total(&self, path: &[usize]) -> Result<U256, EvalError> {
        self.records.iter().try_fold(U256::zero(), |acc, record| {
            checked_add(acc, record.at_path(path)?.as_integer()?, "group total")
        })
    }
}

/// Result of `Value::group_by`. Iteration follows first appearance of each
/// key, so output built from it does not depend on hashing.
#[derive(Debug, Clone, Default)]
pub struct Grouped<'a> {
    groups: Vec<Group<'a>>,
    index: HashMap<&'a Value, usize>,
}

impl<'a> Grouped<'a> {
    fn push(&mut self, key: &'a Value, record: &'a Value) {
        match self.index.get(key) {
            Some(&slot) => self.groups[slot].records.push(record),
            None => {
                self.index.insert(key, self.groups.len());
                let mut records = SmallVec::new();
                records.push(record);
                self.groups.push(Group { key, records });
            }
        }
    }

    pub fn get(&self, key: &Value) -> Option<&Group<'a>> {
        self.index.get(key).map(|&slot| &self.groups[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Group<'a>> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn addr(s: &str) -> Value {
        Value::from_json(&serde_json::Value::String(s.into())).unwrap()
    }

    #[test]
    fn test_address_equality_ignores_case() {
        let upper = addr("0x49277EE36A024120Ee218127354c4a3591dc90A9");
        let lower = addr("0x49277ee36a024120ee218127354c4a3591dc90a9");
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_as_address_reads_address_only() {
        let a = addr("0x00000000000000000000000000000000000000AA");
        assert_eq!(a.as_address().unwrap(), Address::from_low_u64_be(0xaa));
        assert!(addr("0x00").as_address().is_err());
    }

    #[test]
    fn test_address_equality_requires_full_identifier() {
        let a = addr("0x49277EE36A024120Ee218127354c4a3591dc90A9");
        let b = addr("0x49277EE36A024120Ee218127354c4a3591dc90A8");
        assert_ne!(a, b);
    }

    #[test]
    fn test_sum_through_nested_path() {
        let unlocks = Value::seq([
            Value::tuple([addr("0x00000000000000000000000000000000000000AA"), Value::tuple([addr("0x0000000000000000000000000000000000000001"), Value::int(200)])]),
            Value::tuple([addr("0x00000000000000000000000000000000000000AA"), Value::tuple([addr("0x0000000000000000000000000000000000000002"), Value::int(300)])]),
        ]);
        assert_eq!(unlocks.sum(&[1, 1]).unwrap(), U256::from(500));
    }

    #[test]
    fn test_sum_of_empty_sequence_is_zero() {
        assert_eq!(Value::seq([]).sum(&[0]).unwrap(), U256::zero());
    }

    #[rstest]
    #[case(Value::seq([Value::tuple([Value::int(1)])]), &[3][..])]
    #[case(Value::seq([Value::int(1)]), &[0][..])]
    fn test_sum_rejects_short_records(#[case] input: Value, #[case] path: &[usize]) {
        let err = input.sum(path).unwrap_err();
        assert!(matches!(err, EvalError::MalformedTuple { .. } | EvalError::TypeMismatch { .. }));
    }

    #[test]
    fn test_arithmetic_on_address_is_type_mismatch() {
        let seq = Value::seq([addr("0x00000000000000000000000000000000000000AA")]);
        let err = seq.sum(&[]).unwrap_err();
        assert_eq!(
            err,
            EvalError::TypeMismatch {
                context: "integer operand".into(),
                expected: "integer",
                found: "address"
            }
        );
    }

    #[test]
    fn test_sum_overflow_is_reported() {
        let seq = Value::seq([Value::Integer(U256::MAX), Value::int(1)]);
        assert!(matches!(seq.sum(&[]), Err(EvalError::Overflow { .. })));
    }

    #[test]
    fn test_group_by_preserves_first_appearance_order() {
        let a = addr("0x00000000000000000000000000000000000000AA");
        let b = addr("0x00000000000000000000000000000000000000BB");
        let records = Value::seq([
            Value::tuple([b.clone(), Value::int(1)]),
            Value::tuple([a.clone(), Value::int(2)]),
            Value::tuple([b.clone(), Value::int(3)]),
        ]);
        let grouped = records.group_by(0).unwrap();
        let keys: Vec<&Value> = grouped.iter().map(|g| g.key).collect();
        assert_eq!(keys, vec![&b, &a]);
        assert_eq!(grouped.get(&b).unwrap().total(&[1]).unwrap(), U256::from(4));
        assert_eq!(grouped.get(&a).unwrap().records.len(), 1);
    }

    #[test]
    fn test_filter_keeps_matching_records() {
        let records = Value::seq([Value::int(1), Value::int(5), Value::int(9)]);
        let kept = records
            .filter(|v| Ok(v.as_integer()? > U256::from(4)))
            .unwrap();
        assert_eq!(kept, Value::seq([Value::int(5), Value::int(9)]));
    }

    #[test]
    fn test_compare_orders_amounts() {
        assert_eq!(Value::int(100).compare(&Value::int(50)).unwrap(), Ordering::Greater);
        assert!(Value::Boolean(true).compare(&Value::int(1)).is_err());
    }

    #[test]
    fn test_abs_diff_is_symmetric() {
        assert_eq!(abs_diff(U256::from(3), U256::from(10)), U256::from(7));
        assert_eq!(abs_diff(U256::from(10), U256::from(3)), U256::from(7));
    }
}
