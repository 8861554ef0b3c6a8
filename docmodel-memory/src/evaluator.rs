//! Filter and sort evaluation for in-memory records.
//!
//! Filters use the store's own document syntax: `{ field: value }` for equality and
//! `{ field: { "$op": operand } }` for comparisons, plus top-level `$and`, `$or` and
//! `$nor`. Dotted field names reach into embedded documents.

use bson::{Bson, DateTime, Document, oid::ObjectId};
use std::{cmp::Ordering, collections::HashMap};

use crate::error::MemoryStoreError;

type EvalResult<T> = Result<T, MemoryStoreError>;

/// Type-erased, comparable representation of BSON values.
///
/// Numeric types are normalized to f64, so `Int32(1)`, `Int64(1)` and `Double(1.0)`
/// compare equal.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    String(&'a str),
    ObjectId(ObjectId),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
    /// Binary, Decimal128, Timestamp and the rest: equal only to the identical value.
    Other(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(f64::from(*value)),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::Array(arr) => Comparable::Array(arr.iter().map(Comparable::from).collect()),
            Bson::Document(doc) => Comparable::Map(
                doc.iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect(),
            ),
            other => Comparable::Other(other),
        }
    }
}

impl Comparable<'_> {
    /// Position of the value's type in the store's cross-type sort order.
    fn rank(&self) -> u8 {
        match self {
            Comparable::Null => 0,
            Comparable::Number(_) => 1,
            Comparable::String(_) => 2,
            Comparable::Map(_) => 3,
            Comparable::Array(_) => 4,
            Comparable::ObjectId(_) => 5,
            Comparable::Bool(_) => 6,
            Comparable::DateTime(_) => 7,
            Comparable::Other(_) => 8,
        }
    }

    /// Total order used for sorting: by type rank first, then by value.
    pub(crate) fn sort_cmp(&self, other: &Self) -> Ordering {
        self.rank()
            .cmp(&other.rank())
            .then_with(|| self.partial_cmp(other).unwrap_or(Ordering::Equal))
    }
}

impl PartialEq for Comparable<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            (Comparable::Other(a), Comparable::Other(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Comparable<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.bytes().partial_cmp(&b.bytes()),
            _ => None,
        }
    }
}

/// Resolves a possibly dotted field path inside a record.
pub(crate) fn lookup<'a>(record: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = record.get(segments.next()?)?;

    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }

    Some(current)
}

/// Decides whether records match a filter document.
pub(crate) struct RecordEvaluator<'a> {
    record: &'a Document,
}

impl<'a> RecordEvaluator<'a> {
    pub fn new(record: &'a Document) -> Self {
        Self { record }
    }

    /// `true` when every entry of `filter` holds for the record.
    pub fn matches(&self, filter: &Document) -> EvalResult<bool> {
        for (key, condition) in filter {
            if !self.matches_entry(key, condition)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Keeps the records matching `filter`, in their original order.
    pub fn filter_records(
        records: impl IntoIterator<Item = &'a Document>,
        filter: &Document,
    ) -> EvalResult<Vec<Document>> {
        let mut selected = Vec::new();

        for record in records {
            if RecordEvaluator::new(record).matches(filter)? {
                selected.push(record.clone());
            }
        }

        Ok(selected)
    }

    fn matches_entry(&self, key: &str, condition: &Bson) -> EvalResult<bool> {
        match key {
            "$and" => Ok(self.branches(key, condition)?.into_iter().all(|hit| hit)),
            "$or" => Ok(self.branches(key, condition)?.into_iter().any(|hit| hit)),
            "$nor" => Ok(!self.branches(key, condition)?.into_iter().any(|hit| hit)),
            op if op.starts_with('$') => Err(MemoryStoreError::UnsupportedOperator(op.to_string())),
            field => {
                let value = lookup(self.record, field);

                match condition {
                    Bson::Document(ops) if is_operator_document(ops) => {
                        for (op, operand) in ops {
                            if !apply_operator(value, op, operand)? {
                                return Ok(false);
                            }
                        }
                        Ok(true)
                    }
                    expected => Ok(equals(value, expected)),
                }
            }
        }
    }

    fn branches(&self, op: &str, condition: &Bson) -> EvalResult<Vec<bool>> {
        let Bson::Array(branches) = condition else {
            return Err(MemoryStoreError::Malformed(format!("filter: {op} needs an array")));
        };

        branches
            .iter()
            .map(|branch| match branch {
                Bson::Document(filter) => self.matches(filter),
                _ => Err(MemoryStoreError::Malformed(format!("filter: {op} entries must be documents"))),
            })
            .collect()
    }
}

fn is_operator_document(doc: &Document) -> bool {
    !doc.is_empty() && doc.keys().all(|key| key.starts_with('$'))
}

fn apply_operator(value: Option<&Bson>, op: &str, operand: &Bson) -> EvalResult<bool> {
    match op {
        "$eq" => Ok(equals(value, operand)),
        "$ne" => Ok(!equals(value, operand)),
        "$gt" => Ok(compare(value, operand, |o| o == Ordering::Greater)),
        "$gte" => Ok(compare(value, operand, |o| o != Ordering::Less)),
        "$lt" => Ok(compare(value, operand, |o| o == Ordering::Less)),
        "$lte" => Ok(compare(value, operand, |o| o != Ordering::Greater)),
        "$in" => Ok(candidates(op, operand)?.iter().any(|item| equals(value, item))),
        "$nin" => Ok(!candidates(op, operand)?.iter().any(|item| equals(value, item))),
        "$exists" => Ok(value.is_some() == truthy(operand)),
        "$not" => match operand {
            Bson::Document(ops) if is_operator_document(ops) => {
                for (inner, inner_operand) in ops {
                    if !apply_operator(value, inner, inner_operand)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            _ => Err(MemoryStoreError::Malformed("filter: $not needs an operator document".to_string())),
        },
        other => Err(MemoryStoreError::UnsupportedOperator(other.to_string())),
    }
}

/// Equality with the store's array semantics: a scalar matches an array containing it,
/// and `null` matches a missing field.
fn equals(value: Option<&Bson>, expected: &Bson) -> bool {
    match value {
        None => matches!(expected, Bson::Null),
        Some(Bson::Array(items)) if !matches!(expected, Bson::Array(_)) => items
            .iter()
            .any(|item| Comparable::from(item) == Comparable::from(expected)),
        Some(actual) => Comparable::from(actual) == Comparable::from(expected),
    }
}

fn compare(value: Option<&Bson>, operand: &Bson, accept: fn(Ordering) -> bool) -> bool {
    let holds = |actual: &Bson| {
        Comparable::from(actual)
            .partial_cmp(&Comparable::from(operand))
            .is_some_and(accept)
    };

    match value {
        None => false,
        Some(Bson::Array(items)) => items.iter().any(holds),
        Some(actual) => holds(actual),
    }
}

fn candidates<'b>(op: &str, operand: &'b Bson) -> EvalResult<&'b Vec<Bson>> {
    match operand {
        Bson::Array(items) => Ok(items),
        _ => Err(MemoryStoreError::Malformed(format!("filter: {op} needs an array"))),
    }
}

fn truthy(operand: &Bson) -> bool {
    match operand {
        Bson::Boolean(flag) => *flag,
        Bson::Null => false,
        Bson::Int32(n) => *n != 0,
        Bson::Int64(n) => *n != 0,
        Bson::Double(n) => *n != 0.0,
        _ => true,
    }
}

/// Orders records in place by a sort specification of `field -> 1 | -1`.
pub(crate) fn sort_records(records: &mut [Document], spec: &Document) -> EvalResult<()> {
    let mut keys = Vec::with_capacity(spec.len());

    for (field, direction) in spec {
        let descending = match direction {
            Bson::Int32(n) if n.abs() == 1 => *n < 0,
            Bson::Int64(n) if n.abs() == 1 => *n < 0,
            Bson::Double(n) if n.abs() == 1.0 => *n < 0.0,
            other => return Err(MemoryStoreError::Malformed(format!("sort: {field} has direction {other}"))),
        };
        keys.push((field.as_str(), descending));
    }

    records.sort_by(|a, b| {
        for (field, descending) in &keys {
            let left = lookup(a, field).map(Comparable::from).unwrap_or(Comparable::Null);
            let right = lookup(b, field).map(Comparable::from).unwrap_or(Comparable::Null);

            let ordering = if *descending {
                right.sort_cmp(&left)
            } else {
                left.sort_cmp(&right)
            };

            if ordering != Ordering::Equal {
                return ordering;
            }
        }

        Ordering::Equal
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn hit(record: &Document, filter: Document) -> bool {
        RecordEvaluator::new(record).matches(&filter).unwrap()
    }

    #[test]
    fn equality_normalizes_numbers_and_reaches_into_arrays() {
        let record = doc! { "age": 29_i64, "tags": ["a", "b"], "address": { "city": "Rome" } };

        assert!(hit(&record, doc! { "age": 29 }));
        assert!(hit(&record, doc! { "age": 29.0 }));
        assert!(hit(&record, doc! { "tags": "b" }));
        assert!(hit(&record, doc! { "address.city": "Rome" }));
        assert!(hit(&record, doc! { "missing": null }));
        assert!(!hit(&record, doc! { "age": 28 }));
    }

    #[test]
    fn unusual_values_are_not_null() {
        let payload = Bson::Binary(bson::Binary {
            subtype: bson::spec::BinarySubtype::Generic,
            bytes: vec![1, 2, 3],
        });
        let other = Bson::Timestamp(bson::Timestamp { time: 1, increment: 1 });
        let record = doc! { "blob": payload.clone(), "stamp": other.clone() };

        assert!(!hit(&record, doc! { "blob": null }));
        assert!(!hit(&record, doc! { "blob": other }));
        assert!(hit(&record, doc! { "blob": payload }));
        assert!(hit(&record, doc! { "stamp": { "$exists": true } }));
    }

    #[test]
    fn comparison_and_membership_operators() {
        let record = doc! { "age": 29, "name": "A" };

        assert!(hit(&record, doc! { "age": { "$gt": 20, "$lte": 29 } }));
        assert!(!hit(&record, doc! { "age": { "$lt": 29 } }));
        assert!(hit(&record, doc! { "name": { "$in": ["A", "B"] } }));
        assert!(hit(&record, doc! { "name": { "$nin": ["C"] } }));
        assert!(hit(&record, doc! { "email": { "$exists": false } }));
        assert!(hit(&record, doc! { "age": { "$not": { "$gt": 30 } } }));
        assert!(hit(&record, doc! { "$or": [{ "age": 1 }, { "name": "A" }] }));
        assert!(!hit(&record, doc! { "$nor": [{ "name": "A" }] }));
    }

    #[test]
    fn unknown_operators_are_rejected() {
        let record = doc! { "age": 29 };

        assert_eq!(
            RecordEvaluator::new(&record).matches(&doc! { "age": { "$bogus": 1 } }),
            Err(MemoryStoreError::UnsupportedOperator("$bogus".to_string()))
        );
        assert!(RecordEvaluator::new(&record).matches(&doc! { "$where": "1" }).is_err());
    }

    #[test]
    fn sorting_by_several_fields_and_object_ids() {
        let first = ObjectId::new();
        let second = ObjectId::new();
        let mut records = vec![
            doc! { "_id": second, "name": "b", "age": 1 },
            doc! { "_id": first, "name": "a", "age": 2 },
            doc! { "_id": ObjectId::new(), "name": "a", "age": 1 },
        ];

        sort_records(&mut records, &doc! { "name": 1, "age": -1 }).unwrap();
        assert_eq!(records[0].get_i32("age").unwrap(), 2);
        assert_eq!(records[2].get_str("name").unwrap(), "b");

        sort_records(&mut records, &doc! { "_id": 1 }).unwrap();
        assert_eq!(records[0].get_object_id("_id").unwrap(), first);
        assert_eq!(records[1].get_object_id("_id").unwrap(), second);
    }
}
