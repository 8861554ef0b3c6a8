//! Filter and execution conditions that decide which records an operation acts on.
//!
//! A [`Scope`] is an immutable value: deriving a narrower scope always produces a
//! new one, so several query builders can start from the same collection safely.

use bson::{Bson, Document};

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    fn as_bson(self) -> Bson {
        match self {
            SortDirection::Asc => Bson::Int32(1),
            SortDirection::Desc => Bson::Int32(-1),
        }
    }
}

/// Execution conditions: ordering and paging.
///
/// The sort specification is an ordered document of `field -> 1 | -1`, the same
/// shape the store expects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions {
    /// Sort specification, if any.
    pub sort: Option<Document>,
    /// Maximum number of records to return.
    pub limit: Option<u64>,
    /// Number of records to skip.
    pub skip: Option<u64>,
}

impl Conditions {
    /// Creates empty execution conditions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a sort specification over `fields`, in the order given, all in one direction.
    pub fn sort_spec<I, S>(fields: I, direction: SortDirection) -> Document
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        fields
            .into_iter()
            .map(|field| (field.into(), direction.as_bson()))
            .collect()
    }

    /// Returns these conditions with every condition set in `other` taking precedence.
    pub fn overlay(&self, other: &Conditions) -> Conditions {
        Conditions {
            sort: other.sort.clone().or_else(|| self.sort.clone()),
            limit: other.limit.or(self.limit),
            skip: other.skip.or(self.skip),
        }
    }
}

/// The combination of filter and execution conditions for one operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    /// Field -> expected value (or operator document) pairs.
    pub filter: Document,
    /// Ordering and paging.
    pub conditions: Conditions,
}

impl Scope {
    pub fn new(filter: Document, conditions: Conditions) -> Self {
        Self { filter, conditions }
    }

    /// A scope matching every record of a collection.
    pub fn everything() -> Self {
        Self::default()
    }

    /// Derives a narrower scope. Filter keys present in both are taken from `filter`.
    pub fn narrow(&self, filter: &Document, conditions: &Conditions) -> Scope {
        let mut merged = self.filter.clone();
        for (key, value) in filter {
            merged.insert(key.clone(), value.clone());
        }

        Scope {
            filter: merged,
            conditions: self.conditions.overlay(conditions),
        }
    }
}
