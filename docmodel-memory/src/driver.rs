//! The in-memory store driver.

use async_trait::async_trait;
use bson::{Bson, Document, oid::ObjectId};
use mea::rwlock::RwLock;
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use docmodel_core::{
    driver::{StoreDriver, StoreDriverBuilder},
    error::{AdapterError, AdapterResult},
    identity::NATIVE_ID,
    scope::{Conditions, Scope},
};

use crate::{
    error::MemoryStoreError,
    evaluator::{RecordEvaluator, sort_records},
};

/// URI scheme accepted by [`MemoryDriverBuilder`].
pub const SCHEME: &str = "memory://";

type CollectionRecords = Vec<Document>;
type StoreMap = HashMap<String, CollectionRecords>;

/// Thread-safe in-memory document store.
///
/// Records are kept per collection in insertion order. Clones share the same data, so
/// a clone can be handed to a test while the adapter owns the original.
///
/// Filters and sorts are evaluated the way the document store evaluates them for the
/// subset of operators this driver understands; anything else is rejected with
/// [`MemoryStoreError::UnsupportedOperator`].
///
/// # Example
///
/// ```ignore
/// use docmodel::memory::MemoryDriver;
/// use docmodel::driver::StoreDriverBuilder;
///
/// let driver = MemoryDriver::builder("memory://app").build().await?;
/// assert_eq!(driver.name(), "app");
/// ```
#[derive(Clone, Debug)]
pub struct MemoryDriver {
    name: String,
    store: Arc<RwLock<StoreMap>>,
    round_trips: Arc<AtomicU64>,
}

impl MemoryDriver {
    /// Creates an empty store called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            store: Arc::new(RwLock::new(StoreMap::new())),
            round_trips: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn builder(uri: impl Into<String>) -> MemoryDriverBuilder {
        MemoryDriverBuilder::new(uri)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of operations served so far, across all clones.
    pub fn round_trips(&self) -> u64 {
        self.round_trips.load(Ordering::SeqCst)
    }

    fn trip(&self) {
        self.round_trips.fetch_add(1, Ordering::SeqCst);
    }

    async fn select(&self, collection: &str, scope: &Scope) -> Result<Vec<Document>, MemoryStoreError> {
        let store = self.store.read().await;
        let Some(records) = store.get(collection) else {
            return Ok(vec![]);
        };

        let mut selected = RecordEvaluator::filter_records(records.iter(), &scope.filter)?;

        if let Some(sort) = &scope.conditions.sort {
            sort_records(&mut selected, sort)?;
        }

        Ok(page(selected, &scope.conditions))
    }
}

/// Applies skip, then limit. A limit of zero means no limit, as in the document store.
fn page(records: Vec<Document>, conditions: &Conditions) -> Vec<Document> {
    let skip = conditions.skip.unwrap_or(0) as usize;
    let take = match conditions.limit {
        Some(0) | None => usize::MAX,
        Some(limit) => limit as usize,
    };

    records.into_iter().skip(skip).take(take).collect()
}

fn apply_update(record: &mut Document, update: Document) -> Result<(), MemoryStoreError> {
    for (op, fields) in update {
        let Bson::Document(fields) = fields else {
            return Err(MemoryStoreError::Malformed(format!("update: {op} needs a document")));
        };

        match op.as_str() {
            "$set" => {
                for (field, value) in fields {
                    if field == NATIVE_ID && record.get(NATIVE_ID) != Some(&value) {
                        return Err(MemoryStoreError::ImmutableField { field });
                    }
                    record.insert(field, value);
                }
            }
            "$unset" => {
                for (field, _) in fields {
                    if field == NATIVE_ID {
                        return Err(MemoryStoreError::ImmutableField { field });
                    }
                    record.remove(&field);
                }
            }
            other if other.starts_with('$') => {
                return Err(MemoryStoreError::UnsupportedOperator(other.to_string()));
            }
            other => {
                return Err(MemoryStoreError::Malformed(format!("update: {other} is not an operator")));
            }
        }
    }

    Ok(())
}

#[async_trait]
impl StoreDriver for MemoryDriver {
    async fn insert_one(&self, collection: &str, mut record: Document) -> AdapterResult<()> {
        self.trip();

        if !record.contains_key(NATIVE_ID) {
            record.insert(NATIVE_ID, ObjectId::new());
        }

        let mut store = self.store.write().await;
        let records = store.entry(collection.to_string()).or_default();

        let id = record.get(NATIVE_ID).cloned().unwrap_or(Bson::Null);
        if records.iter().any(|existing| existing.get(NATIVE_ID) == Some(&id)) {
            return Err(AdapterError::store(MemoryStoreError::DuplicateKey {
                collection: collection.to_string(),
                id: id.to_string(),
            }));
        }

        tracing::debug!(store = %self.name, collection, id = %id, "inserting record");
        records.push(record);

        Ok(())
    }

    async fn update_one(&self, collection: &str, scope: &Scope, update: Document) -> AdapterResult<()> {
        self.trip();

        let mut store = self.store.write().await;
        let Some(records) = store.get_mut(collection) else {
            return Ok(());
        };

        let mut target = None;
        for (position, record) in records.iter().enumerate() {
            if RecordEvaluator::new(record)
                .matches(&scope.filter)
                .map_err(AdapterError::store)?
            {
                target = Some(position);
                break;
            }
        }

        let Some(position) = target else {
            tracing::debug!(store = %self.name, collection, filter = %scope.filter, "update matched nothing");
            return Ok(());
        };

        let mut updated = records[position].clone();
        apply_update(&mut updated, update).map_err(AdapterError::store)?;
        records[position] = updated;

        tracing::debug!(store = %self.name, collection, "updated record");
        Ok(())
    }

    async fn find(&self, collection: &str, scope: &Scope) -> AdapterResult<Vec<Document>> {
        self.trip();
        tracing::trace!(store = %self.name, collection, filter = %scope.filter, "finding records");

        self.select(collection, scope).await.map_err(AdapterError::store)
    }

    async fn count(&self, collection: &str, scope: &Scope) -> AdapterResult<u64> {
        self.trip();
        tracing::trace!(store = %self.name, collection, filter = %scope.filter, "counting records");

        let selected = self.select(collection, scope).await.map_err(AdapterError::store)?;
        Ok(selected.len() as u64)
    }

    async fn delete_many(&self, collection: &str, scope: &Scope) -> AdapterResult<u64> {
        self.trip();

        let mut store = self.store.write().await;
        let Some(records) = store.get_mut(collection) else {
            return Ok(0);
        };

        let hits = records
            .iter()
            .map(|record| RecordEvaluator::new(record).matches(&scope.filter))
            .collect::<Result<Vec<_>, _>>()
            .map_err(AdapterError::store)?;

        let before = records.len();
        let mut hits = hits.into_iter();
        records.retain(|_| !hits.next().unwrap_or(false));
        let removed = (before - records.len()) as u64;

        tracing::debug!(store = %self.name, collection, removed, "deleted records");

        Ok(removed)
    }

    async fn delete_all(&self, collection: &str) -> AdapterResult<()> {
        self.trip();

        if let Some(records) = self.store.write().await.get_mut(collection) {
            tracing::debug!(store = %self.name, collection, removed = records.len(), "clearing collection");
            records.clear();
        }

        Ok(())
    }
}

/// Builder for [`MemoryDriver`] instances.
///
/// Accepts URIs of the form `memory://<name>`. Every build produces a fresh, empty
/// store.
#[derive(Debug, Clone)]
pub struct MemoryDriverBuilder {
    uri: String,
}

impl MemoryDriverBuilder {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

#[async_trait]
impl StoreDriverBuilder for MemoryDriverBuilder {
    type Driver = MemoryDriver;

    fn uri(&self) -> &str {
        &self.uri
    }

    async fn build(self) -> AdapterResult<Self::Driver> {
        let name = self
            .uri
            .strip_prefix(SCHEME)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AdapterError::store(MemoryStoreError::InvalidUri(self.uri.clone())))?;

        tracing::debug!(name, "opening in-memory store");

        Ok(MemoryDriver::new(name))
    }
}
