//! Collection wrapper: a native collection handle bound to its mapping and a scope.
//!
//! [`Collection`] is an immutable value. [`Collection::find`] derives a new, narrower
//! wrapper and leaves the receiver untouched, so one wrapper can seed any number of
//! query builders.
//!
//! # Example
//!
//! ```ignore
//! use bson::doc;
//! use docmodel::{collection::Collection, scope::Conditions};
//!
//! # async fn example(users: Collection<'_, impl docmodel::driver::StoreDriver, User>) -> docmodel::error::AdapterResult<()> {
//! let mut user = User { id: None, name: "Alice".into(), age: Some(30) };
//! users.insert(&mut user).await?;
//!
//! let adults = users.find(&doc! { "age": { "$gte": 18 } }, &Conditions::new());
//! let found = adults.to_a().await?;
//! # Ok(()) }
//! ```

use bson::{Document, doc, oid::ObjectId};
use std::marker::PhantomData;

use crate::{
    coercer::EntityCoercer,
    driver::{NativeCollection, StoreDriver},
    entity::Entity,
    error::AdapterResult,
    identity::{IDENTITY, NATIVE_ID, native_id_to_string, to_native_id},
    mapping::MappedCollection,
    scope::{Conditions, Scope},
};

/// A mapped collection scoped to a set of records.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the driver and mapping references
/// * `D` - The store driver type
/// * `E` - The entity type records are turned into
#[derive(Debug)]
pub struct Collection<'a, D: StoreDriver, E> {
    native: NativeCollection<'a, D>,
    mapped: &'a MappedCollection,
    scope: Scope,
    _entity: PhantomData<fn() -> E>,
}

impl<D: StoreDriver, E> Clone for Collection<'_, D, E> {
    fn clone(&self) -> Self {
        Self {
            native: self.native.clone(),
            mapped: self.mapped,
            scope: self.scope.clone(),
            _entity: PhantomData,
        }
    }
}

impl<'a, D: StoreDriver, E> Collection<'a, D, E> {
    /// Binds a native collection to its mapping. The initial scope covers every record.
    pub fn new(native: NativeCollection<'a, D>, mapped: &'a MappedCollection) -> Self {
        Self {
            native,
            mapped,
            scope: Scope::everything(),
            _entity: PhantomData,
        }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        self.native.name()
    }

    /// Name of the identifier field on entities. Always `"id"`, never the store-native name.
    pub fn identity(&self) -> &'static str {
        IDENTITY
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn mapped_collection(&self) -> &'a MappedCollection {
        self.mapped
    }

    /// Returns a new wrapper narrowed by `filter` and `conditions`.
    pub fn find(&self, filter: &Document, conditions: &Conditions) -> Self {
        Self {
            native: self.native.clone(),
            mapped: self.mapped,
            scope: self.scope.narrow(filter, conditions),
            _entity: PhantomData,
        }
    }

    /// Counts the records in scope without deserializing them.
    pub async fn count(&self) -> AdapterResult<u64> {
        self.native.count(&self.scope).await
    }

    /// Deletes every record in scope.
    pub async fn delete(&self) -> AdapterResult<u64> {
        tracing::debug!(collection = %self.name(), filter = %self.scope.filter, "deleting scoped records");

        self.native.delete_many(&self.scope).await
    }

    /// Deletes every record in the collection, whatever the scope.
    pub async fn clear(&self) -> AdapterResult<()> {
        tracing::debug!(collection = %self.name(), "clearing collection");

        self.native.delete_all().await
    }
}

impl<'a, D: StoreDriver, E: Entity> Collection<'a, D, E> {
    /// Serializes an entity into a record.
    ///
    /// The identity attribute is dropped; a present identifier is stored under `_id`
    /// in its store-native form.
    pub fn serialize(&self, entity: &E) -> AdapterResult<Document> {
        let mut record = self.mapped.serialize(entity)?;

        if let Some(id) = entity.id() {
            record.insert(NATIVE_ID, to_native_id(id));
        }

        Ok(record)
    }

    /// Writes the entity as a new record under a freshly generated identifier.
    ///
    /// The entity's identifier is only assigned once the store has accepted the record.
    pub async fn insert(&self, entity: &mut E) -> AdapterResult<E> {
        let id = ObjectId::new();
        let mut record = self.serialize(entity)?;
        record.insert(NATIVE_ID, id);

        tracing::debug!(collection = %self.name(), id = %id, "inserting record");

        self.native.insert_one(record).await?;
        entity.set_id(id.to_hex());

        Ok(entity.clone())
    }

    /// Applies the entity's fields to the first record in scope.
    ///
    /// Returns the entity rebuilt from the written fields, so attribute types match the
    /// mapping.
    pub async fn update(&self, entity: &E) -> AdapterResult<E> {
        let record = self.serialize(entity)?;

        tracing::debug!(collection = %self.name(), filter = %self.scope.filter, "updating record");

        self.native
            .update_one(&self.scope, doc! { "$set": record.clone() })
            .await?;

        self.rebuild(&record)
    }

    /// Executes the current scope and deserializes every matching record.
    pub async fn to_a(&self) -> AdapterResult<Vec<E>> {
        tracing::debug!(collection = %self.name(), filter = %self.scope.filter, "fetching records");

        let records = self.native.find(&self.scope).await?;
        self.deserialize(records)
    }

    /// Turns stored records into entities, identifiers included.
    pub fn deserialize(&self, records: impl IntoIterator<Item = Document>) -> AdapterResult<Vec<E>> {
        records
            .into_iter()
            .map(|record| self.rebuild(&record))
            .collect()
    }

    fn rebuild(&self, record: &Document) -> AdapterResult<E> {
        let mut entity: E = EntityCoercer::new(self.mapped).from_record(record)?;

        if let Some(id) = record.get(NATIVE_ID) {
            entity.set_id(native_id_to_string(id));
        }

        Ok(entity)
    }
}
