//! Mutating operations.
//!
//! A [`Command`] wraps anything that can write entities ([`EntityTarget`]) or drop
//! records ([`ScopeTarget`]). Both [`Collection`] and [`Query`] qualify; the adapter
//! picks whichever carries the right scope. Store failures are returned as they come
//! from the driver.

use async_trait::async_trait;

use crate::{
    collection::Collection,
    driver::StoreDriver,
    entity::Entity,
    error::AdapterResult,
    query::Query,
};

/// Something entities can be inserted into and updated through.
#[async_trait]
pub trait EntityTarget<E: Entity>: Send + Sync {
    async fn insert_entity(&self, entity: &mut E) -> AdapterResult<E>;
    async fn update_entity(&self, entity: &E) -> AdapterResult<E>;
}

/// Something whose records can be deleted.
#[async_trait]
pub trait ScopeTarget: Send + Sync {
    /// Deletes the records in the current scope.
    async fn delete_scope(&self) -> AdapterResult<u64>;

    /// Deletes every record of the underlying collection, ignoring any scope.
    async fn clear_collection(&self) -> AdapterResult<()>;
}

#[async_trait]
impl<'a, D: StoreDriver, E: Entity> EntityTarget<E> for Collection<'a, D, E> {
    async fn insert_entity(&self, entity: &mut E) -> AdapterResult<E> {
        self.insert(entity).await
    }

    async fn update_entity(&self, entity: &E) -> AdapterResult<E> {
        self.update(entity).await
    }
}

#[async_trait]
impl<'a, D: StoreDriver, E> ScopeTarget for Collection<'a, D, E> {
    async fn delete_scope(&self) -> AdapterResult<u64> {
        self.delete().await
    }

    async fn clear_collection(&self) -> AdapterResult<()> {
        self.clear().await
    }
}

#[async_trait]
impl<'a, D, E, C> EntityTarget<E> for Query<'a, D, E, C>
where
    D: StoreDriver,
    E: Entity,
    C: Send + Sync,
{
    async fn insert_entity(&self, entity: &mut E) -> AdapterResult<E> {
        self.scoped().insert(entity).await
    }

    async fn update_entity(&self, entity: &E) -> AdapterResult<E> {
        self.scoped().update(entity).await
    }
}

#[async_trait]
impl<'a, D, E, C> ScopeTarget for Query<'a, D, E, C>
where
    D: StoreDriver,
    C: Send + Sync,
{
    async fn delete_scope(&self) -> AdapterResult<u64> {
        self.scoped().delete().await
    }

    async fn clear_collection(&self) -> AdapterResult<()> {
        self.scoped().clear().await
    }
}

/// The four mutating verbs used by the adapter.
#[derive(Debug, Clone)]
pub struct Command<T> {
    target: T,
}

impl<T> Command<T> {
    pub fn new(target: T) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    /// Inserts the entity and assigns its identifier.
    pub async fn create<E>(&self, entity: &mut E) -> AdapterResult<E>
    where
        E: Entity,
        T: EntityTarget<E>,
    {
        self.target.insert_entity(entity).await
    }

    /// Writes the entity's fields to the record in scope.
    pub async fn update<E>(&self, entity: &E) -> AdapterResult<E>
    where
        E: Entity,
        T: EntityTarget<E>,
    {
        self.target.update_entity(entity).await
    }

    /// Deletes every record in scope.
    pub async fn delete(&self) -> AdapterResult<()>
    where
        T: ScopeTarget,
    {
        let deleted = self.target.delete_scope().await?;
        tracing::debug!(deleted, "deleted records");

        Ok(())
    }

    /// Deletes every record of the collection.
    pub async fn clear(&self) -> AdapterResult<()>
    where
        T: ScopeTarget,
    {
        self.target.clear_collection().await
    }
}
