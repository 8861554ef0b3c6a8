//! The adapter: process-wide entry point for a generic repository layer.
//!
//! One [`Adapter`] owns one store connection and the [`Mapper`]. Every call resolves
//! its collection wrapper, then builds either a [`Query`] (reads) or a [`Command`]
//! (writes) for that call alone.
//!
//! # Example
//!
//! ```ignore
//! use docmodel::{prelude::*, memory::MemoryDriver};
//!
//! let adapter = Adapter::connect(mapper, MemoryDriver::builder("memory://app")).await?;
//!
//! let mut user = User::new("Alice", 30);
//! adapter.create("users", &mut user).await?;
//!
//! let found: Option<User> = adapter.find("users", user.id().unwrap()).await?;
//! let oldest: Option<User> = adapter.last("users").await?;
//! ```

use bson::{Bson, doc};

use crate::{
    collection::Collection,
    command::Command,
    driver::{NativeCollection, StoreDriver, StoreDriverBuilder},
    entity::Entity,
    error::{AdapterError, AdapterResult},
    identity::{NATIVE_ID, to_native_id},
    mapping::Mapper,
    query::Query,
};

/// Repository-facing adapter over a single store connection.
///
/// # Type Parameters
///
/// * `D` - The store driver the adapter talks to
#[derive(Debug)]
pub struct Adapter<D: StoreDriver> {
    driver: D,
    mapper: Mapper,
    uri: String,
}

impl<D: StoreDriver> Adapter<D> {
    /// Wraps an already connected driver.
    pub fn new(mapper: Mapper, driver: D, uri: impl Into<String>) -> Self {
        Self {
            driver,
            mapper,
            uri: uri.into(),
        }
    }

    /// Connects a driver through `builder` and wraps it.
    ///
    /// # Errors
    ///
    /// Any failure to build the driver is reported as
    /// [`AdapterError::DatabaseAdapterNotFound`].
    pub async fn connect<B>(mapper: Mapper, builder: B) -> AdapterResult<Self>
    where
        B: StoreDriverBuilder<Driver = D>,
    {
        let uri = builder.uri().to_string();
        let driver = builder.build().await.map_err(|err| {
            tracing::warn!(uri = %uri, error = %err, "could not connect to the store");
            AdapterError::DatabaseAdapterNotFound(err.to_string())
        })?;

        tracing::debug!(uri = %uri, "adapter connected");

        Ok(Self::new(mapper, driver, uri))
    }

    /// The URI this adapter was connected with.
    pub fn connection_string(&self) -> &str {
        &self.uri
    }

    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Inserts the entity into `collection` and assigns its identifier.
    pub async fn create<E: Entity>(&self, collection: &str, entity: &mut E) -> AdapterResult<E> {
        self.command(self.collection::<E>(collection)?)
            .create(entity)
            .await
    }

    /// Writes the entity's fields to the record carrying its identifier.
    pub async fn update<E: Entity>(&self, collection: &str, entity: &E) -> AdapterResult<E> {
        self.command(self.find_scope::<E>(collection, entity.id())?)
            .update(entity)
            .await
    }

    /// Deletes the record carrying the entity's identifier.
    pub async fn delete<E: Entity>(&self, collection: &str, entity: &E) -> AdapterResult<()> {
        self.command(self.find_scope::<E>(collection, entity.id())?)
            .delete()
            .await
    }

    /// Deletes every record of `collection`.
    pub async fn clear(&self, collection: &str) -> AdapterResult<()> {
        self.command(Query::new(self.collection::<()>(collection)?, ()))
            .clear()
            .await
    }

    /// The record with the lowest identifier, i.e. the oldest one.
    pub async fn first<E: Entity>(&self, collection: &str) -> AdapterResult<Option<E>> {
        let mut query = self.query::<E>(collection)?;
        query.asc([NATIVE_ID]);

        first_of(query).await
    }

    /// The record with the highest identifier, i.e. the newest one.
    pub async fn last<E: Entity>(&self, collection: &str) -> AdapterResult<Option<E>> {
        let mut query = self.query::<E>(collection)?;
        query.desc([NATIVE_ID]);

        first_of(query).await
    }

    /// Every record of `collection`.
    pub async fn all<E: Entity>(&self, collection: &str) -> AdapterResult<Vec<E>> {
        self.query::<E>(collection)?.all().await
    }

    /// The record whose identifier equals `id`, if there is one.
    pub async fn find<E: Entity>(&self, collection: &str, id: &str) -> AdapterResult<Option<E>> {
        first_of(self.find_scope::<E>(collection, Some(id))?).await
    }

    /// An empty query over `collection`.
    pub fn query<E: Entity>(&self, collection: &str) -> AdapterResult<Query<'_, D, E>> {
        Ok(Query::new(self.collection(collection)?, ()))
    }

    /// A query over `collection` carrying `context`, configured by `configure`.
    ///
    /// ```ignore
    /// let query = adapter.query_with("users", &repository, |q| {
    ///     q.find(doc! { "name": "Alice" }).limit(1);
    ///     Ok(())
    /// })?;
    /// ```
    pub fn query_with<'a, E, C, F>(
        &'a self,
        collection: &str,
        context: C,
        configure: F,
    ) -> AdapterResult<Query<'a, D, E, C>>
    where
        E: Entity,
        F: FnOnce(&mut Query<'a, D, E, C>) -> AdapterResult<()>,
    {
        Query::configured(self.collection(collection)?, context, configure)
    }

    /// Fabricates a command over `target`.
    pub fn command<T>(&self, target: T) -> Command<T> {
        Command::new(target)
    }

    /// Shuts the store connection down.
    pub async fn disconnect(self) -> AdapterResult<()> {
        tracing::debug!(uri = %self.uri, "adapter disconnecting");

        self.driver.shutdown().await
    }

    fn collection<E>(&self, name: &str) -> AdapterResult<Collection<'_, D, E>> {
        Ok(Collection::new(
            NativeCollection::new(name, &self.driver),
            self.mapper.mapped_collection(name)?,
        ))
    }

    fn find_scope<E>(&self, collection: &str, id: Option<&str>) -> AdapterResult<Query<'_, D, E>> {
        let id = id.map(to_native_id).unwrap_or(Bson::Null);
        tracing::debug!(collection, id = %id, "scoping to identifier");

        let mut query = Query::new(self.collection(collection)?, ());
        query.find(doc! { NATIVE_ID: id });

        Ok(query)
    }
}

async fn first_of<D: StoreDriver, E: Entity>(mut query: Query<'_, D, E>) -> AdapterResult<Option<E>> {
    query.limit(1);
    query.first().await
}
