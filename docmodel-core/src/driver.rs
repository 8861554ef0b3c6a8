//! Store driver abstraction consumed by the adapter.
//!
//! This module defines the narrow interface the adapter needs from a document store.
//! Concrete drivers (in-memory, MongoDB) live in their own crates.
//!
//! # Traits
//!
//! - [`StoreDriver`]: The record-level operations the adapter issues
//! - [`StoreDriverBuilder`]: Factory trait for connecting a driver
//!
//! [`NativeCollection`] is the `connection[name]` handle: a collection name bound to a
//! driver reference, with no mapping knowledge of its own.
//!
//! # Examples
//!
//! ```ignore
//! use docmodel::driver::{StoreDriver, StoreDriverBuilder};
//! use docmodel::scope::Scope;
//! use bson::doc;
//!
//! let driver = MyDriverBuilder::new("memory://test").build().await?;
//! driver.insert_one("users", doc! { "name": "Alice" }).await?;
//! let records = driver.find("users", &Scope::everything()).await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use bson::Document;
use std::fmt::Debug;

use crate::{error::AdapterResult, scope::Scope};

/// Abstract interface for document store drivers.
///
/// Every method is a single round trip to the store. Drivers report their own failures
/// as [`AdapterError::Store`](crate::error::AdapterError::Store) so that the adapter can
/// pass them through unchanged.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; query builders sharing one driver may run
/// concurrently.
#[async_trait]
pub trait StoreDriver: Send + Sync + Debug {
    /// Writes a new record. The record already carries its `_id`.
    async fn insert_one(&self, collection: &str, record: Document) -> AdapterResult<()>;

    /// Applies `update` (an update-operator document such as `{"$set": {...}}`) to the
    /// first record matching the scope's filter.
    async fn update_one(
        &self,
        collection: &str,
        scope: &Scope,
        update: Document,
    ) -> AdapterResult<()>;

    /// Returns the records selected by the scope, honouring sort, skip and limit.
    async fn find(&self, collection: &str, scope: &Scope) -> AdapterResult<Vec<Document>>;

    /// Counts the records selected by the scope, honouring skip and limit.
    async fn count(&self, collection: &str, scope: &Scope) -> AdapterResult<u64>;

    /// Deletes every record matching the scope's filter and returns how many went away.
    async fn delete_many(&self, collection: &str, scope: &Scope) -> AdapterResult<u64>;

    /// Deletes every record of the collection.
    async fn delete_all(&self, collection: &str) -> AdapterResult<()>;

    /// Cleanly shuts the driver down, releasing its connections.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> AdapterResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Factory for connected drivers.
///
/// A failing [`build`](StoreDriverBuilder::build) is reported by the adapter as
/// [`AdapterError::DatabaseAdapterNotFound`](crate::error::AdapterError::DatabaseAdapterNotFound).
#[async_trait]
pub trait StoreDriverBuilder {
    type Driver: StoreDriver;

    /// The connection URI the driver is built from.
    fn uri(&self) -> &str;

    async fn build(self) -> AdapterResult<Self::Driver>;
}

/// A store-native collection handle: a name bound to a driver.
#[derive(Debug)]
pub struct NativeCollection<'a, D: StoreDriver> {
    name: String,
    driver: &'a D,
}

impl<D: StoreDriver> Clone for NativeCollection<'_, D> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            driver: self.driver,
        }
    }
}

impl<'a, D: StoreDriver> NativeCollection<'a, D> {
    pub fn new(name: impl Into<String>, driver: &'a D) -> Self {
        Self { name: name.into(), driver }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn insert_one(&self, record: Document) -> AdapterResult<()> {
        self.driver.insert_one(&self.name, record).await
    }

    pub async fn update_one(&self, scope: &Scope, update: Document) -> AdapterResult<()> {
        self.driver.update_one(&self.name, scope, update).await
    }

    pub async fn find(&self, scope: &Scope) -> AdapterResult<Vec<Document>> {
        self.driver.find(&self.name, scope).await
    }

    pub async fn count(&self, scope: &Scope) -> AdapterResult<u64> {
        self.driver.count(&self.name, scope).await
    }

    pub async fn delete_many(&self, scope: &Scope) -> AdapterResult<u64> {
        self.driver.delete_many(&self.name, scope).await
    }

    pub async fn delete_all(&self) -> AdapterResult<()> {
        self.driver.delete_all(&self.name).await
    }
}
