//! Main docmodel crate: a document store persistence adapter for entity repositories.
//!
//! This crate is the entry point for users of docmodel. It re-exports the adapter,
//! query builder and mapping types from `docmodel-core`, plus the available store
//! drivers.
//!
//! # Features
//!
//! - **Mapped collections** - Declare which attributes each collection stores and their types
//! - **Lazy queries** - Accumulate filters, sorts and paging, resolve on demand
//! - **Store-native syntax** - Filters and sorts are documents the store understands directly
//! - **Swappable drivers** - In-memory for development and tests, MongoDB for production
//!
//! # Quick Start
//!
//! ```ignore
//! use docmodel::{prelude::*, memory::MemoryDriver, bson::doc};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct User {
//!     #[serde(default, skip_serializing_if = "Option::is_none")]
//!     pub id: Option<String>,
//!     pub name: String,
//!     pub age: i64,
//! }
//!
//! impl Entity for User {
//!     fn id(&self) -> Option<&str> { self.id.as_deref() }
//!     fn set_id(&mut self, id: String) { self.id = Some(id); }
//! }
//!
//! #[tokio::main]
//! async fn main() -> AdapterResult<()> {
//!     let mapper = Mapper::new().collection(
//!         MappedCollection::new("users")
//!             .attribute("name", AttributeType::String)
//!             .attribute("age", AttributeType::Integer),
//!     );
//!
//!     let adapter = Adapter::connect(mapper, MemoryDriver::builder("memory://app")).await?;
//!
//!     let mut user = User { id: None, name: "Alice".into(), age: 30 };
//!     adapter.create("users", &mut user).await?;
//!
//!     let mut query = adapter.query::<User>("users")?;
//!     query.find(doc! { "age": { "$gte": 18 } }).desc(["age"]).limit(10);
//!
//!     println!("adults: {:?}", query.all().await?);
//!
//!     adapter.disconnect().await
//! }
//! ```
//!
//! # Drivers
//!
//! - [`memory`] - In-memory store for development and testing
//! - [`mongodb`] - MongoDB store (requires `mongodb` feature)

pub mod prelude;

pub use docmodel_core::{
    adapter, coercer, collection, command, driver, entity, error, identity, mapping, query, scope,
};

// Re-export BSON types for convenience
pub use bson;

/// In-memory store driver.
pub mod memory {
    pub use docmodel_memory::{MemoryDriver, MemoryDriverBuilder, MemoryStoreError};
}

/// MongoDB store driver.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docmodel_mongodb::{MongoDriver, MongoDriverBuilder};
}
