//! A persistence adapter that lets a generic repository layer work against a document store.
//!
//! This crate is the core of the docmodel project and provides:
//!
//! - **Entities** ([`entity`]) - The contract domain types implement to be persisted
//! - **Mapping** ([`mapping`]) - Which collections exist and their typed attributes
//! - **Coercion** ([`coercer`]) - Conversion between stored records and entities
//! - **Identifiers** ([`identity`]) - `id` on entities, `_id` in the store, and the conversion between them
//! - **Driver abstraction** ([`driver`]) - The narrow interface consumed from a store driver
//! - **Scopes** ([`scope`]) - Filter and execution conditions
//! - **Collections** ([`collection`]) - Mapped, scoped collection wrappers
//! - **Queries** ([`query`]) - The lazily resolved query builder
//! - **Commands** ([`command`]) - Create, update, delete and clear
//! - **Adapter** ([`adapter`]) - The repository-facing entry point
//! - **Error handling** ([`error`]) - The adapter's error taxonomy
//!
//! # Example
//!
//! ```ignore
//! use docmodel::{entity::Entity, mapping::{Mapper, MappedCollection, AttributeType}};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct User {
//!     #[serde(default, skip_serializing_if = "Option::is_none")]
//!     pub id: Option<String>,
//!     pub name: String,
//! }
//!
//! impl Entity for User {
//!     fn id(&self) -> Option<&str> {
//!         self.id.as_deref()
//!     }
//!
//!     fn set_id(&mut self, id: String) {
//!         self.id = Some(id);
//!     }
//! }
//!
//! let mapper = Mapper::new().collection(
//!     MappedCollection::new("users").attribute("name", AttributeType::String),
//! );
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmodel_core;

pub mod adapter;
pub mod coercer;
pub mod collection;
pub mod command;
pub mod driver;
pub mod entity;
pub mod error;
pub mod identity;
pub mod mapping;
pub mod query;
pub mod scope;
