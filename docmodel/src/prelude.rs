//! Convenient re-exports of commonly used types from docmodel.
//!
//! ```ignore
//! use docmodel::prelude::*;
//! ```

pub use docmodel_core::{
    adapter::Adapter,
    coercer::EntityCoercer,
    collection::Collection,
    command::{Command, EntityTarget, ScopeTarget},
    driver::{NativeCollection, StoreDriver, StoreDriverBuilder},
    entity::Entity,
    error::{AdapterError, AdapterResult},
    identity::{IDENTITY, NATIVE_ID, to_native_id},
    mapping::{Attribute, AttributeType, MappedCollection, Mapper},
    query::Query,
    scope::{Conditions, Scope, SortDirection},
};
