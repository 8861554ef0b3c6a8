//! Native failures raised by the in-memory driver.
//!
//! These reach callers wrapped in `AdapterError::Store` and can be recovered with
//! `downcast_ref::<MemoryStoreError>()`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MemoryStoreError {
    /// A record with the same `_id` already exists.
    #[error("duplicate key error collection: {collection} _id: {id}")]
    DuplicateKey { collection: String, id: String },
    /// An update tried to change a field that cannot change once written.
    #[error("performing an update on the path '{field}' would modify the immutable field '{field}'")]
    ImmutableField { field: String },
    /// The filter or update used an operator this driver does not understand.
    #[error("unknown operator: {0}")]
    UnsupportedOperator(String),
    /// The filter, sort or update document has the wrong shape.
    #[error("malformed {0}")]
    Malformed(String),
    /// The connection URI does not use the `memory://` scheme.
    #[error("invalid memory store uri: {0}")]
    InvalidUri(String),
}
