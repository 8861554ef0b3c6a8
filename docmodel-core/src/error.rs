//! Error types and result types for adapter operations.
//!
//! Every fallible operation in this crate returns [`AdapterResult<T>`]. Store drivers
//! report their own native failures through [`AdapterError::Store`], which keeps the
//! original error intact so callers can downcast it.

use std::error::Error as StdError;

use bson::error::Error as BsonError;
use thiserror::Error;

/// A boxed native failure raised by a store driver.
pub type NativeError = Box<dyn StdError + Send + Sync + 'static>;

/// Represents all possible errors that can occur when going through the adapter.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// The store connection could not be established when the adapter was built.
    #[error("Database adapter not found: {0}")]
    DatabaseAdapterNotFound(String),
    /// No mapping was registered for the requested collection name.
    #[error("Unmapped collection: {0}")]
    UnmappedCollection(String),
    /// A stored value could not be converted to its declared attribute type.
    #[error("Cannot coerce {target} into {expected}: {reason}")]
    Coercion {
        /// The attribute (or entity type) being coerced.
        target: String,
        /// The declared type.
        expected: String,
        /// What went wrong.
        reason: String,
    },
    /// An entity could not be turned into a BSON document.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The store rejected a query while it was being resolved.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    /// A builder method was called without a required argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// The store driver's own failure, passed through unchanged.
    #[error(transparent)]
    Store(NativeError),
}

impl AdapterError {
    /// Wraps a driver-native failure.
    pub fn store(err: impl Into<NativeError>) -> Self {
        AdapterError::Store(err.into())
    }

    pub(crate) fn coercion(
        target: impl Into<String>,
        expected: impl ToString,
        reason: impl ToString,
    ) -> Self {
        AdapterError::Coercion {
            target: target.into(),
            expected: expected.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Returns `true` for failures that came from the store driver.
    pub fn is_store(&self) -> bool {
        matches!(self, AdapterError::Store(_))
    }
}

/// A specialized `Result` type for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

impl From<BsonError> for AdapterError {
    fn from(err: BsonError) -> Self {
        AdapterError::Serialization(err.to_string())
    }
}
