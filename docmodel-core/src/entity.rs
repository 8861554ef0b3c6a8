//! The domain entity contract.
//!
//! Entities are plain serde types with a public string identifier. The adapter sets the
//! identifier after a successful insert and whenever it rebuilds an entity from a stored
//! record; everything else about the entity belongs to the caller.

use serde::{Serialize, de::DeserializeOwned};

/// Core trait that every entity handled by the adapter must implement.
///
/// The identifier must deserialize to "unset" when absent, since records handed to the
/// coercer never carry it; `#[serde(default)]` on an `Option<String>` field does that.
///
/// # Example
///
/// ```ignore
/// use docmodel::entity::Entity;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// pub struct User {
///     #[serde(default, skip_serializing_if = "Option::is_none")]
///     pub id: Option<String>,
///     pub name: String,
///     pub age: Option<i64>,
/// }
///
/// impl Entity for User {
///     fn id(&self) -> Option<&str> {
///         self.id.as_deref()
///     }
///
///     fn set_id(&mut self, id: String) {
///         self.id = Some(id);
///     }
/// }
/// ```
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + Clone + 'static {
    /// Returns the entity's identifier, if it has been assigned one.
    fn id(&self) -> Option<&str>;

    /// Assigns the entity's identifier.
    fn set_id(&mut self, id: String);
}
