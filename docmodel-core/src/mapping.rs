//! Mapping configuration: which collections exist and the typed attributes they hold.
//!
//! # Example
//!
//! ```ignore
//! use docmodel::mapping::{Mapper, MappedCollection, AttributeType};
//!
//! let mapper = Mapper::new().collection(
//!     MappedCollection::new("users")
//!         .attribute("id", AttributeType::String)
//!         .attribute("name", AttributeType::String)
//!         .attribute("age", AttributeType::Integer)
//!         .attribute("created_at", AttributeType::DateTime),
//! );
//! ```

use bson::Document;
use std::{collections::HashMap, fmt};

use crate::{
    coercer::EntityCoercer,
    entity::Entity,
    error::{AdapterError, AdapterResult},
};

/// Declared type of a mapped attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
    Integer,
    Float,
    Boolean,
    DateTime,
    ObjectId,
    Array,
    Document,
    /// No coercion; the stored value is used as is.
    Any,
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttributeType::String => "String",
            AttributeType::Integer => "Integer",
            AttributeType::Float => "Float",
            AttributeType::Boolean => "Boolean",
            AttributeType::DateTime => "DateTime",
            AttributeType::ObjectId => "ObjectId",
            AttributeType::Array => "Array",
            AttributeType::Document => "Document",
            AttributeType::Any => "Any",
        };
        f.write_str(name)
    }
}

/// A single typed attribute of a mapped collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub kind: AttributeType,
}

/// Binding between a collection name and the attribute schema of its entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedCollection {
    name: String,
    attributes: Vec<Attribute>,
}

impl MappedCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    /// Declares an attribute. Declaring the same name twice replaces its type.
    pub fn attribute(mut self, name: impl Into<String>, kind: AttributeType) -> Self {
        let name = name.into();

        match self.attributes.iter_mut().find(|attr| attr.name == name) {
            Some(existing) => existing.kind = kind,
            None => self.attributes.push(Attribute { name, kind }),
        }

        self
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared attributes, in declaration order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute_type(&self, name: &str) -> Option<AttributeType> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.kind)
    }

    /// Serializes an entity into its declared, coerced fields. The identity is left out.
    pub fn serialize<E: Entity>(&self, entity: &E) -> AdapterResult<Document> {
        EntityCoercer::new(self).to_record(entity)
    }
}

/// Registry of mapped collections, keyed by collection name.
#[derive(Debug, Clone, Default)]
pub struct Mapper {
    collections: HashMap<String, MappedCollection>,
}

impl Mapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a mapped collection, replacing any previous mapping with the same name.
    pub fn collection(mut self, collection: MappedCollection) -> Self {
        self.collections
            .insert(collection.name().to_string(), collection);
        self
    }

    /// Looks up the mapping for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::UnmappedCollection`] when nothing is registered under `name`.
    pub fn mapped_collection(&self, name: &str) -> AdapterResult<&MappedCollection> {
        self.collections
            .get(name)
            .ok_or_else(|| AdapterError::UnmappedCollection(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redeclaring_an_attribute_replaces_its_type() {
        let mapped = MappedCollection::new("users")
            .attribute("age", AttributeType::String)
            .attribute("age", AttributeType::Integer);

        assert_eq!(mapped.attributes().len(), 1);
        assert_eq!(mapped.attribute_type("age"), Some(AttributeType::Integer));
    }

    #[test]
    fn unknown_collections_are_reported() {
        let mapper = Mapper::new().collection(MappedCollection::new("users"));

        assert!(mapper.mapped_collection("users").is_ok());
        assert!(matches!(
            mapper.mapped_collection("posts"),
            Err(AdapterError::UnmappedCollection(name)) if name == "posts"
        ));
    }
}
