//! Conversion between stored records and typed entities.
//!
//! The coercer only looks at attributes declared on the [`MappedCollection`]. Each
//! declared value is converted to its [`AttributeType`] on the way in and on the way
//! out, so entities always see the declared shape regardless of how a record was written.

use bson::{
    Bson, DateTime, Document,
    de::deserialize_from_document,
    oid::ObjectId,
    ser::serialize_to_document,
};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use std::any::type_name;

use crate::{
    entity::Entity,
    error::{AdapterError, AdapterResult},
    identity::IDENTITY,
    mapping::{AttributeType, MappedCollection},
};

/// Builds entities from records, and records from entities, for one mapped collection.
#[derive(Debug, Clone, Copy)]
pub struct EntityCoercer<'a> {
    collection: &'a MappedCollection,
}

impl<'a> EntityCoercer<'a> {
    pub fn new(collection: &'a MappedCollection) -> Self {
        Self { collection }
    }

    /// Builds an entity from a stored record.
    ///
    /// Undeclared fields (including the store-native identifier) are ignored and the
    /// entity's identifier is left unset.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Coercion`] when a value does not convert to its declared
    /// type, or when the coerced fields do not fit the entity type.
    pub fn from_record<E: Entity>(&self, record: &Document) -> AdapterResult<E> {
        let fields = self.declared_fields(record)?;

        deserialize_from_document::<E>(fields).map_err(|err| {
            AdapterError::coercion(self.collection.name(), type_name::<E>(), err)
        })
    }

    /// Serializes an entity into a record of its declared attributes, identity excluded.
    pub fn to_record<E: Entity>(&self, entity: &E) -> AdapterResult<Document> {
        self.declared_fields(&serialize_to_document(entity)?)
    }

    fn declared_fields(&self, source: &Document) -> AdapterResult<Document> {
        let mut fields = Document::new();

        for attribute in self.collection.attributes() {
            if attribute.name == IDENTITY {
                continue;
            }

            if let Some(value) = source.get(&attribute.name) {
                fields.insert(
                    attribute.name.clone(),
                    coerce(&attribute.name, value, attribute.kind)?,
                );
            }
        }

        Ok(fields)
    }
}

/// Converts `value` to the declared `kind`. `target` names the attribute in errors.
///
/// `Null` is accepted for every kind.
pub fn coerce(target: &str, value: &Bson, kind: AttributeType) -> AdapterResult<Bson> {
    let fail = |reason: String| AdapterError::coercion(target, kind, reason);

    if let Bson::Null = value {
        return Ok(Bson::Null);
    }

    match kind {
        AttributeType::Any => Ok(value.clone()),
        AttributeType::String => match value {
            Bson::String(_) => Ok(value.clone()),
            Bson::Int32(i) => Ok(Bson::String(i.to_string())),
            Bson::Int64(i) => Ok(Bson::String(i.to_string())),
            Bson::Double(f) => Ok(Bson::String(f.to_string())),
            Bson::Boolean(b) => Ok(Bson::String(b.to_string())),
            Bson::ObjectId(oid) => Ok(Bson::String(oid.to_hex())),
            Bson::DateTime(dt) => Ok(Bson::String(dt.to_chrono().to_rfc3339())),
            other => Err(fail(format!("unsupported value {other}"))),
        },
        AttributeType::Integer => match value {
            Bson::Int32(i) => Ok(Bson::Int64(i64::from(*i))),
            Bson::Int64(_) => Ok(value.clone()),
            Bson::Double(f) if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 => {
                Ok(Bson::Int64(*f as i64))
            }
            Bson::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Bson::Int64)
                .map_err(|err| fail(format!("{s:?}: {err}"))),
            other => Err(fail(format!("unsupported value {other}"))),
        },
        AttributeType::Float => match value {
            Bson::Int32(i) => Ok(Bson::Double(f64::from(*i))),
            Bson::Int64(i) => Ok(Bson::Double(*i as f64)),
            Bson::Double(_) => Ok(value.clone()),
            Bson::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Bson::Double)
                .map_err(|err| fail(format!("{s:?}: {err}"))),
            other => Err(fail(format!("unsupported value {other}"))),
        },
        AttributeType::Boolean => match value {
            Bson::Boolean(_) => Ok(value.clone()),
            Bson::Int32(0) | Bson::Int64(0) => Ok(Bson::Boolean(false)),
            Bson::Int32(1) | Bson::Int64(1) => Ok(Bson::Boolean(true)),
            Bson::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(Bson::Boolean(true)),
                "false" | "0" => Ok(Bson::Boolean(false)),
                _ => Err(fail(format!("{s:?} is not a boolean"))),
            },
            other => Err(fail(format!("unsupported value {other}"))),
        },
        AttributeType::DateTime => match value {
            Bson::DateTime(_) => Ok(value.clone()),
            Bson::Int64(millis) => Ok(Bson::DateTime(DateTime::from_millis(*millis))),
            Bson::Int32(millis) => Ok(Bson::DateTime(DateTime::from_millis(i64::from(*millis)))),
            Bson::String(s) => parse_datetime(s)
                .map(Bson::DateTime)
                .ok_or_else(|| fail(format!("{s:?} is not a recognised date/time"))),
            other => Err(fail(format!("unsupported value {other}"))),
        },
        AttributeType::ObjectId => match value {
            Bson::ObjectId(_) => Ok(value.clone()),
            Bson::String(s) => ObjectId::parse_str(s)
                .map(Bson::ObjectId)
                .map_err(|err| fail(err.to_string())),
            other => Err(fail(format!("unsupported value {other}"))),
        },
        AttributeType::Array => match value {
            Bson::Array(_) => Ok(value.clone()),
            other => Err(fail(format!("unsupported value {other}"))),
        },
        AttributeType::Document => match value {
            Bson::Document(_) => Ok(value.clone()),
            other => Err(fail(format!("unsupported value {other}"))),
        },
    }
}

fn parse_datetime(input: &str) -> Option<DateTime> {
    let input = input.trim();

    if let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(input) {
        return Some(DateTime::from_chrono(parsed.with_timezone(&Utc)));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S") {
        return Some(DateTime::from_chrono(parsed.and_utc()));
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|parsed| DateTime::from_chrono(parsed.and_utc()))
}
