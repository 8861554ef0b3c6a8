//! Identifier naming and conversion between the entity and the store.
//!
//! Entities expose their identifier as a string under [`IDENTITY`]; records carry the
//! store-native identifier (an ObjectId) under [`NATIVE_ID`].

use bson::{Bson, oid::ObjectId};

/// Name of the identifier field on entities.
pub const IDENTITY: &str = "id";

/// Name of the identifier field in stored records.
pub const NATIVE_ID: &str = "_id";

/// Converts an identifier to its store-native form.
///
/// ObjectIds pass through, strings that are legal ObjectIds (24 hex characters) are
/// parsed, and any other value is returned as given for the store to accept or reject.
/// Never fails; applying it twice gives the same result as applying it once.
pub fn to_native_id(id: impl Into<Bson>) -> Bson {
    match id.into() {
        Bson::String(s) => match ObjectId::parse_str(&s) {
            Ok(oid) => Bson::ObjectId(oid),
            Err(_) => Bson::String(s),
        },
        other => other,
    }
}

/// Renders a store-native identifier as the entity's string identifier.
pub fn native_id_to_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_hex_strings_become_object_ids() {
        let oid = ObjectId::new();
        assert_eq!(to_native_id(oid.to_hex()), Bson::ObjectId(oid));
    }

    #[test]
    fn conversion_is_idempotent() {
        let oid = ObjectId::new();
        let once = to_native_id(oid.to_hex());
        assert_eq!(to_native_id(once.clone()), once);

        let opaque = to_native_id("not-an-object-id");
        assert_eq!(to_native_id(opaque.clone()), opaque);
    }

    #[test]
    fn malformed_ids_pass_through() {
        assert_eq!(to_native_id("abc"), Bson::String("abc".to_string()));
        assert_eq!(to_native_id(42_i64), Bson::Int64(42));
        assert_eq!(to_native_id(Bson::Null), Bson::Null);
    }

    #[test]
    fn native_ids_render_as_hex() {
        let oid = ObjectId::new();
        assert_eq!(native_id_to_string(&Bson::ObjectId(oid)), oid.to_hex());
        assert_eq!(native_id_to_string(&Bson::String("x".into())), "x");
    }
}
