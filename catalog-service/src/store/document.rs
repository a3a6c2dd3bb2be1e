//! Document representation
//!
//! Documents are schemaless JSON objects. The store owns a handful of
//! reserved fields (`_id`, `__v`, `createdAt`, `updatedAt`); everything else
//! belongs to the entity schema.

use serde_json::{Map, Value};

/// A stored document: field name to JSON value
pub type Document = Map<String, Value>;

/// Identifier field present on every document
pub const ID_FIELD: &str = "_id";

/// Internal version field, hidden from list results by default
pub const VERSION_FIELD: &str = "__v";

/// Creation timestamp field
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Last-modification timestamp field
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// Resolve a dotted path (`"category.name"`) inside a document
pub fn get_path<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = document.get(first)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            _ => return None,
        };
    }
    Some(current)
}

/// The document's `_id` as a string, if present
pub fn document_id(document: &Document) -> Option<&str> {
    document.get(ID_FIELD).and_then(Value::as_str)
}

/// Convert a JSON value into a document, rejecting non-objects
pub fn into_document(value: Value) -> Option<Document> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        into_document(value).unwrap()
    }

    #[test]
    fn test_get_path_top_level() {
        let d = doc(json!({"name": "Phones"}));
        assert_eq!(get_path(&d, "name"), Some(&json!("Phones")));
        assert_eq!(get_path(&d, "missing"), None);
    }

    #[test]
    fn test_get_path_nested() {
        let d = doc(json!({"category": {"name": "Phones", "meta": {"rank": 3}}}));
        assert_eq!(get_path(&d, "category.name"), Some(&json!("Phones")));
        assert_eq!(get_path(&d, "category.meta.rank"), Some(&json!(3)));
        assert_eq!(get_path(&d, "category.name.first"), None);
    }

    #[test]
    fn test_document_id() {
        let d = doc(json!({"_id": "65f1c2a9e4b0a1b2c3d4e5f6"}));
        assert_eq!(document_id(&d), Some("65f1c2a9e4b0a1b2c3d4e5f6"));
    }

    #[test]
    fn test_into_document_rejects_arrays() {
        assert!(into_document(json!([1, 2])).is_none());
    }
}
