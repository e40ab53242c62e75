//! Conversion between external entities (`id`) and storage documents (`_id`).

use serde_json::{Map, Value};

use crate::constants::{CONTROL_PREFIX, ID_FIELD, STORAGE_ID_FIELD};
use crate::schema::CategorySchema;
use crate::store::{key_of, Document};

/// Storage name of an external field.
pub fn storage_field(name: &str) -> &str {
    if name == ID_FIELD {
        STORAGE_ID_FIELD
    } else {
        name
    }
}

/// True for `id` and for fields holding the id of another category.
pub fn is_key_field(schema: &CategorySchema, name: &str) -> bool {
    name == ID_FIELD || schema.identifies().contains_key(name)
}

/// Drops control fields and moves `id` to `_id`. Identifiers, including
/// references to other categories, are stored as strings.
pub fn to_storage(schema: &CategorySchema, object: &Map<String, Value>) -> Document {
    object
        .iter()
        .filter(|(name, _)| !name.starts_with(CONTROL_PREFIX))
        .map(|(name, value)| {
            let value = if is_key_field(schema, name) {
                Value::String(key_of(value))
            } else {
                value.clone()
            };
            (storage_field(name).to_string(), value)
        })
        .collect()
}

pub fn from_storage(mut document: Document) -> Map<String, Value> {
    if let Some(id) = document.remove(STORAGE_ID_FIELD) {
        document.insert(ID_FIELD.to_string(), id);
    }
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaRegistry;
    use serde_json::json;

    #[test]
    fn renames_id_and_strips_control_fields() {
        let registry = SchemaRegistry::blog().unwrap();
        let articles = registry.category("articles").unwrap();
        let object = json!({"id": 7, "title": "T", "_count": 3});
        let document = to_storage(articles, object.as_object().unwrap());
        assert_eq!(Value::Object(document.clone()), json!({"_id": "7", "title": "T"}));
        assert_eq!(Value::Object(from_storage(document)), json!({"id": "7", "title": "T"}));
    }

    #[test]
    fn references_are_stored_as_keys() {
        let registry = SchemaRegistry::blog().unwrap();
        let comments = registry.category("comments").unwrap();
        let object = json!({"articleId": 3.5, "commenterId": 42, "content": 9});
        let document = to_storage(comments, object.as_object().unwrap());
        assert_eq!(
            Value::Object(document),
            json!({"articleId": "3.5", "commenterId": "42", "content": 9})
        );
    }
}
