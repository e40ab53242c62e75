use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::registry::SchemaRegistry;
use super::types::Action;
use crate::constants::CONTROL_PREFIX;
use crate::error::{BlogError, BlogErrors, BlogResult};

/// Validates raw input objects against the [`SchemaRegistry`].
///
/// Validation never touches storage. All structural problems in one input
/// are collected and reported together; no partial object is returned.
#[derive(Debug, Clone)]
pub struct Validator {
    registry: Arc<SchemaRegistry>,
}

impl Validator {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Validate `input` for `action` on `category`, returning the object
    /// with transforms applied and defaults filled in.
    pub fn validate(
        &self,
        category: &str,
        action: Action,
        input: &Map<String, Value>,
    ) -> BlogResult<Map<String, Value>> {
        let schema = self.registry.category(category)?;
        let sets = schema.action_fields(action);
        let suffix = format!("for {} {}", category, action);

        let mut out = Map::new();
        let mut errors = Vec::new();
        let mut seen = BTreeSet::new();

        for (name, value) in input {
            seen.insert(name.as_str());
            if name.starts_with(CONTROL_PREFIX) {
                out.insert(name.clone(), value.clone());
                continue;
            }
            let Some(field) = schema.field(name) else {
                errors.push(BlogError::bad_field(format!(
                    "unknown {} field {} {}",
                    category, name, suffix
                )));
                continue;
            };
            if sets.forbidden.contains(name) {
                errors.push(BlogError::bad_field(format!(
                    "the {} field is forbidden {}",
                    field.friendly_name, suffix
                )));
                continue;
            }
            if let Some(check) = &field.check {
                if !check.accepts(value) {
                    errors.push(BlogError::bad_field_value(format!(
                        "bad value: {}; {} {}",
                        display_value(value),
                        check.error,
                        suffix
                    )));
                    continue;
                }
            }
            out.insert(name.clone(), field.apply_transform(value.clone()));
        }

        let missing: Vec<&str> = schema
            .fields()
            .iter()
            .filter(|f| sets.required.contains(&f.name) && !seen.contains(f.name.as_str()))
            .map(|f| f.friendly_name.as_str())
            .collect();
        if !missing.is_empty() {
            errors.push(BlogError::missing_field(format!(
                "missing {} fields {}",
                missing.join(", "),
                suffix
            )));
        }

        if let Some(errors) = BlogErrors::from_vec(errors) {
            return Err(errors);
        }

        for name in &sets.optional {
            if out.contains_key(name) {
                continue;
            }
            if let Some(default) = schema.field(name).and_then(|f| f.default_value()) {
                out.insert(name.clone(), default);
            }
        }
        Ok(out)
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn validator() -> Validator {
        Validator::new(Arc::new(SchemaRegistry::blog().unwrap()))
    }

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn valid_user() -> Map<String, Value> {
        obj(json!({
            "id": "betty77",
            "email": "betty@example.com",
            "firstName": "Betty",
            "lastName": "Smith",
            "roles": ["author"],
        }))
    }

    #[test]
    fn unknown_category() {
        let errs = validator()
            .validate("posts", Action::Find, &Map::new())
            .unwrap_err();
        assert_eq!(errs.kinds(), vec![ErrorKind::BadCategory]);
    }

    #[test]
    fn missing_fields_are_aggregated_in_declaration_order() {
        let errs = validator()
            .validate("users", Action::Create, &Map::new())
            .unwrap_err();
        assert_eq!(errs.len(), 1);
        let err = &errs.errors()[0];
        assert_eq!(err.kind, ErrorKind::MissingField);
        assert_eq!(
            err.message,
            "missing user ID, user email, user first name, user last name, user roles \
             fields for users create"
        );
    }

    #[test]
    fn complete_create_fills_defaults() {
        let out = validator()
            .validate("users", Action::Create, &valid_user())
            .unwrap();
        assert!(out.contains_key("creationTime"));
        assert!(out.contains_key("updateTime"));
        assert_eq!(out["id"], json!("betty77"));
    }

    #[test]
    fn collects_every_problem() {
        let mut input = valid_user();
        input.insert("email".into(), json!("nope"));
        input.insert("nickname".into(), json!("bets"));
        input.remove("lastName");
        let errs = validator()
            .validate("users", Action::Create, &input)
            .unwrap_err();
        let mut kinds = errs.kinds();
        kinds.sort_by_key(|k| k.code());
        assert_eq!(
            kinds,
            vec![ErrorKind::BadField, ErrorKind::BadFieldValue, ErrorKind::MissingField]
        );
        assert!(errs.errors().iter().any(|e| e.message
            == "bad value: nope; the user email fields must be of the form id@domain \
                for users create"));
        assert!(errs
            .errors()
            .iter()
            .any(|e| e.message == "unknown users field nickname for users create"));
    }

    #[test]
    fn forbidden_field_is_rejected() {
        let input = obj(json!({"roles": ["admin"]}));
        let errs = validator()
            .validate("users", Action::Find, &input)
            .unwrap_err();
        assert_eq!(errs.kinds(), vec![ErrorKind::BadField]);
        assert_eq!(
            errs.errors()[0].message,
            "the user roles field is forbidden for users find"
        );
    }

    #[test]
    fn control_fields_pass_through() {
        let input = obj(json!({"_count": "3", "_whatever": true}));
        let out = validator().validate("users", Action::Find, &input).unwrap();
        assert_eq!(out["_count"], json!("3"));
        assert_eq!(out["_whatever"], json!(true));
    }

    #[test]
    fn transforms_timestamps() {
        let mut input = valid_user();
        input.insert("creationTime".into(), json!("2020-01-02"));
        let out = validator()
            .validate("users", Action::Create, &input)
            .unwrap();
        assert_eq!(out["creationTime"], json!("2020-01-02T00:00:00.000Z"));
    }

    #[test]
    fn update_defaults_update_time_only() {
        let input = obj(json!({"id": "a1", "title": "New"}));
        let out = validator()
            .validate("articles", Action::Update, &input)
            .unwrap();
        assert!(out.contains_key("updateTime"));
        assert!(!out.contains_key("creationTime"));
    }
}
