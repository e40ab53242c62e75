//! Translation of validated search criteria into storage queries.

use serde_json::{Map, Value};

use crate::constants::{CONTROL_PREFIX, COUNT_PARAM, DEFAULT_INDEX, INDEX_PARAM};
use crate::error::{BlogError, BlogErrors, BlogResult};
use crate::schema::{CategorySchema, Relation};
use crate::store::{key_of, Condition, Filter, FindOptions};

use super::documents::{is_key_field, storage_field};

/// A concrete storage query for one page of a find.
#[derive(Debug, Clone, PartialEq)]
pub struct FindQuery {
    pub filter: Filter,
    pub options: FindOptions,
}

/// Separates the `_index`/`_count` control parameters from the field
/// filters and builds one condition per filter field, using the field's
/// relation. Results are ordered by the category's canonical order.
pub fn build_find(
    schema: &CategorySchema,
    criteria: &Map<String, Value>,
    default_count: usize,
) -> BlogResult<FindQuery> {
    let mut errors = Vec::new();
    let mut param = |name: &str, default: usize| match control_param(schema.name(), criteria, name, default) {
        Ok(n) => n,
        Err(e) => {
            errors.push(e);
            default
        }
    };
    let skip = param(INDEX_PARAM, DEFAULT_INDEX);
    let limit = param(COUNT_PARAM, default_count);
    if let Some(errors) = BlogErrors::from_vec(errors) {
        return Err(errors);
    }

    let mut filter = Filter::new();
    for (name, value) in criteria {
        if name.starts_with(CONTROL_PREFIX) {
            continue;
        }
        filter.push(condition(schema, name, value));
    }

    Ok(FindQuery {
        filter,
        options: FindOptions::page(schema.order().clone(), skip, limit),
    })
}

fn condition(schema: &CategorySchema, name: &str, value: &Value) -> Condition {
    let field = storage_field(name).to_string();
    if is_key_field(schema, name) {
        return Condition::Equals {
            field,
            value: Value::String(key_of(value)),
        };
    }
    let value = value.clone();
    match schema.relation_of(name) {
        Relation::Equals => Condition::Equals { field, value },
        Relation::AtMostSearchValue => Condition::AtMost { field, value },
        Relation::AtLeastSearchValue => Condition::AtLeast { field, value },
        Relation::ArrayContainsAll => {
            let values = match value {
                Value::Array(items) => items,
                single => vec![single],
            };
            Condition::ContainsAll { field, values }
        }
    }
}

/// Reads a non-negative integer control parameter given as a number or a
/// numeric string.
pub fn control_param(
    category: &str,
    criteria: &Map<String, Value>,
    name: &str,
    default: usize,
) -> Result<usize, BlogError> {
    let Some(value) = criteria.get(name) else {
        return Ok(default);
    };
    let parsed = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed.map(|n| n as usize).ok_or_else(|| {
        BlogError::bad_field_value(format!(
            "bad value: {}; {} must be a non-negative integer for {} find",
            value, name, category
        ))
    })
}
