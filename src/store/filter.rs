use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

use super::Document;

/// One predicate over a stored document field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// Stored value equals the given value, or is an array containing it
    Equals { field: String, value: Value },
    /// Stored value `<=` the given value
    AtMost { field: String, value: Value },
    /// Stored value `>=` the given value
    AtLeast { field: String, value: Value },
    /// Stored array contains every given element
    ContainsAll { field: String, values: Vec<Value> },
}

impl Condition {
    pub fn field(&self) -> &str {
        match self {
            Condition::Equals { field, .. }
            | Condition::AtMost { field, .. }
            | Condition::AtLeast { field, .. }
            | Condition::ContainsAll { field, .. } => field,
        }
    }

    pub fn matches(&self, document: &Document) -> bool {
        let stored = document.get(self.field());
        match self {
            Condition::Equals { value, .. } => match stored {
                Some(Value::Array(items)) if !value.is_array() => items.contains(value),
                Some(stored) => stored == value,
                None => value.is_null(),
            },
            Condition::AtMost { value, .. } => stored
                .and_then(|s| compare_values(s, value))
                .map(|o| o != Ordering::Greater)
                .unwrap_or(false),
            Condition::AtLeast { value, .. } => stored
                .and_then(|s| compare_values(s, value))
                .map(|o| o != Ordering::Less)
                .unwrap_or(false),
            Condition::ContainsAll { values, .. } => match stored {
                Some(Value::Array(items)) => values.iter().all(|v| items.contains(v)),
                _ => false,
            },
        }
    }
}

/// A conjunction of conditions; the empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equals(field: impl Into<String>, value: Value) -> Self {
        Self::new().with(Condition::Equals {
            field: field.into(),
            value,
        })
    }

    #[must_use]
    pub fn with(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn push(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.conditions.iter().all(|c| c.matches(document))
    }

    /// The exact value required for `field`, if an equality condition names it.
    pub fn equality_on(&self, field: &str) -> Option<&Value> {
        self.conditions.iter().find_map(|c| match c {
            Condition::Equals { field: f, value } if f == field => Some(value),
            _ => None,
        })
    }
}

/// Orders numbers numerically, strings lexically and booleans false-first.
/// Values of different types are incomparable.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
