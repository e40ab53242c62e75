use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use super::{Action, Relation};

pub type CheckFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;
pub type TransformFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;
pub type DefaultFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// A validity predicate together with the message reported when it fails.
#[derive(Clone)]
pub struct FieldCheck {
    pub predicate: CheckFn,
    pub error: String,
}

impl FieldCheck {
    pub fn accepts(&self, value: &Value) -> bool {
        (self.predicate)(value)
    }
}

/// Declarative metadata describing one attribute of one category.
///
/// A field that is neither required nor forbidden for an action is
/// optional for that action. Predicates, transforms and defaults are
/// plain function values; the validator dispatches over them uniformly.
#[derive(Clone)]
pub struct FieldDefinition {
    pub name: String,
    pub friendly_name: String,
    pub required_for: BTreeSet<Action>,
    pub forbidden_for: BTreeSet<Action>,
    pub check: Option<FieldCheck>,
    pub transform: Option<TransformFn>,
    pub default_value: Option<DefaultFn>,
    /// Category whose `id` this field's value must equal.
    pub references: Option<String>,
    pub relation: Relation,
    pub indexed: bool,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, friendly_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            friendly_name: friendly_name.into(),
            required_for: BTreeSet::new(),
            forbidden_for: BTreeSet::new(),
            check: None,
            transform: None,
            default_value: None,
            references: None,
            relation: Relation::Equals,
            indexed: false,
        }
    }

    #[must_use]
    pub fn required(mut self, actions: &[Action]) -> Self {
        self.required_for.extend(actions.iter().copied());
        self
    }

    #[must_use]
    pub fn forbidden(mut self, actions: &[Action]) -> Self {
        self.forbidden_for.extend(actions.iter().copied());
        self
    }

    #[must_use]
    pub fn check<F>(mut self, predicate: F, error: impl Into<String>) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.check = Some(FieldCheck {
            predicate: Arc::new(predicate),
            error: error.into(),
        });
        self
    }

    #[must_use]
    pub fn transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }

    #[must_use]
    pub fn default_with<F>(mut self, default: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default_value = Some(Arc::new(default));
        self
    }

    #[must_use]
    pub fn identifies(mut self, category: impl Into<String>) -> Self {
        self.references = Some(category.into());
        self
    }

    #[must_use]
    pub fn relation(mut self, relation: Relation) -> Self {
        self.relation = relation;
        self
    }

    #[must_use]
    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    pub fn is_required_for(&self, action: Action) -> bool {
        self.required_for.contains(&action)
    }

    pub fn is_forbidden_for(&self, action: Action) -> bool {
        self.forbidden_for.contains(&action)
    }

    /// Applies the transform, if any, to an accepted raw value.
    pub fn apply_transform(&self, value: Value) -> Value {
        match &self.transform {
            Some(transform) => transform(value),
            None => value,
        }
    }

    pub fn default_value(&self) -> Option<Value> {
        self.default_value.as_ref().map(|default| default())
    }
}

impl fmt::Debug for FieldDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDefinition")
            .field("name", &self.name)
            .field("friendly_name", &self.friendly_name)
            .field("required_for", &self.required_for)
            .field("forbidden_for", &self.forbidden_for)
            .field("check", &self.check.as_ref().map(|c| &c.error))
            .field("transform", &self.transform.is_some())
            .field("default_value", &self.default_value.is_some())
            .field("references", &self.references)
            .field("relation", &self.relation)
            .field("indexed", &self.indexed)
            .finish()
    }
}
