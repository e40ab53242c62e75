//! Schema registry: per-category lookup tables derived once from the
//! field metadata and immutable afterwards.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::blog::blog_schema;
use super::types::{Action, CategoryDefinition, FieldDefinition, Relation};
use crate::constants::ID_FIELD;
use crate::error::BlogError;
use crate::store::SortOrder;

/// Disjoint required/forbidden/optional field-name sets for one action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionFields {
    pub required: BTreeSet<String>,
    pub forbidden: BTreeSet<String>,
    pub optional: BTreeSet<String>,
}

/// The derived view of one category.
#[derive(Debug, Clone)]
pub struct CategorySchema {
    name: String,
    fields: Vec<FieldDefinition>,
    positions: HashMap<String, usize>,
    actions: HashMap<Action, ActionFields>,
    indexes: BTreeMap<String, Relation>,
    identifies: BTreeMap<String, String>,
    identified_by: Vec<(String, String)>,
    order: SortOrder,
}

impl CategorySchema {
    fn build(definition: CategoryDefinition) -> Result<Self, BlogError> {
        let CategoryDefinition {
            name,
            fields,
            order,
        } = definition;

        let mut positions = HashMap::new();
        for (i, field) in fields.iter().enumerate() {
            if positions.insert(field.name.clone(), i).is_some() {
                return Err(BlogError::bad_field(format!(
                    "duplicate field {} in category {}",
                    field.name, name
                )));
            }
        }

        let mut actions: HashMap<Action, ActionFields> = Action::ALL
            .iter()
            .map(|a| (*a, ActionFields::default()))
            .collect();
        for field in &fields {
            for action in &field.required_for {
                if let Some(sets) = actions.get_mut(action) {
                    sets.required.insert(field.name.clone());
                }
            }
            for action in &field.forbidden_for {
                if let Some(sets) = actions.get_mut(action) {
                    sets.forbidden.insert(field.name.clone());
                }
            }
        }
        for sets in actions.values_mut() {
            for field in &fields {
                if !sets.required.contains(&field.name) && !sets.forbidden.contains(&field.name)
                {
                    sets.optional.insert(field.name.clone());
                }
            }
        }

        // id is always an index field
        let indexes = fields
            .iter()
            .filter(|f| f.indexed || f.name == ID_FIELD)
            .map(|f| (f.name.clone(), f.relation))
            .collect();

        let identifies = fields
            .iter()
            .filter_map(|f| f.references.clone().map(|cat| (f.name.clone(), cat)))
            .collect();

        Ok(Self {
            name,
            fields,
            positions,
            actions,
            indexes,
            identifies,
            identified_by: Vec::new(),
            order,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.positions.get(name).map(|i| &self.fields[*i])
    }

    pub fn action_fields(&self, action: Action) -> &ActionFields {
        // every action is populated in build()
        &self.actions[&action]
    }

    /// Indexed fields and the relation they are searched with.
    pub fn indexes(&self) -> &BTreeMap<String, Relation> {
        &self.indexes
    }

    /// Local field -> category whose id the field holds.
    pub fn identifies(&self) -> &BTreeMap<String, String> {
        &self.identifies
    }

    /// `(other category, field)` pairs that reference this category.
    pub fn identified_by(&self) -> &[(String, String)] {
        &self.identified_by
    }

    pub fn order(&self) -> &SortOrder {
        &self.order
    }

    /// True when `id` must be supplied by the caller on create.
    pub fn id_is_external(&self) -> bool {
        !self
            .action_fields(Action::Create)
            .forbidden
            .contains(ID_FIELD)
    }

    pub fn relation_of(&self, field: &str) -> Relation {
        self.field(field).map(|f| f.relation).unwrap_or_default()
    }
}

/// Immutable registry of every category schema.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    categories: BTreeMap<String, CategorySchema>,
}

impl SchemaRegistry {
    pub fn new(definitions: Vec<CategoryDefinition>) -> Result<Self, BlogError> {
        let mut categories = BTreeMap::new();
        for definition in definitions {
            let name = definition.name.clone();
            let schema = CategorySchema::build(definition)?;
            if categories.insert(name.clone(), schema).is_some() {
                return Err(BlogError::bad_category(format!("duplicate category {}", name)));
            }
        }

        let mut reverse: Vec<(String, String, String)> = Vec::new();
        for (category, schema) in &categories {
            for (field, target) in &schema.identifies {
                if !categories.contains_key(target) {
                    return Err(BlogError::bad_category(format!(
                        "field {} of {} identifies unknown category {}",
                        field, category, target
                    )));
                }
                reverse.push((target.clone(), category.clone(), field.clone()));
            }
        }
        for (target, category, field) in reverse {
            if let Some(schema) = categories.get_mut(&target) {
                schema.identified_by.push((category, field));
            }
        }

        Ok(Self { categories })
    }

    /// Registry for the users/articles/comments blog metadata.
    pub fn blog() -> Result<Self, BlogError> {
        Self::new(blog_schema())
    }

    pub fn category(&self, name: &str) -> Result<&CategorySchema, BlogError> {
        self.categories
            .get(name)
            .ok_or_else(|| BlogError::bad_category(format!("unknown category {}", name)))
    }

    pub fn categories(&self) -> impl Iterator<Item = &CategorySchema> {
        self.categories.values()
    }
}
