use super::FieldDefinition;
use crate::constants::CREATION_TIME_FIELD;
use crate::store::{Direction, SortOrder};

/// Ordered field definitions for one entity kind.
#[derive(Debug, Clone)]
pub struct CategoryDefinition {
    pub name: String,
    pub fields: Vec<FieldDefinition>,
    /// Canonical order of find results.
    pub order: SortOrder,
}

impl CategoryDefinition {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDefinition>) -> Self {
        Self {
            name: name.into(),
            fields,
            order: SortOrder::new(CREATION_TIME_FIELD, Direction::Descending),
        }
    }

    #[must_use]
    pub fn ordered_by(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }
}
