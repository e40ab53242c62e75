use serde::{Deserialize, Serialize};

use crate::store::Direction;

/// Comparison applied when a field is used as a find filter.
///
/// `AtMostSearchValue` retrieves objects whose stored value is `<=` the
/// search value ("at or before" for timestamps). `AtLeastSearchValue`
/// retrieves objects whose stored value is `>=` the search value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Relation {
    #[default]
    Equals,
    AtMostSearchValue,
    AtLeastSearchValue,
    /// The stored array must contain every element of the search value.
    ArrayContainsAll,
}

impl Relation {
    /// Direction of the backing index for a field searched with this relation.
    pub fn index_direction(&self) -> Direction {
        match self {
            Relation::AtMostSearchValue => Direction::Descending,
            _ => Direction::Ascending,
        }
    }
}
