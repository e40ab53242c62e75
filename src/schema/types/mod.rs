pub mod action;
pub mod category;
pub mod field;
pub mod relation;

pub use action::Action;
pub use category::CategoryDefinition;
pub use field::{CheckFn, DefaultFn, FieldCheck, FieldDefinition, TransformFn};
pub use relation::Relation;
