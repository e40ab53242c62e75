//! Declarative entity metadata and the registry derived from it.

pub mod blog;
pub mod checks;
pub mod registry;
pub mod types;
pub mod validator;

pub use blog::{blog_schema, ARTICLES, COMMENTS, USERS};
pub use registry::{ActionFields, CategorySchema, SchemaRegistry};
pub use types::{Action, CategoryDefinition, FieldDefinition, Relation};
pub use validator::Validator;
