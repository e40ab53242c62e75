//! # Blogstore
//!
//! A metadata-driven validation and query engine for a small blog content
//! store holding users, articles and comments.
//!
//! Each category is described by field metadata: which fields are required
//! or forbidden for each action, value checks and transforms, defaults,
//! cross-category references and search relations. The engine validates
//! every request against that metadata, enforces referential integrity on
//! create and remove, and translates searches into paged storage queries.
//!
//! ## Core components
//!
//! * `schema` - field metadata, the derived per-category registry and the validator
//! * `store` - the storage collaborator with in-memory and sled backends
//! * `engine` - [`BlogStore`], the public create/find/update/remove/clear API
//! * `config` - TOML and environment configuration
//! * `logging` - logger setup for binaries

pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod logging;
pub mod schema;
pub mod store;

pub use config::{BlogConfig, StorageConfig};
pub use engine::{BlogStore, Entity};
pub use error::{BlogError, BlogErrors, BlogResult, ErrorKind, StoreError};
pub use schema::{Action, SchemaRegistry, Validator};
pub use store::{Collection, Storage};
