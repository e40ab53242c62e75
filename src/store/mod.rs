//! Storage collaborator: one document collection per category.
//!
//! Documents are JSON objects keyed by `_id`. Backends only need to
//! provide insert/find/update/delete with filter and sort/skip/limit
//! support; the engine owns every schema-level rule.

pub mod filter;
pub mod memory;
pub mod sled_store;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::config::StorageConfig;
use crate::constants::STORAGE_ID_FIELD;
use crate::error::{BlogError, StoreError, StoreResult};
use crate::schema::SchemaRegistry;

pub use filter::{compare_values, Condition, Filter};
pub use memory::MemoryCollection;
pub use sled_store::{SledCollection, SledStore};

pub type Document = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    /// Numeric form used in index bookkeeping (`1` / `-1`).
    pub fn as_i8(&self) -> i8 {
        match self {
            Direction::Ascending => 1,
            Direction::Descending => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    pub field: String,
    pub direction: Direction,
}

impl SortOrder {
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// Sort, offset and window size for [`Collection::find_many`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub sort: Option<SortOrder>,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl FindOptions {
    pub fn page(sort: SortOrder, skip: usize, limit: usize) -> Self {
        Self {
            sort: Some(sort),
            skip,
            limit: Some(limit),
        }
    }
}

/// A collection of documents for one category.
#[async_trait]
pub trait Collection: Send + Sync {
    fn name(&self) -> &str;

    /// Inserts a new document; fails with [`StoreError::DuplicateKey`] if
    /// its `_id` is already present.
    async fn insert(&self, document: Document) -> StoreResult<()>;

    async fn find_many(&self, filter: &Filter, options: &FindOptions)
        -> StoreResult<Vec<Document>>;

    /// Overwrites the fields in `patch` on the document with this id.
    /// Returns the number of matched documents.
    async fn update_fields(&self, id: &str, patch: &Document) -> StoreResult<u64>;

    /// Deletes the first document matching `filter`; returns the number deleted.
    async fn delete_one(&self, filter: &Filter) -> StoreResult<u64>;

    async fn count(&self) -> StoreResult<u64>;

    async fn ensure_index(&self, field: &str, direction: Direction) -> StoreResult<()>;

    async fn clear(&self) -> StoreResult<()>;
}

/// Storage key of a document.
pub fn document_key(document: &Document) -> StoreResult<String> {
    match document.get(STORAGE_ID_FIELD) {
        Some(value) => Ok(key_of(value)),
        None => Err(StoreError::Backend(format!(
            "document has no {} field",
            STORAGE_ID_FIELD
        ))),
    }
}

pub fn key_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Sorts matching documents and applies the skip/limit window.
///
/// Ties (and documents missing the sort field) are ordered by `_id`, so
/// consecutive pages partition the result set.
pub fn apply_options(mut documents: Vec<Document>, options: &FindOptions) -> Vec<Document> {
    if let Some(sort) = &options.sort {
        documents.sort_by(|a, b| {
            let primary = match (a.get(&sort.field), b.get(&sort.field)) {
                (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Greater,
                (None, Some(_)) => Ordering::Less,
                (None, None) => Ordering::Equal,
            };
            let primary = match sort.direction {
                Direction::Ascending => primary,
                Direction::Descending => primary.reverse(),
            };
            primary.then_with(|| tie_key(a).cmp(&tie_key(b)))
        });
    }
    let window = documents.into_iter().skip(options.skip);
    match options.limit {
        Some(limit) => window.take(limit).collect(),
        None => window.collect(),
    }
}

fn tie_key(document: &Document) -> String {
    document.get(STORAGE_ID_FIELD).map(key_of).unwrap_or_default()
}

/// Collections for every category, passed explicitly to the engine.
#[derive(Clone, Default)]
pub struct Storage {
    collections: HashMap<String, Arc<dyn Collection>>,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_collection(mut self, category: impl Into<String>, collection: Arc<dyn Collection>) -> Self {
        self.collections.insert(category.into(), collection);
        self
    }

    /// One in-process collection per registered category.
    pub fn in_memory(registry: &SchemaRegistry) -> Self {
        registry.categories().fold(Self::new(), |storage, schema| {
            storage.with_collection(
                schema.name(),
                Arc::new(MemoryCollection::new(schema.name())),
            )
        })
    }

    /// One sled tree per registered category in the database at `path`.
    pub fn open_sled<P: AsRef<Path>>(path: P, registry: &SchemaRegistry) -> StoreResult<Self> {
        SledStore::open(path)?.storage(registry)
    }

    pub fn from_config(config: &StorageConfig, registry: &SchemaRegistry) -> StoreResult<Self> {
        match config {
            StorageConfig::Memory => Ok(Self::in_memory(registry)),
            StorageConfig::Sled { path } => Self::open_sled(path, registry),
        }
    }

    pub fn collection(&self, category: &str) -> Result<&Arc<dyn Collection>, BlogError> {
        self.collections
            .get(category)
            .ok_or_else(|| BlogError::bad_category(format!("no storage for category {}", category)))
    }

    pub fn collections(&self) -> impl Iterator<Item = (&String, &Arc<dyn Collection>)> {
        self.collections.iter()
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.collections.keys().collect();
        names.sort();
        f.debug_struct("Storage").field("collections", &names).finish()
    }
}
