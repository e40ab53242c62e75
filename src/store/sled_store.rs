use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use super::{
    apply_options, document_key, key_of, Collection, Direction, Document, Filter, FindOptions,
    Storage,
};
use crate::constants::{INDEXES_TREE, STORAGE_ID_FIELD};
use crate::error::{StoreError, StoreResult};
use crate::schema::SchemaRegistry;

/// A sled database holding one tree per category.
#[derive(Clone)]
pub struct SledStore {
    db: sled::Db,
    indexes_tree: sled::Tree,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// A database that is removed when dropped.
    pub fn temporary() -> StoreResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> StoreResult<Self> {
        let indexes_tree = db.open_tree(INDEXES_TREE)?;
        Ok(Self { db, indexes_tree })
    }

    pub fn collection(&self, category: &str) -> StoreResult<SledCollection> {
        let tree = self.db.open_tree(category)?;
        Ok(SledCollection {
            name: category.to_string(),
            tree,
            indexes_tree: self.indexes_tree.clone(),
        })
    }

    pub fn storage(&self, registry: &SchemaRegistry) -> StoreResult<Storage> {
        let mut storage = Storage::new();
        for schema in registry.categories() {
            let collection = self.collection(schema.name())?;
            storage = storage.with_collection(schema.name(), Arc::new(collection));
        }
        Ok(storage)
    }

    /// Directions recorded by `ensure_index`, keyed `{category}-{field}`.
    pub fn recorded_indexes(&self) -> StoreResult<Vec<(String, i8)>> {
        let mut indexes = Vec::new();
        for result in self.indexes_tree.iter() {
            let (key, value) = result?;
            let direction = value.first().map(|b| *b as i8).unwrap_or(1);
            indexes.push((String::from_utf8_lossy(&key).to_string(), direction));
        }
        Ok(indexes)
    }
}

/// A category collection stored in one sled tree, keyed by `_id`.
#[derive(Clone)]
pub struct SledCollection {
    name: String,
    tree: sled::Tree,
    indexes_tree: sled::Tree,
}

impl SledCollection {
    fn decode(bytes: &[u8]) -> StoreResult<Document> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn scan(&self, filter: &Filter) -> StoreResult<Vec<Document>> {
        if let Some(id) = filter.equality_on(STORAGE_ID_FIELD) {
            let found = match self.tree.get(key_of(id).as_bytes())? {
                Some(bytes) => Some(Self::decode(&bytes)?),
                None => None,
            };
            return Ok(found.into_iter().filter(|d| filter.matches(d)).collect());
        }
        let mut matching = Vec::new();
        for result in self.tree.iter() {
            let (_, bytes) = result?;
            let document = Self::decode(&bytes)?;
            if filter.matches(&document) {
                matching.push(document);
            }
        }
        Ok(matching)
    }

    async fn flush(&self) -> StoreResult<()> {
        self.tree.flush_async().await?;
        Ok(())
    }
}

#[async_trait]
impl Collection for SledCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert(&self, document: Document) -> StoreResult<()> {
        let key = document_key(&document)?;
        let bytes = serde_json::to_vec(&document)?;
        let swapped = self
            .tree
            .compare_and_swap(key.as_bytes(), None as Option<&[u8]>, Some(bytes))?;
        if swapped.is_err() {
            return Err(StoreError::DuplicateKey(key));
        }
        self.flush().await
    }

    async fn find_many(
        &self,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>> {
        let matching = self.scan(filter)?;
        Ok(apply_options(matching, options))
    }

    async fn update_fields(&self, id: &str, patch: &Document) -> StoreResult<u64> {
        loop {
            let Some(current) = self.tree.get(id.as_bytes())? else {
                return Ok(0);
            };
            let mut document = Self::decode(&current)?;
            for (field, value) in patch {
                if field != STORAGE_ID_FIELD {
                    document.insert(field.clone(), value.clone());
                }
            }
            let bytes = serde_json::to_vec(&document)?;
            // retry when a concurrent writer changed the document in between
            if self
                .tree
                .compare_and_swap(id.as_bytes(), Some(current), Some(bytes))?
                .is_ok()
            {
                self.flush().await?;
                return Ok(1);
            }
        }
    }

    async fn delete_one(&self, filter: &Filter) -> StoreResult<u64> {
        let target = match filter.equality_on(STORAGE_ID_FIELD) {
            Some(_) => self.scan(filter)?.into_iter().next(),
            None => {
                let mut first = None;
                for result in self.tree.iter() {
                    let (_, bytes) = result?;
                    let document = Self::decode(&bytes)?;
                    if filter.matches(&document) {
                        first = Some(document);
                        break;
                    }
                }
                first
            }
        };
        let Some(document) = target else {
            return Ok(0);
        };
        let key = document_key(&document)?;
        let removed = self.tree.remove(key.as_bytes())?.is_some();
        self.flush().await?;
        Ok(u64::from(removed))
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.tree.len() as u64)
    }

    async fn ensure_index(&self, field: &str, direction: Direction) -> StoreResult<()> {
        let key = format!("{}-{}", self.name, field);
        self.indexes_tree
            .insert(key.as_bytes(), vec![direction.as_i8() as u8])?;
        self.indexes_tree.flush_async().await?;
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        self.tree.clear()?;
        self.flush().await
    }
}
