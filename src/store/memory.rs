use async_trait::async_trait;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{apply_options, document_key, key_of, Collection, Direction, Document, Filter, FindOptions};
use crate::constants::STORAGE_ID_FIELD;
use crate::error::{StoreError, StoreResult};

/// In-process collection guarded by a tokio `RwLock`.
#[derive(Debug)]
pub struct MemoryCollection {
    name: String,
    documents: RwLock<BTreeMap<String, Document>>,
    indexes: RwLock<BTreeMap<String, Direction>>,
}

impl MemoryCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: RwLock::new(BTreeMap::new()),
            indexes: RwLock::new(BTreeMap::new()),
        }
    }

    pub async fn index_direction(&self, field: &str) -> Option<Direction> {
        self.indexes.read().await.get(field).copied()
    }
}

#[async_trait]
impl Collection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert(&self, document: Document) -> StoreResult<()> {
        let key = document_key(&document)?;
        let mut documents = self.documents.write().await;
        match documents.entry(key) {
            Entry::Occupied(entry) => Err(StoreError::DuplicateKey(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(document);
                Ok(())
            }
        }
    }

    async fn find_many(
        &self,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>> {
        let documents = self.documents.read().await;
        let matching: Vec<Document> = match filter.equality_on(STORAGE_ID_FIELD) {
            Some(id) => documents
                .get(&key_of(id))
                .filter(|d| filter.matches(d))
                .cloned()
                .into_iter()
                .collect(),
            None => documents
                .values()
                .filter(|d| filter.matches(d))
                .cloned()
                .collect(),
        };
        Ok(apply_options(matching, options))
    }

    async fn update_fields(&self, id: &str, patch: &Document) -> StoreResult<u64> {
        let mut documents = self.documents.write().await;
        match documents.get_mut(id) {
            Some(document) => {
                for (field, value) in patch {
                    if field != STORAGE_ID_FIELD {
                        document.insert(field.clone(), value.clone());
                    }
                }
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_one(&self, filter: &Filter) -> StoreResult<u64> {
        let mut documents = self.documents.write().await;
        let key = documents
            .iter()
            .find(|(_, d)| filter.matches(d))
            .map(|(k, _)| k.clone());
        match key {
            Some(key) => {
                documents.remove(&key);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.documents.read().await.len() as u64)
    }

    async fn ensure_index(&self, field: &str, direction: Direction) -> StoreResult<()> {
        self.indexes
            .write()
            .await
            .insert(field.to_string(), direction);
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        self.documents.write().await.clear();
        Ok(())
    }
}
