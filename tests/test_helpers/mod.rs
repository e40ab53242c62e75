#![allow(dead_code)]

use blogstore::{BlogStore, Entity, SchemaRegistry, Storage};
use serde_json::{json, Value};
use std::sync::{Arc, Once};
use tempfile::TempDir;
use uuid::Uuid;

static INIT: Once = Once::new();

pub fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// A store plus the directory backing it, when there is one.
pub struct TestStore {
    pub store: BlogStore,
    _dir: Option<TempDir>,
}

impl std::ops::Deref for TestStore {
    type Target = BlogStore;

    fn deref(&self) -> &BlogStore {
        &self.store
    }
}

pub async fn memory_store() -> TestStore {
    init_logging();
    let store = BlogStore::in_memory().await.expect("Failed to create memory store");
    TestStore { store, _dir: None }
}

pub async fn sled_store() -> TestStore {
    init_logging();
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join(format!("blogstore_test_{}", Uuid::new_v4()));
    let registry = Arc::new(SchemaRegistry::blog().expect("Failed to build registry"));
    let storage = Storage::open_sled(&path, &registry).expect("Failed to open sled storage");
    let store = BlogStore::new(registry, storage);
    store.ensure_indexes().await.expect("Failed to ensure indexes");
    TestStore {
        store,
        _dir: Some(dir),
    }
}

pub fn obj(value: Value) -> Entity {
    value
        .as_object()
        .cloned()
        .expect("test input must be a JSON object")
}

pub fn user(id: &str) -> Entity {
    obj(json!({
        "id": id,
        "email": format!("{}@example.com", id),
        "firstName": id,
        "lastName": "Tester",
        "roles": ["author", "commenter"],
    }))
}

pub fn article(author: &str, title: &str, keywords: &[&str]) -> Entity {
    obj(json!({
        "title": title,
        "content": format!("{} body", title),
        "authorId": author,
        "keywords": keywords,
    }))
}

pub fn comment(article: &str, commenter: &str) -> Entity {
    obj(json!({
        "content": "Nice post",
        "articleId": article,
        "commenterId": commenter,
    }))
}

pub fn ids(found: &[Entity]) -> Vec<String> {
    found
        .iter()
        .map(|e| e["id"].as_str().expect("id is a string").to_string())
        .collect()
}
