//! The blog store engine: validation plus referential integrity and query
//! translation over the storage collections.
//!
//! Every public operation first validates its input against the schema
//! registry and then runs the matching data-level operation. Referential
//! checks are read-then-act sequences against storage with no cross-call
//! locking; callers needing strict consistency must serialize above this
//! layer.

pub mod documents;
pub mod ids;
pub mod query;

use futures::future::try_join_all;
use log::{debug, error, info, warn};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::config::BlogConfig;
use crate::constants::{DEFAULT_COUNT, ID_FIELD, MAX_ID_ATTEMPTS, STORAGE_ID_FIELD};
use crate::error::{BlogError, BlogErrors, BlogResult, StoreError};
use crate::schema::{Action, CategorySchema, SchemaRegistry, Validator};
use crate::store::{key_of, Collection, Filter, FindOptions, Storage};

use documents::{from_storage, to_storage};
use ids::generate_id;
use query::build_find;

/// An entity as seen by callers: field name to value, identified by `id`.
pub type Entity = Map<String, Value>;

/// Multi-category content store over explicitly injected storage.
#[derive(Debug, Clone)]
pub struct BlogStore {
    registry: Arc<SchemaRegistry>,
    validator: Validator,
    storage: Storage,
    default_count: usize,
}

impl BlogStore {
    pub fn new(registry: Arc<SchemaRegistry>, storage: Storage) -> Self {
        Self {
            validator: Validator::new(registry.clone()),
            registry,
            storage,
            default_count: DEFAULT_COUNT,
        }
    }

    #[must_use]
    pub fn with_default_count(mut self, default_count: usize) -> Self {
        self.default_count = default_count;
        self
    }

    /// Blog registry over the configured backend, with indexes ensured.
    pub async fn from_config(config: &BlogConfig) -> BlogResult<Self> {
        let registry = Arc::new(SchemaRegistry::blog()?);
        let storage = Storage::from_config(&config.storage, &registry)?;
        let store = Self::new(registry, storage).with_default_count(config.default_count);
        store.ensure_indexes().await?;
        Ok(store)
    }

    /// Blog registry over in-memory collections.
    pub async fn in_memory() -> BlogResult<Self> {
        Self::from_config(&BlogConfig::default()).await
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn default_count(&self) -> usize {
        self.default_count
    }

    /// Ensures a storage index for every indexed field of every category.
    pub async fn ensure_indexes(&self) -> BlogResult<()> {
        for schema in self.registry.categories() {
            let collection = self.storage.collection(schema.name())?;
            for (field, relation) in schema.indexes() {
                let name = documents::storage_field(field);
                collection
                    .ensure_index(name, relation.index_direction())
                    .await
                    .map_err(|e| storage_failure("ensure index", e))?;
            }
            debug!("ensured {} indexes for {}", schema.indexes().len(), schema.name());
        }
        Ok(())
    }

    pub fn validate(&self, category: &str, action: Action, input: &Entity) -> BlogResult<Entity> {
        self.validator.validate(category, action, input)
    }

    /// Create an object as per `input` and return its id.
    pub async fn create(&self, category: &str, input: &Entity) -> BlogResult<String> {
        let object = self.validate(category, Action::Create, input)?;
        self.create_validated(category, object).await
    }

    /// Find objects of `category` meeting `input`.
    ///
    /// The page starts at offset `_index` (default 0) within all matching
    /// objects and holds up to `_count` (default from configuration)
    /// objects, newest first. No match is an empty page, not an error.
    ///
    /// Without an explicit `creationTime` the search is bounded by the
    /// current time, so objects created with a future `creationTime` are
    /// only found when a later bound is given.
    pub async fn find(&self, category: &str, input: &Entity) -> BlogResult<Vec<Entity>> {
        let criteria = self.validate(category, Action::Find, input)?;
        self.find_validated(category, &criteria).await
    }

    /// Update the object identified by `input.id` with the other fields of `input`.
    pub async fn update(&self, category: &str, input: &Entity) -> BlogResult<()> {
        let patch = self.validate(category, Action::Update, input)?;
        self.update_validated(category, &patch).await
    }

    /// Remove the object identified by `input.id`, unless it is still referenced.
    pub async fn remove(&self, category: &str, input: &Entity) -> BlogResult<()> {
        let criteria = self.validate(category, Action::Remove, input)?;
        self.remove_validated(category, &criteria).await
    }

    /// Remove all data from every category.
    pub async fn clear(&self) -> BlogResult<()> {
        for (name, collection) in self.storage.collections() {
            collection
                .clear()
                .await
                .map_err(|e| storage_failure("clear", e))?;
            debug!("cleared {}", name);
        }
        Ok(())
    }

    pub async fn create_validated(&self, category: &str, object: Entity) -> BlogResult<String> {
        let schema = self.registry.category(category)?;
        let collection = self.storage.collection(category)?;
        debug!("create {}: {:?}", category, object);

        self.check_identifies(schema, &object).await?;

        if schema.id_is_external() {
            let id = required_id(schema, &object, Action::Create)?;
            return match collection.insert(to_storage(schema, &object)).await {
                Ok(()) => {
                    info!("created {} {}", category, id);
                    Ok(id)
                }
                Err(StoreError::DuplicateKey(_)) => Err(BlogError::exists(format!(
                    "{} object having id {} already exists",
                    category, id
                ))
                .into()),
                Err(e) => Err(storage_failure("insert", e).into()),
            };
        }

        let mut document = to_storage(schema, &object);
        for _ in 0..MAX_ID_ATTEMPTS {
            let count = collection
                .count()
                .await
                .map_err(|e| storage_failure("count", e))?;
            let id = generate_id(count);
            document.insert(STORAGE_ID_FIELD.to_string(), Value::String(id.clone()));
            match collection.insert(document.clone()).await {
                Ok(()) => {
                    info!("created {} {}", category, id);
                    return Ok(id);
                }
                Err(StoreError::DuplicateKey(_)) => {
                    debug!("generated {} id {} collided, retrying", category, id);
                }
                Err(e) => return Err(storage_failure("insert", e).into()),
            }
        }
        Err(BlogError::storage(format!("could not generate a unique id for {}", category)).into())
    }

    pub async fn find_validated(&self, category: &str, criteria: &Entity) -> BlogResult<Vec<Entity>> {
        let schema = self.registry.category(category)?;
        let collection = self.storage.collection(category)?;
        let query = build_find(schema, criteria, self.default_count)?;
        debug!("find {}: {:?} {:?}", category, query.filter, query.options);

        let documents = collection
            .find_many(&query.filter, &query.options)
            .await
            .map_err(|e| storage_failure("find", e))?;
        Ok(documents.into_iter().map(from_storage).collect())
    }

    pub async fn update_validated(&self, category: &str, patch: &Entity) -> BlogResult<()> {
        let schema = self.registry.category(category)?;
        let collection = self.storage.collection(category)?;
        let id = required_id(schema, patch, Action::Update)?;

        let mut fields = to_storage(schema, patch);
        fields.remove(STORAGE_ID_FIELD);
        let matched = collection
            .update_fields(&id, &fields)
            .await
            .map_err(|e| storage_failure("update", e))?;
        if matched != 1 {
            return Err(BlogError::bad_id(format!("no {} for id {} in update", category, id)).into());
        }
        info!("updated {} {} ({} fields)", category, id, fields.len());
        Ok(())
    }

    pub async fn remove_validated(&self, category: &str, criteria: &Entity) -> BlogResult<()> {
        let schema = self.registry.category(category)?;
        let collection = self.storage.collection(category)?;
        let id = required_id(schema, criteria, Action::Remove)?;
        let not_found = || BlogError::bad_id(format!("no {} for id {} in remove", category, id));

        if lookup_id(collection.as_ref(), &id).await?.is_empty() {
            return Err(not_found().into());
        }

        self.check_identified_by(schema, &id).await?;

        let deleted = collection
            .delete_one(&Filter::equals(STORAGE_ID_FIELD, Value::String(id.clone())))
            .await
            .map_err(|e| storage_failure("delete", e))?;
        if deleted != 1 {
            return Err(not_found().into());
        }
        info!("removed {} {}", category, id);
        Ok(())
    }

    /// Every field identifying another category must hold the id of exactly
    /// one existing object there. All fields are checked before failing.
    async fn check_identifies(&self, schema: &CategorySchema, object: &Entity) -> BlogResult<()> {
        let checks = schema
            .identifies()
            .iter()
            .filter_map(|(field, target)| object.get(field).map(|value| (field, target, value)))
            .map(|(field, target, value)| self.reference_error(schema, field, target, value));

        let errors: Vec<BlogError> = try_join_all(checks).await?.into_iter().flatten().collect();
        match BlogErrors::from_vec(errors) {
            Some(errors) => {
                warn!("create {} rejected: {}", schema.name(), errors);
                Err(errors)
            }
            None => Ok(()),
        }
    }

    async fn reference_error(
        &self,
        schema: &CategorySchema,
        field: &str,
        target: &str,
        value: &Value,
    ) -> BlogResult<Option<BlogError>> {
        let collection = self.storage.collection(target)?;
        let other_id = key_of(value);
        if lookup_id(collection.as_ref(), &other_id).await?.len() == 1 {
            return Ok(None);
        }
        let friendly = schema
            .field(field)
            .map(|f| f.friendly_name.as_str())
            .unwrap_or(field);
        Ok(Some(BlogError::bad_id(format!(
            "invalid {} {} in {} for create {}",
            friendly,
            other_id,
            target,
            schema.name()
        ))))
    }

    /// Collects one error per category still referencing `id`, naming all
    /// of the referencing objects.
    async fn check_identified_by(&self, schema: &CategorySchema, id: &str) -> BlogResult<()> {
        let checks = schema
            .identified_by()
            .iter()
            .map(|(other, field)| self.referrers_error(schema, other, field, id));

        let errors: Vec<BlogError> = try_join_all(checks).await?.into_iter().flatten().collect();
        match BlogErrors::from_vec(errors) {
            Some(errors) => {
                warn!("remove {} {} blocked: {}", schema.name(), id, errors);
                Err(errors)
            }
            None => Ok(()),
        }
    }

    async fn referrers_error(
        &self,
        schema: &CategorySchema,
        other: &str,
        field: &str,
        id: &str,
    ) -> BlogResult<Option<BlogError>> {
        let other_schema = self.registry.category(other)?;
        let collection = self.storage.collection(other)?;
        let filter = Filter::equals(field, Value::String(id.to_string()));
        let options = FindOptions {
            sort: Some(other_schema.order().clone()),
            ..FindOptions::default()
        };
        let referencing = collection
            .find_many(&filter, &options)
            .await
            .map_err(|e| storage_failure("find", e))?;
        if referencing.is_empty() {
            return Ok(None);
        }
        let ids: Vec<String> = referencing
            .iter()
            .map(|d| d.get(STORAGE_ID_FIELD).map(key_of).unwrap_or_default())
            .collect();
        Ok(Some(BlogError::bad_id(format!(
            "{} {} referenced by {} for {} {}",
            schema.name(),
            id,
            field,
            other,
            ids.join(", ")
        ))))
    }
}

/// Targeted single-id lookup used by the referential checks.
async fn lookup_id(collection: &dyn Collection, id: &str) -> BlogResult<Vec<Entity>> {
    let options = FindOptions {
        limit: Some(2),
        ..FindOptions::default()
    };
    let found = collection
        .find_many(&Filter::equals(STORAGE_ID_FIELD, Value::String(id.to_string())), &options)
        .await
        .map_err(|e| storage_failure("find", e))?;
    Ok(found.into_iter().map(from_storage).collect())
}

fn required_id(schema: &CategorySchema, object: &Entity, action: Action) -> BlogResult<String> {
    match object.get(ID_FIELD) {
        Some(id) => Ok(key_of(id)),
        None => {
            let friendly = schema
                .field(ID_FIELD)
                .map(|f| f.friendly_name.as_str())
                .unwrap_or(ID_FIELD);
            Err(BlogError::missing_field(format!(
                "missing {} fields for {} {}",
                friendly,
                schema.name(),
                action
            ))
            .into())
        }
    }
}

fn storage_failure(operation: &str, error: StoreError) -> BlogError {
    error!("storage {} failed: {}", operation, error);
    BlogError::from(error)
}
