/// Common constants used across the blog store.
///
/// These defaults are used by the query layer and configuration
/// when explicit values are not provided.
pub const DEFAULT_COUNT: usize = 5;
pub const DEFAULT_INDEX: usize = 0;

/// Fields starting with this prefix are control parameters and bypass validation.
pub const CONTROL_PREFIX: char = '_';
pub const INDEX_PARAM: &str = "_index";
pub const COUNT_PARAM: &str = "_count";

/// Externally visible identifier field.
pub const ID_FIELD: &str = "id";
/// Identifier field as stored by the collections.
pub const STORAGE_ID_FIELD: &str = "_id";

pub const CREATION_TIME_FIELD: &str = "creationTime";
pub const UPDATE_TIME_FIELD: &str = "updateTime";

/// How many fresh identifiers are tried before a create gives up.
pub const MAX_ID_ATTEMPTS: usize = 8;

/// Name of the sled tree recording which indexes have been ensured.
pub const INDEXES_TREE: &str = "indexes";
