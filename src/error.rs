use serde::{Serialize, Serializer};
use std::fmt;
use std::io;
use thiserror::Error;

/// Kinds of failure reported by the blog store.
///
/// Every kind is a local, recoverable condition for the caller. Transport
/// layers are expected to map each kind to their own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Category is not one of the known entity kinds
    BadCategory,
    /// An object contains an unknown field name or a forbidden field
    BadField,
    /// The value of a field fails its check
    BadFieldValue,
    /// The value of a required field is not specified
    MissingField,
    /// Referenced object missing, target object missing, or removal
    /// blocked by live references
    BadId,
    /// An object being created already exists with the same id
    Exists,
    /// Underlying persistence failure
    Storage,
    /// Configuration could not be loaded
    Config,
}

impl ErrorKind {
    /// Stable code used in messages and serialized errors.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadCategory => "BAD_CATEGORY",
            Self::BadField => "BAD_FIELD",
            Self::BadFieldValue => "BAD_FIELD_VALUE",
            Self::MissingField => "MISSING_FIELD",
            Self::BadId => "BAD_ID",
            Self::Exists => "EXISTS",
            Self::Storage => "DB",
            Self::Config => "CONFIG",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// A single structured error: a kind plus a human-readable message.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{kind}: {message}")]
pub struct BlogError {
    #[serde(rename = "code")]
    pub kind: ErrorKind,
    pub message: String,
}

impl BlogError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn bad_category(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadCategory, message)
    }

    pub fn bad_field(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadField, message)
    }

    pub fn bad_field_value(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadFieldValue, message)
    }

    pub fn missing_field(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingField, message)
    }

    pub fn bad_id(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadId, message)
    }

    pub fn exists(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Exists, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }
}

/// The non-empty list of errors every public operation fails with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BlogErrors(Vec<BlogError>);

impl BlogErrors {
    /// Wraps collected errors; returns `None` when nothing was collected.
    pub fn from_vec(errors: Vec<BlogError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    pub fn errors(&self) -> &[BlogError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn kinds(&self) -> Vec<ErrorKind> {
        self.0.iter().map(|e| e.kind).collect()
    }

    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        self.0.iter().any(|e| e.kind == kind)
    }
}

impl fmt::Display for BlogErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for BlogErrors {}

impl From<BlogError> for BlogErrors {
    fn from(error: BlogError) -> Self {
        Self(vec![error])
    }
}

impl From<StoreError> for BlogErrors {
    fn from(error: StoreError) -> Self {
        BlogError::from(error).into()
    }
}

impl IntoIterator for BlogErrors {
    type Item = BlogError;
    type IntoIter = std::vec::IntoIter<BlogError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Errors raised by a storage collection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// An insert collided with an existing key
    #[error("duplicate key {0}")]
    DuplicateKey(String),
    /// The backend failed
    #[error("storage backend error: {0}")]
    Backend(String),
    /// A stored document could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<sled::Error> for StoreError {
    fn from(error: sled::Error) -> Self {
        StoreError::Backend(error.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        StoreError::Serialization(error.to_string())
    }
}

/// Duplicate keys surfacing here were not anticipated by the engine, so
/// they are reported as storage failures.
impl From<StoreError> for BlogError {
    fn from(error: StoreError) -> Self {
        BlogError::storage(error.to_string())
    }
}

/// Errors related to loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(error: toml::de::Error) -> Self {
        ConfigError::Parse(error.to_string())
    }
}

impl From<ConfigError> for BlogError {
    fn from(error: ConfigError) -> Self {
        BlogError::new(ErrorKind::Config, error.to_string())
    }
}

pub type BlogResult<T> = Result<T, BlogErrors>;
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_code_prefix() {
        let err = BlogError::bad_id("no users for id x in remove");
        assert_eq!(err.to_string(), "BAD_ID: no users for id x in remove");
    }

    #[test]
    fn empty_error_list_is_none() {
        assert!(BlogErrors::from_vec(Vec::new()).is_none());
        let errs = BlogErrors::from_vec(vec![
            BlogError::bad_field("a"),
            BlogError::missing_field("b"),
        ])
        .unwrap();
        assert_eq!(errs.kinds(), vec![ErrorKind::BadField, ErrorKind::MissingField]);
        assert_eq!(errs.to_string(), "BAD_FIELD: a\nMISSING_FIELD: b");
    }

    #[test]
    fn store_errors_become_storage_kind() {
        let err: BlogError = StoreError::Backend("connection lost".into()).into();
        assert_eq!(err.kind, ErrorKind::Storage);
    }

    #[test]
    fn serializes_with_code() {
        let json = serde_json::to_value(BlogError::exists("dup")).unwrap();
        assert_eq!(json, serde_json::json!({"code": "EXISTS", "message": "dup"}));
    }
}
