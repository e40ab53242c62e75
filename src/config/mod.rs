//! Configuration for the blog store.
//!
//! Configuration is loaded from a TOML file and then overridden by
//! environment variables:
//!
//! - `BLOGSTORE_DB_PATH` selects the sled backend at the given path
//! - `BLOGSTORE_DEFAULT_COUNT` sets the default page size for find
//! - `BLOGSTORE_LOG_LEVEL` sets the log level

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::DEFAULT_COUNT;
use crate::error::ConfigError;

/// Which storage backend holds the collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    #[default]
    Memory,
    Sled {
        path: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogConfig {
    pub storage: StorageConfig,
    /// Page size used by find when `_count` is not given
    pub default_count: usize,
    pub log_level: String,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::Memory,
            default_count: DEFAULT_COUNT,
            log_level: "info".to_string(),
        }
    }
}

impl BlogConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config = Self::from_toml(&content)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(path) = std::env::var("BLOGSTORE_DB_PATH") {
            self.storage = StorageConfig::Sled { path: path.into() };
        }
        if let Ok(count) = std::env::var("BLOGSTORE_DEFAULT_COUNT") {
            self.default_count = count.parse().map_err(|_| {
                ConfigError::Invalid(format!("BLOGSTORE_DEFAULT_COUNT is not a count: {}", count))
            })?;
        }
        if let Ok(level) = std::env::var("BLOGSTORE_LOG_LEVEL") {
            self.log_level = level;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_count == 0 {
            return Err(ConfigError::Invalid(
                "default_count must be positive".to_string(),
            ));
        }
        if let StorageConfig::Sled { path } = &self.storage {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(
                    "sled storage path cannot be empty".to_string(),
                ));
            }
        }
        if self.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "unknown log level {}",
                self.log_level
            )));
        }
        Ok(())
    }
}
