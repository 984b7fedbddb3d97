//! YAML configuration for the recommendation engine.
//!
//! One document configures every stage: embedding, the on-disk store,
//! the preference update mode, and recommendation defaults. Every field
//! has a serde default so a minimal file only states what it overrides.
//!
//! ## Example
//!
//! ```yaml
//! version: "1.0"
//! name: "production"
//!
//! embed:
//!   mode: "hash"
//!   text_dimension: 96
//!
//! store:
//!   path: "./data/orgvec.idx"
//!
//! preference:
//!   mean_mode: literal
//!
//! recommend:
//!   default_limit: 10
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use embed::EmbedConfig;

use crate::preference::MeanMode;

/// Errors that can occur when loading the engine configuration.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DonorecConfig {
    /// Configuration format version.
    #[serde(default = "default_version")]
    pub version: String,

    /// Optional configuration name/description.
    #[serde(default)]
    pub name: Option<String>,

    /// Embedding stage configuration.
    #[serde(default)]
    pub embed: EmbedConfig,

    /// Vector store configuration.
    #[serde(default)]
    pub store: StoreConfig,

    /// Preference update configuration.
    #[serde(default)]
    pub preference: PreferenceConfig,

    /// Recommendation query configuration.
    #[serde(default)]
    pub recommend: RecommendConfig,
}

/// Vector store section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    /// Location of the on-disk index file.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

/// Preference update section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreferenceConfig {
    /// Which running-average recurrence to use for the taste slots.
    #[serde(default)]
    pub mean_mode: MeanMode,
}

/// Recommendation query section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecommendConfig {
    /// Result count used when a caller does not specify one.
    #[serde(default = "default_limit")]
    pub default_limit: usize,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./data/orgvec.idx")
}

fn default_limit() -> usize {
    10
}

impl Default for DonorecConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            name: None,
            embed: EmbedConfig::default(),
            store: StoreConfig::default(),
            preference: PreferenceConfig::default(),
            recommend: RecommendConfig::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
        }
    }
}

impl DonorecConfig {
    /// Load a YAML configuration file from the given path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: DonorecConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => {}
            v => return Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }
        if self.embed.text_dimension == 0 {
            return Err(ConfigLoadError::Validation(
                "embed.text_dimension must be greater than zero".into(),
            ));
        }
        if self.recommend.default_limit == 0 {
            return Err(ConfigLoadError::Validation(
                "recommend.default_limit must be greater than zero".into(),
            ));
        }
        if self.store.path.as_os_str().is_empty() {
            return Err(ConfigLoadError::Validation(
                "store.path must not be empty".into(),
            ));
        }
        Ok(())
    }
}
