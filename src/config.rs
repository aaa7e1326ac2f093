//! Runtime configuration loaded from environment variables (and `.env`).

use std::env;
use std::path::PathBuf;

use crate::store::{CorruptPolicy, StoreOptions, DEFAULT_STORAGE_KEY};

pub const DATA_DIR_VAR: &str = "ACTIVITY_TRACKER_DATA_DIR";
pub const STORAGE_KEY_VAR: &str = "ACTIVITY_TRACKER_STORAGE_KEY";
pub const ON_CORRUPT_VAR: &str = "ACTIVITY_TRACKER_ON_CORRUPT";
pub const LOG_FORMAT_VAR: &str = "ACTIVITY_TRACKER_LOG_FORMAT";

const DEFAULT_DATA_DIR: &str = ".activity-tracker";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the activity blob
    pub data_dir: PathBuf,
    /// Blob key; the file on disk is `<data_dir>/<key>.json`
    pub storage_key: String,
    pub on_corrupt: CorruptPolicy,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            on_corrupt: CorruptPolicy::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment, reading `.env` first
    /// if one is present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup. Unset variables
    /// fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let on_corrupt = match non_empty(ON_CORRUPT_VAR) {
            Some(value) => value
                .parse::<CorruptPolicy>()
                .map_err(|_| ConfigError::Invalid(ON_CORRUPT_VAR, value))?,
            None => defaults.on_corrupt,
        };

        let log_format = match non_empty(LOG_FORMAT_VAR) {
            Some(value) => match value.trim().to_lowercase().as_str() {
                "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                _ => return Err(ConfigError::Invalid(LOG_FORMAT_VAR, value)),
            },
            None => defaults.log_format,
        };

        Ok(Self {
            data_dir: non_empty(DATA_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            storage_key: non_empty(STORAGE_KEY_VAR)
                .map(|v| v.trim().to_string())
                .unwrap_or(defaults.storage_key),
            on_corrupt,
            log_format,
        })
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            key: self.storage_key.clone(),
            on_corrupt: self.on_corrupt,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
