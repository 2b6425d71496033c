// Runtime configuration
// Optional JSON file in the app data directory, overridden by environment variables

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::state::storage::{self, StorageError};

pub const ENV_DATABASE_PATH: &str = "COMPONENT_TRACKER_DB";
pub const ENV_SEED_COMPONENTS: &str = "COMPONENT_TRACKER_SEED_COMPONENTS";
pub const ENV_LOG_LEVEL: &str = "COMPONENT_TRACKER_LOG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Database file; defaults to `tracker.db` in the app data directory
    pub database_path: Option<PathBuf>,
    /// Also seed the stock component set on first launch
    pub seed_default_components: bool,
    pub log_level: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            seed_default_components: false,
            log_level: "info".to_string(),
        }
    }
}

impl TrackerConfig {
    /// Load `config.json` from the app data directory (if present) and apply env overrides
    pub fn load() -> ConfigResult<Self> {
        let path = storage::default_config_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load a config file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DATABASE_PATH).filter(|v| !v.trim().is_empty()) {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(flag) = lookup(ENV_SEED_COMPONENTS) {
            self.seed_default_components = matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
            self.log_level = level.trim().to_string();
        }
    }

    pub fn resolve_database_path(&self) -> ConfigResult<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(storage::default_database_path()?),
        }
    }

    /// Unknown level names fall back to `Info`
    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}
