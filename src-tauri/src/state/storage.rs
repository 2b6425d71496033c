// File system locations for the tracker database and configuration
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const APP_DIR_NAME: &str = "com.componenttracker.app";
pub const DATABASE_FILE_NAME: &str = "tracker.db";
pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to get app data directory")]
    NoAppDataDir,
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Get the app data directory for the tracker, creating it if needed
pub fn get_app_data_dir() -> StorageResult<PathBuf> {
    let data_dir = dirs::data_dir().ok_or(StorageError::NoAppDataDir)?;
    let app_dir = data_dir.join(APP_DIR_NAME);
    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}

/// Default location of the SQLite database
pub fn default_database_path() -> StorageResult<PathBuf> {
    Ok(get_app_data_dir()?.join(DATABASE_FILE_NAME))
}

/// Default location of the optional JSON configuration file
pub fn default_config_path() -> StorageResult<PathBuf> {
    Ok(get_app_data_dir()?.join(CONFIG_FILE_NAME))
}

/// Make sure the directory holding `path` exists
pub fn ensure_parent_dir(path: &Path) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
