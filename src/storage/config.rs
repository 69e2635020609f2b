//! Application configuration.
//!
//! Loaded from `config.toml` in the platform data directory. A missing file
//! yields defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::progression::Catalog;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application version
    pub version: String,
    /// Data directory path
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Database settings
    pub database: DatabaseSettings,
    /// Progression rules
    pub progression: ProgressionSettings,
    /// Optional catalog file replacing the built-in achievements and quests
    pub catalog_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            data_dir: PathBuf::new(),
            database: DatabaseSettings::default(),
            progression: ProgressionSettings::default(),
            catalog_file: None,
        }
    }
}

impl AppConfig {
    /// Full path of the database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database.file_name)
    }

    /// Load the configured catalog, or the built-in one.
    ///
    /// Relative catalog paths resolve against the data directory.
    pub fn load_catalog(&self) -> Result<Catalog, ConfigError> {
        match &self.catalog_file {
            Some(path) if path.is_absolute() => Catalog::load(path),
            Some(path) => Catalog::load(&self.data_dir.join(path)),
            None => Ok(Catalog::default()),
        }
    }
}

/// Database-related settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite file name inside the data directory
    pub file_name: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            file_name: "trainhero.db".to_string(),
        }
    }
}

/// Progression-related settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionSettings {
    /// Re-run the level-up cascade after achievement and quest XP grants.
    /// When false, bonus XP is stored as-is and resolved on the next workout.
    pub cascade_bonus_xp: bool,
    /// Default number of workouts returned by history queries
    pub history_limit: u32,
    /// Default number of entries on the leaderboard
    pub leaderboard_limit: u32,
}

impl Default for ProgressionSettings {
    fn default() -> Self {
        Self {
            cascade_bonus_xp: true,
            history_limit: 20,
            leaderboard_limit: 10,
        }
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "trainhero", "TrainHero")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Load application configuration from the default location.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&get_config_path(), get_data_dir())
}

/// Load configuration from `path`, using `data_dir` as the data directory.
pub fn load_config_from(path: &std::path::Path, data_dir: PathBuf) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig {
            data_dir,
            ..Default::default()
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    let mut config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    config.data_dir = data_dir;

    Ok(config)
}

/// Save application configuration to `path`.
pub fn save_config_to(path: &std::path::Path, config: &AppConfig) -> Result<(), ConfigError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
