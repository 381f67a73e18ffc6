use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::database::{Database, DbError};
use crate::import::Actor;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Could not determine config directory")]
    NoConfigDir,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// SQLite file tasks are imported into
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    /// Identity stamped on imported tasks when none is given
    #[serde(default)]
    pub created_by: Option<String>,
}

impl Config {
    /// Load from the default location; a missing file yields defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&default_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn database_path(&self) -> Result<PathBuf, DbError> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Database::default_path(),
        }
    }

    /// Pick the importing identity: explicit value, then config, then `$USER`
    pub fn resolve_actor(&self, explicit: Option<&str>) -> Option<Actor> {
        explicit
            .map(str::to_string)
            .or_else(|| self.created_by.clone())
            .or_else(|| std::env::var("USER").ok())
            .filter(|id| !id.trim().is_empty())
            .map(Actor::new)
    }
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(config_dir.join("taskbook").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taskbook").join("config.toml");

        let config = Config {
            database_path: Some(dir.path().join("tasks.db")),
            created_by: Some("admin".to_string()),
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "created_by = [").unwrap();

        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_explicit_actor_wins() {
        let config = Config {
            database_path: None,
            created_by: Some("from-config".to_string()),
        };

        assert_eq!(config.resolve_actor(Some("cli")), Some(Actor::new("cli")));
        assert_eq!(config.resolve_actor(None), Some(Actor::new("from-config")));
    }
}
