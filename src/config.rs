use std::path::PathBuf;

use anyhow::{anyhow, Result};
use directories::BaseDirs;

/// Environment variable that overrides the database location.
pub const DB_ENV_VAR: &str = "CIRCLE_REGISTRY_DB";
/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".circle-registry";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "registry.sqlite";

/// Runtime settings for the binary.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
}

impl Config {
    /// Use the explicit path when given (flag or `CIRCLE_REGISTRY_DB`, both
    /// handled by clap), otherwise fall back to the home directory default.
    pub fn resolve(database: Option<PathBuf>) -> Result<Self> {
        let db_path = match database {
            Some(path) => path,
            None => default_db_path()?,
        };
        Ok(Config { db_path })
    }
}

/// Resolve the absolute path to the SQLite database inside the user's home.
pub fn default_db_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME).join(DB_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let config = Config::resolve(Some(PathBuf::from("/tmp/registry.sqlite"))).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/registry.sqlite"));
    }

    #[test]
    fn default_lives_under_data_dir() {
        if let Ok(path) = default_db_path() {
            assert!(path.ends_with(".circle-registry/registry.sqlite"));
        }
    }
}
