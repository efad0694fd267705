use std::{fs, path::Path};

use tracing::{debug, instrument};

use super::Config;
use crate::{AppError, Result};

impl Config {
    /// Loads a configuration file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not valid TOML for
    /// this schema
    #[instrument]
    pub fn load(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path)
            .map_err(|e| AppError::io(format!("Failed to read config file: {e}"), path))?;
        Self::parse(&content, Some(path))
    }

    /// Loads `path` if it exists, otherwise returns the defaults
    ///
    /// # Errors
    /// Returns an error if an existing file cannot be read or parsed
    pub fn load_or_default(path: &Path) -> Result<Config> {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        Self::load(path)
    }

    /// Parses TOML text, `path` only labels errors
    ///
    /// # Errors
    /// Returns an error if the text is not valid TOML for this schema
    pub fn parse(content: &str, path: Option<&Path>) -> Result<Config> {
        toml::from_str(content).map_err(|e| AppError::toml_parse(e, path))
    }
}
