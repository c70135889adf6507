//! Store configuration via `cabinet.json`
//!
//! Connection settings live in a small JSON file next to the deployment. On
//! first run a default `cabinet.json` is created. To change settings, edit
//! the file and restart.

use std::path::Path;

use cabinet_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Config file name placed in the working directory.
pub const CONFIG_FILE_NAME: &str = "cabinet.json";

/// Connection settings loaded from `cabinet.json`.
///
/// # Example
///
/// ```json
/// {
///   "uri": "mongodb://127.0.0.1:27017",
///   "database": "cabinet",
///   "app_name": "cabinet"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Connection string for the wire backend.
    #[serde(default = "default_uri")]
    pub uri: String,
    /// Database the collections live in.
    #[serde(default = "default_database")]
    pub database: String,
    /// Application name reported to the backend on connect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
}

fn default_uri() -> String {
    "mongodb://127.0.0.1:27017".to_string()
}

fn default_database() -> String {
    "cabinet".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            database: default_database(),
            app_name: None,
        }
    }
}

impl StoreConfig {
    /// Checks that the settings are usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the uri or database is blank.
    pub fn validate(&self) -> Result<()> {
        if self.uri.is_empty() {
            return Err(Error::validation("store config is missing a uri"));
        }
        if self.database.is_empty() {
            return Err(Error::validation("store config is missing a database"));
        }
        Ok(())
    }

    /// Returns the default config file content.
    pub fn default_json() -> &'static str {
        r#"{
  "uri": "mongodb://127.0.0.1:27017",
  "database": "cabinet"
}
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Backend`] if the file cannot be read,
    /// [`Error::Decode`] if it cannot be parsed, or [`Error::Validation`]
    /// when a required setting is blank.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::backend(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: StoreConfig = serde_json::from_str(&content).map_err(|e| {
            Error::decode(format!(
                "failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Backend`] if the file cannot be written.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_json()).map_err(|e| {
                Error::backend(format!(
                    "failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to JSON and write it to the given path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Backend`] if the file cannot be written.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::backend(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::backend(format!(
                "failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
