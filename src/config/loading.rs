use std::{fs, path::Path};

use tracing::{info, instrument};

use super::Config;
use crate::{AppError, Result};

impl Config {
    /// Loads the configuration file at `path`.
    ///
    /// A missing file is created with the default configuration so users
    /// have something to edit.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration file cannot be read or created
    /// - The TOML content is invalid
    #[instrument]
    pub fn load(path: &Path) -> Result<Config> {
        if !path.exists() {
            info!("No config file found, writing defaults");
            create_default_config_file(path)?;
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| AppError::io_at(e, path))?;
        toml::from_str(&content).map_err(|e| AppError::toml_parse(e, Some(path)))
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::TomlParseError` if the TOML is invalid.
    pub fn from_toml_str(content: &str) -> Result<Config> {
        toml::from_str(content).map_err(|e| AppError::toml_parse(e, None))
    }

    /// JSON schema of the configuration file, for editor tooling.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Json` if the schema cannot be encoded.
    pub fn schema() -> Result<serde_json::Value> {
        let schema = schemars::schema_for!(Config);
        Ok(serde_json::to_value(&schema)?)
    }
}

/// Writes the default configuration to `path`, creating parent directories.
fn create_default_config_file(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| AppError::io_at(e, parent))?;
    }

    let body = toml::to_string_pretty(&Config::default()).map_err(|e| {
        AppError::ConfigValidation {
            component: "default config".to_string(),
            details: e.to_string(),
        }
    })?;

    fs::write(path, format!("# media-sync configuration file\n\n{body}"))
        .map_err(|e| AppError::io_at(e, path))?;

    Ok(())
}
