use std::{
    env, fs,
    io::{Error, ErrorKind},
    path::PathBuf,
};

const APP_DIR: &str = "media-sync";

/// Utility struct for locating media-sync files on disk
///
/// Configuration follows the XDG Base Directory specification; runtime data
/// (cover image, contents document, logs) lives under `$HOME/.media-sync`.
pub struct ConfigPaths;

impl ConfigPaths {
    /// Returns the configuration directory path for the application
    ///
    /// Checks `XDG_CONFIG_HOME` first, then falls back to `$HOME/.config`.
    ///
    /// # Errors
    /// Returns an error if neither `XDG_CONFIG_HOME` nor `HOME` environment variables are set
    pub fn config_dir() -> Result<PathBuf, Error> {
        let config_home = env::var("XDG_CONFIG_HOME")
            .or_else(|_| home_dir().map(|home| format!("{home}/.config")))
            .map_err(|_| {
                Error::new(
                    ErrorKind::NotFound,
                    "Neither XDG_CONFIG_HOME nor HOME environment variable found",
                )
            })?;

        Ok(PathBuf::from(config_home).join(APP_DIR))
    }

    /// Returns the application data directory path
    ///
    /// Creates the directory if it doesn't exist.
    ///
    /// # Errors
    /// Returns an error if HOME is not set or the directory cannot be created
    pub fn app_data_dir() -> Result<PathBuf, Error> {
        let home = home_dir()
            .map_err(|_| Error::new(ErrorKind::NotFound, "HOME environment variable not found"))?;

        let app_dir = PathBuf::from(home).join(format!(".{APP_DIR}"));

        if !app_dir.exists() {
            fs::create_dir_all(&app_dir)?;
        }

        Ok(app_dir)
    }

    /// Get the application log directory
    ///
    /// Creates the directory if it doesn't exist.
    ///
    /// # Errors
    /// Returns error if directory cannot be created
    pub fn log_dir() -> Result<PathBuf, Error> {
        let log_dir = Self::app_data_dir()?.join("logs");

        if !log_dir.exists() {
            fs::create_dir_all(&log_dir)?;
        }

        Ok(log_dir)
    }

    /// Returns the path to the main configuration file
    ///
    /// # Errors
    /// Returns an error if the configuration directory cannot be determined
    pub fn main_config() -> Result<PathBuf, Error> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Default location of the persisted cover image
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be determined or created
    pub fn cover_file() -> Result<PathBuf, Error> {
        Ok(Self::app_data_dir()?.join("media_thumb.png"))
    }
}

fn home_dir() -> Result<String, env::VarError> {
    env::var("HOME").or_else(|_| env::var("USERPROFILE"))
}
