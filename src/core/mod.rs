use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error types for the media-sync application.
///
/// Covers everything that can fail before the synchronizer loop is running:
/// configuration loading, the embedded bootstrap template and connecting
/// to the host media subsystem.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration validation error
    #[error("configuration validation failed for '{component}': {details}")]
    ConfigValidation {
        /// Component that failed validation
        component: String,
        /// Validation error details
        details: String,
    },

    /// I/O operation error
    #[error("I/O error on '{path}': {details}")]
    IoError {
        /// Path where I/O error occurred
        path: PathBuf,
        /// I/O error details
        details: String,
    },

    /// Standard I/O operation error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error with location context
    #[error("failed to parse TOML at '{location}': {details}")]
    TomlParseError {
        /// Location of TOML being parsed (file path or "string")
        location: String,
        /// Parse error details
        details: String,
    },

    /// JSON encoding or decoding failed (bootstrap template, config schema)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The host media subsystem could not be reached
    #[error("media backend unavailable: {0}")]
    Backend(String),
}

/// A specialized `Result` type for media-sync operations.
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Creates a TOML parsing error with optional file path context.
    ///
    /// # Arguments
    ///
    /// * `error` - The underlying parsing error
    /// * `path` - Optional path to the file that failed to parse
    pub fn toml_parse(error: impl std::fmt::Display, path: Option<&Path>) -> Self {
        let location = match path {
            Some(p) => {
                let clean_path = p.canonicalize().unwrap_or_else(|_| p.to_path_buf());
                clean_path.to_string_lossy().to_string()
            }
            None => "string".to_string(),
        };

        AppError::TomlParseError {
            location,
            details: error.to_string(),
        }
    }

    /// Creates an I/O error carrying the path it happened on.
    pub fn io_at(error: impl std::fmt::Display, path: &Path) -> Self {
        AppError::IoError {
            path: path.to_path_buf(),
            details: error.to_string(),
        }
    }
}
