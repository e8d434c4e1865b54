//! Configuration schema definitions and loading.
//!
//! Defines the configuration structure for media-sync. All configurations
//! are serializable to/from TOML format and every field has a default, so an
//! empty file is a valid configuration.

mod general;
mod loading;
mod paths;
mod sync;

#[cfg(test)]
mod tests;

pub use general::{GeneralConfig, LogLevel};
pub use paths::ConfigPaths;
pub use sync::SyncConfig;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Main configuration structure for media-sync.
///
/// Represents the complete configuration schema that can be loaded
/// from TOML files. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct Config {
    /// General application settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Media session synchronizer settings.
    #[serde(default)]
    pub sync: SyncConfig,
}
