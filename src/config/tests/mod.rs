//! Unit tests for config module
//!
//! Tests configuration defaults, TOML parsing and first-run file creation.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]

use std::{fs, path::PathBuf, time::Duration};

use tempfile::TempDir;

use crate::config::{Config, LogLevel, SyncConfig};

#[test]
fn config_default() {
    let config = Config::default();

    assert_eq!(config.general.log_level, LogLevel::Info);
    assert_eq!(config.sync.tick_interval_ms, 100);
    assert_eq!(config.sync.thumbnail_capacity, 5_000_000);
    assert!(config.sync.cover_file.is_none());
    assert!(config.sync.contents_include_cover);
}

#[test]
fn config_serialize_toml() {
    let toml_str = toml::to_string(&Config::default()).unwrap();

    assert!(toml_str.contains("[general]"));
    assert!(toml_str.contains("[sync]"));
}

#[test]
fn config_deserialize_toml() {
    let config = Config::from_toml_str(
        r#"
        [general]
        log_level = "debug"

        [sync]
        tick_interval_ms = 250
        cover_file = "/tmp/cover.png"
        contents_include_cover = false
    "#,
    )
    .unwrap();

    assert_eq!(config.general.log_level, LogLevel::Debug);
    assert_eq!(config.sync.tick_interval(), Duration::from_millis(250));
    assert_eq!(config.sync.cover_file, Some(PathBuf::from("/tmp/cover.png")));
    assert!(!config.sync.contents_include_cover);
    assert_eq!(config.sync.thumbnail_capacity, 5_000_000);
}

#[test]
fn config_empty_toml() {
    let config = Config::from_toml_str("").unwrap();

    assert_eq!(config.sync, SyncConfig::default());
}

#[test]
fn config_invalid_toml_reports_location() {
    let err = Config::from_toml_str("[sync\ntick_interval_ms = ").unwrap_err();

    assert!(err.to_string().contains("string"));
}

#[test]
fn zero_tick_interval_is_clamped() {
    let config = Config::from_toml_str("[sync]\ntick_interval_ms = 0").unwrap();

    assert_eq!(config.sync.tick_interval(), Duration::from_millis(1));
}

#[test]
fn load_creates_missing_file_with_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/config.toml");

    let config = Config::load(&path).unwrap();

    assert!(path.exists());
    assert_eq!(config.sync, SyncConfig::default());

    let reloaded = Config::load(&path).unwrap();
    assert_eq!(reloaded.sync, SyncConfig::default());
    assert!(fs::read_to_string(&path).unwrap().starts_with("# media-sync"));
}

#[test]
fn schema_describes_sync_section() {
    let schema = Config::schema().unwrap();

    assert!(schema.to_string().contains("tick_interval_ms"));
}
