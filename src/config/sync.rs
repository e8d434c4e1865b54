use std::{path::PathBuf, time::Duration};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Size of the receive buffer a cover thumbnail is copied into.
pub const DEFAULT_THUMBNAIL_CAPACITY: usize = 5_000_000;

/// Period of the position interpolator.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;

/// Media session synchronizer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SyncConfig {
    /// Interval between soft position recomputations, in milliseconds.
    pub tick_interval_ms: u64,

    /// Maximum number of cover thumbnail bytes read from the host.
    pub thumbnail_capacity: usize,

    /// Where the current cover image is written. Defaults to
    /// `$HOME/.media-sync/media_thumb.png`.
    pub cover_file: Option<PathBuf>,

    /// When set, every projection is also written to this file as JSON.
    pub contents_file: Option<PathBuf>,

    /// Whether the JSON contents file carries the base64 cover data.
    pub contents_include_cover: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            thumbnail_capacity: DEFAULT_THUMBNAIL_CAPACITY,
            cover_file: None,
            contents_file: None,
            contents_include_cover: true,
        }
    }
}

impl SyncConfig {
    /// Interpolator tick period. Never zero.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}
