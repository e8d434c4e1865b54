use std::path::Path;

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use super::types::{PlaybackControls, PlaybackStatus, PlaybackType, RepeatMode};
use crate::core::Result;

const TEMPLATE: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/template.json"));

/// Cover image used whenever the session has no readable artwork.
pub const PLACEHOLDER_COVER: &[u8] =
    include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/placeholder.png"));

/// Normalized media metadata of the current session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaProperties {
    /// Track title
    pub title: Option<String>,
    /// Album title
    pub album_title: Option<String>,
    /// Album artist
    pub album_artist: Option<String>,
    /// Track artist
    pub artist: Option<String>,
    /// Subtitle
    pub subtitle: Option<String>,
    /// Position of the track on its album
    pub track_number: Option<i32>,
    /// Number of tracks on the album
    pub album_track_count: Option<i32>,
    /// Genres in host order
    pub genres: Option<Vec<String>>,
    /// Kind of media
    pub playback_type: Option<PlaybackType>,

    /// Raw cover bytes, also written to `thumbnail`
    #[serde(skip)]
    pub cover: Vec<u8>,
    /// Path of the persisted cover file
    pub thumbnail: String,
    /// `file://` URL of the persisted cover file
    pub thumbnail_url: String,
    /// Base64 encoding of the cover bytes
    pub thumbnail_data: String,
}

impl MediaProperties {
    /// Attach a cover image persisted at `path`.
    ///
    /// Fills the path, URL and base64 fields from the same bytes so the
    /// three always describe one image.
    pub fn set_cover(&mut self, bytes: Vec<u8>, path: &Path) {
        self.thumbnail = path.to_string_lossy().into_owned();
        self.thumbnail_url = file_url(path);
        self.thumbnail_data = STANDARD.encode(&bytes);
        self.cover = bytes;
    }
}

/// Normalized playback info of the current session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackInfo {
    /// Current status
    pub playback_status: PlaybackStatus,
    /// Auto-repeat mode, absent when not reported
    pub auto_repeat_mode: Option<RepeatMode>,
    /// Shuffle state
    pub is_shuffle_active: Option<bool>,
    /// Signed playback rate
    pub playback_rate: Option<f64>,
    /// Kind of media
    pub playback_type: Option<PlaybackType>,
    /// Controls the session accepts
    pub controls: Option<PlaybackControls>,
}

impl Default for PlaybackInfo {
    fn default() -> Self {
        Self {
            playback_status: PlaybackStatus::Closed,
            auto_repeat_mode: None,
            is_shuffle_active: None,
            playback_rate: None,
            playback_type: None,
            controls: None,
        }
    }
}

/// Normalized timeline of the current session, in whole seconds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineProperties {
    /// Start of the media
    pub start_time: Option<i64>,
    /// End of the media, the duration
    pub end_time: Option<i64>,
    /// Earliest seekable position
    pub min_seek_time: Option<i64>,
    /// Latest seekable position
    pub max_seek_time: Option<i64>,
    /// Position reported by the host
    pub position: Option<i64>,
    /// Epoch seconds `position` was sampled at
    pub last_updated_time: Option<i64>,
    /// Interpolated position, always within `[0, end_time]`
    pub position_soft: i64,
}

impl TimelineProperties {
    /// Clamp a position into `[0, end_time]`. Without a known end only the
    /// lower bound applies.
    pub fn clamp_position(&self, seconds: i64) -> i64 {
        match self.end_time {
            Some(end) => seconds.min(end).max(0),
            None => seconds.max(0),
        }
    }
}

/// The merged snapshot of everything known about the current session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateState {
    /// Application id of the session owner
    pub provider: String,
    /// Metadata sub-document
    pub media_properties: MediaProperties,
    /// Playback sub-document
    pub playback_info: PlaybackInfo,
    /// Timeline sub-document
    pub timeline_properties: TimelineProperties,
}

impl AggregateState {
    /// The bootstrap document: the embedded template with the placeholder
    /// cover attached at `cover_file`.
    ///
    /// # Errors
    /// Returns error if the embedded template is not a valid document
    pub fn bootstrap(cover_file: &Path) -> Result<Self> {
        let mut state: Self = serde_json::from_str(TEMPLATE)?;
        state
            .media_properties
            .set_cover(PLACEHOLDER_COVER.to_vec(), cover_file);
        Ok(state)
    }
}

/// `file://` URL for a local path.
///
/// Absolute Unix paths keep their leading slash; Windows paths get the
/// `file:///` form with forward slashes.
pub fn file_url(path: &Path) -> String {
    let path = path.to_string_lossy().replace('\\', "/");

    if path.starts_with('/') {
        format!("file://{path}")
    } else {
        format!("file:///{path}")
    }
}
