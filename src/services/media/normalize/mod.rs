//! Conversion of raw host property bags into typed sub-documents.
//!
//! Each normalizer reads a fixed list of fields. A field the host cannot
//! provide is logged and left out; only the playback status is mandatory.

/// Metadata sub-document
pub mod media;
/// Playback sub-document
pub mod playback;
/// Cover image reading and persistence
pub mod thumbnail;
/// Timeline sub-document
pub mod timeline;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use tracing::warn;

pub use media::normalize_media;
pub use playback::normalize_playback;
pub use thumbnail::CoverStore;
pub use timeline::normalize_timeline;

use super::{
    MediaError,
    host::{HostResult, MediaPropertiesSource, PlaybackInfoSource, TimelineSource},
    state::{MediaProperties, PLACEHOLDER_COVER, PlaybackInfo, TimelineProperties},
};

/// Normalizes the three property groups of a session
#[derive(Debug, Clone)]
pub struct PropertyNormalizer {
    cover: CoverStore,
}

impl PropertyNormalizer {
    /// Normalizer persisting covers to `cover_file`.
    pub fn new(cover_file: PathBuf, thumbnail_capacity: usize) -> Self {
        Self {
            cover: CoverStore::new(cover_file, thumbnail_capacity),
        }
    }

    /// Path the cover image is persisted at.
    pub fn cover_file(&self) -> &Path {
        self.cover.path()
    }

    /// See [`normalize_media`].
    pub async fn media(&self, source: &dyn MediaPropertiesSource) -> MediaProperties {
        normalize_media(source, &self.cover).await
    }

    /// See [`normalize_playback`].
    ///
    /// # Errors
    /// Returns error if the status is unreadable or a code is out of range
    pub fn playback(&self, source: &dyn PlaybackInfoSource) -> Result<PlaybackInfo, MediaError> {
        normalize_playback(source)
    }

    /// See [`normalize_timeline`].
    pub fn timeline(&self, source: &dyn TimelineSource) -> TimelineProperties {
        normalize_timeline(source)
    }

    /// Overwrite the cover file with the placeholder image.
    pub async fn write_placeholder(&self) {
        self.cover.persist(PLACEHOLDER_COVER).await;
    }
}

/// The value of an optional field, or `None` with a warning.
pub(crate) fn readable<T>(field: &'static str, value: HostResult<T>) -> Option<T> {
    match value {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(field, %error, "Attribute unreadable, omitting");
            None
        }
    }
}
