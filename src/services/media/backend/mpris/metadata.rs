use std::{collections::HashMap, io, path::PathBuf};

use async_trait::async_trait;
use tokio::{fs::File, io::AsyncReadExt};
use tracing::debug;
use url::Url;
use zbus::zvariant::{Array, OwnedValue};

use crate::services::media::{
    HostError,
    host::{HostResult, MediaPropertiesSource, ThumbnailSource},
};

/// Snapshot of a player's `Metadata` property
pub struct MprisMetadata {
    entries: HashMap<String, OwnedValue>,
}

impl MprisMetadata {
    pub(super) fn new(entries: HashMap<String, OwnedValue>) -> Self {
        Self { entries }
    }

    fn entry(&self, key: &str, field: &'static str) -> HostResult<&OwnedValue> {
        self.entries.get(key).ok_or(HostError::Unavailable(field))
    }

    fn text(&self, key: &str, field: &'static str) -> HostResult<String> {
        let value = self.entry(key, field)?;
        String::try_from(value.clone())
            .map_err(|e| HostError::CallFailed(format!("{key} is not a string: {e}")))
    }

    fn text_list(&self, key: &str, field: &'static str) -> HostResult<Vec<String>> {
        let value = self.entry(key, field)?;

        if let Ok(array) = <&Array>::try_from(value) {
            return Ok(array
                .iter()
                .filter_map(|item| {
                    if let Ok(s) = item.downcast_ref::<String>() {
                        Some(s.to_string())
                    } else if let Ok(s) = item.downcast_ref::<&str>() {
                        Some(s.to_string())
                    } else {
                        None
                    }
                })
                .collect());
        }

        self.text(key, field).map(|single| vec![single])
    }

    fn joined(&self, key: &str, field: &'static str) -> HostResult<String> {
        self.text_list(key, field).map(|names| names.join(", "))
    }

    fn integer(&self, key: &str, field: &'static str) -> HostResult<i32> {
        let value = self.entry(key, field)?;
        i32::try_from(value.clone())
            .map_err(|e| HostError::CallFailed(format!("{key} is not an integer: {e}")))
    }

    /// Track length in microseconds, `mpris:length`
    pub fn length_micros(&self) -> Option<i64> {
        let value = self.entries.get("mpris:length")?;

        i64::try_from(value.clone())
            .ok()
            .or_else(|| u64::try_from(value.clone()).ok().and_then(|v| i64::try_from(v).ok()))
            .filter(|micros| *micros > 0)
    }

    /// Object path of the current track, `mpris:trackid`
    pub fn track_id(&self) -> Option<String> {
        let value = self.entries.get("mpris:trackid")?;

        zbus::zvariant::OwnedObjectPath::try_from(value.clone())
            .map(|path| path.to_string())
            .or_else(|_| String::try_from(value.clone()))
            .ok()
    }

    /// Local path behind `mpris:artUrl`, percent-decoded
    fn art_path(&self) -> Option<PathBuf> {
        let raw = self.text("mpris:artUrl", "thumbnail").ok()?;

        let url = match Url::parse(&raw) {
            Ok(url) => url,
            Err(error) => {
                debug!(url = %raw, %error, "Artwork URL does not parse, skipping");
                return None;
            }
        };

        if url.scheme() != "file" {
            debug!(url = %raw, "Artwork is not a local file, skipping");
            return None;
        }

        let path = url.to_file_path().ok();
        if path.is_none() {
            debug!(url = %raw, "Artwork URL has no local path, skipping");
        }
        path
    }
}

impl MediaPropertiesSource for MprisMetadata {
    fn title(&self) -> HostResult<String> {
        self.text("xesam:title", "title")
    }

    fn album_title(&self) -> HostResult<String> {
        self.text("xesam:album", "album_title")
    }

    fn album_artist(&self) -> HostResult<String> {
        self.joined("xesam:albumArtist", "album_artist")
    }

    fn artist(&self) -> HostResult<String> {
        self.joined("xesam:artist", "artist")
    }

    fn subtitle(&self) -> HostResult<String> {
        Err(HostError::Unavailable("subtitle"))
    }

    fn track_number(&self) -> HostResult<i32> {
        self.integer("xesam:trackNumber", "track_number")
    }

    fn album_track_count(&self) -> HostResult<i32> {
        Err(HostError::Unavailable("album_track_count"))
    }

    fn genres(&self) -> HostResult<Vec<String>> {
        self.text_list("xesam:genre", "genres")
    }

    fn playback_type(&self) -> HostResult<Option<i32>> {
        Ok(None)
    }

    fn thumbnail(&self) -> Option<Box<dyn ThumbnailSource>> {
        self.art_path()
            .map(|path| Box::new(LocalArtwork { path }) as Box<dyn ThumbnailSource>)
    }
}

/// Artwork a player exposes as a `file://` URL
struct LocalArtwork {
    path: PathBuf,
}

#[async_trait]
impl ThumbnailSource for LocalArtwork {
    async fn read(&self, capacity: usize) -> io::Result<Vec<u8>> {
        let file = File::open(&self.path).await?;
        let mut bytes = Vec::new();
        file.take(capacity as u64).read_to_end(&mut bytes).await?;
        Ok(bytes)
    }
}
