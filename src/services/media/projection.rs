use std::path::PathBuf;

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{
    state::AggregateState,
    types::{PlaybackStatus, RepeatMode},
};
use crate::services::common::Property;

/// Track fields of a [`Projection`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectionMetadata {
    /// Track title
    pub title: Option<String>,
    /// Album title
    pub album: Option<String>,
    /// Album artist
    pub album_artist: Option<String>,
    /// Track artist
    pub artist: Option<String>,
    /// Path of the persisted cover file
    pub cover: String,
    /// Base64 cover bytes; absent in the cover-less variant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_data: Option<String>,
    /// Track length in seconds
    pub duration: Option<i64>,
}

/// The flattened document pushed to consumers on every change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Application id of the session owner
    pub provider: String,
    /// Track fields
    pub metadata: ProjectionMetadata,
    /// Playback status
    pub status: PlaybackStatus,
    /// Shuffle state
    pub shuffle: Option<bool>,
    /// Interpolated position in seconds
    pub position: i64,
    /// Auto-repeat mode
    #[serde(rename = "loop")]
    pub repeat: Option<RepeatMode>,
}

impl Projection {
    /// Project the aggregate state. Pure.
    pub fn of(state: &AggregateState) -> Self {
        let media = &state.media_properties;

        Self {
            provider: state.provider.clone(),
            metadata: ProjectionMetadata {
                title: media.title.clone(),
                album: media.album_title.clone(),
                album_artist: media.album_artist.clone(),
                artist: media.artist.clone(),
                cover: media.thumbnail.clone(),
                cover_data: Some(media.thumbnail_data.clone()),
                duration: state.timeline_properties.end_time,
            },
            status: state.playback_info.playback_status,
            shuffle: state.playback_info.is_shuffle_active,
            position: state.timeline_properties.position_soft,
            repeat: state.playback_info.auto_repeat_mode,
        }
    }

    /// The same projection without the base64 cover.
    pub fn without_cover_data(&self) -> Self {
        let mut projection = self.clone();
        projection.metadata.cover_data = None;
        projection
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::of(&AggregateState::default())
    }
}

/// Receiver of every pushed projection.
///
/// Called on the synchronizer task; implementations must not block for long.
pub trait ProjectionSink: Send {
    /// Deliver one complete projection.
    fn push(&mut self, projection: &Projection);
}

impl<F> ProjectionSink for F
where
    F: FnMut(&Projection) + Send,
{
    fn push(&mut self, projection: &Projection) {
        self(projection);
    }
}

impl<A, B> ProjectionSink for (A, B)
where
    A: ProjectionSink,
    B: ProjectionSink,
{
    fn push(&mut self, projection: &Projection) {
        self.0.push(projection);
        self.1.push(projection);
    }
}

impl<S: ProjectionSink> ProjectionSink for Option<S> {
    fn push(&mut self, projection: &Projection) {
        if let Some(sink) = self {
            sink.push(projection);
        }
    }
}

/// Publishes the latest projection into a watchable [`Property`].
///
/// Readers such as an HTTP façade call [`Property::get`] for a snapshot or
/// [`Property::watch`] for a stream of changes. Pushes equal to the
/// current value do not wake watchers.
#[derive(Debug, Clone)]
pub struct WatchSink {
    latest: Property<Projection>,
}

impl WatchSink {
    /// Sink with a default projection as its initial value.
    pub fn new() -> Self {
        Self {
            latest: Property::new(Projection::default()),
        }
    }

    /// The cell projections are published into.
    pub fn property(&self) -> Property<Projection> {
        self.latest.clone()
    }
}

impl Default for WatchSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectionSink for WatchSink {
    fn push(&mut self, projection: &Projection) {
        self.latest.set(projection.clone());
    }
}

/// Writes projections to a JSON file from a background task.
///
/// `push` only publishes into a [`Property`]; encoding and writing happen
/// on a spawned writer. Equal consecutive projections are written once,
/// and a burst of pushes may collapse into a single write of the latest.
/// The writer stops once the sink is dropped.
#[derive(Debug)]
pub struct JsonFileSink {
    latest: Property<Option<Projection>>,
    include_cover: bool,
}

impl JsonFileSink {
    /// Sink writing to `path`; `include_cover = false` drops `cover_data`.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn new(path: PathBuf, include_cover: bool) -> Self {
        let latest = Property::new(None);
        tokio::spawn(write_contents(path, latest.watch()));

        Self {
            latest,
            include_cover,
        }
    }
}

impl ProjectionSink for JsonFileSink {
    fn push(&mut self, projection: &Projection) {
        let projection = if self.include_cover {
            projection.clone()
        } else {
            projection.without_cover_data()
        };

        self.latest.set(Some(projection));
    }
}

#[instrument(skip_all, fields(path = %path.display()))]
async fn write_contents(
    path: PathBuf,
    updates: impl Stream<Item = Option<Projection>> + Send + 'static,
) {
    let mut updates = Box::pin(updates);

    while let Some(update) = updates.next().await {
        let Some(projection) = update else {
            continue;
        };

        let bytes = match serde_json::to_vec_pretty(&projection) {
            Ok(bytes) => bytes,
            Err(error) => {
                error!(%error, "Failed to encode projection");
                continue;
            }
        };

        if let Err(error) = tokio::fs::write(&path, bytes).await {
            error!(%error, "Failed to write contents file");
        }
    }

    debug!("Contents sink dropped, writer stopping");
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::panic)]

    use std::{fs, path::Path, time::Duration};

    use serde_json::{Value, json};
    use tempfile::TempDir;

    use super::*;

    fn playing_state() -> AggregateState {
        let mut state = AggregateState::bootstrap(Path::new("/tmp/media_thumb.png")).unwrap();
        state.provider = "Spotify.exe".to_string();
        state.media_properties.title = Some("Song".to_string());
        state.media_properties.album_title = Some("Album".to_string());
        state.playback_info.playback_status = PlaybackStatus::Playing;
        state.playback_info.auto_repeat_mode = Some(RepeatMode::All);
        state.timeline_properties.end_time = Some(300);
        state.timeline_properties.position = Some(10);
        state.timeline_properties.position_soft = 15;
        state
    }

    #[test]
    fn projection_uses_wire_names() {
        let value = serde_json::to_value(Projection::of(&playing_state())).unwrap();

        assert_eq!(value["provider"], json!("Spotify.exe"));
        assert_eq!(value["metadata"]["album"], json!("Album"));
        assert_eq!(value["metadata"]["cover"], json!("/tmp/media_thumb.png"));
        assert_eq!(value["metadata"]["duration"], json!(300));
        assert_eq!(value["status"], json!("playing"));
        assert_eq!(value["position"], json!(15));
        assert_eq!(value["loop"], json!("all"));
        assert!(value["metadata"]["cover_data"].is_string());
    }

    #[test]
    fn cover_less_variant_drops_only_cover_data() {
        let projection = Projection::of(&playing_state());
        let value = serde_json::to_value(projection.without_cover_data()).unwrap();

        assert!(value["metadata"].get("cover_data").is_none());
        assert_eq!(value["metadata"]["cover"], json!("/tmp/media_thumb.png"));
    }

    #[test]
    fn pair_sink_pushes_to_both() {
        let watch = WatchSink::new();
        let property = watch.property();
        let mut seen = Vec::new();

        {
            let mut sink = (watch, |p: &Projection| seen.push(p.position));
            sink.push(&Projection::of(&playing_state()));
        }

        assert_eq!(seen, vec![15]);
        assert_eq!(property.get().position, 15);
    }

    async fn read_when_written(path: &Path) -> Value {
        for _ in 0..200 {
            if let Some(value) = fs::read(path)
                .ok()
                .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            {
                return value;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("{} was never written", path.display());
    }

    #[tokio::test]
    async fn json_file_sink_writes_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("contents.json");
        let mut sink = JsonFileSink::new(path.clone(), false);

        sink.push(&Projection::of(&playing_state()));

        let written = read_when_written(&path).await;
        assert_eq!(written["status"], json!("playing"));
        assert!(written["metadata"].get("cover_data").is_none());
    }

    #[tokio::test]
    async fn json_file_sink_skips_identical_projections() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("contents.json");
        let mut sink = JsonFileSink::new(path.clone(), true);
        let mut state = playing_state();

        sink.push(&Projection::of(&state));
        read_when_written(&path).await;
        fs::remove_file(&path).unwrap();

        for _ in 0..10 {
            sink.push(&Projection::of(&state));
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!path.exists(), "identical projection was written again");

        state.timeline_properties.position_soft = 16;
        sink.push(&Projection::of(&state));
        assert_eq!(read_when_written(&path).await["position"], json!(16));
    }
}
