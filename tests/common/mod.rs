//! In-memory media host shared by the integration tests.

#![allow(dead_code)]
#![allow(clippy::panic)]

use std::{
    io,
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use media_sync::{
    config::SyncConfig,
    services::media::{
        CallbackRegistry, EventCallback, HostError, HostResult, MediaPropertiesSource,
        MediaSession, PlaybackControls, PlaybackInfoSource, Projection, RepeatMode,
        SessionManager, Subscription, ThumbnailSource, TimelineSource,
    },
};

/// Control calls a [`FakeSession`] received, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Play,
    Pause,
    Stop,
    TogglePlayPause,
    Next,
    Previous,
    Position(Duration),
    Repeat(RepeatMode),
    Shuffle(bool),
    Rewind,
}

/// Everything a fake session reports when asked.
#[derive(Debug, Clone)]
pub struct Track {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub cover: Option<Result<Vec<u8>, String>>,
    pub status: i32,
    pub repeat: Option<i32>,
    pub shuffle: Option<bool>,
    pub rate: Option<f64>,
    pub end_secs: i64,
    pub position_secs: i64,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Default for Track {
    fn default() -> Self {
        Self {
            title: "Song".to_string(),
            artist: "Artist".to_string(),
            album: "Album".to_string(),
            cover: Some(Ok(b"cover bytes".to_vec())),
            status: 4,
            repeat: Some(0),
            shuffle: Some(false),
            rate: Some(1.0),
            end_secs: 300,
            position_secs: 42,
            last_updated: Some(Utc::now()),
        }
    }
}

pub struct FakeSession {
    app_id: String,
    track: Mutex<Track>,
    calls: Mutex<Vec<Call>>,
    media: CallbackRegistry,
    playback: CallbackRegistry,
    timeline: CallbackRegistry,
}

impl FakeSession {
    pub fn new(app_id: &str, track: Track) -> Arc<Self> {
        Arc::new(Self {
            app_id: app_id.to_string(),
            track: Mutex::new(track),
            calls: Mutex::new(Vec::new()),
            media: CallbackRegistry::new(),
            playback: CallbackRegistry::new(),
            timeline: CallbackRegistry::new(),
        })
    }

    pub fn update(&self, change: impl FnOnce(&mut Track)) {
        change(&mut self.track.lock().unwrap());
    }

    pub fn track(&self) -> Track {
        self.track.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn emit_media(&self) {
        self.media.notify();
    }

    pub fn emit_playback(&self) {
        self.playback.notify();
    }

    pub fn emit_timeline(&self) {
        self.timeline.notify();
    }

    /// Number of live observers across the three event kinds
    pub fn observers(&self) -> usize {
        self.media.len() + self.playback.len() + self.timeline.len()
    }

    fn record(&self, call: Call) -> HostResult<bool> {
        self.calls.lock().unwrap().push(call);
        Ok(true)
    }
}

#[async_trait]
impl MediaSession for FakeSession {
    fn source_app_id(&self) -> HostResult<String> {
        Ok(self.app_id.clone())
    }

    async fn media_properties(&self) -> HostResult<Box<dyn MediaPropertiesSource>> {
        Ok(Box::new(MediaSnapshot(self.track())))
    }

    async fn playback_info(&self) -> HostResult<Box<dyn PlaybackInfoSource>> {
        Ok(Box::new(PlaybackSnapshot(self.track())))
    }

    async fn timeline_properties(&self) -> HostResult<Box<dyn TimelineSource>> {
        Ok(Box::new(TimelineSnapshot(self.track())))
    }

    fn on_media_properties_changed(&self, callback: EventCallback) -> Subscription {
        self.media.register(callback)
    }

    fn on_playback_info_changed(&self, callback: EventCallback) -> Subscription {
        self.playback.register(callback)
    }

    fn on_timeline_properties_changed(&self, callback: EventCallback) -> Subscription {
        self.timeline.register(callback)
    }

    async fn try_play(&self) -> HostResult<bool> {
        self.record(Call::Play)
    }

    async fn try_pause(&self) -> HostResult<bool> {
        self.record(Call::Pause)
    }

    async fn try_stop(&self) -> HostResult<bool> {
        self.record(Call::Stop)
    }

    async fn try_toggle_play_pause(&self) -> HostResult<bool> {
        self.record(Call::TogglePlayPause)
    }

    async fn try_skip_next(&self) -> HostResult<bool> {
        self.record(Call::Next)
    }

    async fn try_skip_previous(&self) -> HostResult<bool> {
        self.record(Call::Previous)
    }

    async fn try_change_playback_position(&self, position: Duration) -> HostResult<bool> {
        self.record(Call::Position(position))
    }

    async fn try_change_auto_repeat_mode(&self, mode: RepeatMode) -> HostResult<bool> {
        self.update(|track| track.repeat = Some(mode.code()));
        self.record(Call::Repeat(mode))
    }

    async fn try_change_shuffle_active(&self, active: bool) -> HostResult<bool> {
        self.update(|track| track.shuffle = Some(active));
        self.record(Call::Shuffle(active))
    }

    async fn try_rewind(&self) -> HostResult<bool> {
        self.record(Call::Rewind)
    }
}

struct MediaSnapshot(Track);

impl MediaPropertiesSource for MediaSnapshot {
    fn title(&self) -> HostResult<String> {
        Ok(self.0.title.clone())
    }

    fn album_title(&self) -> HostResult<String> {
        Ok(self.0.album.clone())
    }

    fn album_artist(&self) -> HostResult<String> {
        Ok(self.0.artist.clone())
    }

    fn artist(&self) -> HostResult<String> {
        Ok(self.0.artist.clone())
    }

    fn subtitle(&self) -> HostResult<String> {
        Err(HostError::Unavailable("subtitle"))
    }

    fn track_number(&self) -> HostResult<i32> {
        Ok(1)
    }

    fn album_track_count(&self) -> HostResult<i32> {
        Ok(10)
    }

    fn genres(&self) -> HostResult<Vec<String>> {
        Ok(vec!["Rock".to_string()])
    }

    fn playback_type(&self) -> HostResult<Option<i32>> {
        Ok(Some(1))
    }

    fn thumbnail(&self) -> Option<Box<dyn ThumbnailSource>> {
        self.0
            .cover
            .clone()
            .map(|cover| Box::new(FakeCover(cover)) as Box<dyn ThumbnailSource>)
    }
}

struct FakeCover(Result<Vec<u8>, String>);

#[async_trait]
impl ThumbnailSource for FakeCover {
    async fn read(&self, capacity: usize) -> io::Result<Vec<u8>> {
        match &self.0 {
            Ok(bytes) => Ok(bytes.iter().copied().take(capacity).collect()),
            Err(message) => Err(io::Error::other(message.clone())),
        }
    }
}

struct PlaybackSnapshot(Track);

impl PlaybackInfoSource for PlaybackSnapshot {
    fn playback_status(&self) -> HostResult<i32> {
        Ok(self.0.status)
    }

    fn auto_repeat_mode(&self) -> HostResult<Option<i32>> {
        Ok(self.0.repeat)
    }

    fn is_shuffle_active(&self) -> HostResult<Option<bool>> {
        Ok(self.0.shuffle)
    }

    fn playback_rate(&self) -> HostResult<Option<f64>> {
        Ok(self.0.rate)
    }

    fn playback_type(&self) -> HostResult<Option<i32>> {
        Ok(Some(1))
    }

    fn controls(&self) -> HostResult<PlaybackControls> {
        Ok(PlaybackControls {
            play: true,
            pause: true,
            stop: true,
            next: true,
            previous: true,
            seek: true,
            repeat: true,
            shuffle: true,
        })
    }
}

struct TimelineSnapshot(Track);

impl TimelineSource for TimelineSnapshot {
    fn start_time(&self) -> HostResult<TimeDelta> {
        Ok(TimeDelta::zero())
    }

    fn end_time(&self) -> HostResult<TimeDelta> {
        Ok(TimeDelta::seconds(self.0.end_secs))
    }

    fn min_seek_time(&self) -> HostResult<TimeDelta> {
        Ok(TimeDelta::zero())
    }

    fn max_seek_time(&self) -> HostResult<TimeDelta> {
        Ok(TimeDelta::seconds(self.0.end_secs))
    }

    fn position(&self) -> HostResult<TimeDelta> {
        Ok(TimeDelta::seconds(self.0.position_secs))
    }

    fn last_updated_time(&self) -> HostResult<Option<DateTime<Utc>>> {
        Ok(self.0.last_updated)
    }
}

/// Session manager whose current session is set by the test.
#[derive(Default)]
pub struct FakeManager {
    current: Mutex<Option<Arc<FakeSession>>>,
    current_changed: CallbackRegistry,
    sessions_changed: CallbackRegistry,
}

impl FakeManager {
    pub fn with_session(session: &Arc<FakeSession>) -> Arc<Self> {
        let manager = Self::default();
        *manager.current.lock().unwrap() = Some(Arc::clone(session));
        Arc::new(manager)
    }

    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Replace the current session and notify observers.
    pub fn switch_to(&self, session: Option<&Arc<FakeSession>>) {
        *self.current.lock().unwrap() = session.cloned();
        self.sessions_changed.notify();
        self.current_changed.notify();
    }
}

#[async_trait]
impl SessionManager for FakeManager {
    async fn current_session(&self) -> Option<Arc<dyn MediaSession>> {
        self.current
            .lock()
            .unwrap()
            .clone()
            .map(|session| session as Arc<dyn MediaSession>)
    }

    async fn sessions(&self) -> Vec<Arc<dyn MediaSession>> {
        self.current_session().await.into_iter().collect()
    }

    fn on_current_session_changed(&self, callback: EventCallback) -> Subscription {
        self.current_changed.register(callback)
    }

    fn on_sessions_changed(&self, callback: EventCallback) -> Subscription {
        self.sessions_changed.register(callback)
    }
}

/// Collects every pushed projection.
#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<Projection>>>);

impl Recorder {
    pub fn sink(&self) -> impl FnMut(&Projection) + Send + 'static + use<> {
        let pushes = Arc::clone(&self.0);
        move |projection: &Projection| pushes.lock().unwrap().push(projection.clone())
    }

    pub fn pushes(&self) -> Vec<Projection> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }

    pub fn last(&self) -> Option<Projection> {
        self.0.lock().unwrap().last().cloned()
    }
}

/// Poll `check` until it holds, failing the test after about two seconds.
pub async fn eventually(what: &str, mut check: impl FnMut() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

/// Contents of a JSON file written by a background task, once it parses.
pub async fn read_json_when_written(path: &Path) -> serde_json::Value {
    let mut value = None;
    eventually(&path.display().to_string(), || {
        value = std::fs::read(path)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok());
        value.is_some()
    })
    .await;
    value.unwrap()
}

pub fn sync_config(dir: &Path) -> SyncConfig {
    SyncConfig {
        cover_file: Some(dir.join("cover.png")),
        ..SyncConfig::default()
    }
}
