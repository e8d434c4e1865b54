use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use futures::StreamExt;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, instrument, warn};
use zbus::{Connection, zvariant::ObjectPath};

use super::{MPRIS_PREFIX, metadata::MprisMetadata, proxy::MediaPlayer2PlayerProxy};
use crate::services::media::{
    HostError,
    host::{
        CallbackRegistry, EventCallback, HostResult, MediaPropertiesSource, MediaSession,
        PlaybackInfoSource, Subscription, TimelineSource,
    },
    types::{PlaybackControls, RepeatMode},
};

const NO_TRACK: &str = "/org/mpris/MediaPlayer2/TrackList/NoTrack";

#[derive(Clone, Default)]
struct SessionEvents {
    media: CallbackRegistry,
    playback: CallbackRegistry,
    timeline: CallbackRegistry,
}

/// One MPRIS player exposed as a media session.
///
/// A background task watches the player's properties for as long as the
/// session lives and notifies the registered observers.
pub struct MprisSession {
    bus_name: String,
    proxy: MediaPlayer2PlayerProxy<'static>,
    events: SessionEvents,
    monitor: JoinHandle<()>,
}

impl MprisSession {
    /// Attach to the player owning `bus_name`.
    ///
    /// `status_changed` receives a message whenever the player's playback
    /// status changes.
    ///
    /// # Errors
    /// Returns error if the player proxy cannot be built
    #[instrument(skip(connection, status_changed))]
    pub(super) async fn connect(
        connection: &Connection,
        bus_name: String,
        status_changed: mpsc::UnboundedSender<()>,
    ) -> Result<Self, HostError> {
        let proxy = MediaPlayer2PlayerProxy::builder(connection)
            .destination(bus_name.clone())?
            .build()
            .await?;

        let events = SessionEvents::default();
        let monitor = tokio::spawn(monitor(proxy.clone(), events.clone(), status_changed));

        Ok(Self {
            bus_name,
            proxy,
            events,
            monitor,
        })
    }

    /// Well-known bus name of the player
    pub fn bus_name(&self) -> &str {
        &self.bus_name
    }

    pub(super) async fn is_playing(&self) -> bool {
        matches!(self.proxy.playback_status().await.as_deref(), Ok("Playing"))
    }
}

impl Drop for MprisSession {
    fn drop(&mut self) {
        self.monitor.abort();
    }
}

async fn monitor(
    proxy: MediaPlayer2PlayerProxy<'static>,
    events: SessionEvents,
    status_changed: mpsc::UnboundedSender<()>,
) {
    let mut metadata = proxy.receive_metadata_changed().await;
    let mut status = proxy.receive_playback_status_changed().await;
    let mut loop_status = proxy.receive_loop_status_changed().await;
    let mut shuffle = proxy.receive_shuffle_changed().await;
    let mut rate = proxy.receive_rate_changed().await;
    let mut seeked = match proxy.receive_seeked().await {
        Ok(stream) => stream,
        Err(error) => {
            warn!(%error, "Cannot watch Seeked signal");
            return;
        }
    };

    loop {
        tokio::select! {
            Some(_) = metadata.next() => {
                events.media.notify();
                events.timeline.notify();
            }
            Some(_) = status.next() => {
                events.playback.notify();
                events.timeline.notify();
                let _ = status_changed.send(());
            }
            Some(_) = loop_status.next() => events.playback.notify(),
            Some(_) = shuffle.next() => events.playback.notify(),
            Some(_) = rate.next() => {
                events.playback.notify();
                events.timeline.notify();
            }
            Some(_) = seeked.next() => events.timeline.notify(),
            else => break,
        }
    }

    debug!("Player property streams closed");
}

/// Playback properties read in one round
struct MprisPlayback {
    status: Result<String, String>,
    loop_status: Option<String>,
    shuffle: Option<bool>,
    rate: Option<f64>,
    controls: PlaybackControls,
}

impl PlaybackInfoSource for MprisPlayback {
    fn playback_status(&self) -> HostResult<i32> {
        match self.status.as_deref() {
            Ok("Stopped") => Ok(3),
            Ok("Playing") => Ok(4),
            Ok("Paused") => Ok(5),
            Ok(other) => Err(HostError::CallFailed(format!(
                "unknown playback status '{other}'"
            ))),
            Err(error) => Err(HostError::CallFailed(error.clone())),
        }
    }

    fn auto_repeat_mode(&self) -> HostResult<Option<i32>> {
        Ok(self
            .loop_status
            .as_deref()
            .map(|status| RepeatMode::from(status).code()))
    }

    fn is_shuffle_active(&self) -> HostResult<Option<bool>> {
        Ok(self.shuffle)
    }

    fn playback_rate(&self) -> HostResult<Option<f64>> {
        Ok(self.rate)
    }

    fn playback_type(&self) -> HostResult<Option<i32>> {
        Ok(None)
    }

    fn controls(&self) -> HostResult<PlaybackControls> {
        Ok(self.controls)
    }
}

/// Timeline derived from `mpris:length` and `Position`
struct MprisTimeline {
    length: Option<i64>,
    position: Result<i64, String>,
    sampled_at: DateTime<Utc>,
}

impl MprisTimeline {
    fn length(&self, field: &'static str) -> HostResult<TimeDelta> {
        self.length
            .map(TimeDelta::microseconds)
            .ok_or(HostError::Unavailable(field))
    }
}

impl TimelineSource for MprisTimeline {
    fn start_time(&self) -> HostResult<TimeDelta> {
        Ok(TimeDelta::zero())
    }

    fn end_time(&self) -> HostResult<TimeDelta> {
        self.length("end_time")
    }

    fn min_seek_time(&self) -> HostResult<TimeDelta> {
        Ok(TimeDelta::zero())
    }

    fn max_seek_time(&self) -> HostResult<TimeDelta> {
        self.length("max_seek_time")
    }

    fn position(&self) -> HostResult<TimeDelta> {
        self.position
            .clone()
            .map(TimeDelta::microseconds)
            .map_err(HostError::CallFailed)
    }

    fn last_updated_time(&self) -> HostResult<Option<DateTime<Utc>>> {
        Ok(Some(self.sampled_at))
    }
}

#[async_trait]
impl MediaSession for MprisSession {
    fn source_app_id(&self) -> HostResult<String> {
        Ok(self
            .bus_name
            .strip_prefix(MPRIS_PREFIX)
            .unwrap_or(&self.bus_name)
            .to_string())
    }

    async fn media_properties(&self) -> HostResult<Box<dyn MediaPropertiesSource>> {
        let entries = self.proxy.metadata().await?;
        Ok(Box::new(MprisMetadata::new(entries)))
    }

    async fn playback_info(&self) -> HostResult<Box<dyn PlaybackInfoSource>> {
        let (status, loop_status, shuffle, rate) = tokio::join!(
            self.proxy.playback_status(),
            self.proxy.loop_status(),
            self.proxy.shuffle(),
            self.proxy.rate(),
        );
        let (can_play, can_pause, can_next, can_previous, can_seek, can_control) = tokio::join!(
            self.proxy.can_play(),
            self.proxy.can_pause(),
            self.proxy.can_go_next(),
            self.proxy.can_go_previous(),
            self.proxy.can_seek(),
            self.proxy.can_control(),
        );

        let controls = PlaybackControls {
            play: can_play.unwrap_or(false),
            pause: can_pause.unwrap_or(false),
            stop: can_control.as_ref().is_ok_and(|c| *c),
            next: can_next.unwrap_or(false),
            previous: can_previous.unwrap_or(false),
            seek: can_seek.unwrap_or(false),
            repeat: loop_status.is_ok(),
            shuffle: shuffle.is_ok(),
        };

        Ok(Box::new(MprisPlayback {
            status: status.map_err(|e| e.to_string()),
            loop_status: loop_status.ok(),
            shuffle: shuffle.ok(),
            rate: rate.ok(),
            controls,
        }))
    }

    async fn timeline_properties(&self) -> HostResult<Box<dyn TimelineSource>> {
        let (entries, position) = tokio::join!(self.proxy.metadata(), self.proxy.position());

        Ok(Box::new(MprisTimeline {
            length: MprisMetadata::new(entries?).length_micros(),
            position: position.map_err(|e| e.to_string()),
            sampled_at: Utc::now(),
        }))
    }

    fn on_media_properties_changed(&self, callback: EventCallback) -> Subscription {
        self.events.media.register(callback)
    }

    fn on_playback_info_changed(&self, callback: EventCallback) -> Subscription {
        self.events.playback.register(callback)
    }

    fn on_timeline_properties_changed(&self, callback: EventCallback) -> Subscription {
        self.events.timeline.register(callback)
    }

    async fn try_play(&self) -> HostResult<bool> {
        self.proxy.play().await?;
        Ok(true)
    }

    async fn try_pause(&self) -> HostResult<bool> {
        self.proxy.pause().await?;
        Ok(true)
    }

    async fn try_stop(&self) -> HostResult<bool> {
        self.proxy.stop().await?;
        Ok(true)
    }

    async fn try_toggle_play_pause(&self) -> HostResult<bool> {
        self.proxy.play_pause().await?;
        Ok(true)
    }

    async fn try_skip_next(&self) -> HostResult<bool> {
        self.proxy.next().await?;
        Ok(true)
    }

    async fn try_skip_previous(&self) -> HostResult<bool> {
        self.proxy.previous().await?;
        Ok(true)
    }

    async fn try_change_playback_position(&self, position: Duration) -> HostResult<bool> {
        let metadata = MprisMetadata::new(self.proxy.metadata().await?);
        let track_id = metadata.track_id().unwrap_or_else(|| NO_TRACK.to_string());
        let track_path = ObjectPath::try_from(track_id.as_str()).map_err(zbus::Error::from)?;
        let micros = i64::try_from(position.as_micros()).unwrap_or(i64::MAX);

        self.proxy.set_position(&track_path, micros).await?;
        Ok(true)
    }

    async fn try_change_auto_repeat_mode(&self, mode: RepeatMode) -> HostResult<bool> {
        let status = match mode {
            RepeatMode::None => "None",
            RepeatMode::Track => "Track",
            RepeatMode::All => "Playlist",
        };

        self.proxy.set_loop_status(status).await?;
        Ok(true)
    }

    async fn try_change_shuffle_active(&self, active: bool) -> HostResult<bool> {
        self.proxy.set_shuffle(active).await?;
        Ok(true)
    }

    async fn try_rewind(&self) -> HostResult<bool> {
        debug!(bus_name = %self.bus_name, "MPRIS players have no rewind");
        Ok(false)
    }
}
