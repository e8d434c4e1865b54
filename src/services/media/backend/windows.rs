//! Windows back-end: the system media transport controls (SMTC) session
//! manager, mapped one to one onto the host traits.

use std::{io, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tracing::{info, instrument, warn};
use windows::{
    Foundation::{DateTime as WinDateTime, EventRegistrationToken, TimeSpan, TypedEventHandler},
    Media::{
        Control::{
            GlobalSystemMediaTransportControlsSession as SmtcSessionHandle,
            GlobalSystemMediaTransportControlsSessionManager as SmtcManagerHandle,
            GlobalSystemMediaTransportControlsSessionMediaProperties as SmtcMediaProperties,
            GlobalSystemMediaTransportControlsSessionPlaybackInfo as SmtcPlaybackInfo,
            GlobalSystemMediaTransportControlsSessionTimelineProperties as SmtcTimeline,
        },
        MediaPlaybackAutoRepeatMode,
    },
    Storage::Streams::{Buffer, DataReader, IRandomAccessStreamReference, InputStreamOptions},
};

use crate::services::media::{
    HostError,
    host::{
        EventCallback, HostResult, MediaPropertiesSource, MediaSession, PlaybackInfoSource,
        SessionManager, Subscription, ThumbnailSource, TimelineSource,
    },
    types::{PlaybackControls, RepeatMode},
};

/// 100 ns ticks between 1601-01-01 and 1970-01-01
const UNIX_EPOCH_TICKS: i64 = 116_444_736_000_000_000;
const TICKS_PER_SECOND: i64 = 10_000_000;

fn span(value: TimeSpan) -> TimeDelta {
    TimeDelta::microseconds(value.Duration / 10)
}

fn instant(value: WinDateTime) -> Option<DateTime<Utc>> {
    let ticks = value.UniversalTime.checked_sub(UNIX_EPOCH_TICKS)?;
    let nanos = u32::try_from(ticks.rem_euclid(TICKS_PER_SECOND) * 100).ok()?;
    DateTime::from_timestamp(ticks.div_euclid(TICKS_PER_SECOND), nanos)
}

fn ticks(duration: Duration) -> i64 {
    i64::try_from(duration.as_nanos() / 100).unwrap_or(i64::MAX)
}

fn guard(cancel: impl FnOnce() -> windows::core::Result<()> + Send + 'static) -> Subscription {
    Subscription::new(move || {
        if let Err(error) = cancel() {
            warn!(%error, "Failed to remove SMTC event handler");
        }
    })
}

/// Entry point to the SMTC session manager
pub struct SmtcSessionManager {
    manager: SmtcManagerHandle,
}

impl SmtcSessionManager {
    /// Request the session manager from the OS.
    ///
    /// # Errors
    /// Returns error if the WinRT request fails
    #[instrument]
    pub async fn connect() -> Result<Self, HostError> {
        info!("Requesting SMTC session manager");
        let manager = SmtcManagerHandle::RequestAsync()?.await?;
        Ok(Self { manager })
    }
}

#[async_trait]
impl SessionManager for SmtcSessionManager {
    async fn current_session(&self) -> Option<Arc<dyn MediaSession>> {
        self.manager
            .GetCurrentSession()
            .ok()
            .map(|session| Arc::new(SmtcSession { session }) as Arc<dyn MediaSession>)
    }

    async fn sessions(&self) -> Vec<Arc<dyn MediaSession>> {
        match self.manager.GetSessions() {
            Ok(sessions) => sessions
                .into_iter()
                .map(|session| Arc::new(SmtcSession { session }) as Arc<dyn MediaSession>)
                .collect(),
            Err(error) => {
                warn!(%error, "Cannot list SMTC sessions");
                Vec::new()
            }
        }
    }

    fn on_current_session_changed(&self, callback: EventCallback) -> Subscription {
        let handler = TypedEventHandler::new(move |_, _| {
            callback();
            Ok(())
        });

        match self.manager.CurrentSessionChanged(&handler) {
            Ok(token) => {
                let manager = self.manager.clone();
                guard(move || manager.RemoveCurrentSessionChanged(token))
            }
            Err(error) => {
                warn!(%error, "Cannot observe current session changes");
                Subscription::noop()
            }
        }
    }

    fn on_sessions_changed(&self, callback: EventCallback) -> Subscription {
        let handler = TypedEventHandler::new(move |_, _| {
            callback();
            Ok(())
        });

        match self.manager.SessionsChanged(&handler) {
            Ok(token) => {
                let manager = self.manager.clone();
                guard(move || manager.RemoveSessionsChanged(token))
            }
            Err(error) => {
                warn!(%error, "Cannot observe session list changes");
                Subscription::noop()
            }
        }
    }
}

/// One SMTC session
pub struct SmtcSession {
    session: SmtcSessionHandle,
}

impl SmtcSession {
    fn observe(
        &self,
        event: &'static str,
        register: impl FnOnce(&SmtcSessionHandle) -> windows::core::Result<EventRegistrationToken>,
        remove: fn(&SmtcSessionHandle, EventRegistrationToken) -> windows::core::Result<()>,
    ) -> Subscription {
        match register(&self.session) {
            Ok(token) => {
                let session = self.session.clone();
                guard(move || remove(&session, token))
            }
            Err(error) => {
                warn!(event, %error, "Cannot observe session event");
                Subscription::noop()
            }
        }
    }
}

#[async_trait]
impl MediaSession for SmtcSession {
    fn source_app_id(&self) -> HostResult<String> {
        Ok(self.session.SourceAppUserModelId()?.to_string())
    }

    async fn media_properties(&self) -> HostResult<Box<dyn MediaPropertiesSource>> {
        let properties = self.session.TryGetMediaPropertiesAsync()?.await?;
        Ok(Box::new(SmtcMedia(properties)))
    }

    async fn playback_info(&self) -> HostResult<Box<dyn PlaybackInfoSource>> {
        Ok(Box::new(SmtcPlayback(self.session.GetPlaybackInfo()?)))
    }

    async fn timeline_properties(&self) -> HostResult<Box<dyn TimelineSource>> {
        Ok(Box::new(SmtcTimelineSource(
            self.session.GetTimelineProperties()?,
        )))
    }

    fn on_media_properties_changed(&self, callback: EventCallback) -> Subscription {
        self.observe(
            "MediaPropertiesChanged",
            |session| {
                session.MediaPropertiesChanged(&TypedEventHandler::new(move |_, _| {
                    callback();
                    Ok(())
                }))
            },
            SmtcSessionHandle::RemoveMediaPropertiesChanged,
        )
    }

    fn on_playback_info_changed(&self, callback: EventCallback) -> Subscription {
        self.observe(
            "PlaybackInfoChanged",
            |session| {
                session.PlaybackInfoChanged(&TypedEventHandler::new(move |_, _| {
                    callback();
                    Ok(())
                }))
            },
            SmtcSessionHandle::RemovePlaybackInfoChanged,
        )
    }

    fn on_timeline_properties_changed(&self, callback: EventCallback) -> Subscription {
        self.observe(
            "TimelinePropertiesChanged",
            |session| {
                session.TimelinePropertiesChanged(&TypedEventHandler::new(move |_, _| {
                    callback();
                    Ok(())
                }))
            },
            SmtcSessionHandle::RemoveTimelinePropertiesChanged,
        )
    }

    async fn try_play(&self) -> HostResult<bool> {
        Ok(self.session.TryPlayAsync()?.await?)
    }

    async fn try_pause(&self) -> HostResult<bool> {
        Ok(self.session.TryPauseAsync()?.await?)
    }

    async fn try_stop(&self) -> HostResult<bool> {
        Ok(self.session.TryStopAsync()?.await?)
    }

    async fn try_toggle_play_pause(&self) -> HostResult<bool> {
        Ok(self.session.TryTogglePlayPauseAsync()?.await?)
    }

    async fn try_skip_next(&self) -> HostResult<bool> {
        Ok(self.session.TrySkipNextAsync()?.await?)
    }

    async fn try_skip_previous(&self) -> HostResult<bool> {
        Ok(self.session.TrySkipPreviousAsync()?.await?)
    }

    async fn try_change_playback_position(&self, position: Duration) -> HostResult<bool> {
        Ok(self
            .session
            .TryChangePlaybackPositionAsync(ticks(position))?
            .await?)
    }

    async fn try_change_auto_repeat_mode(&self, mode: RepeatMode) -> HostResult<bool> {
        Ok(self
            .session
            .TryChangeAutoRepeatModeAsync(MediaPlaybackAutoRepeatMode(mode.code()))?
            .await?)
    }

    async fn try_change_shuffle_active(&self, active: bool) -> HostResult<bool> {
        Ok(self.session.TryChangeShuffleActiveAsync(active)?.await?)
    }

    async fn try_rewind(&self) -> HostResult<bool> {
        Ok(self.session.TryRewindAsync()?.await?)
    }
}

struct SmtcMedia(SmtcMediaProperties);

impl MediaPropertiesSource for SmtcMedia {
    fn title(&self) -> HostResult<String> {
        Ok(self.0.Title()?.to_string())
    }

    fn album_title(&self) -> HostResult<String> {
        Ok(self.0.AlbumTitle()?.to_string())
    }

    fn album_artist(&self) -> HostResult<String> {
        Ok(self.0.AlbumArtist()?.to_string())
    }

    fn artist(&self) -> HostResult<String> {
        Ok(self.0.Artist()?.to_string())
    }

    fn subtitle(&self) -> HostResult<String> {
        Ok(self.0.Subtitle()?.to_string())
    }

    fn track_number(&self) -> HostResult<i32> {
        Ok(self.0.TrackNumber()?)
    }

    fn album_track_count(&self) -> HostResult<i32> {
        Ok(self.0.AlbumTrackCount()?)
    }

    fn genres(&self) -> HostResult<Vec<String>> {
        Ok(self
            .0
            .Genres()?
            .into_iter()
            .map(|genre| genre.to_string())
            .collect())
    }

    fn playback_type(&self) -> HostResult<Option<i32>> {
        Ok(self
            .0
            .PlaybackType()
            .and_then(|value| value.Value())
            .ok()
            .map(|kind| kind.0))
    }

    fn thumbnail(&self) -> Option<Box<dyn ThumbnailSource>> {
        self.0
            .Thumbnail()
            .ok()
            .map(|reference| Box::new(SmtcThumbnail(reference)) as Box<dyn ThumbnailSource>)
    }
}

struct SmtcThumbnail(IRandomAccessStreamReference);

impl SmtcThumbnail {
    async fn read_winrt(&self, capacity: u32) -> windows::core::Result<Vec<u8>> {
        let stream = self.0.OpenReadAsync()?.await?;
        let buffer = Buffer::Create(capacity)?;
        let filled = stream
            .ReadAsync(&buffer, capacity, InputStreamOptions::ReadAhead)?
            .await?;

        let reader = DataReader::FromBuffer(&filled)?;
        let mut bytes = vec![0u8; filled.Length()? as usize];
        reader.ReadBytes(&mut bytes)?;
        Ok(bytes)
    }
}

#[async_trait]
impl ThumbnailSource for SmtcThumbnail {
    async fn read(&self, capacity: usize) -> io::Result<Vec<u8>> {
        let capacity = u32::try_from(capacity).unwrap_or(u32::MAX);
        self.read_winrt(capacity).await.map_err(io::Error::other)
    }
}

struct SmtcPlayback(SmtcPlaybackInfo);

impl PlaybackInfoSource for SmtcPlayback {
    fn playback_status(&self) -> HostResult<i32> {
        Ok(self.0.PlaybackStatus()?.0)
    }

    fn auto_repeat_mode(&self) -> HostResult<Option<i32>> {
        Ok(self
            .0
            .AutoRepeatMode()
            .and_then(|value| value.Value())
            .ok()
            .map(|mode| mode.0))
    }

    fn is_shuffle_active(&self) -> HostResult<Option<bool>> {
        Ok(self.0.IsShuffleActive().and_then(|value| value.Value()).ok())
    }

    fn playback_rate(&self) -> HostResult<Option<f64>> {
        Ok(self.0.PlaybackRate().and_then(|value| value.Value()).ok())
    }

    fn playback_type(&self) -> HostResult<Option<i32>> {
        Ok(self
            .0
            .PlaybackType()
            .and_then(|value| value.Value())
            .ok()
            .map(|kind| kind.0))
    }

    fn controls(&self) -> HostResult<PlaybackControls> {
        let controls = self.0.Controls()?;

        Ok(PlaybackControls {
            play: controls.IsPlayEnabled()?,
            pause: controls.IsPauseEnabled()?,
            stop: controls.IsStopEnabled()?,
            next: controls.IsNextEnabled()?,
            previous: controls.IsPreviousEnabled()?,
            seek: controls.IsPlaybackPositionEnabled()?,
            repeat: controls.IsRepeatEnabled()?,
            shuffle: controls.IsShuffleEnabled()?,
        })
    }
}

struct SmtcTimelineSource(SmtcTimeline);

impl TimelineSource for SmtcTimelineSource {
    fn start_time(&self) -> HostResult<TimeDelta> {
        Ok(span(self.0.StartTime()?))
    }

    fn end_time(&self) -> HostResult<TimeDelta> {
        Ok(span(self.0.EndTime()?))
    }

    fn min_seek_time(&self) -> HostResult<TimeDelta> {
        Ok(span(self.0.MinSeekTime()?))
    }

    fn max_seek_time(&self) -> HostResult<TimeDelta> {
        Ok(span(self.0.MaxSeekTime()?))
    }

    fn position(&self) -> HostResult<TimeDelta> {
        Ok(span(self.0.Position()?))
    }

    fn last_updated_time(&self) -> HostResult<Option<DateTime<Utc>>> {
        Ok(instant(self.0.LastUpdatedTime()?))
    }
}
