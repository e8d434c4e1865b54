//! Unit tests for the property normalizers

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use std::io;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, TimeDelta, Utc};
use tempfile::TempDir;

use super::*;
use crate::services::media::{
    DecodeError, HostError,
    host::ThumbnailSource,
    types::{PlaybackControls, PlaybackStatus, PlaybackType, RepeatMode},
};

fn unavailable<T>(field: &'static str, value: Option<T>) -> HostResult<T> {
    value.ok_or(HostError::Unavailable(field))
}

#[derive(Default)]
struct MediaBag {
    title: Option<String>,
    artist: Option<String>,
    genres: Option<Vec<String>>,
    cover: Option<Result<Vec<u8>, String>>,
}

struct Cover(Result<Vec<u8>, String>);

#[async_trait]
impl ThumbnailSource for Cover {
    async fn read(&self, _capacity: usize) -> io::Result<Vec<u8>> {
        self.0.clone().map_err(io::Error::other)
    }
}

impl MediaPropertiesSource for MediaBag {
    fn title(&self) -> HostResult<String> {
        unavailable("title", self.title.clone())
    }
    fn album_title(&self) -> HostResult<String> {
        Ok("Album".to_string())
    }
    fn album_artist(&self) -> HostResult<String> {
        Ok("Band".to_string())
    }
    fn artist(&self) -> HostResult<String> {
        unavailable("artist", self.artist.clone())
    }
    fn subtitle(&self) -> HostResult<String> {
        Err(HostError::Unavailable("subtitle"))
    }
    fn track_number(&self) -> HostResult<i32> {
        Ok(3)
    }
    fn album_track_count(&self) -> HostResult<i32> {
        Ok(12)
    }
    fn genres(&self) -> HostResult<Vec<String>> {
        unavailable("genres", self.genres.clone())
    }
    fn playback_type(&self) -> HostResult<Option<i32>> {
        Ok(Some(1))
    }
    fn thumbnail(&self) -> Option<Box<dyn ThumbnailSource>> {
        self.cover
            .clone()
            .map(|cover| Box::new(Cover(cover)) as Box<dyn ThumbnailSource>)
    }
}

struct PlaybackBag {
    status: Option<i32>,
    repeat: Option<i32>,
    shuffle: Option<bool>,
}

impl PlaybackBag {
    fn playing() -> Self {
        Self {
            status: Some(4),
            repeat: Some(1),
            shuffle: Some(true),
        }
    }
}

impl PlaybackInfoSource for PlaybackBag {
    fn playback_status(&self) -> HostResult<i32> {
        unavailable("playback_status", self.status)
    }
    fn auto_repeat_mode(&self) -> HostResult<Option<i32>> {
        Ok(self.repeat)
    }
    fn is_shuffle_active(&self) -> HostResult<Option<bool>> {
        unavailable("is_shuffle_active", self.shuffle).map(Some)
    }
    fn playback_rate(&self) -> HostResult<Option<f64>> {
        Ok(Some(-2.0))
    }
    fn playback_type(&self) -> HostResult<Option<i32>> {
        Ok(None)
    }
    fn controls(&self) -> HostResult<PlaybackControls> {
        Ok(PlaybackControls {
            play: true,
            ..PlaybackControls::default()
        })
    }
}

struct TimelineBag {
    end: TimeDelta,
    position: TimeDelta,
    updated: Option<DateTime<Utc>>,
}

impl TimelineSource for TimelineBag {
    fn start_time(&self) -> HostResult<TimeDelta> {
        Ok(TimeDelta::zero())
    }
    fn end_time(&self) -> HostResult<TimeDelta> {
        Ok(self.end)
    }
    fn min_seek_time(&self) -> HostResult<TimeDelta> {
        Err(HostError::Unavailable("min_seek_time"))
    }
    fn max_seek_time(&self) -> HostResult<TimeDelta> {
        Ok(self.end)
    }
    fn position(&self) -> HostResult<TimeDelta> {
        Ok(self.position)
    }
    fn last_updated_time(&self) -> HostResult<Option<DateTime<Utc>>> {
        Ok(self.updated)
    }
}

fn normalizer(dir: &TempDir) -> PropertyNormalizer {
    PropertyNormalizer::new(dir.path().join("media_thumb.png"), 1024)
}

#[test]
fn playback_decodes_codes_and_keeps_signed_rate() {
    let dir = TempDir::new().unwrap();

    let info = normalizer(&dir).playback(&PlaybackBag::playing()).unwrap();

    assert_eq!(info.playback_status, PlaybackStatus::Playing);
    assert_eq!(info.auto_repeat_mode, Some(RepeatMode::Track));
    assert_eq!(info.is_shuffle_active, Some(true));
    assert_eq!(info.playback_rate, Some(-2.0));
    assert_eq!(info.playback_type, None);
    assert!(info.controls.is_some_and(|c| c.play && !c.seek));
}

#[test]
fn playback_rejects_unknown_status() {
    let dir = TempDir::new().unwrap();
    let bag = PlaybackBag {
        status: Some(9),
        ..PlaybackBag::playing()
    };

    let err = normalizer(&dir).playback(&bag).unwrap_err();

    assert!(matches!(err, MediaError::Decode(DecodeError::PlaybackStatus(9))));
}

#[test]
fn playback_rejects_unknown_repeat_code() {
    let dir = TempDir::new().unwrap();
    let bag = PlaybackBag {
        repeat: Some(3),
        ..PlaybackBag::playing()
    };

    let err = normalizer(&dir).playback(&bag).unwrap_err();

    assert!(matches!(err, MediaError::Decode(DecodeError::RepeatMode(3))));
}

#[test]
fn playback_without_status_is_missing_field() {
    let dir = TempDir::new().unwrap();
    let bag = PlaybackBag {
        status: None,
        ..PlaybackBag::playing()
    };

    let err = normalizer(&dir).playback(&bag).unwrap_err();

    assert!(matches!(
        err,
        MediaError::MissingField {
            field: "playback_status",
            ..
        }
    ));
}

#[test]
fn playback_omits_unreadable_optional_fields() {
    let dir = TempDir::new().unwrap();
    let bag = PlaybackBag {
        repeat: None,
        shuffle: None,
        ..PlaybackBag::playing()
    };

    let info = normalizer(&dir).playback(&bag).unwrap();

    assert_eq!(info.auto_repeat_mode, None);
    assert_eq!(info.is_shuffle_active, None);
}

#[test]
fn timeline_truncates_to_whole_seconds() {
    let dir = TempDir::new().unwrap();
    let bag = TimelineBag {
        end: TimeDelta::milliseconds(300_900),
        position: TimeDelta::milliseconds(10_999),
        updated: DateTime::from_timestamp(1_700_000_000, 500_000_000),
    };

    let timeline = normalizer(&dir).timeline(&bag);

    assert_eq!(timeline.start_time, Some(0));
    assert_eq!(timeline.end_time, Some(300));
    assert_eq!(timeline.min_seek_time, None);
    assert_eq!(timeline.max_seek_time, Some(300));
    assert_eq!(timeline.position, Some(10));
    assert_eq!(timeline.position_soft, 10);
    assert_eq!(timeline.last_updated_time, Some(1_700_000_000));
}

#[test]
fn timeline_pre_epoch_update_is_unknown() {
    let dir = TempDir::new().unwrap();
    let bag = TimelineBag {
        end: TimeDelta::seconds(100),
        position: TimeDelta::seconds(150),
        updated: DateTime::from_timestamp(-60, 0),
    };

    let timeline = normalizer(&dir).timeline(&bag);

    assert_eq!(timeline.last_updated_time, None);
    assert_eq!(timeline.position, Some(150));
    assert_eq!(timeline.position_soft, 100);
}

#[tokio::test]
async fn media_reads_fields_and_persists_cover() {
    let dir = TempDir::new().unwrap();
    let normalizer = normalizer(&dir);
    let bag = MediaBag {
        title: Some("Song".to_string()),
        artist: Some("Singer".to_string()),
        genres: Some(vec!["Rock".to_string(), "Pop".to_string()]),
        cover: Some(Ok(b"jpeg".to_vec())),
    };

    let media = normalizer.media(&bag).await;

    assert_eq!(media.title.as_deref(), Some("Song"));
    assert_eq!(media.subtitle, None);
    assert_eq!(media.track_number, Some(3));
    assert_eq!(media.genres, Some(vec!["Rock".to_string(), "Pop".to_string()]));
    assert_eq!(media.playback_type, Some(PlaybackType::Music));
    assert_eq!(media.cover, b"jpeg");
    assert_eq!(media.thumbnail_data, STANDARD.encode(b"jpeg"));
    assert_eq!(std::fs::read(normalizer.cover_file()).unwrap(), b"jpeg");
}

#[tokio::test]
async fn media_with_failing_cover_writes_placeholder() {
    let dir = TempDir::new().unwrap();
    let normalizer = normalizer(&dir);
    let bag = MediaBag {
        cover: Some(Err("device lost".to_string())),
        ..MediaBag::default()
    };

    let media = normalizer.media(&bag).await;

    assert_eq!(media.title, None);
    assert_eq!(media.thumbnail_data, STANDARD.encode(PLACEHOLDER_COVER));
    assert_eq!(std::fs::read(normalizer.cover_file()).unwrap(), PLACEHOLDER_COVER);
    assert!(media.thumbnail_url.starts_with("file://"));
}
