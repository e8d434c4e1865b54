use tracing::instrument;

use super::readable;
use crate::services::media::{
    MediaError,
    host::PlaybackInfoSource,
    state::PlaybackInfo,
    types::{PlaybackStatus, PlaybackType, RepeatMode},
};

/// Build the playback sub-document.
///
/// # Errors
/// Returns [`MediaError::MissingField`] when the status cannot be read and
/// [`MediaError::Decode`] when the status or repeat code is out of range.
#[instrument(skip_all)]
pub fn normalize_playback(source: &dyn PlaybackInfoSource) -> Result<PlaybackInfo, MediaError> {
    let status_code = source
        .playback_status()
        .map_err(|source| MediaError::MissingField {
            field: "playback_status",
            source,
        })?;
    let playback_status = PlaybackStatus::try_from(status_code)?;

    let auto_repeat_mode = readable("auto_repeat_mode", source.auto_repeat_mode())
        .flatten()
        .map(RepeatMode::try_from)
        .transpose()?;

    Ok(PlaybackInfo {
        playback_status,
        auto_repeat_mode,
        is_shuffle_active: readable("is_shuffle_active", source.is_shuffle_active()).flatten(),
        playback_rate: readable("playback_rate", source.playback_rate()).flatten(),
        playback_type: readable("playback_type", source.playback_type())
            .flatten()
            .map(PlaybackType::from),
        controls: readable("controls", source.controls()),
    })
}
