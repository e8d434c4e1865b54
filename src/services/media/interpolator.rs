//! Soft position estimation between host timeline updates.
//!
//! Hosts report the position only occasionally, together with the wall
//! clock instant it was sampled at. While playing, the position is
//! extrapolated as `position + floor(rate * elapsed)`.

use chrono::{DateTime, Utc};

use super::{state::AggregateState, types::PlaybackStatus};

/// Rate assumed when the host does not report one
pub const DEFAULT_PLAYBACK_RATE: f64 = 1.0;

/// Whether the interpolator has anything to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No session, or the session is not playing
    Idle,
    /// The session is playing; each tick recomputes the soft position
    Advancing,
}

impl Phase {
    /// Phase for the given state.
    pub fn of(state: &AggregateState, has_session: bool) -> Self {
        if has_session && state.playback_info.playback_status == PlaybackStatus::Playing {
            Self::Advancing
        } else {
            Self::Idle
        }
    }
}

/// Soft position at `now`, clamped to `[0, end_time]`.
///
/// Returns `None` when there is nothing to extrapolate from: no reported
/// position or no known sample instant.
pub fn interpolate(state: &AggregateState, now: DateTime<Utc>) -> Option<i64> {
    let timeline = &state.timeline_properties;
    let position = timeline.position?;
    let last_updated = timeline.last_updated_time?;

    let rate = state
        .playback_info
        .playback_rate
        .unwrap_or(DEFAULT_PLAYBACK_RATE);
    let elapsed = now.timestamp_millis() as f64 / 1000.0 - last_updated as f64;
    let delta = (rate * elapsed).floor() as i64;

    Some(timeline.clamp_position(position.saturating_add(delta)))
}
