use chrono::TimeDelta;
use tracing::instrument;

use super::readable;
use crate::services::media::{host::TimelineSource, state::TimelineProperties};

/// Build the timeline sub-document with durations truncated to seconds.
#[instrument(skip_all)]
pub fn normalize_timeline(source: &dyn TimelineSource) -> TimelineProperties {
    let seconds = |delta: TimeDelta| delta.num_seconds();

    let mut timeline = TimelineProperties {
        start_time: readable("start_time", source.start_time()).map(seconds),
        end_time: readable("end_time", source.end_time()).map(seconds),
        min_seek_time: readable("min_seek_time", source.min_seek_time()).map(seconds),
        max_seek_time: readable("max_seek_time", source.max_seek_time()).map(seconds),
        position: readable("position", source.position()).map(seconds),
        last_updated_time: readable("last_updated_time", source.last_updated_time())
            .flatten()
            .map(|instant| instant.timestamp())
            .filter(|epoch| *epoch >= 0),
        position_soft: 0,
    };
    timeline.position_soft = timeline.clamp_position(timeline.position.unwrap_or(0));

    timeline
}
