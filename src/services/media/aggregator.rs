use tracing::trace;

use super::{
    projection::{Projection, ProjectionSink},
    state::{AggregateState, MediaProperties, PlaybackInfo, TimelineProperties},
};

/// Owner of the aggregate state and the only caller of the push sink.
///
/// Each `apply_*` replaces one sub-document wholesale and pushes the new
/// projection, so every push reflects a complete document.
pub struct StateAggregator<S> {
    state: AggregateState,
    bootstrap: AggregateState,
    sink: S,
}

impl<S: ProjectionSink> StateAggregator<S> {
    /// Start from `bootstrap`, which is also what [`reset`](Self::reset)
    /// returns to.
    pub fn new(bootstrap: AggregateState, sink: S) -> Self {
        Self {
            state: bootstrap.clone(),
            bootstrap,
            sink,
        }
    }

    /// Current aggregate state.
    pub fn state(&self) -> &AggregateState {
        &self.state
    }

    /// Replace the provider and push.
    pub fn set_provider(&mut self, provider: String) {
        self.state.provider = provider;
        self.push();
    }

    /// Replace the metadata sub-document and push.
    pub fn apply_media(&mut self, media: MediaProperties) {
        self.state.media_properties = media;
        self.push();
    }

    /// Replace the playback sub-document and push.
    pub fn apply_playback(&mut self, playback: PlaybackInfo) {
        self.state.playback_info = playback;
        self.push();
    }

    /// Replace the timeline sub-document and push.
    pub fn apply_timeline(&mut self, timeline: TimelineProperties) {
        self.state.timeline_properties = timeline;
        self.push();
    }

    /// Overwrite the interpolated position only. Does not push.
    pub fn set_soft_position(&mut self, seconds: i64) {
        self.state.timeline_properties.position_soft = seconds;
    }

    /// Return to the bootstrap document and push.
    pub fn reset(&mut self) {
        self.state = self.bootstrap.clone();
        self.push();
    }

    /// The projection of the current state.
    pub fn project(&self) -> Projection {
        Projection::of(&self.state)
    }

    /// Send the current projection to the sink.
    pub fn push(&mut self) {
        let projection = self.project();
        trace!(status = %projection.status, position = projection.position, "Pushing projection");
        self.sink.push(&projection);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::services::media::types::PlaybackStatus;

    fn recording() -> (Arc<Mutex<Vec<Projection>>>, impl ProjectionSink) {
        let pushed = Arc::new(Mutex::new(Vec::new()));
        let sink_log = Arc::clone(&pushed);
        let sink = move |p: &Projection| {
            if let Ok(mut log) = sink_log.lock() {
                log.push(p.clone());
            }
        };
        (pushed, sink)
    }

    #[test]
    fn each_apply_pushes_one_complete_projection() {
        let (pushed, sink) = recording();
        let mut aggregator = StateAggregator::new(AggregateState::default(), sink);

        aggregator.set_provider("vlc".to_string());
        aggregator.apply_playback(PlaybackInfo {
            playback_status: PlaybackStatus::Playing,
            ..PlaybackInfo::default()
        });

        let log = pushed.lock().map(|log| log.clone()).unwrap_or_default();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].provider, "vlc");
        assert_eq!(log[1].status, PlaybackStatus::Playing);
    }

    #[test]
    fn soft_position_leaves_hard_values_alone() {
        let (pushed, sink) = recording();
        let mut aggregator = StateAggregator::new(AggregateState::default(), sink);
        aggregator.apply_timeline(TimelineProperties {
            position: Some(10),
            position_soft: 10,
            ..TimelineProperties::default()
        });

        aggregator.set_soft_position(14);

        let timeline = &aggregator.state().timeline_properties;
        assert_eq!(timeline.position, Some(10));
        assert_eq!(timeline.position_soft, 14);
        assert_eq!(pushed.lock().map(|log| log.len()).unwrap_or_default(), 1);
    }

    #[test]
    fn reset_restores_bootstrap() {
        let (_, sink) = recording();
        let bootstrap = AggregateState::default();
        let mut aggregator = StateAggregator::new(bootstrap.clone(), sink);
        aggregator.set_provider("mpv".to_string());

        aggregator.reset();

        assert_eq!(aggregator.state(), &bootstrap);
    }
}
