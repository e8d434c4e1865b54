use std::{path::PathBuf, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::{
    sync::mpsc,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, error, info, instrument, warn};

use super::{
    aggregator::StateAggregator,
    dispatcher::{CommandDispatcher, SessionBinding},
    host::{EventCallback, MediaSession, SessionManager, Subscription},
    interpolator::{self, Phase},
    normalize::PropertyNormalizer,
    projection::{Projection, ProjectionSink},
    state::AggregateState,
    types::SessionToken,
};
use crate::{
    config::{ConfigPaths, SyncConfig},
    core::Result,
    services::common::Property,
};

/// Notification delivered from host callbacks into the synchronizer task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEvent {
    CurrentSessionChanged,
    SessionsChanged,
    MediaPropertiesChanged(SessionToken),
    PlaybackInfoChanged(SessionToken),
    TimelinePropertiesChanged(SessionToken),
}

/// Mirrors the host's current media session into one aggregate state.
///
/// A single task owns the state: host callbacks only enqueue events, which
/// [`run`](Self::run) handles in order alongside the interpolation tick.
/// Per-session events carry the [`SessionToken`] of the binding they were
/// registered for and are dropped once that binding is replaced.
pub struct Synchronizer<S> {
    manager: Arc<dyn SessionManager>,
    normalizer: PropertyNormalizer,
    aggregator: StateAggregator<S>,
    binding: Property<Option<SessionBinding>>,
    next_token: SessionToken,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    _manager_subscriptions: Vec<Subscription>,
    session_subscriptions: Vec<Subscription>,
    tick_interval: Duration,
}

impl<S: ProjectionSink> Synchronizer<S> {
    /// Create a synchronizer over `manager` pushing into `sink`.
    ///
    /// Nothing is read from the host until [`load`](Self::load).
    ///
    /// # Errors
    /// Returns error if the default cover location cannot be resolved or
    /// the embedded bootstrap template is invalid
    pub fn new(manager: Arc<dyn SessionManager>, sink: S, config: &SyncConfig) -> Result<Self> {
        let cover_file: PathBuf = match &config.cover_file {
            Some(path) => path.clone(),
            None => ConfigPaths::cover_file()?,
        };
        let bootstrap = AggregateState::bootstrap(&cover_file)?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Ok(Self {
            manager,
            normalizer: PropertyNormalizer::new(cover_file, config.thumbnail_capacity),
            aggregator: StateAggregator::new(bootstrap, sink),
            binding: Property::new(None),
            next_token: SessionToken::first(),
            events_tx,
            events_rx,
            _manager_subscriptions: Vec::new(),
            session_subscriptions: Vec::new(),
            tick_interval: config.tick_interval(),
        })
    }

    /// Command surface bound to whatever session this synchronizer tracks.
    pub fn dispatcher(&self) -> CommandDispatcher {
        CommandDispatcher::new(self.binding.clone())
    }

    /// Current aggregate state.
    pub fn state(&self) -> &AggregateState {
        self.aggregator.state()
    }

    /// Projection of the current state.
    pub fn projection(&self) -> Projection {
        self.aggregator.project()
    }

    /// Whether a session is bound.
    pub fn has_session(&self) -> bool {
        self.binding.with(Option::is_some)
    }

    /// Subscribe to the session manager and bind the current session.
    ///
    /// Ends with one push, even when there is no session.
    #[instrument(skip_all)]
    pub async fn load(&mut self) {
        info!("Loading media session state");

        self._manager_subscriptions = vec![
            self.manager
                .on_current_session_changed(self.forward(SessionEvent::CurrentSessionChanged)),
            self.manager
                .on_sessions_changed(self.forward(SessionEvent::SessionsChanged)),
        ];

        self.normalizer.write_placeholder().await;
        self.rebind().await;
        self.aggregator.push();
    }

    /// Handle every event queued so far, then return.
    pub async fn process_pending(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle(event).await;
        }
    }

    /// One interpolation step at the current wall clock time.
    pub fn tick(&mut self) {
        self.tick_at(Utc::now());
    }

    /// One interpolation step as if the time were `now`.
    ///
    /// No-op unless a session is bound and playing. Only the soft position
    /// changes; the reported position is left alone.
    pub fn tick_at(&mut self, now: DateTime<Utc>) {
        if Phase::of(self.state(), self.has_session()) == Phase::Idle {
            return;
        }

        if let Some(position) = interpolator::interpolate(self.state(), now) {
            self.aggregator.set_soft_position(position);
            self.aggregator.push();
        }
    }

    /// Load, then handle events and ticks for as long as the task lives.
    ///
    /// Never returns: the event channel stays open while `self` holds its
    /// sender. Stop it by dropping or aborting the task.
    #[instrument(skip_all, fields(tick = ?self.tick_interval))]
    pub async fn run(mut self) {
        self.load().await;

        let mut ticker = time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                Some(event) = self.events_rx.recv() => self.handle(event).await,
                _ = ticker.tick() => self.tick(),
            }
        }
    }

    fn forward(&self, event: SessionEvent) -> EventCallback {
        let tx = self.events_tx.clone();
        Arc::new(move || {
            let _ = tx.send(event);
        })
    }

    fn bound_session(&self, token: SessionToken) -> Option<Arc<dyn MediaSession>> {
        self.binding.with(|binding| {
            binding
                .as_ref()
                .filter(|binding| binding.token() == token)
                .map(|binding| Arc::clone(binding.session()))
        })
    }

    async fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::CurrentSessionChanged => self.rebind().await,
            SessionEvent::SessionsChanged => {
                let count = self.manager.sessions().await.len();
                debug!(count, "Sessions changed");
            }
            SessionEvent::MediaPropertiesChanged(token)
            | SessionEvent::PlaybackInfoChanged(token)
            | SessionEvent::TimelinePropertiesChanged(token) => {
                let Some(session) = self.bound_session(token) else {
                    debug!(%token, ?event, "Dropping event from replaced session");
                    return;
                };

                match event {
                    SessionEvent::MediaPropertiesChanged(_) => self.refresh_media(&session).await,
                    SessionEvent::PlaybackInfoChanged(_) => self.refresh_playback(&session).await,
                    _ => self.refresh_timeline(&session).await,
                }
            }
        }
    }

    /// Drop the old binding and bind whatever the host says is current.
    ///
    /// Refreshes in the order provider, playback, timeline, media.
    #[instrument(skip_all)]
    async fn rebind(&mut self) {
        self.session_subscriptions.clear();

        let Some(session) = self.manager.current_session().await else {
            info!("No current media session");
            self.binding.replace(None);
            self.normalizer.write_placeholder().await;
            self.aggregator.reset();
            return;
        };

        let token = self.next_token;
        self.next_token = token.next();
        self.binding
            .replace(Some(SessionBinding::new(token, Arc::clone(&session))));

        self.session_subscriptions = vec![
            session.on_media_properties_changed(
                self.forward(SessionEvent::MediaPropertiesChanged(token)),
            ),
            session.on_playback_info_changed(self.forward(SessionEvent::PlaybackInfoChanged(token))),
            session.on_timeline_properties_changed(
                self.forward(SessionEvent::TimelinePropertiesChanged(token)),
            ),
        ];

        let provider = session.source_app_id().unwrap_or_else(|error| {
            warn!(%error, "Cannot read session provider");
            String::new()
        });
        info!(%token, provider = %provider, "Bound media session");

        self.aggregator.set_provider(provider);
        self.refresh_playback(&session).await;
        self.refresh_timeline(&session).await;
        self.refresh_media(&session).await;
    }

    async fn refresh_playback(&mut self, session: &Arc<dyn MediaSession>) {
        debug!("Playback info changed");

        let source = match session.playback_info().await {
            Ok(source) => source,
            Err(error) => {
                error!(%error, "Cannot fetch playback info");
                return;
            }
        };

        match self.normalizer.playback(source.as_ref()) {
            Ok(playback) => self.aggregator.apply_playback(playback),
            Err(error) => error!(%error, "Discarding playback update"),
        }
    }

    async fn refresh_timeline(&mut self, session: &Arc<dyn MediaSession>) {
        debug!("Timeline properties changed");

        match session.timeline_properties().await {
            Ok(source) => {
                let timeline = self.normalizer.timeline(source.as_ref());
                self.aggregator.apply_timeline(timeline);
            }
            Err(error) => error!(%error, "Cannot fetch timeline properties"),
        }
    }

    async fn refresh_media(&mut self, session: &Arc<dyn MediaSession>) {
        debug!("Media properties changed");

        match session.media_properties().await {
            Ok(source) => {
                let media = self.normalizer.media(source.as_ref()).await;
                self.aggregator.apply_media(media);
            }
            Err(error) => error!(%error, "Cannot fetch media properties"),
        }
    }
}
