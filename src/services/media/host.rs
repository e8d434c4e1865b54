use std::{
    collections::BTreeMap,
    io,
    sync::{Arc, Mutex, PoisonError, Weak},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use super::{HostError, RepeatMode, types::PlaybackControls};

/// Result of reading one attribute from the host
pub type HostResult<T> = Result<T, HostError>;

/// Notification callback registered with the host.
///
/// Hosts may invoke it from any thread; it must return quickly.
pub type EventCallback = Arc<dyn Fn() + Send + Sync>;

/// Cancellation guard for an observer registration.
///
/// The registration stays active while the guard lives. Dropping the guard
/// or calling [`Subscription::cancel`] unregisters the callback.
#[must_use = "dropping a Subscription unregisters its callback"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Guard that runs `cancel` once, when it is dropped or cancelled.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Guard for a registration that needs no cleanup.
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    /// Unregister now.
    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[derive(Default)]
struct Registrations {
    next_id: u64,
    callbacks: BTreeMap<u64, EventCallback>,
}

/// A list of observers that hands out [`Subscription`] guards.
///
/// Back-ends keep one registry per host event and call
/// [`CallbackRegistry::notify`] when the event fires.
#[derive(Clone, Default)]
pub struct CallbackRegistry {
    inner: Arc<Mutex<Registrations>>,
}

impl CallbackRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer. It stays registered until the guard is dropped.
    pub fn register(&self, callback: EventCallback) -> Subscription {
        let id = {
            let mut registrations = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            let id = registrations.next_id;
            registrations.next_id += 1;
            registrations.callbacks.insert(id, callback);
            id
        };

        let registry: Weak<Mutex<Registrations>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = registry.upgrade() {
                inner
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .callbacks
                    .remove(&id);
            }
        })
    }

    /// Invoke every registered observer.
    ///
    /// Callbacks run outside the lock, so an observer may register or
    /// cancel from inside its callback.
    pub fn notify(&self) {
        let callbacks: Vec<EventCallback> = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .callbacks
            .values()
            .cloned()
            .collect();

        for callback in callbacks {
            callback();
        }
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .callbacks
            .len()
    }

    /// Whether nobody is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("registrations", &self.len())
            .finish()
    }
}

/// Entry point into the host media subsystem
#[async_trait]
pub trait SessionManager: Send + Sync {
    /// The session the host currently considers active, if any.
    async fn current_session(&self) -> Option<Arc<dyn MediaSession>>;

    /// Every session the host knows about.
    async fn sessions(&self) -> Vec<Arc<dyn MediaSession>>;

    /// Observe changes of the current session.
    fn on_current_session_changed(&self, callback: EventCallback) -> Subscription;

    /// Observe sessions appearing or disappearing.
    fn on_sessions_changed(&self, callback: EventCallback) -> Subscription;
}

/// One media session owned by a host application.
///
/// Control calls return `Ok(true)` when the host accepted the request.
#[async_trait]
pub trait MediaSession: Send + Sync {
    /// Identifier of the application that owns the session.
    fn source_app_id(&self) -> HostResult<String>;

    /// Fetch the current media metadata.
    async fn media_properties(&self) -> HostResult<Box<dyn MediaPropertiesSource>>;

    /// Fetch the current playback info.
    async fn playback_info(&self) -> HostResult<Box<dyn PlaybackInfoSource>>;

    /// Fetch the current timeline.
    async fn timeline_properties(&self) -> HostResult<Box<dyn TimelineSource>>;

    /// Observe metadata changes.
    fn on_media_properties_changed(&self, callback: EventCallback) -> Subscription;

    /// Observe playback info changes.
    fn on_playback_info_changed(&self, callback: EventCallback) -> Subscription;

    /// Observe timeline changes.
    fn on_timeline_properties_changed(&self, callback: EventCallback) -> Subscription;

    /// Start playback.
    async fn try_play(&self) -> HostResult<bool>;

    /// Pause playback.
    async fn try_pause(&self) -> HostResult<bool>;

    /// Stop playback.
    async fn try_stop(&self) -> HostResult<bool>;

    /// Toggle between playing and paused.
    async fn try_toggle_play_pause(&self) -> HostResult<bool>;

    /// Skip to the next track.
    async fn try_skip_next(&self) -> HostResult<bool>;

    /// Skip to the previous track.
    async fn try_skip_previous(&self) -> HostResult<bool>;

    /// Move the playback position.
    async fn try_change_playback_position(&self, position: Duration) -> HostResult<bool>;

    /// Change the auto-repeat mode.
    async fn try_change_auto_repeat_mode(&self, mode: RepeatMode) -> HostResult<bool>;

    /// Enable or disable shuffle.
    async fn try_change_shuffle_active(&self, active: bool) -> HostResult<bool>;

    /// Rewind.
    async fn try_rewind(&self) -> HostResult<bool>;
}

/// Raw media metadata as reported by the host
pub trait MediaPropertiesSource: Send + Sync {
    /// Track title
    fn title(&self) -> HostResult<String>;
    /// Album title
    fn album_title(&self) -> HostResult<String>;
    /// Album artist
    fn album_artist(&self) -> HostResult<String>;
    /// Track artist
    fn artist(&self) -> HostResult<String>;
    /// Subtitle
    fn subtitle(&self) -> HostResult<String>;
    /// Position of the track on its album
    fn track_number(&self) -> HostResult<i32>;
    /// Number of tracks on the album
    fn album_track_count(&self) -> HostResult<i32>;
    /// Genre list, in host order
    fn genres(&self) -> HostResult<Vec<String>>;
    /// Raw playback type code, `None` when the host does not report one
    fn playback_type(&self) -> HostResult<Option<i32>>;
    /// Cover thumbnail reference, `None` when the track has no artwork
    fn thumbnail(&self) -> Option<Box<dyn ThumbnailSource>>;
}

/// A readable cover image
#[async_trait]
pub trait ThumbnailSource: Send + Sync {
    /// Read at most `capacity` bytes of the image.
    async fn read(&self, capacity: usize) -> io::Result<Vec<u8>>;
}

/// Raw playback info as reported by the host
///
/// Optional attributes return `Ok(None)` when the host does not report them.
pub trait PlaybackInfoSource: Send + Sync {
    /// Raw playback status code (`0..=5`)
    fn playback_status(&self) -> HostResult<i32>;
    /// Raw auto-repeat code (`0..=2`)
    fn auto_repeat_mode(&self) -> HostResult<Option<i32>>;
    /// Whether shuffle is on
    fn is_shuffle_active(&self) -> HostResult<Option<bool>>;
    /// Signed playback rate
    fn playback_rate(&self) -> HostResult<Option<f64>>;
    /// Raw playback type code
    fn playback_type(&self) -> HostResult<Option<i32>>;
    /// Controls the session currently accepts
    fn controls(&self) -> HostResult<PlaybackControls>;
}

/// Raw timeline as reported by the host
pub trait TimelineSource: Send + Sync {
    /// Start of the seekable media
    fn start_time(&self) -> HostResult<TimeDelta>;
    /// End of the media
    fn end_time(&self) -> HostResult<TimeDelta>;
    /// Earliest seekable position
    fn min_seek_time(&self) -> HostResult<TimeDelta>;
    /// Latest seekable position
    fn max_seek_time(&self) -> HostResult<TimeDelta>;
    /// Position at the time of the last update
    fn position(&self) -> HostResult<TimeDelta>;
    /// Wall-clock instant `position` was sampled at, `None` if unknown
    fn last_updated_time(&self) -> HostResult<Option<DateTime<Utc>>>;
}
