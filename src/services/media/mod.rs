//! Media session synchronization.
//!
//! [`Synchronizer`] follows the host's current media session, merges its
//! metadata, playback info and timeline into an [`AggregateState`], and
//! pushes a flattened [`Projection`] to a [`ProjectionSink`] on every
//! change. [`CommandDispatcher`] sends playback commands to the same
//! session.

/// State aggregation and the push choke point
pub mod aggregator;
/// Platform host back-ends
pub mod backend;
/// Playback command surface
pub mod dispatcher;
/// Media error types
pub mod error;
/// Host media subsystem abstraction
pub mod host;
/// Soft position interpolation
pub mod interpolator;
/// Raw property normalization
pub mod normalize;
/// Pushed projection and sinks
pub mod projection;
/// Aggregate state documents
pub mod state;
/// The synchronizer event loop
pub mod synchronizer;
/// Status, repeat and playback type enums
pub mod types;

pub use aggregator::StateAggregator;
pub use dispatcher::{Attempt, Command, CommandBridge, CommandDispatcher, SessionBinding};
pub use error::{CommandError, DecodeError, HostError, MediaError};
pub use host::{
    CallbackRegistry, EventCallback, HostResult, MediaPropertiesSource, MediaSession,
    PlaybackInfoSource, SessionManager, Subscription, ThumbnailSource, TimelineSource,
};
pub use projection::{JsonFileSink, Projection, ProjectionMetadata, ProjectionSink, WatchSink};
pub use state::{AggregateState, MediaProperties, PlaybackInfo, TimelineProperties};
pub use synchronizer::Synchronizer;
pub use types::{PlaybackControls, PlaybackStatus, PlaybackType, RepeatMode, SessionToken};
