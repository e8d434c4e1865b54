/// Shared building blocks for services
pub mod common;
/// Media session synchronization service
pub mod media;

pub use media::{CommandDispatcher, Projection, Synchronizer};
