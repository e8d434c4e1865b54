//! Linux back-end: MPRIS players on the D-Bus session bus.

/// Player discovery and current-player selection
pub mod manager;
/// `Metadata` property decoding
pub mod metadata;
/// D-Bus proxy definitions
pub mod proxy;
/// One player as a media session
pub mod session;

pub use manager::MprisSessionManager;
pub use session::MprisSession;

/// Bus name prefix every MPRIS player registers under
pub const MPRIS_PREFIX: &str = "org.mpris.MediaPlayer2.";
