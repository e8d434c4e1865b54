#![allow(missing_docs)]

use std::collections::HashMap;

use zbus::{Result, proxy, zvariant::ObjectPath};

/// `org.mpris.MediaPlayer2.Player`: transport control, playback state and
/// track metadata of one player
#[proxy(
    interface = "org.mpris.MediaPlayer2.Player",
    default_path = "/org/mpris/MediaPlayer2"
)]
pub trait MediaPlayer2Player {
    /// Start playback
    fn play(&self) -> Result<()>;

    /// Pause playback
    fn pause(&self) -> Result<()>;

    /// Toggle play/pause state
    fn play_pause(&self) -> Result<()>;

    /// Stop playback
    fn stop(&self) -> Result<()>;

    /// Skip to next track
    fn next(&self) -> Result<()>;

    /// Skip to previous track
    fn previous(&self) -> Result<()>;

    /// Seek by a relative offset in microseconds
    fn seek(&self, offset: i64) -> Result<()>;

    /// Set absolute playback position in microseconds
    fn set_position(&self, track_id: &ObjectPath<'_>, position: i64) -> Result<()>;

    /// Emitted when the position jumps instead of advancing normally
    #[zbus(signal)]
    fn seeked(&self, position: i64) -> Result<()>;

    /// Playing, Paused or Stopped
    #[zbus(property)]
    fn playback_status(&self) -> Result<String>;

    /// None, Track or Playlist
    #[zbus(property)]
    fn loop_status(&self) -> Result<String>;

    #[zbus(property)]
    fn set_loop_status(&self, status: &str) -> Result<()>;

    /// Playback rate, 1.0 is normal speed
    #[zbus(property)]
    fn rate(&self) -> Result<f64>;

    #[zbus(property)]
    fn shuffle(&self) -> Result<bool>;

    #[zbus(property)]
    fn set_shuffle(&self, shuffle: bool) -> Result<()>;

    /// `xesam:*` and `mpris:*` track metadata
    #[zbus(property)]
    fn metadata(&self) -> Result<HashMap<String, zbus::zvariant::OwnedValue>>;

    /// Position in microseconds. Never signalled; read on demand.
    #[zbus(property(emits_changed_signal = "false"))]
    fn position(&self) -> Result<i64>;

    #[zbus(property)]
    fn can_go_next(&self) -> Result<bool>;

    #[zbus(property)]
    fn can_go_previous(&self) -> Result<bool>;

    #[zbus(property)]
    fn can_play(&self) -> Result<bool>;

    #[zbus(property)]
    fn can_pause(&self) -> Result<bool>;

    #[zbus(property)]
    fn can_seek(&self) -> Result<bool>;

    #[zbus(property)]
    fn can_control(&self) -> Result<bool>;
}
