use std::fmt;

use serde::{Deserialize, Serialize};

use super::DecodeError;

/// Identity of one session binding.
///
/// Every time the synchronizer binds a session handle it issues a fresh
/// token; host callbacks carry the token they were registered with so that
/// events from a superseded handle can be recognized and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionToken(u64);

impl SessionToken {
    pub(crate) fn first() -> Self {
        Self(1)
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Playback status reported by the host session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    /// The session is closed
    Closed,

    /// The session is open but nothing has started
    Opened,

    /// The session is switching media
    Changing,

    /// Playback is stopped
    Stopped,

    /// Media is currently playing
    Playing,

    /// Playback is paused
    Paused,
}

impl PlaybackStatus {
    /// Lowercase name used in the projection
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Opened => "opened",
            Self::Changing => "changing",
            Self::Stopped => "stopped",
            Self::Playing => "playing",
            Self::Paused => "paused",
        }
    }
}

impl TryFrom<i32> for PlaybackStatus {
    type Error = DecodeError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Closed),
            1 => Ok(Self::Opened),
            2 => Ok(Self::Changing),
            3 => Ok(Self::Stopped),
            4 => Ok(Self::Playing),
            5 => Ok(Self::Paused),
            other => Err(DecodeError::PlaybackStatus(other)),
        }
    }
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Auto-repeat mode of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// No repetition
    None,

    /// Repeat the current track
    Track,

    /// Repeat the whole list
    All,
}

impl RepeatMode {
    /// Host code for this mode (`0..=2`)
    pub fn code(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Track => 1,
            Self::All => 2,
        }
    }

    /// The mode `toggle_repeat` moves to: none → track → all → none
    pub fn cycle(self) -> Self {
        match self {
            Self::None => Self::Track,
            Self::Track => Self::All,
            Self::All => Self::None,
        }
    }

    /// Lowercase name used in the projection
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Track => "track",
            Self::All => "all",
        }
    }
}

impl TryFrom<i32> for RepeatMode {
    type Error = DecodeError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::None),
            1 => Ok(Self::Track),
            2 => Ok(Self::All),
            other => Err(DecodeError::RepeatMode(other)),
        }
    }
}

/// Lenient name lookup: anything unrecognized means no repetition.
impl From<&str> for RepeatMode {
    fn from(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "track" => Self::Track,
            "all" | "list" | "playlist" => Self::All,
            _ => Self::None,
        }
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of media the session is playing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackType {
    /// The host did not say
    Unknown,

    /// Audio
    Music,

    /// Video
    Video,

    /// Still image
    Image,
}

impl From<i32> for PlaybackType {
    fn from(code: i32) -> Self {
        match code {
            1 => Self::Music,
            2 => Self::Video,
            3 => Self::Image,
            _ => Self::Unknown,
        }
    }
}

/// Which transport controls the session currently accepts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackControls {
    /// Play is available
    pub play: bool,
    /// Pause is available
    pub pause: bool,
    /// Stop is available
    pub stop: bool,
    /// Skipping forward is available
    pub next: bool,
    /// Skipping backward is available
    pub previous: bool,
    /// Seeking is available
    pub seek: bool,
    /// Repeat mode can be changed
    pub repeat: bool,
    /// Shuffle can be changed
    pub shuffle: bool,
}
