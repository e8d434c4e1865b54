/// A host enum code outside its known range
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Playback status code is not one of `0..=5`
    #[error("unknown playback status code {0}")]
    PlaybackStatus(i32),

    /// Auto-repeat code is not one of `0..=2`
    #[error("unknown auto-repeat mode code {0}")]
    RepeatMode(i32),
}

/// Failures reported by the host media subsystem
#[derive(thiserror::Error, Debug)]
pub enum HostError {
    /// The host does not expose this attribute right now
    #[error("attribute '{0}' is not available")]
    Unavailable(&'static str),

    /// A host call failed for a host-specific reason
    #[error("host call failed: {0}")]
    CallFailed(String),

    /// Reading a host stream failed
    #[error("stream read failed: {0}")]
    Io(#[from] std::io::Error),

    /// D-Bus communication error
    #[cfg(target_os = "linux")]
    #[error("D-Bus operation failed: {0}")]
    Dbus(#[from] zbus::Error),

    /// WinRT call error
    #[cfg(target_os = "windows")]
    #[error("WinRT call failed: {0}")]
    Windows(#[from] windows::core::Error),
}

/// Errors that abort one normalization cycle
#[derive(thiserror::Error, Debug)]
pub enum MediaError {
    /// An enum code could not be decoded
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A field the document cannot exist without was unreadable
    #[error("required attribute '{field}' could not be read: {source}")]
    MissingField {
        /// Name of the field
        field: &'static str,
        /// Why the host could not provide it
        source: HostError,
    },

    /// The property group itself could not be fetched
    #[error("host query failed: {0}")]
    Host(#[from] HostError),
}

/// Rejections at the command boundary, before anything reaches a session
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// No command with that name
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// The command needs an argument and none was given
    #[error("command '{0}' requires an argument")]
    MissingArgument(&'static str),

    /// The argument could not be interpreted
    #[error("invalid argument '{value}' for '{command}': {reason}")]
    InvalidArgument {
        /// Command being parsed
        command: &'static str,
        /// The rejected raw value
        value: String,
        /// What was expected
        reason: &'static str,
    },
}
