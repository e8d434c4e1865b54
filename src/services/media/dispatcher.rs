use std::{fmt, future::Future, sync::Arc, time::Duration};

use tokio::runtime::Handle;
use tracing::{debug, instrument, warn};

use super::{
    CommandError, HostError,
    host::{HostResult, MediaSession},
    types::{RepeatMode, SessionToken},
};
use crate::services::common::Property;

/// The session the synchronizer is currently bound to
#[derive(Clone)]
pub struct SessionBinding {
    token: SessionToken,
    session: Arc<dyn MediaSession>,
}

impl SessionBinding {
    pub(crate) fn new(token: SessionToken, session: Arc<dyn MediaSession>) -> Self {
        Self { token, session }
    }

    /// Identity of this binding.
    pub fn token(&self) -> SessionToken {
        self.token
    }

    /// The bound session handle.
    pub fn session(&self) -> &Arc<dyn MediaSession> {
        &self.session
    }
}

impl PartialEq for SessionBinding {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token
    }
}

impl fmt::Debug for SessionBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionBinding")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

/// Outcome of a dispatched command.
///
/// Host-side failures are logged where they happen and reported only as
/// [`Attempt::Attempted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// No session was bound; nothing was sent
    NoSession,
    /// The command was sent to the bound session
    Attempted,
}

/// A validated playback command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Start playback
    Play,
    /// Pause playback
    Pause,
    /// Stop playback
    Stop,
    /// Toggle between playing and paused
    PlayPause,
    /// Next track
    Next,
    /// Previous track
    Previous,
    /// Jump to a position in seconds
    SetPosition(i64),
    /// Jump to a percentage of the seekable range
    SeekPercentage(f64),
    /// Set the auto-repeat mode
    SetRepeat(RepeatMode),
    /// Advance the auto-repeat mode: none, track, all
    ToggleRepeat,
    /// Enable or disable shuffle
    SetShuffle(bool),
    /// Flip shuffle
    ToggleShuffle,
    /// Rewind
    Rewind,
}

impl Command {
    /// Parse a command name and its optional raw argument.
    ///
    /// `repeat` and `shuffle` without an argument toggle. Repeat accepts a
    /// mode name (unknown names mean `none`) or a code in `0..=2`.
    ///
    /// # Errors
    /// Returns error for unknown names, missing arguments and arguments
    /// that are not valid for the command
    pub fn parse(name: &str, argument: Option<&str>) -> Result<Self, CommandError> {
        let argument = argument.map(str::trim).filter(|arg| !arg.is_empty());

        match name.trim().to_ascii_lowercase().as_str() {
            "play" => Ok(Self::Play),
            "pause" => Ok(Self::Pause),
            "stop" => Ok(Self::Stop),
            "play_pause" | "toggle" => Ok(Self::PlayPause),
            "next" => Ok(Self::Next),
            "prev" | "previous" => Ok(Self::Previous),
            "rewind" => Ok(Self::Rewind),
            "seek" => {
                let raw = argument.ok_or(CommandError::MissingArgument("seek"))?;
                parse_number("seek", raw).map(Self::SeekPercentage)
            }
            "position" => {
                let raw = argument.ok_or(CommandError::MissingArgument("position"))?;
                parse_number("position", raw).map(|seconds| Self::SetPosition(seconds.trunc() as i64))
            }
            "repeat" => match argument {
                None => Ok(Self::ToggleRepeat),
                Some(raw) => parse_repeat(raw).map(Self::SetRepeat),
            },
            "shuffle" => match argument {
                None => Ok(Self::ToggleShuffle),
                Some(raw) => parse_switch(raw).map(Self::SetShuffle),
            },
            _ => Err(CommandError::UnknownCommand(name.to_string())),
        }
    }
}

fn parse_number(command: &'static str, raw: &str) -> Result<f64, CommandError> {
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| CommandError::InvalidArgument {
            command,
            value: raw.to_string(),
            reason: "expected a number",
        })
}

fn parse_repeat(raw: &str) -> Result<RepeatMode, CommandError> {
    match raw.parse::<i32>() {
        Ok(code) => RepeatMode::try_from(code).map_err(|_| CommandError::InvalidArgument {
            command: "repeat",
            value: raw.to_string(),
            reason: "expected 0, 1 or 2",
        }),
        Err(_) => Ok(RepeatMode::from(raw)),
    }
}

fn parse_switch(raw: &str) -> Result<bool, CommandError> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "on" | "1" => Ok(true),
        "false" | "off" | "0" => Ok(false),
        _ => Err(CommandError::InvalidArgument {
            command: "shuffle",
            value: raw.to_string(),
            reason: "expected true or false",
        }),
    }
}

/// Sends playback commands to whatever session is currently bound.
///
/// Cheap to clone; every clone observes the same binding. With no session
/// each command is a silent no-op returning [`Attempt::NoSession`].
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    binding: Property<Option<SessionBinding>>,
}

impl CommandDispatcher {
    pub(crate) fn new(binding: Property<Option<SessionBinding>>) -> Self {
        Self { binding }
    }

    /// Whether a session is bound right now.
    pub fn has_session(&self) -> bool {
        self.binding.with(Option::is_some)
    }

    fn session(&self) -> Option<Arc<dyn MediaSession>> {
        self.binding
            .with(|binding| binding.as_ref().map(|b| Arc::clone(b.session())))
    }

    async fn attempt<F, Fut>(&self, command: &'static str, call: F) -> Attempt
    where
        F: FnOnce(Arc<dyn MediaSession>) -> Fut,
        Fut: Future<Output = HostResult<bool>>,
    {
        let Some(session) = self.session() else {
            debug!(command, "No session, ignoring command");
            return Attempt::NoSession;
        };

        report(command, call(session).await);
        Attempt::Attempted
    }

    /// Run a parsed [`Command`].
    #[instrument(skip(self))]
    pub async fn execute(&self, command: Command) -> Attempt {
        match command {
            Command::Play => self.play().await,
            Command::Pause => self.pause().await,
            Command::Stop => self.stop().await,
            Command::PlayPause => self.play_pause().await,
            Command::Next => self.next().await,
            Command::Previous => self.previous().await,
            Command::SetPosition(seconds) => self.set_position(seconds).await,
            Command::SeekPercentage(percentage) => self.seek_percentage(percentage).await,
            Command::SetRepeat(mode) => self.set_repeat(mode).await,
            Command::ToggleRepeat => self.toggle_repeat().await,
            Command::SetShuffle(active) => self.set_shuffle(active).await,
            Command::ToggleShuffle => self.toggle_shuffle().await,
            Command::Rewind => self.rewind().await,
        }
    }

    /// Start playback
    pub async fn play(&self) -> Attempt {
        self.attempt("play", |s| async move { s.try_play().await })
            .await
    }

    /// Pause playback
    pub async fn pause(&self) -> Attempt {
        self.attempt("pause", |s| async move { s.try_pause().await })
            .await
    }

    /// Stop playback
    pub async fn stop(&self) -> Attempt {
        self.attempt("stop", |s| async move { s.try_stop().await })
            .await
    }

    /// Toggle between playing and paused
    pub async fn play_pause(&self) -> Attempt {
        self.attempt("play_pause", |s| async move {
            s.try_toggle_play_pause().await
        })
        .await
    }

    /// Skip to the next track
    pub async fn next(&self) -> Attempt {
        self.attempt("next", |s| async move { s.try_skip_next().await })
            .await
    }

    /// Skip to the previous track
    pub async fn previous(&self) -> Attempt {
        self.attempt("previous", |s| async move { s.try_skip_previous().await })
            .await
    }

    /// Rewind
    pub async fn rewind(&self) -> Attempt {
        self.attempt("rewind", |s| async move { s.try_rewind().await })
            .await
    }

    /// Jump to `seconds` from the start. Negative values mean the start.
    pub async fn set_position(&self, seconds: i64) -> Attempt {
        let position = Duration::from_secs(u64::try_from(seconds).unwrap_or(0));

        self.attempt("set_position", move |s| async move {
            s.try_change_playback_position(position).await
        })
        .await
    }

    /// Jump to `percentage` of the seekable range.
    ///
    /// The percentage is clamped to `[0, 100]` and applied to a fresh
    /// reading of the session's max seek time.
    pub async fn seek_percentage(&self, percentage: f64) -> Attempt {
        let Some(session) = self.session() else {
            debug!("No session, ignoring seek");
            return Attempt::NoSession;
        };

        let timeline = match session.timeline_properties().await {
            Ok(timeline) => timeline,
            Err(error) => {
                warn!(%error, "Cannot read timeline for seek");
                return Attempt::Attempted;
            }
        };
        let max_seek = match timeline.max_seek_time() {
            Ok(max_seek) => max_seek,
            Err(error) => {
                warn!(%error, "Cannot read max seek time");
                return Attempt::Attempted;
            }
        };

        let seconds = seek_target(max_seek.num_milliseconds(), percentage);
        debug!(percentage, seconds, "Seeking");

        let position = Duration::from_secs(u64::try_from(seconds).unwrap_or(0));
        report(
            "seek_percentage",
            session.try_change_playback_position(position).await,
        );
        Attempt::Attempted
    }

    /// Set the auto-repeat mode
    pub async fn set_repeat(&self, mode: RepeatMode) -> Attempt {
        self.attempt("set_repeat", move |s| async move {
            s.try_change_auto_repeat_mode(mode).await
        })
        .await
    }

    /// Enable or disable shuffle
    pub async fn set_shuffle(&self, active: bool) -> Attempt {
        self.attempt("set_shuffle", move |s| async move {
            s.try_change_shuffle_active(active).await
        })
        .await
    }

    /// Advance the repeat mode one step, based on what the host reports now.
    pub async fn toggle_repeat(&self) -> Attempt {
        self.attempt("toggle_repeat", |s| async move {
            let playback = s.playback_info().await?;
            let Some(code) = playback.auto_repeat_mode()? else {
                warn!("Session does not report a repeat mode");
                return Ok(false);
            };
            let current = RepeatMode::try_from(code)
                .map_err(|error| HostError::CallFailed(error.to_string()))?;

            s.try_change_auto_repeat_mode(current.cycle()).await
        })
        .await
    }

    /// Flip shuffle, based on what the host reports now.
    pub async fn toggle_shuffle(&self) -> Attempt {
        self.attempt("toggle_shuffle", |s| async move {
            let playback = s.playback_info().await?;
            let Some(active) = playback.is_shuffle_active()? else {
                warn!("Session does not report shuffle state");
                return Ok(false);
            };

            s.try_change_shuffle_active(!active).await
        })
        .await
    }
}

/// Whole seconds at `percentage` of `max_seek_ms`.
fn seek_target(max_seek_ms: i64, percentage: f64) -> i64 {
    let percentage = if percentage.is_nan() {
        0.0
    } else {
        percentage.clamp(0.0, 100.0)
    };

    (max_seek_ms as f64 / 1000.0 * percentage / 100.0).trunc() as i64
}

fn report(command: &'static str, result: HostResult<bool>) {
    match result {
        Ok(true) => debug!(command, "Command accepted"),
        Ok(false) => warn!(command, "Command rejected by session"),
        Err(error) => warn!(command, %error, "Command failed"),
    }
}

/// Runs commands to completion from threads outside the runtime.
///
/// Each call blocks the calling thread only; the synchronizer keeps
/// running on the runtime.
#[derive(Debug, Clone)]
pub struct CommandBridge {
    handle: Handle,
    dispatcher: CommandDispatcher,
}

impl CommandBridge {
    /// Bridge into the runtime behind `handle`.
    pub fn new(handle: Handle, dispatcher: CommandDispatcher) -> Self {
        Self { handle, dispatcher }
    }

    /// Execute `command` and wait for it.
    ///
    /// # Panics
    /// Panics if called from a thread that is already driving the runtime.
    pub fn run(&self, command: Command) -> Attempt {
        self.handle.block_on(self.dispatcher.execute(command))
    }

    /// Parse then execute.
    ///
    /// # Errors
    /// Returns error if the name or argument is rejected by [`Command::parse`]
    ///
    /// # Panics
    /// Panics if called from a thread that is already driving the runtime.
    pub fn run_named(&self, name: &str, argument: Option<&str>) -> Result<Attempt, CommandError> {
        let command = Command::parse(name, argument)?;
        Ok(self.run(command))
    }
}
