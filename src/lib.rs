//! media-sync - mirrors the system "now playing" media session.
//!
//! The crate follows the host's current media session (MPRIS on Linux,
//! the system media transport controls on Windows), merges its metadata,
//! playback info and timeline into one consistent document, keeps the
//! playback position moving between host updates, and accepts playback
//! commands against the same session.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use media_sync::{
//!     config::SyncConfig,
//!     services::media::{Synchronizer, WatchSink, backend},
//! };
//!
//! # async fn example() -> media_sync::Result<()> {
//! let manager = backend::connect().await?;
//! let sink = WatchSink::new();
//! let latest = sink.property();
//!
//! let synchronizer = Synchronizer::new(manager, sink, &SyncConfig::default())?;
//! let commands = synchronizer.dispatcher();
//! tokio::spawn(synchronizer.run());
//!
//! commands.play_pause().await;
//! println!("{:?}", latest.get().status);
//! # Ok(())
//! # }
//! ```

/// Configuration schema definitions and loading.
pub mod config;

/// Core error types and result aliases.
pub mod core;

/// Media session services.
pub mod services;

/// Tracing subscriber setup.
pub mod tracing_config;

/// Re-exported core types for convenience.
pub use core::{AppError, Result};
