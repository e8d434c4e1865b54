//! media-sync daemon - mirrors the current media session until interrupted.
//!
//! Playback commands are read from standard input, one per line, as a
//! command name followed by an optional argument (`seek 50`, `repeat`).

use std::{error::Error, io::BufRead, thread};

use media_sync::{
    config::{Config, ConfigPaths},
    services::media::{CommandBridge, JsonFileSink, Synchronizer, WatchSink, backend},
    tracing_config,
};
use tokio::runtime::Handle;
use tracing::{Level, error, info, span, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::load(&ConfigPaths::main_config()?)?;
    let _guard = tracing_config::init_with_file(config.general.log_level)?;
    let _span = span!(Level::INFO, "media_sync_main").entered();
    info!("Starting media-sync");

    let manager = backend::connect().await?;
    let contents = config
        .sync
        .contents_file
        .clone()
        .map(|path| JsonFileSink::new(path, config.sync.contents_include_cover));
    let synchronizer = Synchronizer::new(manager, (WatchSink::new(), contents), &config.sync)?;

    spawn_command_reader(CommandBridge::new(
        Handle::current(),
        synchronizer.dispatcher(),
    ))?;

    let synchronizer = tokio::spawn(synchronizer.run());

    tokio::signal::ctrl_c().await?;
    info!("Interrupted, shutting down");
    synchronizer.abort();

    Ok(())
}

/// Feeds stdin lines into `bridge` from a plain OS thread.
fn spawn_command_reader(bridge: CommandBridge) -> std::io::Result<()> {
    thread::Builder::new()
        .name("stdin-commands".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(error) => {
                        error!(%error, "Cannot read command input");
                        break;
                    }
                };

                let mut words = line.split_whitespace();
                let Some(name) = words.next() else {
                    continue;
                };

                match bridge.run_named(name, words.next()) {
                    Ok(attempt) => info!(command = name, ?attempt, "Command handled"),
                    Err(error) => warn!(%error, "Command rejected"),
                }
            }
        })?;

    Ok(())
}
