use std::sync::Arc;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tokio::{
    sync::{RwLock, mpsc},
    task::JoinHandle,
};
use tracing::{debug, info, instrument, warn};
use zbus::{
    Connection,
    fdo::{DBusProxy, NameOwnerChanged},
};

use super::{MPRIS_PREFIX, session::MprisSession};
use crate::services::media::{
    HostError,
    host::{CallbackRegistry, EventCallback, MediaSession, SessionManager, Subscription},
};

#[derive(Default)]
struct Players {
    sessions: Vec<Arc<MprisSession>>,
    current: Option<Arc<MprisSession>>,
}

/// Tracks MPRIS players on the session bus and picks the current one.
///
/// The current player is the first one playing; when none is, the
/// previous choice is kept while it exists, otherwise the first player
/// discovered wins.
pub struct MprisSessionManager {
    players: Arc<RwLock<Players>>,
    current_changed: CallbackRegistry,
    sessions_changed: CallbackRegistry,
    watcher: JoinHandle<()>,
}

impl MprisSessionManager {
    /// Connect to the session bus and discover running players.
    ///
    /// # Errors
    /// Returns error if the session bus or the bus daemon is unreachable
    #[instrument]
    pub async fn connect() -> Result<Self, HostError> {
        info!("Connecting to MPRIS players on the session bus");

        let connection = Connection::session().await?;
        let dbus = DBusProxy::new(&connection).await?;
        let owner_changes = dbus.receive_name_owner_changed().await?;
        let (status_tx, status_rx) = mpsc::unbounded_channel();

        let players = Arc::new(RwLock::new(Players::default()));
        let names = dbus.list_names().await.map_err(zbus::Error::from)?;
        for name in names.iter().filter(|name| name.starts_with(MPRIS_PREFIX)) {
            add_player(&connection, &players, name.to_string(), &status_tx).await;
        }
        info!(count = players.read().await.sessions.len(), "Discovered MPRIS players");

        let current_changed = CallbackRegistry::new();
        let sessions_changed = CallbackRegistry::new();
        select_current(&players, &current_changed).await;

        let watcher = tokio::spawn(watch_players(
            Watcher {
                connection,
                players: Arc::clone(&players),
                status_tx,
                current_changed: current_changed.clone(),
                sessions_changed: sessions_changed.clone(),
            },
            owner_changes,
            status_rx,
        ));

        Ok(Self {
            players,
            current_changed,
            sessions_changed,
            watcher,
        })
    }
}

impl Drop for MprisSessionManager {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

#[async_trait]
impl SessionManager for MprisSessionManager {
    async fn current_session(&self) -> Option<Arc<dyn MediaSession>> {
        self.players
            .read()
            .await
            .current
            .clone()
            .map(|session| session as Arc<dyn MediaSession>)
    }

    async fn sessions(&self) -> Vec<Arc<dyn MediaSession>> {
        self.players
            .read()
            .await
            .sessions
            .iter()
            .map(|session| Arc::clone(session) as Arc<dyn MediaSession>)
            .collect()
    }

    fn on_current_session_changed(&self, callback: EventCallback) -> Subscription {
        self.current_changed.register(callback)
    }

    fn on_sessions_changed(&self, callback: EventCallback) -> Subscription {
        self.sessions_changed.register(callback)
    }
}

struct Watcher {
    connection: Connection,
    players: Arc<RwLock<Players>>,
    status_tx: mpsc::UnboundedSender<()>,
    current_changed: CallbackRegistry,
    sessions_changed: CallbackRegistry,
}

async fn watch_players(
    watcher: Watcher,
    mut owner_changes: impl Stream<Item = NameOwnerChanged> + Unpin,
    mut status_rx: mpsc::UnboundedReceiver<()>,
) {
    loop {
        tokio::select! {
            Some(signal) = owner_changes.next() => {
                if handle_owner_change(&watcher, &signal).await {
                    watcher.sessions_changed.notify();
                    select_current(&watcher.players, &watcher.current_changed).await;
                }
            }
            Some(()) = status_rx.recv() => {
                select_current(&watcher.players, &watcher.current_changed).await;
            }
            else => break,
        }
    }

    debug!("Bus name watcher stopped");
}

/// Apply one `NameOwnerChanged` signal. Returns whether the player set changed.
async fn handle_owner_change(watcher: &Watcher, signal: &NameOwnerChanged) -> bool {
    let Ok(args) = signal.args() else {
        return false;
    };

    if !args.name().starts_with(MPRIS_PREFIX) {
        return false;
    }

    let name = args.name().to_string();
    match (args.old_owner().as_deref(), args.new_owner().as_deref()) {
        (Some(_), None) => remove_player(&watcher.players, &name).await,
        (None, Some(_)) => {
            add_player(&watcher.connection, &watcher.players, name, &watcher.status_tx).await
        }
        _ => false,
    }
}

#[instrument(skip(connection, players, status_tx))]
async fn add_player(
    connection: &Connection,
    players: &RwLock<Players>,
    bus_name: String,
    status_tx: &mpsc::UnboundedSender<()>,
) -> bool {
    match MprisSession::connect(connection, bus_name, status_tx.clone()).await {
        Ok(session) => {
            info!("Player appeared");
            players.write().await.sessions.push(Arc::new(session));
            true
        }
        Err(error) => {
            warn!(%error, "Cannot attach to player");
            false
        }
    }
}

#[instrument(skip(players))]
async fn remove_player(players: &RwLock<Players>, bus_name: &str) -> bool {
    let mut players = players.write().await;
    let before = players.sessions.len();
    players
        .sessions
        .retain(|session| session.bus_name() != bus_name);

    let removed = players.sessions.len() != before;
    if removed {
        info!("Player vanished");
    }
    removed
}

async fn select_current(players: &RwLock<Players>, current_changed: &CallbackRegistry) {
    let (sessions, previous) = {
        let players = players.read().await;
        (players.sessions.clone(), players.current.clone())
    };

    let mut playing = None;
    for session in &sessions {
        if session.is_playing().await {
            playing = Some(Arc::clone(session));
            break;
        }
    }

    let chosen = playing
        .or_else(|| {
            previous
                .clone()
                .filter(|prev| sessions.iter().any(|s| Arc::ptr_eq(s, prev)))
        })
        .or_else(|| sessions.first().cloned());

    let changed = match (&previous, &chosen) {
        (Some(previous), Some(chosen)) => !Arc::ptr_eq(previous, chosen),
        (None, None) => false,
        _ => true,
    };

    if changed {
        info!(
            player = chosen.as_ref().map(|s| s.bus_name()).unwrap_or("none"),
            "Current player changed"
        );
        players.write().await.current = chosen;
        current_changed.notify();
    }
}
