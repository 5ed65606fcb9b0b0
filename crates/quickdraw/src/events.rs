//! The unified event feed exposed to presentation layers.
//!
//! The registry and both game engines each emit their own events; the
//! server merges them into one stream so a dashboard or CLI has a single
//! subscription point. The core never depends on any rendering
//! technology — this channel is the entire display interface.

use quickdraw_game::GameEvent;
use quickdraw_registry::RegistryEvent;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};

/// One observable server occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerEvent {
    /// Membership changed (player joined or left).
    Registry(RegistryEvent),

    /// Game state changed (round, winner, score, collection, reset).
    Game(GameEvent),
}

/// Spawns a task that forwards one source channel into the unified
/// feed until shutdown or the source closes. Lagged receivers skip
/// ahead — the feed is for display, not for correctness.
pub(crate) fn spawn_forwarder<T, F>(
    mut source: broadcast::Receiver<T>,
    sink: broadcast::Sender<ServerEvent>,
    mut shutdown: watch::Receiver<bool>,
    map: F,
) where
    T: Clone + Send + 'static,
    F: Fn(T) -> ServerEvent + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                event = source.recv() => match event {
                    Ok(e) => {
                        let _ = sink.send(map(e));
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "event forwarder lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    });
}
