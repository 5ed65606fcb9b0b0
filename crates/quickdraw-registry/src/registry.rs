//! The client registry: tracks all currently connected players.
//!
//! This is the central piece of the membership layer. It's responsible
//! for:
//! - Assigning identities when connections register
//! - Tracking which players are connected
//! - Fanning directives out to every connected player
//! - Emitting join/leave events for the presentation layer
//!
//! # Concurrency note
//!
//! `ClientRegistry` is safe to share (`Arc`) across connection tasks and
//! the round-scheduler driver. Internally it holds one `std::sync::Mutex`
//! around the player map; no operation awaits while holding it — sends
//! go to unbounded channels, so the actual socket I/O happens in each
//! connection's writer task, outside the lock. Broadcast snapshots the
//! recipient list under the lock and delivers outside it (copy-then-
//! iterate), so a slow client never holds up the registry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use quickdraw_protocol::{PlayerId, Recipient, ServerDirective};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::{Outbox, Player, RegistryError};

/// Capacity of the registry event channel. Lagging subscribers drop the
/// oldest events, which is acceptable for a display feed.
const EVENT_CHANNEL_SIZE: usize = 64;

/// A membership change, observable by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryEvent {
    /// A player completed registration.
    PlayerJoined { id: PlayerId, name: String },

    /// A player was removed (disconnect or quit).
    PlayerLeft { id: PlayerId, name: String },
}

struct Entry {
    name: String,
    outbox: Outbox,
}

/// Thread-safe set of currently connected players.
///
/// A player appears in the registry iff its connection is open and has
/// completed registration — the connection handler registers right
/// after accept and unregisters in its cleanup guard.
pub struct ClientRegistry {
    players: Mutex<HashMap<PlayerId, Entry>>,

    /// Monotonic source of player ids and display names. Never reset,
    /// so names stay unique even after their holders disconnect.
    next_id: AtomicU64,

    events: broadcast::Sender<RegistryEvent>,
}

impl ClientRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self {
            players: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            events,
        }
    }

    /// Registers a new connection and assigns it a fresh identity.
    ///
    /// `outbox` is the sending half of the connection's outbound line
    /// channel; everything the registry delivers to this player goes
    /// through it.
    pub fn register(&self, outbox: Outbox) -> Player {
        let id = PlayerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let name = format!("Player_{}", id.0);

        self.players.lock().expect("registry lock poisoned").insert(
            id,
            Entry {
                name: name.clone(),
                outbox,
            },
        );

        tracing::info!(player_id = %id, %name, "player registered");
        let _ = self.events.send(RegistryEvent::PlayerJoined {
            id,
            name: name.clone(),
        });

        Player { id, name }
    }

    /// Removes a player. Idempotent — unregistering an absent player is
    /// a no-op, so a disconnect racing a graceful quit cleans up once.
    pub fn unregister(&self, player_id: PlayerId) {
        let removed = self
            .players
            .lock()
            .expect("registry lock poisoned")
            .remove(&player_id);

        if let Some(entry) = removed {
            tracing::info!(
                %player_id,
                name = %entry.name,
                "player unregistered"
            );
            let _ = self.events.send(RegistryEvent::PlayerLeft {
                id: player_id,
                name: entry.name,
            });
        }
    }

    /// Sends a line to every currently registered player.
    ///
    /// The recipient list is snapshotted under the lock and delivery
    /// happens outside it. A player whose channel is gone (writer task
    /// exited) is skipped and logged, never an error — failed delivery
    /// to one client must not abort delivery to the rest.
    ///
    /// Returns the number of players the line was handed to.
    pub fn broadcast(&self, line: &str) -> usize {
        let targets: Vec<(PlayerId, Outbox)> = {
            let players =
                self.players.lock().expect("registry lock poisoned");
            players
                .iter()
                .map(|(id, e)| (*id, e.outbox.clone()))
                .collect()
        };

        let mut delivered = 0;
        for (id, outbox) in targets {
            if outbox.send(line.to_string()).is_ok() {
                delivered += 1;
            } else {
                tracing::debug!(
                    player_id = %id,
                    "skipping broadcast to closed channel"
                );
            }
        }
        delivered
    }

    /// Sends a line to one player.
    ///
    /// # Errors
    /// Returns [`RegistryError::NotFound`] if the player is not
    /// registered. A closed channel is treated like a broadcast skip —
    /// logged, not an error — since the disconnect cleanup will remove
    /// the entry momentarily.
    pub fn send_to(
        &self,
        player_id: PlayerId,
        line: &str,
    ) -> Result<(), RegistryError> {
        let outbox = {
            let players =
                self.players.lock().expect("registry lock poisoned");
            players
                .get(&player_id)
                .map(|e| e.outbox.clone())
                .ok_or(RegistryError::NotFound(player_id))?
        };

        if outbox.send(line.to_string()).is_err() {
            tracing::debug!(
                %player_id,
                "skipping send to closed channel"
            );
        }
        Ok(())
    }

    /// Delivers a batch of `(Recipient, ServerDirective)` pairs, as
    /// produced by the game engine.
    pub fn dispatch(&self, msgs: Vec<(Recipient, ServerDirective)>) {
        for (recipient, directive) in msgs {
            let line = directive.to_line();
            match recipient {
                Recipient::All => {
                    self.broadcast(&line);
                }
                Recipient::Player(id) => {
                    if let Err(e) = self.send_to(id, &line) {
                        tracing::debug!(error = %e, "dispatch skipped");
                    }
                }
                Recipient::AllExcept(excluded) => {
                    for (id, _) in self.snapshot() {
                        if id == excluded {
                            continue;
                        }
                        if let Err(e) = self.send_to(id, &line) {
                            tracing::debug!(
                                error = %e,
                                "dispatch skipped"
                            );
                        }
                    }
                }
            }
        }
    }

    /// Returns a point-in-time list of `(id, name)` for all registered
    /// players. Callers iterate the copy without holding the registry
    /// locked during potentially slow work.
    pub fn snapshot(&self) -> Vec<(PlayerId, String)> {
        self.players
            .lock()
            .expect("registry lock poisoned")
            .iter()
            .map(|(id, e)| (*id, e.name.clone()))
            .collect()
    }

    /// Looks up a player's display name.
    pub fn name_of(&self, player_id: PlayerId) -> Option<String> {
        self.players
            .lock()
            .expect("registry lock poisoned")
            .get(&player_id)
            .map(|e| e.name.clone())
    }

    /// Returns the number of registered players.
    pub fn len(&self) -> usize {
        self.players.lock().expect("registry lock poisoned").len()
    }

    /// Returns `true` if no players are registered.
    pub fn is_empty(&self) -> bool {
        self.players
            .lock()
            .expect("registry lock poisoned")
            .is_empty()
    }

    /// Subscribes to membership change events.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
