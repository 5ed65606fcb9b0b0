//! `QuickdrawServer` builder, accept loop, and the round driver.
//!
//! This is the entry point for running a Quickdraw server. It ties the
//! layers together: transport → protocol → registry → game engines,
//! plus the singleton round-driver task that turns scheduler timing
//! into `GO` broadcasts.

use std::sync::Arc;
use std::time::Duration;

use quickdraw_game::{
    GameConfig, ResourceConfig, ResourceField, ScoringEngine,
};
use quickdraw_protocol::ServerDirective;
use quickdraw_registry::ClientRegistry;
use quickdraw_round::{RoundConfig, RoundScheduler};
use quickdraw_transport::{TcpLineTransport, Transport};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};

use crate::events::spawn_forwarder;
use crate::handler::handle_connection;
use crate::{QuickdrawError, ServerEvent};

/// Capacity of the unified server event channel.
const EVENT_CHANNEL_SIZE: usize = 128;

/// Which game this server instance runs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default,
)]
pub enum GameMode {
    /// Reaction rounds: `GO` broadcasts, first `CLICK` wins.
    #[default]
    Reaction,

    /// Shared-resource contention: `COLLECT_RESOURCE` under two locks.
    /// No round scheduler runs in this mode.
    Contention,
}

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. Each
/// field guards its own interior mutability; see the crate-level
/// locking notes in the component crates.
pub(crate) struct ServerState {
    pub(crate) registry: ClientRegistry,
    pub(crate) scoring: ScoringEngine,
    pub(crate) resources: ResourceField,
    pub(crate) mode: GameMode,
    /// When set, a timer resets the scoring engine this long after a
    /// game ends.
    pub(crate) auto_reset: Option<Duration>,
    pub(crate) shutdown: watch::Sender<bool>,
    pub(crate) events: broadcast::Sender<ServerEvent>,
}

/// Builder for configuring and starting a Quickdraw server.
///
/// # Example
///
/// ```rust,no_run
/// use quickdraw::prelude::*;
///
/// # async fn run() -> Result<(), QuickdrawError> {
/// let server = QuickdrawServer::builder()
///     .bind("0.0.0.0:5000")
///     .mode(GameMode::Reaction)
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct QuickdrawServerBuilder {
    bind_addr: String,
    mode: GameMode,
    game_config: GameConfig,
    resource_config: ResourceConfig,
    round_config: RoundConfig,
}

impl QuickdrawServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            mode: GameMode::Reaction,
            game_config: GameConfig::default(),
            resource_config: ResourceConfig::default(),
            round_config: RoundConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the game mode.
    pub fn mode(mut self, mode: GameMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the scoring configuration (win threshold, auto-reset).
    pub fn game_config(mut self, config: GameConfig) -> Self {
        self.game_config = config;
        self
    }

    /// Sets the resource-contention configuration.
    pub fn resource_config(mut self, config: ResourceConfig) -> Self {
        self.resource_config = config;
        self
    }

    /// Sets the round scheduler configuration (delay range, polling).
    pub fn round_config(mut self, config: RoundConfig) -> Self {
        self.round_config = config;
        self
    }

    /// Binds the transport and assembles the server.
    pub async fn build(self) -> Result<QuickdrawServer, QuickdrawError> {
        let transport = TcpLineTransport::bind(&self.bind_addr).await?;

        let (shutdown, _) = watch::channel(false);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let auto_reset = self.game_config.auto_reset;

        let state = Arc::new(ServerState {
            registry: ClientRegistry::new(),
            scoring: ScoringEngine::new(self.game_config),
            resources: ResourceField::new(self.resource_config),
            mode: self.mode,
            auto_reset,
            shutdown,
            events,
        });

        // Merge the component event streams into the unified feed.
        spawn_forwarder(
            state.registry.subscribe(),
            state.events.clone(),
            state.shutdown.subscribe(),
            ServerEvent::Registry,
        );
        spawn_forwarder(
            state.scoring.subscribe(),
            state.events.clone(),
            state.shutdown.subscribe(),
            ServerEvent::Game,
        );
        spawn_forwarder(
            state.resources.subscribe(),
            state.events.clone(),
            state.shutdown.subscribe(),
            ServerEvent::Game,
        );

        Ok(QuickdrawServer {
            transport,
            state,
            round_config: self.round_config,
        })
    }
}

impl Default for QuickdrawServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A handle for controlling a running server from outside its task.
#[derive(Clone)]
pub struct ServerHandle {
    state: Arc<ServerState>,
}

impl ServerHandle {
    /// Signals the accept loop and round driver to stop. In-flight
    /// connection loops terminate naturally when their sockets close.
    pub fn shutdown(&self) {
        let _ = self.state.shutdown.send(true);
    }

    /// Subscribes to the unified server event feed.
    pub fn subscribe_events(&self) -> broadcast::Receiver<ServerEvent> {
        self.state.events.subscribe()
    }
}

/// A running Quickdraw server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct QuickdrawServer {
    transport: TcpLineTransport,
    state: Arc<ServerState>,
    round_config: RoundConfig,
}

impl QuickdrawServer {
    /// Creates a new builder.
    pub fn builder() -> QuickdrawServerBuilder {
        QuickdrawServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns a control handle usable after `run()` consumes the server.
    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// Subscribes to the unified server event feed.
    pub fn subscribe_events(&self) -> broadcast::Receiver<ServerEvent> {
        self.state.events.subscribe()
    }

    /// Runs the server: the accept loop plus (in Reaction mode) the
    /// round driver. Returns after [`ServerHandle::shutdown`] is called.
    pub async fn run(mut self) -> Result<(), QuickdrawError> {
        tracing::info!(mode = ?self.state.mode, "quickdraw server running");

        if self.state.mode == GameMode::Reaction {
            let scheduler = RoundScheduler::new(self.round_config.clone());
            let state = Arc::clone(&self.state);
            tokio::spawn(round_driver(state, scheduler));
        }

        let mut shutdown = self.state.shutdown.subscribe();
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    tracing::info!("server shutting down");
                    break;
                }
                result = self.transport.accept() => match result {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) =
                                handle_connection(conn, state).await
                            {
                                tracing::debug!(
                                    error = %e,
                                    "connection ended with error"
                                );
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        Ok(())
    }
}

/// The singleton round driver: one task, one round in flight at a time.
///
/// On each cycle: skip silently while there are no players (or while a
/// finished game awaits reset); otherwise sleep the scheduler's
/// jittered delay, arm the round with the registry snapshot taken at
/// broadcast time, and send `GO`. The shutdown signal interrupts any
/// sleep — the driver never blocks shutdown.
async fn round_driver(state: Arc<ServerState>, mut scheduler: RoundScheduler) {
    let mut shutdown = state.shutdown.subscribe();

    loop {
        if *shutdown.borrow() {
            break;
        }

        if state.registry.is_empty() || state.scoring.is_over() {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = scheduler.idle_wait() => continue,
            }
        }

        tokio::select! {
            _ = shutdown.changed() => break,
            info = scheduler.wait_for_signal() => {
                // Snapshot at broadcast time: whoever is registered now
                // is eligible; later joiners wait for the next round.
                let participants = state.registry.snapshot();
                if participants.is_empty() {
                    // Everyone left during the delay.
                    scheduler.signal_sent();
                    continue;
                }

                if state.scoring.open_round(participants).is_some() {
                    let delivered = state
                        .registry
                        .broadcast(&ServerDirective::Go.to_line());
                    tracing::debug!(
                        round = info.round,
                        delivered,
                        "GO broadcast"
                    );
                }
                scheduler.signal_sent();
            }
        }
    }

    tracing::info!("round driver stopped");
}
