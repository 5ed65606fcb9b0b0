//! # Quickdraw
//!
//! A small multiplayer session server for a reaction-race game. Clients
//! connect over a persistent line-oriented TCP socket; the server
//! periodically broadcasts a `GO` signal, clients race to `CLICK` first,
//! and the server adjudicates one winner per round until a player
//! reaches the win threshold. A variant mode replaces rounds with a
//! shared doubly-locked resource that clients `COLLECT_RESOURCE` from.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quickdraw::prelude::*;
//!
//! # async fn run() -> Result<(), QuickdrawError> {
//! let server = QuickdrawServer::builder()
//!     .bind("0.0.0.0:5000")
//!     .mode(GameMode::Reaction)
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod events;
mod handler;
mod server;

pub use error::QuickdrawError;
pub use events::ServerEvent;
pub use server::{
    GameMode, QuickdrawServer, QuickdrawServerBuilder, ServerHandle,
};

/// Everything a server embedder usually needs, in one import.
pub mod prelude {
    pub use crate::{
        GameMode, QuickdrawError, QuickdrawServer, QuickdrawServerBuilder,
        ServerEvent, ServerHandle,
    };
    pub use quickdraw_game::{
        GameConfig, GameEvent, GamePhase, ResourceConfig,
    };
    pub use quickdraw_protocol::{
        ClientDirective, PlayerId, Recipient, ServerDirective,
    };
    pub use quickdraw_registry::RegistryEvent;
    pub use quickdraw_round::RoundConfig;
}
