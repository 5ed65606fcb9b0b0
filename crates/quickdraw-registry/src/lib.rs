//! Connected-player registry for Quickdraw.
//!
//! This crate tracks who is currently connected and fans server
//! directives out to them:
//!
//! 1. **Identity** — assigning each connection a fresh [`Player`] with a
//!    process-unique display name
//! 2. **Membership** — register on connect, unregister on disconnect
//!    (idempotent), point-in-time snapshots
//! 3. **Delivery** — broadcast and targeted sends over each player's
//!    outbound line channel, skipping (never failing on) dead receivers
//!
//! # How it fits in the stack
//!
//! ```text
//! Server / handler (above)  ← registers connections, dispatches directives
//!     ↕
//! Registry (this crate)     ← membership, names, fan-out
//!     ↕
//! Protocol (below)          ← PlayerId, Recipient, ServerDirective
//! ```

mod error;
mod player;
mod registry;

pub use error::RegistryError;
pub use player::{Outbox, Player};
pub use registry::{ClientRegistry, RegistryEvent};
