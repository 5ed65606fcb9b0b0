//! Game engines for Quickdraw.
//!
//! Two independent engines share this crate, one per server mode:
//!
//! - [`ScoringEngine`] — adjudicates the first valid click per round as
//!   the winner, keeps per-player scores, and declares game over at the
//!   win threshold. The whole decision sits behind one mutex so "first
//!   click wins" is a single atomic decision point.
//! - [`ResourceField`] — the contention variant: collecting one unit of
//!   the shared resource requires holding two independent locks at once,
//!   acquired in a fixed order with bounded waits and released on every
//!   exit path.
//!
//! Both engines return `(Recipient, ServerDirective)` batches (or an
//! outcome convertible to one) that the caller dispatches through the
//! registry, and both emit [`GameEvent`]s for the presentation layer.

mod config;
mod events;
mod resource;
mod scoring;

pub use config::{GameConfig, GamePhase, ResourceConfig};
pub use events::GameEvent;
pub use resource::{CollectOutcome, ResourceField};
pub use scoring::ScoringEngine;
