//! Observable game events for the presentation layer.
//!
//! Dashboards and CLIs subscribe to these instead of reaching into
//! engine state — the core never depends on any rendering technology.

use quickdraw_protocol::PlayerId;
use serde::{Deserialize, Serialize};

/// Something a display might want to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A round was armed; the listed players are eligible to click.
    RoundOpened { round: u64, participants: usize },

    /// A round's winner was adjudicated.
    WinnerDeclared {
        id: PlayerId,
        name: String,
        score: u32,
    },

    /// A player reached the win threshold; the game is over.
    GameOver { id: PlayerId, name: String },

    /// Scores and round state were cleared.
    GameReset,

    /// A collection attempt succeeded.
    ResourceCollected { id: PlayerId, count: u32 },

    /// A collection reached the resource win threshold.
    ResourceWon { id: PlayerId, count: u32 },
}
