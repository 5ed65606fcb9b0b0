//! Core protocol types for Quickdraw's wire format.
//!
//! Everything here either travels on the wire as a text line or names
//! who a line is addressed to.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// A newtype wrapper so a raw `u64` can't be passed where a player is
/// expected. `#[serde(transparent)]` serializes it as the bare number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient — who should receive a directive?
// ---------------------------------------------------------------------------

/// Specifies who should receive a server directive.
///
/// The game engine returns `(Recipient, ServerDirective)` pairs; the
/// dispatcher decides WHERE each one is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Send to every registered player.
    All,

    /// Send to one specific player.
    Player(PlayerId),

    /// Send to everyone EXCEPT the specified player.
    AllExcept(PlayerId),
}

// ---------------------------------------------------------------------------
// Directives
// ---------------------------------------------------------------------------

/// A directive sent by a client, one per line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientDirective {
    /// Respond to the current round signal.
    Click,

    /// Attempt one resource-collection unit (Contention mode).
    CollectResource,

    /// Graceful disconnect request.
    Quit,
}

/// A directive sent by the server, one per line.
///
/// The exact line format for each variant is defined by
/// [`to_line`](ServerDirective::to_line) — clients match on the prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerDirective {
    /// `NAME:<name>` — the identity assigned to this client.
    Name(String),

    /// `GO` — round signal; the client may now respond.
    Go,

    /// `WINNER:<name>` — declares the round's winner.
    Winner(String),

    /// `SCORE:<n>` — the winner's updated score (sent to the winner only).
    Score(u32),

    /// `GAME_OVER:<name> wins!` — declares game completion.
    GameOver(String),

    /// `COLLECTED:<n>` — a collection succeeded; new total.
    Collected(u32),

    /// `RESOURCE_WIN:<n>` — the collection reached the win threshold.
    ResourceWin(u32),

    /// `TRY_AGAIN` — lock acquisition timed out; retry at will.
    TryAgain,
}
