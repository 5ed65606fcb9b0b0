//! Game configuration and the scoring phase machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Configuration for the reaction game (scoring mode).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Score at which a player wins and the game ends.
    pub win_threshold: u32,

    /// When set, the server arms a timer after game over and resets the
    /// engine once it elapses. `None` leaves reset to an explicit
    /// external call.
    pub auto_reset: Option<Duration>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            win_threshold: 5,
            auto_reset: None,
        }
    }
}

// ---------------------------------------------------------------------------
// ResourceConfig
// ---------------------------------------------------------------------------

/// Configuration for the resource-contention variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Resource count at which a player wins; no further increments are
    /// recorded for that player afterwards.
    pub collect_threshold: u32,

    /// Bounded wait for each of the two lock acquisitions. On timeout
    /// the caller gets a try-again outcome, never an indefinite wait.
    pub acquire_timeout: Duration,

    /// Simulated work performed while both locks are held. Zero in
    /// normal operation; raised in tests and demos to force contention.
    pub hold: Duration,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            collect_threshold: 10,
            acquire_timeout: Duration::from_secs(1),
            hold: Duration::ZERO,
        }
    }
}

// ---------------------------------------------------------------------------
// GamePhase
// ---------------------------------------------------------------------------

/// The scoring engine's position in the game.
///
/// ```text
///        open_round            handle_click
/// Idle ───────────→ AwaitingClick ───────────→ WinnerDeclared
///   ↑                                            │         │
///   │            (score < threshold, next round) │         │ (threshold)
///   └──────────── reset ──────── GameOver ←──────┘─────────┘
/// ```
///
/// - **Idle**: no round armed; clicks are ignored.
/// - **AwaitingClick**: a `GO` has been broadcast; the first eligible
///   click wins the round.
/// - **WinnerDeclared**: this round already has its winner; further
///   clicks are ignored until the next round is opened.
/// - **GameOver**: a player reached the threshold. No scoring happens
///   until reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Idle,
    AwaitingClick,
    WinnerDeclared,
    GameOver,
}

impl GamePhase {
    /// Returns `true` if a click right now could win the round.
    pub fn is_accepting_clicks(&self) -> bool {
        matches!(self, Self::AwaitingClick)
    }

    /// Returns `true` if the game has ended and awaits reset.
    pub fn is_over(&self) -> bool {
        matches!(self, Self::GameOver)
    }
}

impl std::fmt::Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::AwaitingClick => write!(f, "AwaitingClick"),
            Self::WinnerDeclared => write!(f, "WinnerDeclared"),
            Self::GameOver => write!(f, "GameOver"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_phase_is_accepting_clicks() {
        assert!(!GamePhase::Idle.is_accepting_clicks());
        assert!(GamePhase::AwaitingClick.is_accepting_clicks());
        assert!(!GamePhase::WinnerDeclared.is_accepting_clicks());
        assert!(!GamePhase::GameOver.is_accepting_clicks());
    }

    #[test]
    fn test_game_phase_is_over() {
        assert!(GamePhase::GameOver.is_over());
        assert!(!GamePhase::AwaitingClick.is_over());
    }

    #[test]
    fn test_game_phase_display() {
        assert_eq!(GamePhase::AwaitingClick.to_string(), "AwaitingClick");
        assert_eq!(GamePhase::GameOver.to_string(), "GameOver");
    }

    #[test]
    fn test_game_config_default() {
        let config = GameConfig::default();
        assert_eq!(config.win_threshold, 5);
        assert_eq!(config.auto_reset, None);
    }

    #[test]
    fn test_resource_config_default() {
        let config = ResourceConfig::default();
        assert_eq!(config.collect_threshold, 10);
        assert_eq!(config.acquire_timeout, Duration::from_secs(1));
        assert_eq!(config.hold, Duration::ZERO);
    }
}
