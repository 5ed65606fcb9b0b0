//! The scoring engine: winner adjudication, scores, and game over.
//!
//! # Concurrency note
//!
//! "First click wins" is resolved by a single atomic decision point:
//! every part of the decision — is the game over, is a round armed, has
//! this round already been won, what is the new score, did it reach the
//! threshold — happens under one `std::sync::Mutex`. Connection tasks
//! call [`handle_click`](ScoringEngine::handle_click) concurrently and
//! the lock linearizes them; per-score atomics alone could not rule out
//! two winners in one round. Nothing awaits while the lock is held.

use std::collections::HashMap;
use std::sync::Mutex;

use quickdraw_protocol::{PlayerId, Recipient, ServerDirective};
use tokio::sync::broadcast;

use crate::{GameConfig, GameEvent, GamePhase};

/// Capacity of the game event channel.
const EVENT_CHANNEL_SIZE: usize = 64;

/// Everything the adjudication decision reads or writes.
struct ScoreState {
    phase: GamePhase,
    /// Rounds opened so far (not reset by [`ScoringEngine::reset`]).
    round: u64,
    /// Players eligible for the current round, with the display names
    /// snapshotted when the round was armed. Late joiners wait for the
    /// next round.
    eligible: HashMap<PlayerId, String>,
    scores: HashMap<PlayerId, u32>,
    /// The overall winner once the game has ended.
    champion: Option<PlayerId>,
}

/// Adjudicates rounds and keeps score until the win threshold.
///
/// ## Lifecycle
///
/// ```text
/// open_round() ──→ handle_click() ──→ ... ──→ handle_click()
///      ↑                │                          │
///      │                ▼ (threshold reached)      ▼
///      │            GameOver ←──────────── WinnerDeclared
///      │                │
///      └──── reset() ───┘
/// ```
pub struct ScoringEngine {
    config: GameConfig,
    state: Mutex<ScoreState>,
    events: broadcast::Sender<GameEvent>,
}

impl ScoringEngine {
    /// Creates a new engine with no rounds played and no scores.
    pub fn new(config: GameConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self {
            config,
            state: Mutex::new(ScoreState {
                phase: GamePhase::Idle,
                round: 0,
                eligible: HashMap::new(),
                scores: HashMap::new(),
                champion: None,
            }),
            events,
        }
    }

    /// Arms a new round for the given participants.
    ///
    /// Called by the round driver immediately before broadcasting `GO`;
    /// `participants` is the registry snapshot taken at broadcast time,
    /// so players who join mid-round are not eligible until the next
    /// round. A no-op once the game is over.
    ///
    /// Returns the round number, or `None` if no round was armed.
    pub fn open_round(
        &self,
        participants: Vec<(PlayerId, String)>,
    ) -> Option<u64> {
        let mut state = self.state.lock().expect("score lock poisoned");

        if state.phase.is_over() {
            return None;
        }

        state.round += 1;
        state.eligible = participants.into_iter().collect();
        state.phase = GamePhase::AwaitingClick;

        tracing::debug!(
            round = state.round,
            participants = state.eligible.len(),
            "round opened"
        );
        let _ = self.events.send(GameEvent::RoundOpened {
            round: state.round,
            participants: state.eligible.len(),
        });

        Some(state.round)
    }

    /// Adjudicates one inbound click.
    ///
    /// The first eligible click of an armed round wins it: `WINNER` to
    /// all, the updated score to the winner only, and — if the score
    /// reached the threshold — `GAME_OVER` to all. Everything else is
    /// harmless and produces no directives:
    ///
    /// - the game is already over (late clicks after game over),
    /// - no round is armed, or this round already has a winner,
    /// - the player isn't eligible for this round.
    pub fn handle_click(
        &self,
        player: PlayerId,
    ) -> Vec<(Recipient, ServerDirective)> {
        let mut state = self.state.lock().expect("score lock poisoned");

        if !state.phase.is_accepting_clicks() {
            tracing::trace!(%player, phase = %state.phase, "click ignored");
            return Vec::new();
        }

        let Some(name) = state.eligible.get(&player).cloned() else {
            tracing::debug!(%player, "click from non-participant ignored");
            return Vec::new();
        };

        // This click wins the round.
        state.phase = GamePhase::WinnerDeclared;
        let score = state.scores.entry(player).or_insert(0);
        *score += 1;
        let score = *score;

        tracing::info!(%player, %name, score, round = state.round, "round won");
        let _ = self.events.send(GameEvent::WinnerDeclared {
            id: player,
            name: name.clone(),
            score,
        });

        let mut out = vec![
            (Recipient::All, ServerDirective::Winner(name.clone())),
            (Recipient::Player(player), ServerDirective::Score(score)),
        ];

        if score >= self.config.win_threshold {
            state.phase = GamePhase::GameOver;
            state.champion = Some(player);

            tracing::info!(%player, %name, "game over");
            let _ = self.events.send(GameEvent::GameOver {
                id: player,
                name: name.clone(),
            });
            out.push((Recipient::All, ServerDirective::GameOver(name)));
        }

        out
    }

    /// Clears all scores and round state, returning to `Idle`.
    ///
    /// The trigger is external — an operator action or the server's
    /// optional auto-reset timer. The round counter is not reset, so
    /// round numbers stay unique across games.
    pub fn reset(&self) {
        let mut state = self.state.lock().expect("score lock poisoned");
        state.phase = GamePhase::Idle;
        state.eligible.clear();
        state.scores.clear();
        state.champion = None;

        tracing::info!("game reset");
        let _ = self.events.send(GameEvent::GameReset);
    }

    /// Disconnect cleanup: drops the player's score entry and round
    /// eligibility. Idempotent.
    pub fn remove_player(&self, player: PlayerId) {
        let mut state = self.state.lock().expect("score lock poisoned");
        state.eligible.remove(&player);
        state.scores.remove(&player);
    }

    /// The engine's current phase.
    pub fn phase(&self) -> GamePhase {
        self.state.lock().expect("score lock poisoned").phase
    }

    /// Returns `true` once a player has reached the win threshold.
    pub fn is_over(&self) -> bool {
        self.phase().is_over()
    }

    /// The overall winner, once the game has ended.
    pub fn champion(&self) -> Option<PlayerId> {
        self.state.lock().expect("score lock poisoned").champion
    }

    /// Point-in-time copy of all scores.
    pub fn scores(&self) -> Vec<(PlayerId, u32)> {
        self.state
            .lock()
            .expect("score lock poisoned")
            .scores
            .iter()
            .map(|(id, s)| (*id, *s))
            .collect()
    }

    /// Subscribes to game events.
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    /// The configured win threshold.
    pub fn win_threshold(&self) -> u32 {
        self.config.win_threshold
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -- Helpers ----------------------------------------------------------

    fn pid(id: u64) -> PlayerId {
        PlayerId(id)
    }

    fn participants(ids: &[u64]) -> Vec<(PlayerId, String)> {
        ids.iter()
            .map(|id| (PlayerId(*id), format!("Player_{id}")))
            .collect()
    }

    fn engine_with_threshold(threshold: u32) -> ScoringEngine {
        ScoringEngine::new(GameConfig {
            win_threshold: threshold,
            auto_reset: None,
        })
    }

    /// Pulls the directive a batch sent to `Recipient::All`, if any.
    fn all_directives(
        msgs: &[(Recipient, ServerDirective)],
    ) -> Vec<&ServerDirective> {
        msgs.iter()
            .filter(|(r, _)| *r == Recipient::All)
            .map(|(_, d)| d)
            .collect()
    }

    // =====================================================================
    // open_round()
    // =====================================================================

    #[test]
    fn test_open_round_arms_clicks() {
        let engine = engine_with_threshold(5);
        assert_eq!(engine.phase(), GamePhase::Idle);

        let round = engine.open_round(participants(&[1, 2]));

        assert_eq!(round, Some(1));
        assert_eq!(engine.phase(), GamePhase::AwaitingClick);
    }

    #[test]
    fn test_open_round_numbers_increase() {
        let engine = engine_with_threshold(5);
        assert_eq!(engine.open_round(participants(&[1])), Some(1));
        assert_eq!(engine.open_round(participants(&[1])), Some(2));
    }

    #[test]
    fn test_open_round_after_game_over_is_noop() {
        let engine = engine_with_threshold(1);
        engine.open_round(participants(&[1]));
        engine.handle_click(pid(1)); // threshold 1 → game over

        assert_eq!(engine.open_round(participants(&[1])), None);
        assert!(engine.is_over());
    }

    // =====================================================================
    // handle_click()
    // =====================================================================

    #[test]
    fn test_first_click_wins_round() {
        let engine = engine_with_threshold(5);
        engine.open_round(participants(&[1, 2]));

        let msgs = engine.handle_click(pid(2));

        assert_eq!(
            all_directives(&msgs),
            vec![&ServerDirective::Winner("Player_2".into())]
        );
        // Score goes to the winner only.
        assert!(msgs.contains(&(
            Recipient::Player(pid(2)),
            ServerDirective::Score(1)
        )));
        assert_eq!(engine.phase(), GamePhase::WinnerDeclared);
    }

    #[test]
    fn test_second_click_same_round_is_ignored() {
        let engine = engine_with_threshold(5);
        engine.open_round(participants(&[1, 2]));

        let first = engine.handle_click(pid(1));
        let second = engine.handle_click(pid(2));

        assert!(!first.is_empty());
        assert!(second.is_empty(), "at most one winner per round");
        assert_eq!(engine.scores(), vec![(pid(1), 1)]);
    }

    #[test]
    fn test_click_without_armed_round_is_ignored() {
        let engine = engine_with_threshold(5);

        let msgs = engine.handle_click(pid(1));

        assert!(msgs.is_empty());
        assert!(engine.scores().is_empty());
    }

    #[test]
    fn test_click_from_non_participant_is_ignored() {
        // Player 3 joined after the round was armed — not eligible.
        let engine = engine_with_threshold(5);
        engine.open_round(participants(&[1, 2]));

        let msgs = engine.handle_click(pid(3));

        assert!(msgs.is_empty());
        // The round is still open for eligible players.
        assert_eq!(engine.phase(), GamePhase::AwaitingClick);
        let msgs = engine.handle_click(pid(1));
        assert!(!msgs.is_empty());
    }

    #[test]
    fn test_scores_accumulate_across_rounds() {
        let engine = engine_with_threshold(5);

        for expected in 1..=3 {
            engine.open_round(participants(&[1, 2]));
            let msgs = engine.handle_click(pid(1));
            assert!(msgs.contains(&(
                Recipient::Player(pid(1)),
                ServerDirective::Score(expected)
            )));
        }

        assert_eq!(engine.scores(), vec![(pid(1), 3)]);
    }

    #[test]
    fn test_threshold_triggers_game_over() {
        let engine = engine_with_threshold(2);

        engine.open_round(participants(&[1]));
        engine.handle_click(pid(1));

        engine.open_round(participants(&[1]));
        let msgs = engine.handle_click(pid(1));

        let all = all_directives(&msgs);
        assert_eq!(
            all,
            vec![
                &ServerDirective::Winner("Player_1".into()),
                &ServerDirective::GameOver("Player_1".into()),
            ]
        );
        assert!(engine.is_over());
        assert_eq!(engine.champion(), Some(pid(1)));
    }

    #[test]
    fn test_no_scoring_after_game_over() {
        let engine = engine_with_threshold(1);
        engine.open_round(participants(&[1, 2]));
        engine.handle_click(pid(1));
        assert!(engine.is_over());

        // Late clicks after game over are harmless.
        let msgs = engine.handle_click(pid(2));
        assert!(msgs.is_empty());
        assert_eq!(engine.scores(), vec![(pid(1), 1)]);
    }

    #[test]
    fn test_score_never_exceeds_threshold() {
        let engine = engine_with_threshold(3);

        for _ in 0..10 {
            engine.open_round(participants(&[1]));
            engine.handle_click(pid(1));
        }

        assert_eq!(engine.scores(), vec![(pid(1), 3)]);
    }

    // =====================================================================
    // reset()
    // =====================================================================

    #[test]
    fn test_reset_clears_scores_and_reopens_game() {
        let engine = engine_with_threshold(1);
        engine.open_round(participants(&[1]));
        engine.handle_click(pid(1));
        assert!(engine.is_over());

        engine.reset();

        assert_eq!(engine.phase(), GamePhase::Idle);
        assert!(engine.scores().is_empty());
        assert_eq!(engine.champion(), None);

        // Scoring works again after reset.
        engine.open_round(participants(&[1]));
        let msgs = engine.handle_click(pid(1));
        assert!(!msgs.is_empty());
    }

    #[test]
    fn test_reset_preserves_round_numbering() {
        let engine = engine_with_threshold(1);
        engine.open_round(participants(&[1]));
        engine.handle_click(pid(1));

        engine.reset();

        assert_eq!(engine.open_round(participants(&[1])), Some(2));
    }

    // =====================================================================
    // remove_player()
    // =====================================================================

    #[test]
    fn test_remove_player_drops_score_and_eligibility() {
        let engine = engine_with_threshold(5);
        engine.open_round(participants(&[1, 2]));
        engine.handle_click(pid(1));

        engine.remove_player(pid(1));

        assert!(engine.scores().is_empty());

        // A new round no longer includes the removed player; a click
        // from them is ignored even if it races the disconnect.
        engine.open_round(participants(&[2]));
        assert!(engine.handle_click(pid(1)).is_empty());
    }

    #[test]
    fn test_remove_player_is_idempotent() {
        let engine = engine_with_threshold(5);
        engine.open_round(participants(&[1]));
        engine.handle_click(pid(1));

        engine.remove_player(pid(1));
        engine.remove_player(pid(1));

        assert!(engine.scores().is_empty());
    }

    // =====================================================================
    // Events
    // =====================================================================

    #[test]
    fn test_events_follow_the_game() {
        let engine = engine_with_threshold(1);
        let mut events = engine.subscribe();

        engine.open_round(participants(&[1]));
        engine.handle_click(pid(1));
        engine.reset();

        assert!(matches!(
            events.try_recv(),
            Ok(GameEvent::RoundOpened { round: 1, participants: 1 })
        ));
        assert!(matches!(
            events.try_recv(),
            Ok(GameEvent::WinnerDeclared { score: 1, .. })
        ));
        assert!(matches!(events.try_recv(), Ok(GameEvent::GameOver { .. })));
        assert!(matches!(events.try_recv(), Ok(GameEvent::GameReset)));
    }
}
