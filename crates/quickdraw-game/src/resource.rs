//! The resource field: two-lock collection with deadlock avoidance.
//!
//! Collecting one unit of the shared resource requires holding `lock_a`
//! and `lock_b` simultaneously. Deadlock freedom rests on two rules, in
//! order of importance:
//!
//! 1. **Fixed acquisition order** — every caller takes `lock_a` before
//!    `lock_b`, so a circular wait cannot form.
//! 2. **Bounded waits** — each acquisition is wrapped in
//!    `tokio::time::timeout`; a caller that times out releases whatever
//!    it holds and reports "try again". Retry is the caller's decision
//!    (retry-by-caller), not an internal loop, which bounds worst-case
//!    latency under contention.
//!
//! The guards are RAII: both locks are free after every `collect` call
//! returns, on success and on timeout alike. A player therefore cannot
//! hold a lock across calls, so disconnect cleanup only has to drop the
//! count entry.
//!
//! Lock ordering discipline for this module: `lock_a` → `lock_b` →
//! counts mutex. The counts mutex is only ever taken with both resource
//! locks held, and nothing awaits while it is held.

use std::collections::HashMap;
use std::sync::Mutex as StdMutex;

use quickdraw_protocol::{PlayerId, ServerDirective};
use tokio::sync::{broadcast, Mutex};
use tokio::time::timeout;

use crate::{GameEvent, ResourceConfig};

/// Capacity of the game event channel.
const EVENT_CHANNEL_SIZE: usize = 64;

/// The result of one collection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectOutcome {
    /// Both locks were held; the player's count is now this.
    Collected(u32),

    /// The increment reached the win threshold.
    Won(u32),

    /// The player had already won; nothing was recorded.
    AlreadyWon(u32),

    /// A lock acquisition timed out; nothing was recorded. The caller
    /// may simply try again.
    TryAgain,
}

impl CollectOutcome {
    /// The status line reported back to the collecting client.
    pub fn directive(&self) -> ServerDirective {
        match self {
            Self::Collected(n) => ServerDirective::Collected(*n),
            Self::Won(n) | Self::AlreadyWon(n) => {
                ServerDirective::ResourceWin(*n)
            }
            Self::TryAgain => ServerDirective::TryAgain,
        }
    }
}

struct PlayerCount {
    count: u32,
    won: bool,
}

/// The globally shared, doubly-locked resource.
pub struct ResourceField {
    config: ResourceConfig,
    lock_a: Mutex<()>,
    lock_b: Mutex<()>,
    counts: StdMutex<HashMap<PlayerId, PlayerCount>>,
    events: broadcast::Sender<GameEvent>,
}

impl ResourceField {
    /// Creates a new field with both locks free and no counts.
    pub fn new(config: ResourceConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self {
            config,
            lock_a: Mutex::new(()),
            lock_b: Mutex::new(()),
            counts: StdMutex::new(HashMap::new()),
            events,
        }
    }

    /// Attempts to collect one resource unit for `player`.
    ///
    /// Acquires `lock_a` then `lock_b`, each with a bounded wait. On
    /// either timeout whatever was obtained is released before
    /// returning [`CollectOutcome::TryAgain`] — a lock is never held
    /// while waiting indefinitely on the other.
    pub async fn collect(&self, player: PlayerId) -> CollectOutcome {
        let guard_a = match timeout(
            self.config.acquire_timeout,
            self.lock_a.lock(),
        )
        .await
        {
            Ok(guard) => guard,
            Err(_) => {
                tracing::debug!(%player, "timed out waiting for lock A");
                return CollectOutcome::TryAgain;
            }
        };

        let guard_b = match timeout(
            self.config.acquire_timeout,
            self.lock_b.lock(),
        )
        .await
        {
            Ok(guard) => guard,
            Err(_) => {
                tracing::debug!(%player, "timed out waiting for lock B");
                drop(guard_a);
                return CollectOutcome::TryAgain;
            }
        };

        // Both locks held — the collection window.
        if !self.config.hold.is_zero() {
            tokio::time::sleep(self.config.hold).await;
        }

        let outcome = self.record(player);

        drop(guard_b);
        drop(guard_a);
        outcome
    }

    /// Records the collection for a player holding both locks.
    fn record(&self, player: PlayerId) -> CollectOutcome {
        let mut counts = self.counts.lock().expect("counts lock poisoned");
        let entry = counts
            .entry(player)
            .or_insert(PlayerCount { count: 0, won: false });

        if entry.won {
            // No further increments once the threshold is reached.
            return CollectOutcome::AlreadyWon(entry.count);
        }

        entry.count += 1;
        let count = entry.count;

        if count >= self.config.collect_threshold {
            entry.won = true;
            tracing::info!(%player, count, "resource win");
            let _ = self
                .events
                .send(GameEvent::ResourceWon { id: player, count });
            CollectOutcome::Won(count)
        } else {
            tracing::debug!(%player, count, "resource collected");
            let _ = self
                .events
                .send(GameEvent::ResourceCollected { id: player, count });
            CollectOutcome::Collected(count)
        }
    }

    /// Disconnect cleanup: drops the player's count entry. Idempotent.
    /// Locks cannot be leaked across calls, so there is nothing else to
    /// release here.
    pub fn remove_player(&self, player: PlayerId) {
        self.counts
            .lock()
            .expect("counts lock poisoned")
            .remove(&player);
    }

    /// Point-in-time copy of all resource counts.
    pub fn counts(&self) -> Vec<(PlayerId, u32)> {
        self.counts
            .lock()
            .expect("counts lock poisoned")
            .iter()
            .map(|(id, c)| (*id, c.count))
            .collect()
    }

    /// Subscribes to game events.
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    /// The configured collection win threshold.
    pub fn collect_threshold(&self) -> u32 {
        self.config.collect_threshold
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn pid(id: u64) -> PlayerId {
        PlayerId(id)
    }

    fn field_with_threshold(threshold: u32) -> ResourceField {
        ResourceField::new(ResourceConfig {
            collect_threshold: threshold,
            ..ResourceConfig::default()
        })
    }

    #[tokio::test]
    async fn test_collect_increments_count() {
        let field = field_with_threshold(10);

        assert_eq!(field.collect(pid(1)).await, CollectOutcome::Collected(1));
        assert_eq!(field.collect(pid(1)).await, CollectOutcome::Collected(2));
        assert_eq!(field.counts(), vec![(pid(1), 2)]);
    }

    #[tokio::test]
    async fn test_counts_are_per_player() {
        let field = field_with_threshold(10);

        field.collect(pid(1)).await;
        field.collect(pid(1)).await;
        field.collect(pid(2)).await;

        let mut counts = field.counts();
        counts.sort_by_key(|(id, _)| id.0);
        assert_eq!(counts, vec![(pid(1), 2), (pid(2), 1)]);
    }

    #[tokio::test]
    async fn test_threshold_reports_win() {
        let field = field_with_threshold(3);

        field.collect(pid(1)).await;
        field.collect(pid(1)).await;
        assert_eq!(field.collect(pid(1)).await, CollectOutcome::Won(3));
    }

    #[tokio::test]
    async fn test_no_increments_after_win() {
        let field = field_with_threshold(2);

        field.collect(pid(1)).await;
        field.collect(pid(1)).await;

        assert_eq!(
            field.collect(pid(1)).await,
            CollectOutcome::AlreadyWon(2)
        );
        assert_eq!(field.counts(), vec![(pid(1), 2)]);
    }

    #[tokio::test]
    async fn test_other_players_collect_after_someones_win() {
        let field = field_with_threshold(2);

        field.collect(pid(1)).await;
        field.collect(pid(1)).await; // player 1 wins

        assert_eq!(field.collect(pid(2)).await, CollectOutcome::Collected(1));
    }

    #[tokio::test]
    async fn test_remove_player_drops_count() {
        let field = field_with_threshold(10);
        field.collect(pid(1)).await;

        field.remove_player(pid(1));
        assert!(field.counts().is_empty());

        // Idempotent.
        field.remove_player(pid(1));
    }

    #[test]
    fn test_outcome_directives() {
        assert_eq!(
            CollectOutcome::Collected(3).directive(),
            ServerDirective::Collected(3)
        );
        assert_eq!(
            CollectOutcome::Won(10).directive(),
            ServerDirective::ResourceWin(10)
        );
        assert_eq!(
            CollectOutcome::AlreadyWon(10).directive(),
            ServerDirective::ResourceWin(10)
        );
        assert_eq!(
            CollectOutcome::TryAgain.directive(),
            ServerDirective::TryAgain
        );
    }

    #[tokio::test]
    async fn test_events_emitted_on_collect_and_win() {
        let field = field_with_threshold(2);
        let mut events = field.subscribe();

        field.collect(pid(1)).await;
        field.collect(pid(1)).await;

        assert!(matches!(
            events.try_recv(),
            Ok(GameEvent::ResourceCollected { count: 1, .. })
        ));
        assert!(matches!(
            events.try_recv(),
            Ok(GameEvent::ResourceWon { count: 2, .. })
        ));
    }
}
