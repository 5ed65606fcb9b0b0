//! Jittered round scheduler for Quickdraw.
//!
//! Provides the timing half of the round loop: a uniformly random delay
//! drawn from a configured range (re-drawn every round) before each `GO`
//! signal, and a fixed short poll while the server has no players.
//!
//! # Integration
//!
//! The scheduler is deliberately standalone — it owns no registry and
//! sends nothing. A single driver task (in the server crate) runs it
//! inside a `tokio::select!` loop so shutdown can interrupt any sleep:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         _ = shutdown.changed() => break,
//!         _ = scheduler.idle_wait(), if registry.is_empty() => {}
//!         info = scheduler.wait_for_signal(), if !registry.is_empty() => {
//!             scoring.open_round(registry.snapshot());
//!             registry.broadcast("GO");
//!             scheduler.signal_sent();
//!         }
//!     }
//! }
//! ```
//!
//! Because one task drives it and `wait_for_signal` takes `&mut self`,
//! at most one round is ever in flight.

use std::time::Duration;

use rand::Rng;
use tokio::time;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Full configuration for the round scheduler.
#[derive(Debug, Clone)]
pub struct RoundConfig {
    /// How often to re-check for players while the registry is empty.
    pub poll_interval: Duration,
    /// Lower bound of the jittered pre-signal delay.
    pub delay_min: Duration,
    /// Upper bound of the jittered pre-signal delay.
    pub delay_max: Duration,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            delay_min: Duration::from_secs(3),
            delay_max: Duration::from_secs(7),
        }
    }
}

impl RoundConfig {
    /// Minimum supported poll interval.
    pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

    /// Create a config with a specific delay range and default polling.
    pub fn with_delay_range(min: Duration, max: Duration) -> Self {
        Self {
            delay_min: min,
            delay_max: max,
            ..Default::default()
        }
    }

    /// Clamp and fix any out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`RoundScheduler::new`]. Rules:
    /// - `delay_min` forced ≤ `delay_max`.
    /// - `poll_interval` raised to [`Self::MIN_POLL_INTERVAL`] (a zero
    ///   poll would spin the driver loop).
    pub fn validated(mut self) -> Self {
        if self.delay_min > self.delay_max {
            warn!(
                min_ms = self.delay_min.as_millis() as u64,
                max_ms = self.delay_max.as_millis() as u64,
                "delay_min exceeds delay_max — clamping min to max"
            );
            self.delay_min = self.delay_max;
        }
        if self.poll_interval < Self::MIN_POLL_INTERVAL {
            warn!(
                poll_ms = self.poll_interval.as_millis() as u64,
                "poll_interval below minimum — clamping"
            );
            self.poll_interval = Self::MIN_POLL_INTERVAL;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Round info (returned to the driver each round)
// ---------------------------------------------------------------------------

/// Information about a round whose delay has elapsed, returned by
/// [`RoundScheduler::wait_for_signal`].
#[derive(Debug, Clone)]
pub struct RoundInfo {
    /// Monotonically increasing round number (starts at 1).
    pub round: u64,
    /// The jittered delay that was drawn for this round.
    pub delay: Duration,
}

// ---------------------------------------------------------------------------
// State & metrics
// ---------------------------------------------------------------------------

/// The scheduler's position in its cycle.
///
/// ```text
/// Idle → Waiting(delay) → Broadcasting → Idle
/// ```
///
/// `Broadcasting` covers the window between the delay elapsing and the
/// driver confirming delivery via [`RoundScheduler::signal_sent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Waiting,
    Broadcasting,
}

/// Runtime counters for the round scheduler.
#[derive(Debug, Clone, Default)]
pub struct RoundMetrics {
    /// Total rounds whose delay has elapsed.
    pub total_rounds: u64,
    /// Total idle polls taken while the registry was empty.
    pub idle_polls: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Jittered-delay round timer.
///
/// One instance per server; driven by a single task.
pub struct RoundScheduler {
    config: RoundConfig,
    round_count: u64,
    state: SchedulerState,
    metrics: RoundMetrics,
}

impl RoundScheduler {
    /// Create a new scheduler from config.
    pub fn new(config: RoundConfig) -> Self {
        let config = config.validated();
        debug!(
            delay_min_ms = config.delay_min.as_millis() as u64,
            delay_max_ms = config.delay_max.as_millis() as u64,
            poll_ms = config.poll_interval.as_millis() as u64,
            "round scheduler created"
        );
        Self {
            config,
            round_count: 0,
            state: SchedulerState::Idle,
            metrics: RoundMetrics::default(),
        }
    }

    /// Create a scheduler for a specific delay range with default polling.
    pub fn with_delay_range(min: Duration, max: Duration) -> Self {
        Self::new(RoundConfig::with_delay_range(min, max))
    }

    /// Waits one poll interval. The driver calls this instead of
    /// [`wait_for_signal`](Self::wait_for_signal) while the registry is
    /// empty, so an empty tick is skipped silently without burning a
    /// drawn delay.
    pub async fn idle_wait(&mut self) {
        self.state = SchedulerState::Idle;
        time::sleep(self.config.poll_interval).await;
        self.metrics.idle_polls += 1;
    }

    /// Draws a fresh jittered delay, sleeps it, and returns the round
    /// that is now due for its `GO` broadcast.
    ///
    /// The delay is uniform over `[delay_min, delay_max]` and re-drawn
    /// for every round. After this resolves the scheduler sits in
    /// [`SchedulerState::Broadcasting`] until
    /// [`signal_sent`](Self::signal_sent) is called.
    pub async fn wait_for_signal(&mut self) -> RoundInfo {
        let delay = self.draw_delay();
        self.state = SchedulerState::Waiting;

        time::sleep(delay).await;

        self.state = SchedulerState::Broadcasting;
        self.round_count += 1;
        self.metrics.total_rounds += 1;

        debug!(
            round = self.round_count,
            delay_ms = delay.as_millis() as u64,
            "round due"
        );

        RoundInfo {
            round: self.round_count,
            delay,
        }
    }

    /// Record that the driver has broadcast the signal for the current
    /// round. Returns the scheduler to `Idle`.
    pub fn signal_sent(&mut self) {
        self.state = SchedulerState::Idle;
    }

    /// The scheduler's current position in its cycle.
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Rounds fired so far.
    pub fn round_count(&self) -> u64 {
        self.round_count
    }

    /// Snapshot of current counters.
    pub fn metrics(&self) -> &RoundMetrics {
        &self.metrics
    }

    /// The configured delay range.
    pub fn delay_range(&self) -> (Duration, Duration) {
        (self.config.delay_min, self.config.delay_max)
    }

    fn draw_delay(&self) -> Duration {
        let min = self.config.delay_min.as_millis() as u64;
        let max = self.config.delay_max.as_millis() as u64;
        if min == max {
            return self.config.delay_min;
        }
        let ms = rand::rng().random_range(min..=max);
        Duration::from_millis(ms)
    }
}
