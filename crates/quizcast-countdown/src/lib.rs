//! Per-question countdown clock for Quizcast.
//!
//! A [`Countdown`] is armed when a question opens, ticks once per second
//! with the seconds remaining, and fires an expiry exactly once when the
//! clock reaches zero — then stops on its own. Disarming is idempotent
//! and suppresses all further ticks and the expiry.
//!
//! # Integration
//!
//! The countdown is designed to sit inside a room actor's
//! `tokio::select!` loop. While disarmed, [`Countdown::tick`] pends
//! forever, so the branch simply never fires:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         tick = countdown.tick() => {
//!             broadcast_time_left(tick.seconds_left);
//!             if tick.expired { force_reveal(); }
//!         }
//!     }
//! }
//! ```
//!
//! Remaining time is computed from the arm instant, not accumulated per
//! tick, so a tick that wakes late self-corrects instead of drifting.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for a countdown clock.
#[derive(Debug, Clone, Copy)]
pub struct CountdownConfig {
    /// Total time a question stays open.
    pub duration: Duration,
    /// How often a time-remaining tick fires.
    pub tick_interval: Duration,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(30),
            tick_interval: Duration::from_secs(1),
        }
    }
}

impl CountdownConfig {
    /// A config for a specific question duration with 1 s ticks.
    pub fn with_duration(duration: Duration) -> Self {
        Self { duration, ..Default::default() }
    }
}

// ---------------------------------------------------------------------------
// Tick info (returned to caller each tick)
// ---------------------------------------------------------------------------

/// One countdown tick, returned by [`Countdown::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTick {
    /// Whole seconds remaining: `max(duration − elapsed, 0)`.
    pub seconds_left: u64,
    /// `true` exactly once per armed run, on the tick where the clock
    /// reaches zero. The countdown disarms itself on that tick.
    pub expired: bool,
}

// ---------------------------------------------------------------------------
// Countdown
// ---------------------------------------------------------------------------

/// A one-question countdown clock. One `Countdown` per room actor;
/// re-armed for each question.
#[derive(Debug)]
pub struct Countdown {
    config: CountdownConfig,
    /// When the current run was armed. `None` while disarmed.
    armed_at: Option<Instant>,
    /// When the next tick should fire.
    next_tick: Option<Instant>,
}

impl Countdown {
    /// Creates a disarmed countdown.
    pub fn new(config: CountdownConfig) -> Self {
        Self { config, armed_at: None, next_tick: None }
    }

    /// Arms (or re-arms) the clock for a fresh run of the full duration.
    ///
    /// Arming while already armed restarts the run — the previous run's
    /// remaining ticks and expiry are discarded.
    pub fn arm(&mut self) {
        let now = Instant::now();
        self.armed_at = Some(now);
        self.next_tick = Some(now + self.config.tick_interval);
        debug!(duration_secs = self.config.duration.as_secs(), "countdown armed");
    }

    /// Stops the clock: no further ticks, no expiry. Idempotent.
    pub fn disarm(&mut self) {
        if self.armed_at.take().is_some() {
            self.next_tick = None;
            debug!("countdown disarmed");
        }
    }

    /// Whether the clock is currently running.
    pub fn is_armed(&self) -> bool {
        self.armed_at.is_some()
    }

    /// Whole seconds remaining, or `None` while disarmed.
    pub fn remaining(&self) -> Option<u64> {
        self.armed_at.map(|armed| {
            let elapsed = armed.elapsed().as_secs();
            self.config.duration.as_secs().saturating_sub(elapsed)
        })
    }

    /// Waits until the next tick is due and returns it.
    ///
    /// While disarmed this pends forever — it will never resolve on its
    /// own, but `tokio::select!` still processes other branches. On the
    /// expiry tick (`seconds_left == 0`) the countdown disarms itself,
    /// so expiry fires at most once per armed run.
    ///
    /// Cancel-safe: state only changes after the sleep completes, so a
    /// dropped `tick` future leaves the schedule intact.
    pub async fn tick(&mut self) -> CountdownTick {
        let (armed, next) = match (self.armed_at, self.next_tick) {
            (Some(armed), Some(next)) => (armed, next),
            _ => {
                // Disarmed: pend forever. select! handles other branches.
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        time::sleep_until(next).await;

        let now = Instant::now();
        let elapsed = now.saturating_duration_since(armed).as_secs();
        let seconds_left =
            self.config.duration.as_secs().saturating_sub(elapsed);

        if seconds_left == 0 {
            self.armed_at = None;
            self.next_tick = None;
            debug!("countdown expired");
            return CountdownTick { seconds_left: 0, expired: true };
        }

        // Schedule the next tick from the previous deadline to keep a
        // steady cadence; fall back to "from now" if we woke up late.
        let mut upcoming = next + self.config.tick_interval;
        if upcoming <= now {
            upcoming = now + self.config.tick_interval;
        }
        self.next_tick = Some(upcoming);

        trace!(seconds_left, "countdown tick");
        CountdownTick { seconds_left, expired: false }
    }

    /// The configured question duration.
    pub fn duration(&self) -> Duration {
        self.config.duration
    }
}
