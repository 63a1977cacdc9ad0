//! Round clock for roundkeeper.
//!
//! Two pieces live here:
//!
//! - [`TickScheduler`]: the periodic clock the host runs. Fires once per
//!   interval (one second by default) and reports late wake-ups.
//! - [`PhaseTimer`]: the per-round elapsed-seconds counter each round
//!   owns. It only moves when the round advances it from a clock tick.
//!
//! # Integration
//!
//! The scheduler sits inside the host's `tokio::select!` loop; every
//! fired tick advances every live round once:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         _ = &mut shutdown => break,
//!         info = clock.wait_for_tick() => {
//!             registry.lock().await.tick();
//!             clock.record_tick_end();
//!         }
//!     }
//! }
//! ```

mod timer;

pub use timer::PhaseTimer;

use std::time::{Duration, Instant};

use rand::Rng;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when the clock wakes up later than scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickPolicy {
    /// Drop the missed ticks and resume from now. Round timers then run
    /// slow by the missed amount, but the tick thread never piles up work.
    #[default]
    Skip,
    /// Fire missed ticks back-to-back so round timers keep wall-clock
    /// pace, up to `max_catchup` in a row.
    CatchUp {
        /// Cap on consecutive catch-up ticks.
        max_catchup: u32,
    },
}

/// Configuration for the [`TickScheduler`].
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Time between ticks. Round durations are counted in ticks, so this
    /// is one second in production.
    pub interval: Duration,
    /// Overrun handling policy.
    pub policy: TickPolicy,
    /// Fraction of the interval (0.0–1.0) that tick work may take before a
    /// warning is logged.
    pub budget_warn_threshold: f64,
    /// Random delay (0–max µs) added to the first tick so several hosts
    /// started together don't tick in lockstep.
    pub initial_jitter_us: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            policy: TickPolicy::default(),
            budget_warn_threshold: 0.5,
            initial_jitter_us: 2_000,
        }
    }
}

impl TickConfig {
    /// Shortest interval the scheduler accepts.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(10);

    /// A config with the given interval and default everything else.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Clamps out-of-range values. Called by [`TickScheduler::new`].
    pub fn validated(mut self) -> Self {
        if self.interval < Self::MIN_INTERVAL {
            warn!(
                interval_ms = self.interval.as_millis() as u64,
                min_ms = Self::MIN_INTERVAL.as_millis() as u64,
                "tick interval below minimum, clamping"
            );
            self.interval = Self::MIN_INTERVAL;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self
    }
}

// ---------------------------------------------------------------------------
// Tick info
// ---------------------------------------------------------------------------

/// What [`TickScheduler::wait_for_tick`] reports for each fired tick.
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Monotonically increasing tick number, starting at 1.
    pub tick: u64,
    /// `true` if the clock woke up more than 10% of an interval late.
    pub overrun: bool,
    /// Ticks dropped because of the overrun (0 in normal operation).
    pub ticks_skipped: u64,
}

/// Counters kept by the scheduler.
#[derive(Debug, Clone, Default)]
pub struct TickMetrics {
    pub total_ticks: u64,
    pub total_overruns: u64,
    pub total_skipped: u64,
    /// Longest tick work reported through `record_tick_end`.
    pub max_tick_time: Duration,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-interval clock that drives every round in a namespace.
pub struct TickScheduler {
    config: TickConfig,
    tick_count: u64,
    next_tick: TokioInstant,
    tick_start: Option<Instant>,
    paused: bool,
    metrics: TickMetrics,
}

impl TickScheduler {
    /// Creates a scheduler. The first tick fires one interval (plus
    /// jitter) from now.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let jitter = if config.initial_jitter_us > 0 {
            Duration::from_micros(rand::rng().random_range(0..config.initial_jitter_us))
        } else {
            Duration::ZERO
        };
        debug!(
            interval_ms = config.interval.as_millis() as u64,
            policy = ?config.policy,
            "round clock created"
        );

        Self {
            next_tick: TokioInstant::now() + config.interval + jitter,
            config,
            tick_count: 0,
            tick_start: None,
            paused: false,
            metrics: TickMetrics::default(),
        }
    }

    /// A one-second scheduler with default settings.
    pub fn every_second() -> Self {
        Self::new(TickConfig::default())
    }

    /// Waits until the next tick is due.
    ///
    /// While paused this future never resolves, which lets it sit in a
    /// `tokio::select!` next to other branches.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        if self.paused {
            std::future::pending::<()>().await;
        }

        let due = self.next_tick;
        let interval = self.config.interval;
        time::sleep_until(due).await;

        let now = TokioInstant::now();
        self.tick_count += 1;
        self.tick_start = Some(Instant::now());

        let late_by = now.saturating_duration_since(due);
        let overrun = late_by > interval / 10;
        let behind = (late_by.as_nanos() / interval.as_nanos()) as u64;
        let mut ticks_skipped = 0;

        self.next_tick = match self.config.policy {
            TickPolicy::Skip => {
                if overrun && behind > 0 {
                    ticks_skipped = behind;
                    warn!(
                        tick = self.tick_count,
                        skipped = behind,
                        late_ms = late_by.as_millis() as u64,
                        "round clock overrun, skipping ahead"
                    );
                }
                now + interval
            }
            TickPolicy::CatchUp { max_catchup } => {
                if behind > u64::from(max_catchup) {
                    ticks_skipped = behind - u64::from(max_catchup);
                    warn!(
                        tick = self.tick_count,
                        behind,
                        skipped = ticks_skipped,
                        "round clock too far behind, catch-up capped"
                    );
                    now + interval
                } else {
                    due + interval
                }
            }
        };

        if overrun {
            self.metrics.total_overruns += 1;
        }
        self.metrics.total_skipped += ticks_skipped;
        self.metrics.total_ticks += 1;
        trace!(tick = self.tick_count, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            overrun,
            ticks_skipped,
        }
    }

    /// Records that the work for the current tick is done.
    ///
    /// Rounds must not block past a tick boundary; this is where a slow
    /// tick gets reported.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        let elapsed = start.elapsed();
        if elapsed > self.metrics.max_tick_time {
            self.metrics.max_tick_time = elapsed;
        }

        let utilization = elapsed.as_secs_f64() / self.config.interval.as_secs_f64();
        if utilization >= self.config.budget_warn_threshold {
            warn!(
                tick = self.tick_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                utilization_pct = format!("{:.1}", utilization * 100.0),
                "tick work approaching interval"
            );
        }
    }

    /// Stops firing ticks until [`resume`](Self::resume). Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.tick_count, "round clock paused");
        }
    }

    /// Resumes after a pause. The next tick is one full interval away, so
    /// time spent paused is never caught up.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.next_tick = TokioInstant::now() + self.config.interval;
            debug!(tick = self.tick_count, "round clock resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }
}
