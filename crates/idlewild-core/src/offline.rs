//! Offline catch-up engine.
//!
//! After an absence the backlog can be more than a million ticks. The
//! engine never runs it in one call: each [`run_batch`] runs at most
//! `tick_rate` ticks, measures how long that took on the monotonic clock,
//! and resizes the next batch so one batch costs about
//! `tick_interval * safety_ratio` milliseconds of host time.
//!
//! Deciding when catch-up is over belongs to
//! [`SimulationClock`](crate::clock::SimulationClock); the engine only
//! answers [`is_caught_up`].
//!
//! [`run_batch`]: OfflineCatchupEngine::run_batch
//! [`is_caught_up`]: OfflineCatchupEngine::is_caught_up

use serde::Serialize;
use tracing::debug;

use crate::config::{ClockConfig, OfflineConfig};
use crate::error::OfflineTickFailure;
use crate::simulation::Simulation;
use crate::snapshot::{Snapshot, SnapshotDelta};
use crate::time::TimeSource;

/// Floor applied to a measured batch duration before dividing by it.
const MIN_BATCH_ELAPSED_MS: f64 = 1.0;

/// Progress of one offline catch-up.
///
/// Created when the clock enters offline mode and reset to zero values
/// when it leaves, or when a tick fails.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OfflineSession {
    armed: bool,
    start_time: i64,
    time_processed: i64,
    tick_rate: u32,
    ticks_run: u64,
    snapshot: Snapshot,
    action: Option<String>,
}

impl OfflineSession {
    /// Whether a catch-up is in progress.
    pub const fn is_armed(&self) -> bool {
        self.armed
    }

    /// Wall-clock instant the absence started.
    pub const fn start_time(&self) -> i64 {
        self.start_time
    }

    /// Simulated milliseconds of the backlog already processed.
    pub const fn time_processed(&self) -> i64 {
        self.time_processed
    }

    /// Ticks the next batch may run.
    pub const fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    /// Ticks run so far in this session.
    pub const fn ticks_run(&self) -> u64 {
        self.ticks_run
    }

    /// Snapshot taken at entry.
    pub const fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Action active at entry.
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }
}

/// Result of one batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatchReport {
    /// Ticks run by this batch.
    pub ticks: u64,
    /// Monotonic milliseconds the batch took.
    pub elapsed_ms: f64,
    /// Batch size chosen for the next call.
    pub tick_rate: u32,
    /// Backlog left after this batch.
    pub backlog_ms: i64,
}

/// Summary produced when offline catch-up ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfflineReport {
    /// Wall-clock length of the absence.
    pub offline_ms: i64,
    /// Milliseconds actually simulated.
    pub processed_ms: i64,
    /// Milliseconds beyond the offline cap, dropped.
    pub discarded_ms: i64,
    /// Sub-threshold remainder handed back to online ticking.
    pub carried_ms: i64,
    /// Ticks run during catch-up.
    pub ticks: u64,
    /// Action active when the absence began.
    pub action: Option<String>,
    /// Net change in tracked state over the absence.
    pub delta: SnapshotDelta,
}

/// Adaptive batch runner for offline catch-up.
#[derive(Debug, Clone)]
pub struct OfflineCatchupEngine {
    tick_interval_ms: i64,
    max_offline_ms: i64,
    exit_threshold_ms: i64,
    initial_tick_rate: u32,
    max_tick_rate: u32,
    safety_ratio: f64,
    session: OfflineSession,
}

impl OfflineCatchupEngine {
    /// Create a disarmed engine.
    pub fn new(clock: &ClockConfig, offline: &OfflineConfig) -> Self {
        Self {
            tick_interval_ms: i64::try_from(clock.tick_interval_ms.max(1)).unwrap_or(i64::MAX),
            max_offline_ms: i64::try_from(clock.max_offline_ms).unwrap_or(i64::MAX),
            exit_threshold_ms: i64::try_from(clock.offline_exit_threshold_ms).unwrap_or(i64::MAX),
            initial_tick_rate: offline.initial_tick_rate.max(1),
            max_tick_rate: offline.max_tick_rate.max(1),
            safety_ratio: offline.safety_ratio,
            session: OfflineSession::default(),
        }
    }

    /// The current session (zero values when disarmed).
    pub const fn session(&self) -> &OfflineSession {
        &self.session
    }

    /// Start a session for an absence that began at `start_time`.
    pub fn arm(&mut self, start_time: i64, snapshot: Snapshot, action: Option<String>) {
        self.session = OfflineSession {
            armed: true,
            start_time,
            time_processed: 0,
            tick_rate: self.initial_tick_rate,
            ticks_run: 0,
            snapshot,
            action,
        };
    }

    /// Reset the session to zero values, returning the old one.
    pub fn disarm(&mut self) -> OfflineSession {
        std::mem::take(&mut self.session)
    }

    /// Absence length at `now`, clamped to the offline cap.
    pub fn elapsed_ms(&self, now: i64) -> i64 {
        now.saturating_sub(self.session.start_time)
            .clamp(0, self.max_offline_ms)
    }

    /// Unprocessed part of the (capped) absence at `now`.
    pub fn backlog_ms(&self, now: i64) -> i64 {
        self.elapsed_ms(now)
            .saturating_sub(self.session.time_processed)
            .max(0)
    }

    /// Whether the backlog is below the exit threshold, or too small to
    /// hold another whole tick.
    pub fn is_caught_up(&self, now: i64) -> bool {
        let backlog = self.backlog_ms(now);
        backlog < self.exit_threshold_ms || backlog < self.tick_interval_ms
    }

    /// Run one batch of at most `tick_rate` ticks against the backlog at
    /// `now`, then resize the next batch from the measured cost.
    ///
    /// # Errors
    ///
    /// Returns [`OfflineTickFailure`] if a tick fails. The failure carries
    /// the backlog covered by the ticks that did run, and the session is
    /// disarmed before returning.
    pub fn run_batch<S, T>(
        &mut self,
        simulation: &mut S,
        time: &T,
        now: i64,
    ) -> Result<BatchReport, OfflineTickFailure>
    where
        S: Simulation + ?Sized,
        T: TimeSource + ?Sized,
    {
        let remaining = self
            .backlog_ms(now)
            .checked_div(self.tick_interval_ms)
            .and_then(|ticks| u64::try_from(ticks).ok())
            .unwrap_or(0);
        let batch = remaining.min(u64::from(self.session.tick_rate));

        let started = time.monotonic_ms();
        for done in 0..batch {
            if let Err(source) = simulation.tick() {
                let failure = OfflineTickFailure {
                    ticks_completed: self.session.ticks_run.saturating_add(done),
                    processed_ms: self.processed_after(done),
                    diagnostics: simulation.diagnostics(),
                    source,
                };
                self.disarm();
                return Err(failure);
            }
        }
        let elapsed_ms = elapsed_since(started, time.monotonic_ms());

        self.session.time_processed = self.processed_after(batch);
        self.session.ticks_run = self.session.ticks_run.saturating_add(batch);
        if batch > 0 {
            self.session.tick_rate = self.next_tick_rate(batch, elapsed_ms);
        }

        let report = BatchReport {
            ticks: batch,
            elapsed_ms,
            tick_rate: self.session.tick_rate,
            backlog_ms: self.backlog_ms(now),
        };
        debug!(
            ticks = report.ticks,
            elapsed_ms = report.elapsed_ms,
            next_tick_rate = report.tick_rate,
            backlog_ms = report.backlog_ms,
            "offline batch complete"
        );
        Ok(report)
    }

    /// `time_processed` once `ticks` more ticks have run.
    fn processed_after(&self, ticks: u64) -> i64 {
        let advanced = i64::try_from(ticks)
            .unwrap_or(i64::MAX)
            .saturating_mul(self.tick_interval_ms);
        self.session
            .time_processed
            .saturating_add(advanced)
            .min(self.max_offline_ms)
    }

    /// Batch size that makes `ticks` ticks taking `elapsed_ms` fit in
    /// `tick_interval * safety_ratio` milliseconds, clamped to
    /// `1..=max_tick_rate`.
    #[allow(
        clippy::arithmetic_side_effects,
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn next_tick_rate(&self, ticks: u64, elapsed_ms: f64) -> u32 {
        let elapsed = elapsed_ms.max(MIN_BATCH_ELAPSED_MS);
        let rate = (ticks as f64 / elapsed) * self.tick_interval_ms as f64 * self.safety_ratio;
        let rate = rate.floor();
        if !rate.is_finite() || rate < 1.0 {
            1
        } else if rate >= f64::from(self.max_tick_rate) {
            self.max_tick_rate
        } else {
            rate as u32
        }
    }

    /// End the session at `now` and summarize it against `after`.
    pub fn finish(&mut self, now: i64, after: &Snapshot) -> OfflineReport {
        let session = self.disarm();
        let offline_ms = now.saturating_sub(session.start_time).max(0);
        let capped = offline_ms.min(self.max_offline_ms);
        OfflineReport {
            offline_ms,
            processed_ms: session.time_processed,
            discarded_ms: offline_ms.saturating_sub(capped),
            carried_ms: capped.saturating_sub(session.time_processed).max(0),
            ticks: session.ticks_run,
            delta: session.snapshot.diff(after),
            action: session.action,
        }
    }
}

#[allow(clippy::arithmetic_side_effects)]
fn elapsed_since(started: f64, now: f64) -> f64 {
    (now - started).max(0.0)
}
