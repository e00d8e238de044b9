//! Fixed-tick simulation clock with online and offline modes.
//!
//! The host calls [`SimulationClock::advance`] from a periodic callback.
//! Each call does one of:
//!
//! - **Online**: run `floor((now - previous_tick_time) / tick_interval)`
//!   ticks (capped per call) and move both timestamps forward by exactly
//!   that many intervals. The sub-tick remainder stays behind for the next
//!   call.
//! - **Offline**: run one adaptive batch of the backlog through the
//!   [`OfflineCatchupEngine`], leaving once the backlog is below the exit
//!   threshold or the offline cap has been reached.
//! - **Stopped**: nothing, until [`SimulationClock::restart`].
//!
//! Online switches to offline when the wall clock has moved more than the
//! entry threshold past `tick_timestamp`, or on [`force_offline`], unless
//! the simulation currently forbids it.
//!
//! [`force_offline`]: SimulationClock::force_offline

use tracing::{error, info, trace};

use crate::config::{ClockConfig, SimulationConfig};
use crate::error::SchedulerError;
use crate::offline::{BatchReport, OfflineCatchupEngine, OfflineReport};
use crate::simulation::Simulation;
use crate::time::TimeSource;

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockMode {
    /// Ticking in lockstep with the monotonic clock.
    Online,
    /// Catching up a backlog in adaptive batches.
    Offline,
    /// Halted after a tick failure.
    Stopped,
}

/// What one [`SimulationClock::advance`] call did.
#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceOutcome {
    /// Online ticking ran `ticks` ticks.
    Online {
        /// Ticks run this call.
        ticks: u32,
    },
    /// An absence was detected but the simulation had nothing to do, so the
    /// timestamps were moved to now without ticking.
    BacklogSkipped {
        /// Milliseconds skipped.
        skipped_ms: i64,
    },
    /// One offline batch ran; catch-up continues on the next call.
    OfflineBatch(BatchReport),
    /// Offline catch-up finished this call.
    OfflineComplete(OfflineReport),
    /// The clock is stopped.
    Stopped,
}

/// Online/offline tick scheduler over a [`TimeSource`].
#[derive(Debug)]
pub struct SimulationClock<T> {
    config: ClockConfig,
    time: T,
    mode: ClockMode,
    engine: OfflineCatchupEngine,
    force_offline: bool,
}

impl<T: TimeSource> SimulationClock<T> {
    /// Create an online clock reading time from `time`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Config`] if the configuration fails
    /// validation.
    pub fn new(config: &SimulationConfig, time: T) -> Result<Self, SchedulerError> {
        config.validate()?;
        Ok(Self {
            config: config.clock.clone(),
            time,
            mode: ClockMode::Online,
            engine: OfflineCatchupEngine::new(&config.clock, &config.offline),
            force_offline: false,
        })
    }

    /// Current mode.
    pub const fn mode(&self) -> ClockMode {
        self.mode
    }

    /// The time source.
    pub const fn time_source(&self) -> &T {
        &self.time
    }

    /// The offline engine and its session.
    pub const fn offline_engine(&self) -> &OfflineCatchupEngine {
        &self.engine
    }

    /// Bind a freshly created or loaded state to this process's monotonic
    /// clock. `tick_timestamp` is left alone, so a loaded save that is old
    /// enough enters offline catch-up on the next [`advance`].
    ///
    /// [`advance`]: SimulationClock::advance
    pub fn attach<S: Simulation + ?Sized>(&self, simulation: &mut S) {
        simulation.time_mut().previous_tick_time = self.time.monotonic_ms();
    }

    /// Request offline catch-up on the next [`advance`], regardless of how
    /// long the player has been away.
    ///
    /// [`advance`]: SimulationClock::advance
    pub const fn force_offline(&mut self) {
        self.force_offline = true;
    }

    /// Leave the stopped state (or abandon a catch-up in progress) and
    /// resume online ticking from now.
    pub fn restart<S: Simulation + ?Sized>(&mut self, simulation: &mut S) {
        let discarded = self.engine.disarm();
        if discarded.is_armed() {
            simulation.set_offline(false);
        }
        let wall = self.time.wall_now_ms();
        let mono = self.time.monotonic_ms();
        simulation.time_mut().resync(wall, mono);
        self.force_offline = false;
        self.mode = ClockMode::Online;
        info!(wall_ms = wall, "simulation clock restarted");
    }

    /// Ticks an online call would run with the monotonic clock at `now`.
    #[allow(
        clippy::arithmetic_side_effects,
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn ticks_due(&self, previous_tick_time: f64, now: f64) -> u32 {
        let elapsed = now - previous_tick_time;
        if elapsed.is_nan() || elapsed <= 0.0 {
            return 0;
        }
        let due = (elapsed / self.config.tick_interval_ms as f64).floor();
        let cap = self.config.max_ticks_per_invocation;
        if due >= f64::from(cap) { cap } else { due as u32 }
    }

    /// Run one scheduling step.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::OfflineTick`] or
    /// [`SchedulerError::OnlineTick`] when a tick fails. The clock is
    /// stopped in both cases.
    pub fn advance<S: Simulation + ?Sized>(
        &mut self,
        simulation: &mut S,
    ) -> Result<AdvanceOutcome, SchedulerError> {
        match self.mode {
            ClockMode::Stopped => Ok(AdvanceOutcome::Stopped),
            ClockMode::Offline => self.advance_offline(simulation),
            ClockMode::Online => {
                let wall = self.time.wall_now_ms();
                let absent = wall.saturating_sub(simulation.time().tick_timestamp);
                let threshold =
                    i64::try_from(self.config.offline_entry_threshold_ms).unwrap_or(i64::MAX);
                if self.force_offline || absent > threshold {
                    if simulation.blocks_offline() {
                        trace!(absent_ms = absent, "offline entry blocked by current activity");
                    } else {
                        self.force_offline = false;
                        return self.enter_offline(simulation, wall);
                    }
                }
                self.advance_online(simulation)
            }
        }
    }

    fn advance_online<S: Simulation + ?Sized>(
        &mut self,
        simulation: &mut S,
    ) -> Result<AdvanceOutcome, SchedulerError> {
        let now = self.time.monotonic_ms();
        let ticks = self.ticks_due(simulation.time().previous_tick_time, now);
        for done in 0..ticks {
            if let Err(source) = simulation.tick() {
                self.commit_online_ticks(simulation, done);
                self.mode = ClockMode::Stopped;
                error!(ticks_completed = done, %source, "online tick failed; clock stopped");
                return Err(SchedulerError::OnlineTick {
                    ticks_completed: done,
                    source,
                });
            }
        }
        self.commit_online_ticks(simulation, ticks);
        Ok(AdvanceOutcome::Online { ticks })
    }

    #[allow(clippy::arithmetic_side_effects, clippy::cast_precision_loss)]
    fn commit_online_ticks<S: Simulation + ?Sized>(&self, simulation: &mut S, ticks: u32) {
        let interval = i64::try_from(self.config.tick_interval_ms).unwrap_or(i64::MAX);
        let advanced = i64::from(ticks).saturating_mul(interval);
        let time = simulation.time_mut();
        time.tick_timestamp = time.tick_timestamp.saturating_add(advanced);
        time.previous_tick_time += advanced as f64;
    }

    fn enter_offline<S: Simulation + ?Sized>(
        &mut self,
        simulation: &mut S,
        wall: i64,
    ) -> Result<AdvanceOutcome, SchedulerError> {
        let start = simulation.time().tick_timestamp;
        let offline_ms = wall.saturating_sub(start).max(0);

        if !simulation.has_meaningful_work() {
            let mono = self.time.monotonic_ms();
            simulation.time_mut().resync(wall, mono);
            info!(skipped_ms = offline_ms, "no meaningful work; offline backlog skipped");
            return Ok(AdvanceOutcome::BacklogSkipped {
                skipped_ms: offline_ms,
            });
        }

        let diagnostics = simulation.diagnostics();
        info!(
            offline_ms,
            action = diagnostics.active_action.as_deref().unwrap_or("none"),
            "entering offline catch-up"
        );
        self.engine
            .arm(start, simulation.capture(), diagnostics.active_action);
        self.mode = ClockMode::Offline;
        simulation.set_offline(true);
        self.advance_offline(simulation)
    }

    fn advance_offline<S: Simulation + ?Sized>(
        &mut self,
        simulation: &mut S,
    ) -> Result<AdvanceOutcome, SchedulerError> {
        let wall = self.time.wall_now_ms();
        let start = self.engine.session().start_time();
        let batch = match self.engine.run_batch(simulation, &self.time, wall) {
            Ok(batch) => batch,
            Err(failure) => {
                // Ticks that ran before the fault stay applied, so their
                // time is committed too.
                simulation.time_mut().tick_timestamp = start.saturating_add(failure.processed_ms);
                self.mode = ClockMode::Stopped;
                simulation.set_offline(false);
                error!(
                    ticks_completed = failure.ticks_completed,
                    diagnostics = %failure.diagnostics,
                    source = %failure.source,
                    "offline catch-up failed; clock stopped"
                );
                return Err(failure.into());
            }
        };

        let session = self.engine.session();
        simulation.time_mut().tick_timestamp = session
            .start_time()
            .saturating_add(session.time_processed());

        if self.engine.is_caught_up(wall) {
            return Ok(AdvanceOutcome::OfflineComplete(
                self.exit_offline(simulation, wall),
            ));
        }
        Ok(AdvanceOutcome::OfflineBatch(batch))
    }

    #[allow(clippy::arithmetic_side_effects, clippy::cast_precision_loss)]
    fn exit_offline<S: Simulation + ?Sized>(&mut self, simulation: &mut S, wall: i64) -> OfflineReport {
        let report = self.engine.finish(wall, &simulation.capture());
        let mono = self.time.monotonic_ms();
        simulation.time_mut().resync(
            wall.saturating_sub(report.carried_ms),
            mono - report.carried_ms as f64,
        );
        simulation.set_offline(false);
        self.mode = ClockMode::Online;
        info!(
            offline_ms = report.offline_ms,
            processed_ms = report.processed_ms,
            discarded_ms = report.discarded_ms,
            ticks = report.ticks,
            gains = report.delta.gains.len(),
            losses = report.delta.losses.len(),
            "offline catch-up complete"
        );
        report
    }
}
