//! The host loop: periodic clock callbacks, autosave and the exit save.
//!
//! [`Host`] owns the running [`Game`] and everything around it. Each
//! timer firing calls [`Host::step`], which advances the clock once and
//! saves if the [`AutosavePolicy`] says so. Saves happen only here,
//! between `advance` calls, so a save never sees a half-run tick.
//!
//! A tick failure stops the clock. The host logs the failure report,
//! stops the action that failed, saves what was simulated up to the fault
//! and restarts online ticking from now.
//!
//! A save that cannot be written is logged and stays pending; the
//! simulation keeps running and the next step tries again.

use std::future::Future;
use std::time::Duration;

use idlewild_core::{AdvanceOutcome, AutosavePolicy, SimulationClock, TimeSource};
use idlewild_save::{SaveCodec, SaveSession, SaveStore};
use idlewild_state::Game;
use tracing::{debug, error, info, warn};

use crate::error::EngineError;

/// Totals reported when the host loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostSummary {
    /// Timer firings handled.
    pub steps: u64,
    /// Online ticks run.
    pub online_ticks: u64,
    /// Offline catch-up sessions completed.
    pub catchups: u64,
    /// Tick failures recovered from by restarting the clock.
    pub failures: u64,
    /// Saves written, the exit save included.
    pub saves: u64,
    /// Save attempts the store rejected.
    pub save_failures: u64,
}

/// Running game plus its scheduler and save slot.
#[derive(Debug)]
pub struct Host<T, St> {
    clock: SimulationClock<T>,
    game: Game,
    codec: SaveCodec,
    store: St,
    session: SaveSession,
    autosave: AutosavePolicy,
    summary: HostSummary,
}

impl<T: TimeSource, St: SaveStore> Host<T, St> {
    /// Bind `game` to `clock` and start the autosave interval from now.
    pub fn new(
        clock: SimulationClock<T>,
        mut game: Game,
        store: St,
        session: SaveSession,
        autosave_interval_ms: u64,
    ) -> Self {
        clock.attach(&mut game);
        let autosave = AutosavePolicy::new(autosave_interval_ms, clock.time_source().monotonic_ms());
        Self {
            clock,
            game,
            codec: SaveCodec::new(),
            store,
            session,
            autosave,
            summary: HostSummary::default(),
        }
    }

    /// The running game.
    pub const fn game(&self) -> &Game {
        &self.game
    }

    /// The scheduler.
    pub const fn clock(&self) -> &SimulationClock<T> {
        &self.clock
    }

    /// Totals so far.
    pub const fn summary(&self) -> HostSummary {
        self.summary
    }

    /// Handle one timer firing.
    pub fn step(&mut self) {
        self.summary.steps = self.summary.steps.saturating_add(1);
        match self.clock.advance(&mut self.game) {
            Ok(outcome) => self.record(&outcome),
            Err(err) => {
                error!(error = %err, "tick failed; stopping action and restarting clock");
                self.summary.failures = self.summary.failures.saturating_add(1);
                self.game.stop_action();
                self.autosave.request();
                self.save_if_due();
                self.clock.restart(&mut self.game);
                return;
            }
        }
        self.save_if_due();
    }

    fn record(&mut self, outcome: &AdvanceOutcome) {
        match outcome {
            AdvanceOutcome::Online { ticks } => {
                self.summary.online_ticks = self.summary.online_ticks.saturating_add(u64::from(*ticks));
            }
            AdvanceOutcome::OfflineBatch(batch) => {
                debug!(
                    ticks = batch.ticks,
                    tick_rate = batch.tick_rate,
                    backlog_ms = batch.backlog_ms,
                    "offline batch"
                );
            }
            AdvanceOutcome::OfflineComplete(report) => {
                self.summary.catchups = self.summary.catchups.saturating_add(1);
                for change in report.delta.gains.iter().chain(&report.delta.losses) {
                    info!(
                        kind = %change.key.kind,
                        id = %change.key.id,
                        amount = change.amount(),
                        "changed while away"
                    );
                }
                self.autosave.request();
            }
            AdvanceOutcome::BacklogSkipped { .. } => self.autosave.request(),
            AdvanceOutcome::Stopped => {}
        }
    }

    /// Save if the autosave policy says one is due. A failed write is
    /// logged and the save stays due.
    pub fn save_if_due(&mut self) {
        let now = self.clock.time_source().monotonic_ms();
        if !self.autosave.is_due(now) {
            return;
        }
        if let Err(err) = self.save_now() {
            self.summary.save_failures = self.summary.save_failures.saturating_add(1);
            self.autosave.request();
            warn!(slot = self.session.slot_id, error = %err, "save failed; will retry");
        }
    }

    /// Write the current state to the session's slot.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Save`] or [`EngineError::Store`] when the
    /// state cannot be encoded or written.
    pub fn save_now(&mut self) -> Result<(), EngineError> {
        let now_wall = self.clock.time_source().wall_now_ms();
        self.game.state_mut().time.save_timestamp = now_wall;
        let raw = self.codec.encode(self.game.state())?;
        self.store.write(&self.session.key(), &raw)?;
        self.autosave
            .mark_saved(self.clock.time_source().monotonic_ms());
        self.summary.saves = self.summary.saves.saturating_add(1);
        debug!(slot = self.session.slot_id, bytes = raw.len(), "game saved");
        Ok(())
    }

    /// Call [`step`](Self::step) every `period` until `shutdown`
    /// resolves, then write an exit save.
    ///
    /// # Errors
    ///
    /// Returns the exit save's error. Failures while running are logged
    /// and recovered from.
    pub async fn run(
        &mut self,
        period: Duration,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), EngineError> {
        let mut timer = tokio::time::interval(period);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tokio::pin!(shutdown);
        let period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX);
        info!(period_ms, slot = self.session.slot_id, "host loop starting");

        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => break,
                _ = timer.tick() => self.step(),
            }
        }

        self.save_now()?;
        info!(
            steps = self.summary.steps,
            online_ticks = self.summary.online_ticks,
            catchups = self.summary.catchups,
            failures = self.summary.failures,
            saves = self.summary.saves,
            save_failures = self.summary.save_failures,
            "host loop stopped"
        );
        Ok(())
    }
}
