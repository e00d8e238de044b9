//! The collaborator the clock drives.
//!
//! The scheduler knows nothing about skills, items or combat. It asks a
//! [`Simulation`] to run one tick at a time and to answer a few questions
//! about whether ticking is currently worthwhile.

use crate::error::{Diagnostics, TickFault};
use crate::snapshot::Snapshot;
use crate::time::SimulationTime;

/// A state graph advanced in fixed quanta.
///
/// The clock calls [`tick`](Simulation::tick) only between its own
/// bookkeeping steps, so a save taken between two `advance` calls always
/// sees a fully ticked state.
pub trait Simulation {
    /// Run one fixed quantum of simulated progress.
    ///
    /// # Errors
    ///
    /// Returns [`TickFault`] when the tick cannot be completed. The clock
    /// stops on the first fault.
    fn tick(&mut self) -> Result<(), TickFault>;

    /// Whether ticking currently changes anything. An idle player's absence
    /// is skipped instead of simulated.
    fn has_meaningful_work(&self) -> bool;

    /// Whether the current activity forbids entering offline mode (for
    /// example, a live encounter in progress).
    fn blocks_offline(&self) -> bool {
        false
    }

    /// Value copy of the trackable state.
    fn capture(&self) -> Snapshot;

    /// State dump used in failure reports.
    fn diagnostics(&self) -> Diagnostics;

    /// The scheduler timestamps kept on the state.
    fn time(&self) -> &SimulationTime;

    /// Mutable access to the scheduler timestamps.
    fn time_mut(&mut self) -> &mut SimulationTime;

    /// Notification that offline catch-up started (`true`) or ended.
    fn set_offline(&mut self, _offline: bool) {}
}
