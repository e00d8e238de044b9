//! Simulation scheduling for Idlewild: the fixed-tick clock, offline
//! catch-up and the before/after reporting around it.
//!
//! Nothing in this crate knows what a tick does. The game state implements
//! [`Simulation`] and the host drives [`SimulationClock::advance`] from a
//! periodic callback.
//!
//! # Modules
//!
//! - [`clock`] -- [`SimulationClock`], the online/offline/stopped state
//!   machine
//! - [`offline`] -- [`OfflineCatchupEngine`] and its adaptive batch size
//! - [`snapshot`] -- [`Snapshot`] capture and diffing
//! - [`simulation`] -- the [`Simulation`] collaborator trait
//! - [`time`] -- wall/monotonic [`TimeSource`]s and [`SimulationTime`]
//! - [`autosave`] -- [`AutosavePolicy`]
//! - [`config`] -- Configuration loading from `idlewild-config.yaml`
//! - [`error`] -- Tick faults and [`SchedulerError`]

pub mod autosave;
pub mod clock;
pub mod config;
pub mod error;
pub mod offline;
pub mod simulation;
pub mod snapshot;
pub mod time;

pub use autosave::AutosavePolicy;
pub use clock::{AdvanceOutcome, ClockMode, SimulationClock};
pub use config::{
    ClockConfig, ConfigError, LoggingConfig, OfflineConfig, PersistenceConfig, SimulationConfig,
};
pub use error::{Diagnostics, OfflineTickFailure, SchedulerError, TickFault};
pub use offline::{BatchReport, OfflineCatchupEngine, OfflineReport, OfflineSession};
pub use simulation::Simulation;
pub use snapshot::{Change, Snapshot, SnapshotDelta, TrackedKey, TrackedKind};
pub use time::{ManualTimeSource, SimulationTime, SystemTimeSource, TimeSource};
