//! Time sources and persisted simulation timestamps.
//!
//! The scheduler reads two clocks. The wall clock (epoch milliseconds) can
//! jump, for example across device sleep, and a jump there is what signals
//! an absence. The monotonic counter cannot jump and paces online ticking.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use chrono::Utc;

/// Source of wall-clock and monotonic time.
pub trait TimeSource {
    /// Wall-clock time in milliseconds since the Unix epoch.
    fn wall_now_ms(&self) -> i64;

    /// Monotonic time in milliseconds since an arbitrary origin.
    fn monotonic_ms(&self) -> f64;
}

impl<T: TimeSource + ?Sized> TimeSource for Rc<T> {
    fn wall_now_ms(&self) -> i64 {
        (**self).wall_now_ms()
    }

    fn monotonic_ms(&self) -> f64 {
        (**self).monotonic_ms()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn wall_now_ms(&self) -> i64 {
        (**self).wall_now_ms()
    }

    fn monotonic_ms(&self) -> f64 {
        (**self).monotonic_ms()
    }
}

/// The host's real clocks.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    /// Create a source whose monotonic origin is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn wall_now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    #[allow(clippy::arithmetic_side_effects)]
    fn monotonic_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Hand-driven clocks for tests and replays.
///
/// Share one instance between the clock under test and the test body with
/// an [`Rc`].
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    wall: Cell<i64>,
    monotonic: Cell<f64>,
}

impl ManualTimeSource {
    /// Create a source at the given wall and monotonic readings.
    pub const fn new(wall_ms: i64, monotonic_ms: f64) -> Self {
        Self {
            wall: Cell::new(wall_ms),
            monotonic: Cell::new(monotonic_ms),
        }
    }

    /// Move both clocks forward by `ms`.
    #[allow(clippy::cast_precision_loss)]
    pub fn advance(&self, ms: i64) {
        self.advance_wall(ms);
        self.advance_monotonic(ms as f64);
    }

    /// Move only the wall clock, as a device sleep would.
    pub fn advance_wall(&self, ms: i64) {
        self.wall.set(self.wall.get().saturating_add(ms));
    }

    /// Move only the monotonic counter.
    #[allow(clippy::arithmetic_side_effects)]
    pub fn advance_monotonic(&self, ms: f64) {
        self.monotonic.set(self.monotonic.get() + ms);
    }

    /// Set the wall clock.
    pub fn set_wall(&self, wall_ms: i64) {
        self.wall.set(wall_ms);
    }

    /// Set the monotonic counter.
    pub fn set_monotonic(&self, monotonic_ms: f64) {
        self.monotonic.set(monotonic_ms);
    }
}

impl TimeSource for ManualTimeSource {
    fn wall_now_ms(&self) -> i64 {
        self.wall.get()
    }

    fn monotonic_ms(&self) -> f64 {
        self.monotonic.get()
    }
}

/// Timestamps the scheduler keeps on the simulated state.
///
/// `tick_timestamp` and `save_timestamp` are persisted. `previous_tick_time`
/// is a reading of the monotonic counter and is only meaningful within one
/// process; it is reset when a save is loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimulationTime {
    /// Wall-clock instant up to which the state has been simulated.
    pub tick_timestamp: i64,
    /// Wall-clock instant of the last save.
    pub save_timestamp: i64,
    /// Monotonic reading up to which online ticks have been run.
    pub previous_tick_time: f64,
}

impl SimulationTime {
    /// Timestamps for a state that is current at `wall_ms` / `monotonic_ms`.
    pub const fn starting_at(wall_ms: i64, monotonic_ms: f64) -> Self {
        Self {
            tick_timestamp: wall_ms,
            save_timestamp: wall_ms,
            previous_tick_time: monotonic_ms,
        }
    }

    /// Snap both live timestamps to the given readings.
    pub const fn resync(&mut self, wall_ms: i64, monotonic_ms: f64) {
        self.tick_timestamp = wall_ms;
        self.previous_tick_time = monotonic_ms;
    }
}
