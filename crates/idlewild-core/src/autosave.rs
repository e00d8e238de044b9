//! Autosave cadence.
//!
//! Saving is a side effect the host triggers between `advance` calls, never
//! from inside a tick. The policy only answers "is a save due now?".

/// Interval-based autosave with explicit requests.
#[derive(Debug, Clone, PartialEq)]
pub struct AutosavePolicy {
    interval_ms: f64,
    last_save: f64,
    requested: bool,
}

impl AutosavePolicy {
    /// Create a policy whose first autosave falls one interval after
    /// `now` (monotonic milliseconds).
    #[allow(clippy::cast_precision_loss)]
    pub fn new(interval_ms: u64, now: f64) -> Self {
        Self {
            interval_ms: interval_ms as f64,
            last_save: now,
            requested: false,
        }
    }

    /// Ask for a save at the next opportunity.
    pub const fn request(&mut self) {
        self.requested = true;
    }

    /// Whether a save is due at `now`.
    #[allow(clippy::arithmetic_side_effects)]
    pub fn is_due(&self, now: f64) -> bool {
        self.requested || now - self.last_save >= self.interval_ms
    }

    /// Record that a save completed at `now`.
    pub const fn mark_saved(&mut self, now: f64) {
        self.last_save = now;
        self.requested = false;
    }
}
