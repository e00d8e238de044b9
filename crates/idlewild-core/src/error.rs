//! Scheduler error types.
//!
//! A tick failure never unwinds into the host loop. The clock stops,
//! returns one of these values, and stays stopped until the host calls
//! [`SimulationClock::restart`](crate::clock::SimulationClock::restart).

use std::fmt;

use serde::Serialize;

use crate::config::ConfigError;

/// A single tick could not be completed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("tick failed: {message}")]
pub struct TickFault {
    /// Description of what went wrong.
    pub message: String,
}

impl TickFault {
    /// Create a fault with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// State dump attached to an offline tick failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// The action being run, if any.
    pub active_action: Option<String>,
    /// Equipped items.
    pub equipment: Vec<String>,
    /// Content namespaces loaded besides the base game.
    pub extensions: Vec<String>,
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "action={} equipment=[{}] extensions=[{}]",
            self.active_action.as_deref().unwrap_or("none"),
            self.equipment.join(", "),
            self.extensions.join(", ")
        )
    }
}

/// A tick failed during offline catch-up.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("offline catch-up failed after {ticks_completed} ticks ({diagnostics}): {source}")]
pub struct OfflineTickFailure {
    /// Ticks completed in the session before the failure.
    pub ticks_completed: u64,
    /// Backlog milliseconds those ticks covered.
    pub processed_ms: i64,
    /// State dump taken at the failure.
    pub diagnostics: Diagnostics,
    /// The underlying fault.
    pub source: TickFault,
}

/// Errors surfaced by [`SimulationClock`](crate::clock::SimulationClock).
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// A tick failed during offline catch-up.
    #[error(transparent)]
    OfflineTick(Box<OfflineTickFailure>),

    /// A tick failed during online play.
    #[error("online tick failed after {ticks_completed} ticks this invocation: {source}")]
    OnlineTick {
        /// Ticks completed in the invocation before the failure.
        ticks_completed: u32,
        /// The underlying fault.
        source: TickFault,
    },

    /// The clock was built from an unusable configuration.
    #[error("invalid scheduler configuration: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },
}

impl From<OfflineTickFailure> for SchedulerError {
    fn from(failure: OfflineTickFailure) -> Self {
        Self::OfflineTick(Box::new(failure))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_failure_message_carries_diagnostics() {
        let failure = OfflineTickFailure {
            ticks_completed: 42,
            processed_ms: 2_100,
            diagnostics: Diagnostics {
                active_action: Some("idlewild:chop_oak".to_owned()),
                equipment: vec!["idlewild:bronze_axe".to_owned()],
                extensions: vec!["gems_mod".to_owned()],
            },
            source: TickFault::new("inventory full"),
        };
        let message = SchedulerError::from(failure).to_string();
        assert!(message.contains("42 ticks"));
        assert!(message.contains("idlewild:chop_oak"));
        assert!(message.contains("gems_mod"));
        assert!(message.contains("inventory full"));
    }
}
