//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure the host can hit during startup,
//! ticking and saving, so `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: idlewild_core::ConfigError,
    },

    /// The scheduler could not be built or a tick failed.
    #[error("scheduler error: {source}")]
    Scheduler {
        /// The underlying scheduler error.
        #[from]
        source: idlewild_core::SchedulerError,
    },

    /// Built-in content failed to register.
    #[error("content error: {source}")]
    Content {
        /// The underlying state error.
        #[from]
        source: idlewild_state::StateError,
    },

    /// Reading or writing a save slot failed.
    #[error("save store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: idlewild_save::StoreError,
    },

    /// A save string could not be encoded or decoded.
    #[error("save error: {source}")]
    Save {
        /// The underlying save error.
        #[from]
        source: idlewild_save::SaveError,
    },
}
