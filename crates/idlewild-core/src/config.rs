//! Configuration loading and typed config structures for the Idlewild
//! simulation.
//!
//! The canonical configuration lives in `idlewild-config.yaml` next to the
//! binary. Every field has a default, so an empty file (or no file at all)
//! yields a working configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The values parsed but are not usable together.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `idlewild-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Tick interval and online/offline thresholds.
    #[serde(default)]
    pub clock: ClockConfig,

    /// Offline catch-up batching.
    #[serde(default)]
    pub offline: OfflineConfig,

    /// Save location and autosave cadence.
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `IDLEWILD_SAVE_DIR` overrides `persistence.save_dir` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.persistence.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| {
            Err(ConfigError::Invalid {
                reason: reason.to_owned(),
            })
        };
        if self.clock.tick_interval_ms == 0 {
            return invalid("clock.tick_interval_ms must be at least 1");
        }
        if self.clock.max_ticks_per_invocation == 0 {
            return invalid("clock.max_ticks_per_invocation must be at least 1");
        }
        if self.clock.offline_exit_threshold_ms >= self.clock.offline_entry_threshold_ms {
            return invalid("clock.offline_exit_threshold_ms must be below the entry threshold");
        }
        if !(self.offline.safety_ratio > 0.0 && self.offline.safety_ratio <= 1.0) {
            return invalid("offline.safety_ratio must be in (0, 1]");
        }
        if self.offline.initial_tick_rate == 0 || self.offline.max_tick_rate == 0 {
            return invalid("offline tick rates must be at least 1");
        }
        if self.offline.initial_tick_rate > self.offline.max_tick_rate {
            return invalid("offline.initial_tick_rate must not exceed offline.max_tick_rate");
        }
        Ok(())
    }
}

/// Fixed-tick clock configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClockConfig {
    /// Simulated milliseconds per tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Wall-clock lag beyond which the clock switches to offline catch-up.
    #[serde(default = "default_offline_entry_threshold_ms")]
    pub offline_entry_threshold_ms: u64,

    /// Backlog below which offline catch-up counts as caught up.
    #[serde(default = "default_offline_exit_threshold_ms")]
    pub offline_exit_threshold_ms: u64,

    /// Longest absence that is simulated; anything beyond is discarded.
    #[serde(default = "default_max_offline_ms")]
    pub max_offline_ms: u64,

    /// Ceiling on ticks run by a single online invocation.
    #[serde(default = "default_max_ticks_per_invocation")]
    pub max_ticks_per_invocation: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            offline_entry_threshold_ms: default_offline_entry_threshold_ms(),
            offline_exit_threshold_ms: default_offline_exit_threshold_ms(),
            max_offline_ms: default_max_offline_ms(),
            max_ticks_per_invocation: default_max_ticks_per_invocation(),
        }
    }
}

/// Offline catch-up configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OfflineConfig {
    /// Ticks run by the first batch after entering offline mode.
    #[serde(default = "default_initial_tick_rate")]
    pub initial_tick_rate: u32,

    /// Fraction of a tick interval each batch may spend running ticks.
    #[serde(default = "default_safety_ratio")]
    pub safety_ratio: f64,

    /// Upper bound on the adaptive batch size.
    #[serde(default = "default_max_tick_rate")]
    pub max_tick_rate: u32,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            initial_tick_rate: default_initial_tick_rate(),
            safety_ratio: default_safety_ratio(),
            max_tick_rate: default_max_tick_rate(),
        }
    }
}

/// Persistence configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersistenceConfig {
    /// Directory holding one file per save key.
    #[serde(default = "default_save_dir")]
    pub save_dir: PathBuf,

    /// Prefix shared by every key this installation writes.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Save slot loaded at startup.
    #[serde(default)]
    pub slot: u32,

    /// Milliseconds between autosaves.
    #[serde(default = "default_autosave_interval_ms")]
    pub autosave_interval_ms: u64,

    /// JSON file mapping legacy numeric IDs to namespaced IDs.
    #[serde(default)]
    pub legacy_manifest_path: Option<PathBuf>,
}

impl PersistenceConfig {
    /// Override the save directory with `IDLEWILD_SAVE_DIR` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("IDLEWILD_SAVE_DIR") {
            self.save_dir = PathBuf::from(val);
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            save_dir: default_save_dir(),
            key_prefix: default_key_prefix(),
            slot: 0,
            autosave_interval_ms: default_autosave_interval_ms(),
            legacy_manifest_path: None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

const fn default_tick_interval_ms() -> u64 {
    50
}

const fn default_offline_entry_threshold_ms() -> u64 {
    60_000
}

const fn default_offline_exit_threshold_ms() -> u64 {
    500
}

const fn default_max_offline_ms() -> u64 {
    86_400_000
}

const fn default_max_ticks_per_invocation() -> u32 {
    1_200
}

const fn default_initial_tick_rate() -> u32 {
    1_000
}

const fn default_safety_ratio() -> f64 {
    0.8
}

const fn default_max_tick_rate() -> u32 {
    72_000
}

fn default_save_dir() -> PathBuf {
    PathBuf::from("saves")
}

fn default_key_prefix() -> String {
    "idlewild".to_owned()
}

const fn default_autosave_interval_ms() -> u64 {
    10_000
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.clock.tick_interval_ms, 50);
        assert_eq!(config.clock.max_offline_ms, 86_400_000);
        assert_eq!(config.offline.initial_tick_rate, 1_000);
        assert_eq!(config.persistence.autosave_interval_ms, 10_000);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
clock:
  tick_interval_ms: 1000
  offline_entry_threshold_ms: 30000
  offline_exit_threshold_ms: 250
  max_offline_ms: 3600000
  max_ticks_per_invocation: 10

offline:
  initial_tick_rate: 200
  safety_ratio: 0.5
  max_tick_rate: 5000

persistence:
  key_prefix: "test"
  slot: 2
  autosave_interval_ms: 2000
  legacy_manifest_path: "legacy-ids.json"

logging:
  level: "debug"
  json: true
"#;
        let config = SimulationConfig::parse(yaml).unwrap();
        assert_eq!(config.clock.tick_interval_ms, 1000);
        assert_eq!(config.clock.max_ticks_per_invocation, 10);
        assert!((config.offline.safety_ratio - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.persistence.slot, 2);
        assert_eq!(
            config.persistence.legacy_manifest_path,
            Some(PathBuf::from("legacy-ids.json"))
        );
        assert!(config.logging.json);
    }

    #[test]
    fn parse_minimal_and_empty_yaml() {
        let config = SimulationConfig::parse("clock:\n  tick_interval_ms: 100\n").unwrap();
        assert_eq!(config.clock.tick_interval_ms, 100);
        assert_eq!(config.clock.offline_exit_threshold_ms, 500);

        let config = SimulationConfig::parse("").unwrap();
        assert_eq!(config.clock, ClockConfig::default());
    }

    #[test]
    fn rejects_unusable_values() {
        assert!(matches!(
            SimulationConfig::parse("clock:\n  tick_interval_ms: 0\n"),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            SimulationConfig::parse("offline:\n  safety_ratio: 1.5\n"),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            SimulationConfig::parse(
                "clock:\n  offline_entry_threshold_ms: 100\n  offline_exit_threshold_ms: 100\n"
            ),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        assert!(matches!(
            SimulationConfig::parse("clock: [unclosed"),
            Err(ConfigError::Yaml { .. })
        ));
    }
}
