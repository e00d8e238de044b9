//! Host binary for the Idlewild simulation.
//!
//! Wires the simulation clock, the game state and the save slot together
//! and drives them from a periodic timer until interrupted.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `idlewild-config.yaml` (or `IDLEWILD_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Register the built-in content
//! 4. Install the process-wide legacy ID manifest cache
//! 5. Preview and load the configured save slot, or start a new character
//! 6. Create the simulation clock over the system clocks
//! 7. Run the host loop until Ctrl-C, then write an exit save

mod error;
mod host;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use idlewild_core::{
    LoggingConfig, SimulationClock, SimulationConfig, SimulationTime, SystemTimeSource, TimeSource,
};
use idlewild_save::{
    FileManifestSource, FileStore, ManifestCache, SaveCodec, SaveSession, SaveStore, preview_slots,
};
use idlewild_state::{Game, GameState, Profile, starting_registries};
use idlewild_types::{NamespacedId, Registries};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::host::Host;

const DEFAULT_CONFIG_PATH: &str = "idlewild-config.yaml";
const DEFAULT_LEGACY_MANIFEST_PATH: &str = "legacy-ids.json";
const DEFAULT_CHARACTER_NAME: &str = "Wanderer";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let config = load_config().context("loading configuration")?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!(
        tick_interval_ms = config.clock.tick_interval_ms,
        offline_entry_threshold_ms = config.clock.offline_entry_threshold_ms,
        max_offline_ms = config.clock.max_offline_ms,
        save_dir = %config.persistence.save_dir.display(),
        "idlewild-engine starting"
    );

    // 3. Built-in content.
    let registries = Arc::new(starting_registries().map_err(EngineError::from)?);
    info!(
        skills = registries.skills.len(),
        items = registries.items.len(),
        actions = registries.actions.len(),
        "content registered"
    );

    // 4. Legacy manifest cache.
    let manifest_path = config
        .persistence
        .legacy_manifest_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LEGACY_MANIFEST_PATH));
    if !ManifestCache::install_global(ManifestCache::new(FileManifestSource::new(&manifest_path))) {
        warn!("legacy manifest cache was already installed");
    }
    let manifests = ManifestCache::global()
        .context("legacy manifest cache missing after install")?;

    // 5. Load or create the game.
    let session = SaveSession::new(config.persistence.slot, config.persistence.key_prefix.clone());
    let store = FileStore::new(&config.persistence.save_dir);
    let time = SystemTimeSource::new();
    let game = load_game(&store, &session, &registries, manifests, &time)
        .with_context(|| format!("loading save slot {}", session.slot_id))?;

    // 6. Simulation clock.
    let clock = SimulationClock::new(&config, time).map_err(EngineError::from)?;

    // 7. Host loop.
    let period = Duration::from_millis(config.clock.tick_interval_ms);
    let mut host = Host::new(
        clock,
        game,
        store,
        session,
        config.persistence.autosave_interval_ms,
    );
    host.run(period, shutdown_signal()).await?;
    let summary = host.summary();

    info!(
        steps = summary.steps,
        saves = summary.saves,
        mode = ?host.clock().mode(),
        total_level = host.game().state().total_level(),
        "idlewild-engine shutdown complete"
    );
    Ok(())
}

/// Load configuration from `IDLEWILD_CONFIG` or `idlewild-config.yaml`.
///
/// A missing file yields the defaults.
fn load_config() -> Result<SimulationConfig, EngineError> {
    let path = std::env::var_os("IDLEWILD_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if path.exists() {
        Ok(SimulationConfig::from_file(&path)?)
    } else {
        Ok(SimulationConfig::parse("")?)
    }
}

/// Install the global tracing subscriber. `RUST_LOG` wins over the
/// configured level.
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if config.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Decode the slot's save, or build a new character when the slot is
/// empty.
fn load_game(
    store: &FileStore,
    session: &SaveSession,
    registries: &Arc<Registries>,
    manifests: &ManifestCache,
    time: &impl TimeSource,
) -> Result<Game, EngineError> {
    let cached = manifests.cached();
    for preview in preview_slots(store, std::slice::from_ref(session), cached.as_deref())? {
        match preview.header {
            Some(Ok(header)) => info!(
                slot = preview.session.slot_id,
                character = %header.character_name,
                total_level = header.total_level,
                format = ?header.format,
                namespaces = ?header.active_namespaces,
                "save slot found"
            ),
            Some(Err(err)) => warn!(slot = preview.session.slot_id, error = %err, "save slot unreadable"),
            None => info!(slot = preview.session.slot_id, "save slot empty"),
        }
    }

    let Some(raw) = store.read(&session.key())? else {
        return new_game(registries, time);
    };
    let loaded = SaveCodec::new().decode(&raw, registries, manifests)?;
    for miss in &loaded.unresolved {
        warn!(kind = %miss.kind, id = %miss.id, "dropped content missing from this build");
    }
    info!(
        character = %loaded.state.profile.character_name,
        format = ?loaded.format,
        unresolved = loaded.unresolved.len(),
        "save loaded"
    );
    Ok(Game::new(loaded.state, Arc::clone(registries)))
}

/// A new character named by `IDLEWILD_CHARACTER`, optionally starting the
/// action named by `IDLEWILD_START_ACTION`.
fn new_game(registries: &Arc<Registries>, time: &impl TimeSource) -> Result<Game, EngineError> {
    let name = std::env::var("IDLEWILD_CHARACTER")
        .unwrap_or_else(|_| DEFAULT_CHARACTER_NAME.to_owned());
    let state = GameState::new(
        Profile::new(name, NamespacedId::base("standard")),
        registries,
        SimulationTime::starting_at(time.wall_now_ms(), time.monotonic_ms()),
    );
    let mut game = Game::new(state, Arc::clone(registries));
    if let Ok(raw) = std::env::var("IDLEWILD_START_ACTION") {
        match NamespacedId::parse(&raw) {
            Ok(action) => game.start_action(&action)?,
            Err(err) => warn!(action = %raw, error = %err, "ignoring malformed start action"),
        }
    }
    info!(character = %game.state().profile.character_name, "new character created");
    Ok(game)
}

/// Resolves on Ctrl-C. If the handler cannot be installed, never resolves.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
