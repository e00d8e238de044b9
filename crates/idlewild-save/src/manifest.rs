//! The legacy ID manifest, fetched once per process.
//!
//! Legacy saves use historical numeric IDs that only mean something through
//! an [`IdManifest`] published outside the game. Fetching it is the only
//! blocking I/O on any load path, so [`ManifestCache`] memoizes the first
//! successful fetch. A failed fetch is not remembered: the next legacy
//! load tries again.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use idlewild_state::IdManifest;
use tracing::{info, warn};

use crate::error::SaveError;

/// Somewhere an [`IdManifest`] can be fetched from.
pub trait IdManifestSource: Send + Sync {
    /// Fetch the manifest.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::ManifestUnavailable`] when it cannot be read.
    fn fetch(&self) -> Result<IdManifest, SaveError>;
}

/// Reads the manifest from a JSON file.
#[derive(Debug, Clone)]
pub struct FileManifestSource {
    path: PathBuf,
}

impl FileManifestSource {
    /// Source reading `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl IdManifestSource for FileManifestSource {
    fn fetch(&self) -> Result<IdManifest, SaveError> {
        let unavailable = |reason: String| SaveError::ManifestUnavailable { reason };
        let text = std::fs::read_to_string(&self.path)
            .map_err(|err| unavailable(format!("{}: {err}", self.path.display())))?;
        serde_json::from_str(&text)
            .map_err(|err| unavailable(format!("{}: {err}", self.path.display())))
    }
}

/// Memoizes the first successful manifest fetch.
pub struct ManifestCache {
    source: Box<dyn IdManifestSource>,
    manifest: OnceLock<Arc<IdManifest>>,
}

impl std::fmt::Debug for ManifestCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManifestCache")
            .field("loaded", &self.manifest.get().is_some())
            .finish_non_exhaustive()
    }
}

static GLOBAL: OnceLock<ManifestCache> = OnceLock::new();

impl ManifestCache {
    /// Cache over `source`.
    pub fn new(source: impl IdManifestSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            manifest: OnceLock::new(),
        }
    }

    /// A cache that already holds `manifest`.
    pub fn preloaded(manifest: IdManifest) -> Self {
        Self {
            source: Box::new(Unavailable),
            manifest: OnceLock::from(Arc::new(manifest)),
        }
    }

    /// The manifest, fetching it on first use.
    pub fn get(&self) -> Result<Arc<IdManifest>, SaveError> {
        if let Some(manifest) = self.manifest.get() {
            return Ok(Arc::clone(manifest));
        }
        match self.source.fetch() {
            Ok(fetched) => {
                info!(
                    skills = fetched.skills.len(),
                    items = fetched.items.len(),
                    "legacy ID manifest loaded"
                );
                Ok(Arc::clone(self.manifest.get_or_init(|| Arc::new(fetched))))
            }
            Err(err) => {
                warn!(error = %err, "legacy ID manifest fetch failed");
                Err(err)
            }
        }
    }

    /// The manifest if it was already fetched. Never fetches.
    pub fn cached(&self) -> Option<Arc<IdManifest>> {
        self.manifest.get().cloned()
    }

    /// Install the process-wide cache. Returns `false` if one was already
    /// installed.
    pub fn install_global(cache: Self) -> bool {
        GLOBAL.set(cache).is_ok()
    }

    /// The process-wide cache, if installed.
    pub fn global() -> Option<&'static Self> {
        GLOBAL.get()
    }
}

/// Source for a cache that is only ever preloaded.
struct Unavailable;

impl IdManifestSource for Unavailable {
    fn fetch(&self) -> Result<IdManifest, SaveError> {
        Err(SaveError::ManifestUnavailable {
            reason: "no manifest source configured".to_owned(),
        })
    }
}
