//! Where save strings live between sessions.
//!
//! A [`SaveStore`] only moves opaque strings; encoding stays in
//! [`SaveCodec`](crate::codec::SaveCodec). [`preview_slots`] reads just the
//! headers for a slot-selection screen.

use std::collections::BTreeMap;
use std::path::PathBuf;

use idlewild_state::IdManifest;
use tracing::{debug, warn};

use crate::error::{SaveError, StoreError};
use crate::header::{HeaderReader, SaveHeader};
use crate::session::SaveSession;

/// Key-value storage for save strings.
pub trait SaveStore {
    /// The string stored under `key`, if any.
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `save` under `key`, replacing what was there.
    fn write(&mut self, key: &str, save: &str) -> Result<(), StoreError>;

    /// The string stored under `key`, or [`StoreError::NotFound`].
    fn require(&self, key: &str) -> Result<String, StoreError> {
        self.read(key)?
            .ok_or_else(|| StoreError::NotFound(key.to_owned()))
    }
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saves: BTreeMap<String, String>,
}

impl MemoryStore {
    /// An empty store.
    pub const fn new() -> Self {
        Self {
            saves: BTreeMap::new(),
        }
    }
}

impl SaveStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.saves.get(key).cloned())
    }

    fn write(&mut self, key: &str, save: &str) -> Result<(), StoreError> {
        self.saves.insert(key.to_owned(), save.to_owned());
        Ok(())
    }
}

/// One `.sav` file per key in a directory.
///
/// Writes go to a temporary file that is renamed over the old save, so a
/// crash mid-write leaves the previous save intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.sav"))
    }
}

impl SaveStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(save) => Ok(Some(save)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&mut self, key: &str, save: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path(key);
        let staging = path.with_extension("sav.tmp");
        std::fs::write(&staging, save)?;
        std::fs::rename(&staging, &path)?;
        debug!(path = %path.display(), bytes = save.len(), "save written");
        Ok(())
    }
}

/// Header preview of one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotPreview {
    /// The slot.
    pub session: SaveSession,
    /// `None` for an empty slot; otherwise the header or why it could not
    /// be read.
    pub header: Option<Result<SaveHeader, SaveError>>,
}

/// Read the header of every slot in `sessions`.
///
/// One unreadable slot does not hide the others. Storage errors are
/// returned as-is.
pub fn preview_slots(
    store: &impl SaveStore,
    sessions: &[SaveSession],
    manifest: Option<&IdManifest>,
) -> Result<Vec<SlotPreview>, StoreError> {
    let reader = HeaderReader::new(manifest);
    sessions
        .iter()
        .map(|session| {
            let header = store.read(&session.key())?.map(|raw| reader.read(&raw));
            if let Some(Err(err)) = &header {
                warn!(slot = session.slot_id, error = %err, "unreadable save slot");
            }
            Ok(SlotPreview {
                session: session.clone(),
                header,
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.read("a").unwrap(), None);
        store.write("a", "one").unwrap();
        store.write("a", "two").unwrap();
        assert_eq!(store.require("a").unwrap(), "two");
        assert!(matches!(store.require("b"), Err(StoreError::NotFound(key)) if key == "b"));
    }

    #[test]
    fn file_store_replaces_saves() {
        let dir = std::env::temp_dir().join(format!("idlewild-store-{}", std::process::id()));
        let mut store = FileStore::new(&dir);
        assert_eq!(store.read("main_save_0").unwrap(), None);
        store.write("main_save_0", "first").unwrap();
        store.write("main_save_0", "second").unwrap();
        assert_eq!(store.read("main_save_0").unwrap().as_deref(), Some("second"));
        assert!(!dir.join("main_save_0.sav.tmp").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn previews_report_each_slot() {
        let mut store = MemoryStore::new();
        let sessions = [SaveSession::new(0, "main"), SaveSession::new(1, "main")];
        store.write(&sessions[1].key(), "not a save").unwrap();

        let previews = preview_slots(&store, &sessions, None).unwrap();
        assert_eq!(previews.len(), 2);
        assert!(previews[0].header.is_none());
        assert!(matches!(previews[1].header, Some(Err(SaveError::Corrupt { .. }))));
    }
}
