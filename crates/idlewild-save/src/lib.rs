//! Save strings for the Idlewild simulation.
//!
//! Turns a [`GameState`](idlewild_state::GameState) into a single
//! text-safe string and back, reads cheap header previews, bridges legacy
//! JSON saves and stores the results.
//!
//! # Modules
//!
//! - [`codec`] -- [`SaveCodec`], the full encode/decode entry point
//! - [`header`] -- [`SaveHeader`] and [`HeaderReader`] for previews
//! - [`envelope`] -- zlib + base64 wrapping and format detection
//! - [`manifest`] -- [`ManifestCache`], the memoized legacy ID manifest
//! - [`store`] -- [`SaveStore`] backends and slot previews
//! - [`session`] -- [`SaveSession`] slot keys
//! - [`error`] -- [`SaveError`] and [`StoreError`]

pub mod codec;
pub mod envelope;
pub mod error;
pub mod header;
pub mod manifest;
pub mod session;
pub mod store;

pub use codec::{LoadedSave, SaveCodec};
pub use error::{SaveError, StoreError};
pub use header::{HeaderReader, SaveFormat, SaveHeader};
pub use manifest::{FileManifestSource, IdManifestSource, ManifestCache};
pub use session::SaveSession;
pub use store::{FileStore, MemoryStore, SaveStore, SlotPreview, preview_slots};
