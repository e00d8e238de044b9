//! Binary cursor and namespaced object codec for Idlewild saves.
//!
//! The save format is a flat little-endian byte stream. This crate owns
//! the primitives; it knows nothing about the game state it carries.
//!
//! # Modules
//!
//! - [`writer`] / [`reader`] -- the two halves of the binary cursor, with
//!   length-prefixed regions that readers can skip whole
//! - [`manifest`] -- per-save table of referenced namespaces and local IDs
//! - [`object`] -- [`SaveEncoder`] / [`SaveDecoder`], resolving references
//!   through caller-supplied registries
//! - [`ladder`] -- declarative `(version range, reader)` decode tables
//! - [`error`] -- [`CodecError`] and its format/version classification

pub mod error;
pub mod ladder;
pub mod manifest;
pub mod object;
pub mod reader;
pub mod writer;

pub use error::{CodecError, FailureKind};
pub use ladder::{FieldLadder, FieldReader, FieldStep, VersionRange};
pub use manifest::ReferenceManifest;
pub use object::{SaveDecoder, SaveEncoder, UnresolvedReference};
pub use reader::SaveReader;
pub use writer::SaveWriter;
