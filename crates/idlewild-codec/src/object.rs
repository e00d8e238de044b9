//! Namespaced object codec.
//!
//! [`SaveEncoder`] writes domain objects as compact `(namespace-index,
//! local-index)` pairs, interning them into a [`ReferenceManifest`].
//! [`SaveDecoder`] reads those pairs back and resolves them through a
//! caller-supplied [`Registry`]. An identifier the registry does not know
//! (removed content, uninstalled extension) becomes
//! [`Reference::Unresolved`] and is recorded; the cursor advances exactly
//! as far as it would have on success.

use core::ops::{Deref, DerefMut};

use idlewild_types::{Content, NamespacedId, ObjectKind, Reference, Registry};
use tracing::warn;

use crate::error::CodecError;
use crate::manifest::ReferenceManifest;
use crate::reader::SaveReader;
use crate::writer::SaveWriter;

/// A reference that could not be resolved during decode.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnresolvedReference {
    /// Kind of object the stream referred to.
    pub kind: ObjectKind,
    /// The identifier that did not resolve.
    pub id: NamespacedId,
}

/// Writer plus the reference manifest being built for the current save.
#[derive(Debug, Default)]
pub struct SaveEncoder {
    writer: SaveWriter,
    manifest: ReferenceManifest,
}

impl SaveEncoder {
    /// Create an encoder whose buffer is pre-sized to `hint` bytes.
    pub fn with_capacity(hint: usize) -> Self {
        Self {
            writer: SaveWriter::with_capacity(hint),
            manifest: ReferenceManifest::new(),
        }
    }

    /// Write a reference to a content object.
    pub fn write_ref<T: Content + ?Sized>(&mut self, object: &T) -> Result<(), CodecError> {
        self.write_id(object.id())
    }

    /// Write a reference to a raw identifier.
    pub fn write_id(&mut self, id: &NamespacedId) -> Result<(), CodecError> {
        let (namespace_index, local_index) = self.manifest.intern(id)?;
        self.writer.write_u16(namespace_index);
        self.writer.write_u32(local_index);
        Ok(())
    }

    /// Write `body` inside its own length-prefixed region.
    pub fn write_region(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<(), CodecError>,
    ) -> Result<(), CodecError> {
        self.writer.start_marking_write_region();
        body(self)?;
        self.writer.stop_marking_write_region()
    }

    /// The manifest built so far.
    pub const fn manifest(&self) -> &ReferenceManifest {
        &self.manifest
    }

    /// Mark a namespace active even if nothing references it yet.
    pub fn declare_namespace(&mut self, namespace: &str) -> Result<(), CodecError> {
        self.manifest.intern_namespace(namespace).map(|_index| ())
    }

    /// Finish encoding, returning the manifest and the body bytes.
    pub fn finish(self) -> Result<(ReferenceManifest, Vec<u8>), CodecError> {
        let body = self.writer.into_bytes()?;
        Ok((self.manifest, body))
    }
}

impl Deref for SaveEncoder {
    type Target = SaveWriter;

    fn deref(&self) -> &SaveWriter {
        &self.writer
    }
}

impl DerefMut for SaveEncoder {
    fn deref_mut(&mut self) -> &mut SaveWriter {
        &mut self.writer
    }
}

/// Reader plus the context every nested decode call needs: the stream's
/// schema version and its reference manifest.
#[derive(Debug)]
pub struct SaveDecoder<'a> {
    reader: SaveReader<'a>,
    manifest: &'a ReferenceManifest,
    version: u32,
    unresolved: Vec<UnresolvedReference>,
}

impl<'a> SaveDecoder<'a> {
    /// Create a decoder for a body written at `version`.
    pub const fn new(reader: SaveReader<'a>, manifest: &'a ReferenceManifest, version: u32) -> Self {
        Self {
            reader,
            manifest,
            version,
            unresolved: Vec::new(),
        }
    }

    /// Schema version the stream was written at.
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Read a reference and resolve it through `registry`.
    pub fn read_ref<R: Registry>(&mut self, registry: &R) -> Result<Reference<R::Object>, CodecError> {
        let id = self.read_id()?;
        Ok(self.resolve(registry, id))
    }

    /// Resolve an identifier read outside the body (the header's gamemode)
    /// and record a miss like [`read_ref`](Self::read_ref) does.
    pub fn resolve<R: Registry>(&mut self, registry: &R, id: NamespacedId) -> Reference<R::Object> {
        if let Some(object) = registry.resolve(&id) {
            return Reference::Resolved(object);
        }
        warn!(kind = %registry.kind(), id = %id, "unresolved reference in save");
        self.unresolved.push(UnresolvedReference {
            kind: registry.kind(),
            id: id.clone(),
        });
        Reference::Unresolved(id)
    }

    /// Read a reference as a raw identifier without resolving it.
    pub fn read_id(&mut self) -> Result<NamespacedId, CodecError> {
        let namespace_index = self.reader.read_u16()?;
        let local_index = self.reader.read_u32()?;
        self.manifest
            .lookup(namespace_index, local_index)
            .ok_or(CodecError::InvalidReference {
                namespace_index,
                local_index,
            })
    }

    /// Decode a length-prefixed region with `read`.
    ///
    /// Bytes `read` leaves unconsumed are skipped, which is how callers
    /// step over regions whose subject did not resolve.
    pub fn read_region<T>(
        &mut self,
        read: impl FnOnce(&mut SaveDecoder<'a>) -> Result<T, CodecError>,
    ) -> Result<T, CodecError> {
        let body = self.reader.read_prefixed_bytes()?;
        let mut inner = SaveDecoder::new(SaveReader::new(body), self.manifest, self.version);
        let result = read(&mut inner);
        self.unresolved.append(&mut inner.unresolved);
        result
    }

    /// Unresolved references recorded so far.
    pub fn unresolved(&self) -> &[UnresolvedReference] {
        &self.unresolved
    }

    /// Consume the decoder, returning the unresolved references.
    pub fn into_unresolved(self) -> Vec<UnresolvedReference> {
        self.unresolved
    }
}

impl<'a> Deref for SaveDecoder<'a> {
    type Target = SaveReader<'a>;

    fn deref(&self) -> &SaveReader<'a> {
        &self.reader
    }
}

impl DerefMut for SaveDecoder<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.reader
    }
}
