//! Per-save reference manifest.
//!
//! Object references in a save body are two integers: an index into the
//! manifest's namespace list and an index into that namespace's local ID
//! list. The manifest itself is written once ahead of the body, so a save
//! that only touches base content spells the namespace out exactly once.

use std::collections::BTreeMap;

use idlewild_types::NamespacedId;

use crate::error::CodecError;
use crate::reader::SaveReader;
use crate::writer::SaveWriter;

/// Local IDs interned for one namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct NamespaceEntry {
    name: String,
    locals: Vec<String>,
    lookup: BTreeMap<String, u32>,
}

impl NamespaceEntry {
    fn new(name: String) -> Self {
        Self {
            name,
            locals: Vec::new(),
            lookup: BTreeMap::new(),
        }
    }

    fn intern(&mut self, local_id: &str) -> Result<u32, CodecError> {
        if let Some(&index) = self.lookup.get(local_id) {
            return Ok(index);
        }
        let index = u32::try_from(self.locals.len()).map_err(|_err| CodecError::LengthOverflow {
            length: self.locals.len(),
        })?;
        self.locals.push(local_id.to_owned());
        self.lookup.insert(local_id.to_owned(), index);
        Ok(index)
    }
}

/// Namespaces and local IDs referenced by one save, in first-use order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceManifest {
    entries: Vec<NamespaceEntry>,
    lookup: BTreeMap<String, u16>,
}

impl ReferenceManifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign (or reuse) the compact `(namespace, local)` indices for `id`.
    pub fn intern(&mut self, id: &NamespacedId) -> Result<(u16, u32), CodecError> {
        let namespace_index = self.intern_namespace(id.namespace())?;
        let entry = self
            .entries
            .get_mut(usize::from(namespace_index))
            .ok_or(CodecError::InvalidReference {
                namespace_index,
                local_index: 0,
            })?;
        let local_index = entry.intern(id.local_id())?;
        Ok((namespace_index, local_index))
    }

    /// Register a namespace without any local IDs (e.g. for an extension
    /// that is active but not yet referenced).
    pub fn intern_namespace(&mut self, namespace: &str) -> Result<u16, CodecError> {
        if let Some(&index) = self.lookup.get(namespace) {
            return Ok(index);
        }
        let index = u16::try_from(self.entries.len()).map_err(|_err| CodecError::LengthOverflow {
            length: self.entries.len(),
        })?;
        self.entries.push(NamespaceEntry::new(namespace.to_owned()));
        self.lookup.insert(namespace.to_owned(), index);
        Ok(index)
    }

    /// Recover the identifier behind a pair of indices.
    pub fn lookup(&self, namespace_index: u16, local_index: u32) -> Option<NamespacedId> {
        let entry = self.entries.get(usize::from(namespace_index))?;
        let local = entry.locals.get(usize::try_from(local_index).ok()?)?;
        Some(NamespacedId::new(entry.name.clone(), local.clone()))
    }

    /// Namespaces in index order.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    /// Total number of interned local IDs across namespaces.
    pub fn reference_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.locals.len()).sum()
    }

    /// Encode the manifest.
    pub fn write(&self, writer: &mut SaveWriter) -> Result<(), CodecError> {
        writer.write_array(&self.entries, |w, entry| {
            w.write_string(&entry.name)?;
            w.write_array(&entry.locals, |w, local| w.write_string(local))
        })
    }

    /// Decode a manifest written by [`ReferenceManifest::write`].
    pub fn read(reader: &mut SaveReader<'_>) -> Result<Self, CodecError> {
        let mut manifest = Self::new();
        let entries = reader.read_array(|r| {
            let name = r.read_string()?;
            let locals = r.read_array(SaveReader::read_string)?;
            Ok((name, locals))
        })?;
        for (name, locals) in entries {
            let namespace_index = manifest.intern_namespace(&name)?;
            let entry = manifest
                .entries
                .get_mut(usize::from(namespace_index))
                .ok_or(CodecError::InvalidReference {
                    namespace_index,
                    local_index: 0,
                })?;
            for local in &locals {
                entry.intern(local)?;
            }
        }
        Ok(manifest)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_stable() {
        let mut manifest = ReferenceManifest::new();
        let logs = manifest.intern(&NamespacedId::base("logs")).unwrap();
        let ore = manifest.intern(&NamespacedId::base("ore")).unwrap();
        let gem = manifest.intern(&NamespacedId::new("gems_mod", "ruby")).unwrap();
        assert_eq!(logs, (0, 0));
        assert_eq!(ore, (0, 1));
        assert_eq!(gem, (1, 0));
        assert_eq!(manifest.intern(&NamespacedId::base("logs")).unwrap(), (0, 0));
        assert_eq!(manifest.reference_count(), 3);
    }

    #[test]
    fn manifest_round_trips() {
        let mut manifest = ReferenceManifest::new();
        manifest.intern(&NamespacedId::base("logs")).unwrap();
        manifest.intern(&NamespacedId::new("gems_mod", "ruby")).unwrap();
        manifest.intern_namespace("empty_mod").unwrap();

        let mut writer = SaveWriter::new();
        manifest.write(&mut writer).unwrap();
        let bytes = writer.into_bytes().unwrap();
        let decoded = ReferenceManifest::read(&mut SaveReader::new(&bytes)).unwrap();

        assert_eq!(decoded, manifest);
        assert_eq!(
            decoded.namespaces().collect::<Vec<_>>(),
            vec!["idlewild", "gems_mod", "empty_mod"]
        );
        assert_eq!(
            decoded.lookup(1, 0),
            Some(NamespacedId::new("gems_mod", "ruby"))
        );
        assert_eq!(decoded.lookup(2, 0), None);
        assert_eq!(decoded.lookup(9, 0), None);
    }
}
