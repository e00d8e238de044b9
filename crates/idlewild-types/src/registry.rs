//! Registries resolving namespaced identifiers to live content.
//!
//! Decoders never infer an object's kind from the bytes they read. The
//! caller passes the registry for the expected kind explicitly, and the
//! [`Registries`] bundle keeps one strongly-typed registry per kind.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::content::{Action, Content, Currency, Gamemode, Item, Monster, ObjectKind, Skill};
use crate::ids::{BASE_NAMESPACE, NamespacedId};

/// Errors raised while populating a registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// An object with the same identity was already registered.
    #[error("duplicate {kind} registration: {id}")]
    Duplicate {
        /// Kind of the rejected object.
        kind: ObjectKind,
        /// Identity of the rejected object.
        id: NamespacedId,
    },

    /// The object's namespace has not been installed.
    #[error("namespace '{namespace}' is not installed")]
    UnknownNamespace {
        /// The namespace that was not installed.
        namespace: String,
    },
}

/// Resolution capability for one kind of domain object.
pub trait Registry {
    /// The live object handed out on successful resolution.
    type Object: Clone;

    /// Kind of object this registry serves.
    fn kind(&self) -> ObjectKind;

    /// Look an object up by identity.
    fn resolve(&self, id: &NamespacedId) -> Option<Self::Object>;

    /// Recover an object's identity.
    fn id_of(&self, object: &Self::Object) -> NamespacedId;
}

/// Map-backed registry for one [`Content`] kind.
#[derive(Debug, Clone)]
pub struct ContentRegistry<T> {
    entries: BTreeMap<NamespacedId, Arc<T>>,
}

impl<T> Default for ContentRegistry<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T: Content> ContentRegistry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition, returning the shared handle.
    pub fn register(&mut self, object: T) -> Result<Arc<T>, RegistryError> {
        let id = object.id().clone();
        if self.entries.contains_key(&id) {
            return Err(RegistryError::Duplicate { kind: T::KIND, id });
        }
        let handle = Arc::new(object);
        self.entries.insert(id, Arc::clone(&handle));
        Ok(handle)
    }

    /// Borrow the handle registered under `id`.
    pub fn get(&self, id: &NamespacedId) -> Option<&Arc<T>> {
        self.entries.get(id)
    }

    /// Iterate over registered definitions in identity order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.entries.values()
    }

    /// Number of registered definitions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Content> Registry for ContentRegistry<T> {
    type Object = Arc<T>;

    fn kind(&self) -> ObjectKind {
        T::KIND
    }

    fn resolve(&self, id: &NamespacedId) -> Option<Arc<T>> {
        self.entries.get(id).cloned()
    }

    fn id_of(&self, object: &Arc<T>) -> NamespacedId {
        object.id().clone()
    }
}

/// One registry per domain-object kind, plus the set of installed
/// namespaces.
#[derive(Debug, Clone)]
pub struct Registries {
    /// Installed namespaces (base content is always present).
    namespaces: BTreeSet<String>,
    /// Skills.
    pub skills: ContentRegistry<Skill>,
    /// Items.
    pub items: ContentRegistry<Item>,
    /// Currencies.
    pub currencies: ContentRegistry<Currency>,
    /// Gamemodes.
    pub gamemodes: ContentRegistry<Gamemode>,
    /// Monsters.
    pub monsters: ContentRegistry<Monster>,
    /// Actions.
    pub actions: ContentRegistry<Action>,
}

impl Default for Registries {
    fn default() -> Self {
        Self::new()
    }
}

impl Registries {
    /// Create empty registries with only the base namespace installed.
    pub fn new() -> Self {
        let mut namespaces = BTreeSet::new();
        namespaces.insert(BASE_NAMESPACE.to_owned());
        Self {
            namespaces,
            skills: ContentRegistry::new(),
            items: ContentRegistry::new(),
            currencies: ContentRegistry::new(),
            gamemodes: ContentRegistry::new(),
            monsters: ContentRegistry::new(),
            actions: ContentRegistry::new(),
        }
    }

    /// Install an extension namespace.
    pub fn install_namespace(&mut self, namespace: impl Into<String>) {
        self.namespaces.insert(namespace.into());
    }

    /// Whether `namespace` is installed.
    pub fn is_installed(&self, namespace: &str) -> bool {
        self.namespaces.contains(namespace)
    }

    /// Installed namespaces in sorted order.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaces.iter().map(String::as_str)
    }

    /// Fail unless the namespace of `id` is installed.
    pub fn ensure_installed(&self, id: &NamespacedId) -> Result<(), RegistryError> {
        if self.is_installed(id.namespace()) {
            Ok(())
        } else {
            Err(RegistryError::UnknownNamespace {
                namespace: id.namespace().to_owned(),
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn logs() -> Item {
        Item {
            id: NamespacedId::base("logs"),
            name: "Logs".to_owned(),
            sell_price: 1,
        }
    }

    #[test]
    fn register_and_resolve() {
        let mut items = ContentRegistry::new();
        let handle = items.register(logs()).unwrap();
        let resolved = items.resolve(&NamespacedId::base("logs")).unwrap();
        assert!(Arc::ptr_eq(&handle, &resolved));
        assert_eq!(items.id_of(&resolved), NamespacedId::base("logs"));
        assert_eq!(items.kind(), ObjectKind::Item);
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut items = ContentRegistry::new();
        items.register(logs()).unwrap();
        let err = items.register(logs()).unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate { kind: ObjectKind::Item, .. }));
    }

    #[test]
    fn unknown_id_resolves_to_none() {
        let items: ContentRegistry<Item> = ContentRegistry::new();
        assert!(items.resolve(&NamespacedId::new("other_mod", "gem")).is_none());
    }

    #[test]
    fn base_namespace_always_installed() {
        let mut registries = Registries::new();
        assert!(registries.is_installed(BASE_NAMESPACE));
        assert!(registries
            .ensure_installed(&NamespacedId::new("my_mod", "x"))
            .is_err());
        registries.install_namespace("my_mod");
        assert!(registries
            .ensure_installed(&NamespacedId::new("my_mod", "x"))
            .is_ok());
    }
}
