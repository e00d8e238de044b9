//! Namespaced identifiers for persistable domain objects.
//!
//! Every object that can appear in a save (skills, items, currencies,
//! gamemodes, monsters, actions) belongs to exactly one namespace -- the
//! base content pack or an installed extension -- and carries a local ID
//! that is unique within that namespace. The pair is the object's stable
//! identity across sessions, content updates and mod installs.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Namespace of the base content shipped with the game.
pub const BASE_NAMESPACE: &str = "idlewild";

/// Namespace used for placeholders synthesized by read-only previews when
/// the referenced content no longer exists.
pub const PLACEHOLDER_NAMESPACE: &str = "unknown";

/// Separator between namespace and local ID in the textual form.
const SEPARATOR: char = ':';

/// Errors produced when parsing a textual namespaced identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The string has no `namespace:local` separator.
    #[error("identifier '{raw}' is missing the ':' separator")]
    MissingSeparator {
        /// The offending input.
        raw: String,
    },

    /// One of the two halves is empty.
    #[error("identifier '{raw}' has an empty namespace or local ID")]
    EmptyComponent {
        /// The offending input.
        raw: String,
    },
}

/// A `(namespace, local_id)` pair uniquely identifying a domain object.
///
/// Serialized through serde in its textual `namespace:local_id` form so
/// that external manifests stay human-editable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NamespacedId {
    namespace: String,
    local_id: String,
}

impl NamespacedId {
    /// Create an identifier from its two components.
    pub fn new(namespace: impl Into<String>, local_id: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local_id: local_id.into(),
        }
    }

    /// Create an identifier in the base content namespace.
    pub fn base(local_id: impl Into<String>) -> Self {
        Self::new(BASE_NAMESPACE, local_id)
    }

    /// Create a placeholder identifier for content that could not be found.
    pub fn placeholder(local_id: impl Into<String>) -> Self {
        Self::new(PLACEHOLDER_NAMESPACE, local_id)
    }

    /// Parse the textual `namespace:local_id` form.
    ///
    /// Only the first separator splits; local IDs may themselves contain
    /// colons.
    pub fn parse(raw: &str) -> Result<Self, IdError> {
        let (namespace, local_id) =
            raw.split_once(SEPARATOR)
                .ok_or_else(|| IdError::MissingSeparator {
                    raw: raw.to_owned(),
                })?;
        if namespace.is_empty() || local_id.is_empty() {
            return Err(IdError::EmptyComponent {
                raw: raw.to_owned(),
            });
        }
        Ok(Self::new(namespace, local_id))
    }

    /// The content pack this object belongs to.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The identifier within the namespace.
    pub fn local_id(&self) -> &str {
        &self.local_id
    }

    /// Whether this identifier was synthesized as a placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.namespace == PLACEHOLDER_NAMESPACE
    }
}

impl fmt::Display for NamespacedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.namespace, self.local_id)
    }
}

impl TryFrom<String> for NamespacedId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NamespacedId> for String {
    fn from(id: NamespacedId) -> Self {
        id.to_string()
    }
}

/// Outcome of resolving a decoded reference against a registry.
///
/// Decoding never fails because content was removed: the reference is
/// kept as [`Reference::Unresolved`] and the owning subsystem treats it as
/// absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference<T> {
    /// The reference resolved to a live object.
    Resolved(T),
    /// No registered object matches; the raw identifier is retained for
    /// diagnostics.
    Unresolved(NamespacedId),
}

impl<T> Reference<T> {
    /// Convert into an `Option`, discarding the identifier of unresolved
    /// references.
    pub fn resolved(self) -> Option<T> {
        match self {
            Self::Resolved(object) => Some(object),
            Self::Unresolved(_) => None,
        }
    }

    /// Borrow the resolved object, if any.
    pub const fn as_resolved(&self) -> Option<&T> {
        match self {
            Self::Resolved(object) => Some(object),
            Self::Unresolved(_) => None,
        }
    }

    /// Whether the reference resolved.
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_on_first_separator() {
        let id = NamespacedId::parse("my_mod:tree:oak").unwrap();
        assert_eq!(id.namespace(), "my_mod");
        assert_eq!(id.local_id(), "tree:oak");
        assert_eq!(id.to_string(), "my_mod:tree:oak");
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert!(matches!(
            NamespacedId::parse("logs"),
            Err(IdError::MissingSeparator { .. })
        ));
        assert!(matches!(
            NamespacedId::parse(":logs"),
            Err(IdError::EmptyComponent { .. })
        ));
    }

    #[test]
    fn serde_uses_textual_form() {
        let id = NamespacedId::base("logs");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"idlewild:logs\"");
        let back: NamespacedId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn placeholder_is_flagged() {
        assert!(NamespacedId::placeholder("gamemode").is_placeholder());
        assert!(!NamespacedId::base("gamemode").is_placeholder());
    }

    #[test]
    fn reference_unresolved_is_absent() {
        let reference: Reference<u8> = Reference::Unresolved(NamespacedId::base("gone"));
        assert!(!reference.is_resolved());
        assert_eq!(reference.resolved(), None);
    }
}
