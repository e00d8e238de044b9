//! Error types for the `idlewild-state` crate.
//!
//! These cover live mutations of the state graph. Decode problems are
//! [`CodecError`](idlewild_codec::CodecError)s, and unresolved references
//! are never errors at all.

use idlewild_types::{NamespacedId, RegistryError};

/// Errors that can occur while mutating game state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// The bank has no free slot for a new item.
    #[error("bank is full, cannot store {item}")]
    BankFull {
        /// The item that did not fit.
        item: NamespacedId,
    },

    /// An action was requested that is not registered.
    #[error("action not found: {0}")]
    UnknownAction(NamespacedId),

    /// Content refers to a skill that is not registered.
    #[error("skill not found: {0}")]
    UnknownSkill(NamespacedId),

    /// Content refers to an item that is not registered.
    #[error("item not found: {0}")]
    UnknownItem(NamespacedId),

    /// Content refers to a monster that is not registered.
    #[error("monster not found: {0}")]
    UnknownMonster(NamespacedId),

    /// Static content could not be registered.
    #[error("content registration failed: {source}")]
    Registry {
        /// The underlying registry error.
        #[from]
        source: RegistryError,
    },
}
