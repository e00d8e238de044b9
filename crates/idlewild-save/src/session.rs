//! Save slot identity.

use serde::{Deserialize, Serialize};

/// Which slot a running game saves to.
///
/// The key prefix keeps separate characters or installs apart when they
/// share one store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SaveSession {
    /// Slot number.
    pub slot_id: u32,
    /// Prefix applied to every storage key.
    pub key_prefix: String,
}

impl SaveSession {
    /// Session for `slot_id` under `key_prefix`.
    pub fn new(slot_id: u32, key_prefix: impl Into<String>) -> Self {
        Self {
            slot_id,
            key_prefix: key_prefix.into(),
        }
    }

    /// Storage key of this slot.
    pub fn key(&self) -> String {
        format!("{}_save_{}", self.key_prefix, self.slot_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_differ_by_slot_and_prefix() {
        assert_eq!(SaveSession::new(2, "main").key(), "main_save_2");
        assert_ne!(
            SaveSession::new(2, "main").key(),
            SaveSession::new(2, "beta").key()
        );
    }
}
