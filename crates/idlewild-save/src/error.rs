//! Error types for the persistence layer.
//!
//! [`SaveError::Corrupt`] and [`SaveError::InvalidVersion`] are kept apart
//! because the player is offered different recoveries: import or restore
//! for a corrupt save, a client update for a save from a newer build.
//! Unresolved references are not errors; they are listed on the
//! [`LoadedSave`](crate::codec::LoadedSave).

use idlewild_codec::{CodecError, FailureKind};

/// Errors that can occur while encoding or decoding a save string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SaveError {
    /// The string is not a readable save in any supported format.
    #[error("corrupt save: {reason}")]
    Corrupt {
        /// What failed.
        reason: String,
    },

    /// The save is in a known format but from a newer build.
    #[error("save version {found} is newer than supported version {supported}")]
    InvalidVersion {
        /// Version declared by the save.
        found: u32,
        /// Newest version this build reads.
        supported: u32,
    },

    /// The legacy ID manifest could not be fetched. Retrying may succeed.
    #[error("legacy ID manifest unavailable: {reason}")]
    ManifestUnavailable {
        /// What failed.
        reason: String,
    },

    /// Compressing the encoded bytes failed.
    #[error("save compression failed: {reason}")]
    Compress {
        /// What failed.
        reason: String,
    },

    /// Writing the current format failed.
    #[error("save encoding failed: {source}")]
    Encode {
        /// The underlying codec error.
        source: CodecError,
    },
}

impl SaveError {
    /// Build a [`SaveError::Corrupt`].
    pub fn corrupt(reason: impl Into<String>) -> Self {
        Self::Corrupt {
            reason: reason.into(),
        }
    }

    /// Classify a codec failure met while decoding a binary save.
    pub fn from_decode(error: CodecError) -> Self {
        match (error.kind(), error) {
            (FailureKind::VersionTooNew, CodecError::UnsupportedVersion { found, supported }) => {
                Self::InvalidVersion { found, supported }
            }
            (_, other) => Self::corrupt(other.to_string()),
        }
    }
}

/// Errors raised by a [`SaveStore`](crate::store::SaveStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing storage failed.
    #[error("save store I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The stored save could not be encoded or decoded.
    #[error(transparent)]
    Save(#[from] SaveError),

    /// No save exists under the key.
    #[error("no save stored under key: {0}")]
    NotFound(String),
}
