//! Error types for the binary cursor and object codec.
//!
//! Callers branch on [`CodecError::kind`]: a [`FailureKind::NotThisFormat`]
//! failure means the bytes are not a (valid) binary save and the legacy
//! parser should be tried, while [`FailureKind::VersionTooNew`] means the
//! format was recognized but this build cannot read it.

/// Coarse classification of a codec failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The bytes do not form a readable stream in this format.
    NotThisFormat,
    /// The stream is in this format but declares a newer schema version.
    VersionTooNew,
}

/// Errors that can occur while writing or reading a binary stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// A read needed more bytes than remain in the buffer.
    #[error("unexpected end of stream at offset {offset}: needed {needed}, {remaining} remaining")]
    UnexpectedEof {
        /// Cursor offset at the failed read.
        offset: usize,
        /// Bytes the read required.
        needed: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },

    /// The leading format signature did not match.
    #[error("format signature mismatch")]
    SignatureMismatch,

    /// A string payload was not valid UTF-8.
    #[error("invalid UTF-8 in string at offset {offset}")]
    InvalidUtf8 {
        /// Cursor offset of the string payload.
        offset: usize,
    },

    /// A length does not fit the on-disk length prefix.
    #[error("length {length} exceeds the u32 length prefix")]
    LengthOverflow {
        /// The offending length.
        length: usize,
    },

    /// A byte held a value outside its encoding's domain.
    #[error("invalid {context} tag {value}")]
    InvalidTag {
        /// What was being decoded.
        context: &'static str,
        /// The byte that was read.
        value: u8,
    },

    /// A region was closed without being opened, or left open at finish.
    #[error("unbalanced write region markers ({open} open)")]
    UnbalancedRegion {
        /// Regions still open when the imbalance was detected.
        open: usize,
    },

    /// A reference pointed outside the save's reference manifest.
    #[error("reference ({namespace_index}, {local_index}) is outside the manifest")]
    InvalidReference {
        /// Namespace index read from the stream.
        namespace_index: u16,
        /// Local index read from the stream.
        local_index: u32,
    },

    /// The stream declares a schema version newer than this build.
    #[error("save version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version declared by the stream.
        found: u32,
        /// Newest version this build can read.
        supported: u32,
    },
}

impl CodecError {
    /// Classify the failure for fallback decisions.
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::UnsupportedVersion { .. } => FailureKind::VersionTooNew,
            _ => FailureKind::NotThisFormat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_version_errors_are_too_new() {
        let too_new = CodecError::UnsupportedVersion {
            found: 200,
            supported: 118,
        };
        assert_eq!(too_new.kind(), FailureKind::VersionTooNew);
        assert_eq!(
            CodecError::SignatureMismatch.kind(),
            FailureKind::NotThisFormat
        );
        let eof = CodecError::UnexpectedEof {
            offset: 3,
            needed: 4,
            remaining: 1,
        };
        assert_eq!(eof.kind(), FailureKind::NotThisFormat);
    }
}
