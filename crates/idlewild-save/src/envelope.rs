//! Text-safe wrapper around save bytes.
//!
//! A save string is the base64 text of a zlib stream. Inside, binary saves
//! start with [`SIGNATURE`]; anything else is tried as a legacy JSON save.
//! Both the full codec and the header reader go through [`open`], so the
//! format detection is identical on both paths.

use std::io::{Read, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use idlewild_codec::SaveReader;
use idlewild_state::LegacySave;
use tracing::debug;

use crate::error::SaveError;

/// Leading bytes of every binary save.
pub const SIGNATURE: &[u8; 4] = b"IDLW";

/// Largest decompressed save accepted, 64 MiB.
pub const MAX_DECOMPRESSED_BYTES: u64 = 67_108_864;

/// Compress and text-encode raw save bytes.
pub fn seal(bytes: &[u8]) -> Result<String, SaveError> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(bytes.len()), Compression::default());
    encoder
        .write_all(bytes)
        .and_then(|()| encoder.finish())
        .map(|compressed| STANDARD.encode(compressed))
        .map_err(|err| SaveError::Compress {
            reason: err.to_string(),
        })
}

/// Undo [`seal`].
///
/// A stream that inflates past [`MAX_DECOMPRESSED_BYTES`] is corrupt.
pub fn unseal(raw: &str) -> Result<Vec<u8>, SaveError> {
    unseal_bounded(raw, MAX_DECOMPRESSED_BYTES)
}

fn unseal_bounded(raw: &str, limit: u64) -> Result<Vec<u8>, SaveError> {
    let compressed = STANDARD
        .decode(raw.trim())
        .map_err(|err| SaveError::corrupt(format!("not base64: {err}")))?;
    let mut bytes = Vec::with_capacity(compressed.len().saturating_mul(4));
    ZlibDecoder::new(compressed.as_slice())
        .take(limit.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|err| SaveError::corrupt(format!("not a zlib stream: {err}")))?;
    if u64::try_from(bytes.len()).unwrap_or(u64::MAX) > limit {
        return Err(SaveError::corrupt(format!(
            "decompressed save exceeds {limit} bytes"
        )));
    }
    Ok(bytes)
}

/// A save string after unwrapping and format detection.
#[derive(Debug)]
pub enum Opened {
    /// Binary save bytes, signature included.
    Binary(Vec<u8>),
    /// Legacy JSON save.
    Legacy(Box<LegacySave>),
}

/// Unwrap `raw` and detect its format.
///
/// A missing signature falls back to the legacy parser; only when that
/// fails too is the save declared corrupt.
pub fn open(raw: &str) -> Result<Opened, SaveError> {
    let bytes = unseal(raw)?;
    if SaveReader::new(&bytes).expect_signature(SIGNATURE).is_ok() {
        return Ok(Opened::Binary(bytes));
    }
    debug!(len = bytes.len(), "binary signature absent, trying legacy format");
    serde_json::from_slice::<LegacySave>(&bytes)
        .map(|legacy| Opened::Legacy(Box::new(legacy)))
        .map_err(|err| SaveError::corrupt(format!("neither binary nor legacy save: {err}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn seal_and_unseal() {
        let sealed = seal(b"IDLW\x76\x00\x00\x00payload").unwrap();
        assert!(sealed.is_ascii());
        assert_eq!(unseal(&sealed).unwrap(), b"IDLW\x76\x00\x00\x00payload");
    }

    #[test]
    fn oversized_stream_is_corrupt() {
        let sealed = seal(&[0; 4_096]).unwrap();
        assert!(sealed.len() < 4_096);
        assert_eq!(unseal_bounded(&sealed, 4_096).unwrap().len(), 4_096);
        let err = unseal_bounded(&sealed, 1_024).unwrap_err();
        assert!(matches!(&err, SaveError::Corrupt { reason } if reason.contains("exceeds 1024")));
    }

    #[test]
    fn detects_formats() {
        let binary = seal(b"IDLWrest").unwrap();
        assert!(matches!(open(&binary).unwrap(), Opened::Binary(_)));

        let legacy = seal(br#"{"characterName":"Old"}"#).unwrap();
        let opened = open(&legacy).unwrap();
        assert!(matches!(&opened, Opened::Legacy(save) if save.character_name == "Old"));
    }

    #[test]
    fn garbage_is_corrupt() {
        assert!(matches!(open("%%%"), Err(SaveError::Corrupt { .. })));
        let not_json = seal(b"hello").unwrap();
        assert!(matches!(open(&not_json), Err(SaveError::Corrupt { .. })));
    }
}
