//! Full save encode and decode.
//!
//! Binary layout, after unwrapping (see [`envelope`](crate::envelope)):
//!
//! ```text
//! "IDLW" | version: u32 | header region | reference manifest | body
//! ```
//!
//! The body is the [`GameState`] encoding, length-prefixed. Encoding always
//! writes [`CURRENT_VERSION`]. Decoding threads the declared version into
//! every nested read. A string without the binary signature goes down the
//! legacy path instead: JSON, numeric IDs mapped through the memoized
//! [`IdManifest`](idlewild_state::IdManifest), then per-subsystem
//! conversion.

use idlewild_codec::{
    ReferenceManifest, SaveDecoder, SaveEncoder, SaveReader, SaveWriter, UnresolvedReference,
};
use idlewild_state::{CURRENT_VERSION, GameState, LegacySave, Profile};
use idlewild_types::Registries;
use tracing::{debug, info, warn};

use crate::envelope::{self, Opened, SIGNATURE};
use crate::error::SaveError;
use crate::header::{SaveFormat, SaveHeader, read_binary_header};
use crate::manifest::ManifestCache;

/// A decoded save.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSave {
    /// The reconstructed state, derived values included.
    pub state: GameState,
    /// Format the save was read from.
    pub format: SaveFormat,
    /// References that did not resolve and were dropped.
    pub unresolved: Vec<UnresolvedReference>,
}

/// Encodes and decodes save strings.
///
/// Remembers the size of the last body and header it wrote so the next
/// save's buffers start at about the right size.
#[derive(Debug, Default)]
pub struct SaveCodec {
    body_hint: usize,
    envelope_hint: usize,
}

impl SaveCodec {
    /// Create a codec with no size history.
    pub const fn new() -> Self {
        Self {
            body_hint: 0,
            envelope_hint: 0,
        }
    }

    /// Encode `state` in the current schema and wrap it as text.
    pub fn encode(&mut self, state: &GameState) -> Result<String, SaveError> {
        let encode_failed = |source| SaveError::Encode { source };

        let mut encoder = SaveEncoder::with_capacity(self.body_hint);
        state.encode_body(&mut encoder).map_err(encode_failed)?;
        let (manifest, body) = encoder.finish().map_err(encode_failed)?;

        let namespaces = manifest.namespaces().map(str::to_owned).collect();
        let header = SaveHeader::describe(state, namespaces);

        let mut writer = SaveWriter::with_capacity(self.envelope_hint.saturating_add(body.len()));
        writer.write_bytes(SIGNATURE);
        writer.write_u32(CURRENT_VERSION);
        header.write(&mut writer).map_err(encode_failed)?;
        manifest.write(&mut writer).map_err(encode_failed)?;
        let envelope_len = writer.len();
        writer.write_prefixed_bytes(&body).map_err(encode_failed)?;
        let bytes = writer.into_bytes().map_err(encode_failed)?;

        self.body_hint = body.len();
        self.envelope_hint = envelope_len;
        let sealed = envelope::seal(&bytes)?;
        debug!(
            body_bytes = body.len(),
            raw_bytes = bytes.len(),
            sealed_bytes = sealed.len(),
            references = manifest.reference_count(),
            "save encoded"
        );
        Ok(sealed)
    }

    /// Decode a save string in either format.
    ///
    /// `manifests` is consulted only for legacy saves.
    #[allow(clippy::unused_self)]
    pub fn decode(
        &self,
        raw: &str,
        registries: &Registries,
        manifests: &ManifestCache,
    ) -> Result<LoadedSave, SaveError> {
        match envelope::open(raw)? {
            Opened::Binary(bytes) => Self::decode_binary(&bytes, registries),
            Opened::Legacy(legacy) => Self::decode_legacy(&legacy, registries, manifests),
        }
    }

    fn decode_binary(bytes: &[u8], registries: &Registries) -> Result<LoadedSave, SaveError> {
        let mut reader = SaveReader::new(bytes);
        let header = read_binary_header(&mut reader)?;
        let version = header.format.version().unwrap_or(CURRENT_VERSION);
        let manifest = ReferenceManifest::read(&mut reader).map_err(SaveError::from_decode)?;
        let body = reader
            .read_prefixed_bytes()
            .map_err(SaveError::from_decode)?;
        if !reader.is_exhausted() {
            return Err(SaveError::corrupt(format!(
                "{} trailing bytes after body",
                reader.remaining()
            )));
        }

        let mut decoder = SaveDecoder::new(SaveReader::new(body), &manifest, version);
        // An unknown gamemode is reported but kept, so the next save
        // still names it.
        if !decoder
            .resolve(&registries.gamemodes, header.gamemode.clone())
            .is_resolved()
        {
            debug!(gamemode = %header.gamemode, "keeping uninstalled gamemode");
        }
        let profile = Profile {
            character_name: header.character_name,
            gamemode: header.gamemode,
            mod_profile: header.mod_profile,
        };
        let state = GameState::decode_body(&mut decoder, registries, profile)
            .map_err(SaveError::from_decode)?;
        if !decoder.is_exhausted() {
            return Err(SaveError::corrupt(format!(
                "{} unread bytes at end of body",
                decoder.remaining()
            )));
        }
        let unresolved = decoder.into_unresolved();
        if !unresolved.is_empty() {
            warn!(count = unresolved.len(), "save references missing content");
        }
        info!(version, character = %state.profile.character_name, "save decoded");
        Ok(LoadedSave {
            state,
            format: header.format,
            unresolved,
        })
    }

    fn decode_legacy(
        legacy: &LegacySave,
        registries: &Registries,
        manifests: &ManifestCache,
    ) -> Result<LoadedSave, SaveError> {
        let manifest = manifests.get()?;
        let (state, unresolved) = GameState::from_legacy(legacy, &manifest, registries);
        Ok(LoadedSave {
            state,
            format: SaveFormat::Legacy,
            unresolved,
        })
    }
}
