//! Save headers and the preview reader.
//!
//! The header is the leading region of a binary save: enough to list a
//! slot (name, gamemode, total level, gold, last played) without decoding
//! the body. [`HeaderReader`] reads only the signature, the version and
//! this region. Legacy saves have no header, so their preview is computed
//! from the parsed JSON, with placeholders for anything the ID manifest
//! cannot name.

use idlewild_codec::{
    CodecError, FieldLadder, FieldStep, ReferenceManifest, SaveDecoder, SaveReader, SaveWriter,
};
use idlewild_state::version::HEADER_MOD_PROFILE;
use idlewild_state::{
    CURRENT_VERSION, GameState, IdManifest, LegacySave, MIN_SUPPORTED_VERSION,
};
use idlewild_types::{BASE_NAMESPACE, NamespacedId, ObjectKind, xp};
use serde::Serialize;

use crate::envelope::{self, Opened, SIGNATURE};
use crate::error::SaveError;

/// Which format a save string was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "format")]
pub enum SaveFormat {
    /// Versioned binary format.
    Binary {
        /// Schema version the save declares.
        version: u32,
    },
    /// Unversioned legacy JSON.
    Legacy,
}

impl SaveFormat {
    /// Binary schema version, if any.
    pub const fn version(&self) -> Option<u32> {
        match self {
            Self::Binary { version } => Some(*version),
            Self::Legacy => None,
        }
    }
}

/// Summary fields of a save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveHeader {
    /// Format and version.
    pub format: SaveFormat,
    /// Content namespaces the save references.
    pub active_namespaces: Vec<String>,
    /// Character name.
    pub character_name: String,
    /// Gamemode; a placeholder when the content no longer exists.
    pub gamemode: NamespacedId,
    /// Sum of skill levels.
    pub total_level: u32,
    /// Primary currency held.
    pub currency_amount: u64,
    /// Action that was running when the game was closed.
    pub offline_action: Option<NamespacedId>,
    /// Wall-clock instant up to which the state was simulated.
    pub tick_timestamp: i64,
    /// Wall-clock instant of the save.
    pub save_timestamp: i64,
    /// Mod profile the save was played with.
    pub mod_profile: Option<String>,
}

impl SaveHeader {
    /// Summarize `state` for a save about to be written.
    pub fn describe(state: &GameState, active_namespaces: Vec<String>) -> Self {
        Self {
            format: SaveFormat::Binary {
                version: CURRENT_VERSION,
            },
            active_namespaces,
            character_name: state.profile.character_name.clone(),
            gamemode: state.profile.gamemode.clone(),
            total_level: state.total_level(),
            currency_amount: state.wallet.primary_amount(),
            offline_action: state
                .active_action
                .as_ref()
                .map(|active| active.action.id.clone()),
            tick_timestamp: state.time.tick_timestamp,
            save_timestamp: state.time.save_timestamp,
            mod_profile: state.profile.mod_profile.clone(),
        }
    }

    /// Summarize a legacy save. Numbers missing from `manifest` (or every
    /// number, without one) become placeholder identifiers.
    pub fn from_legacy(legacy: &LegacySave, manifest: Option<&IdManifest>) -> Self {
        let name = |kind: ObjectKind, old: u32| {
            manifest.map_or_else(
                || NamespacedId::placeholder(format!("{kind}_{old}")),
                |manifest| manifest.lookup_or_placeholder(kind, old),
            )
        };
        let total_level = legacy
            .skill_xp
            .values()
            .fold(0_u32, |total, &xp| total.saturating_add(xp::level_for_xp(xp)));
        Self {
            format: SaveFormat::Legacy,
            active_namespaces: vec![BASE_NAMESPACE.to_owned()],
            character_name: legacy.character_name.clone(),
            gamemode: name(ObjectKind::Gamemode, legacy.gamemode),
            total_level,
            currency_amount: legacy.gp,
            offline_action: legacy.offline_action.map(|old| name(ObjectKind::Action, old)),
            tick_timestamp: legacy.tick_timestamp,
            save_timestamp: legacy.save_timestamp,
            mod_profile: None,
        }
    }

    /// Write the header region in the current schema.
    pub fn write(&self, writer: &mut SaveWriter) -> Result<(), CodecError> {
        writer.write_region(|w| {
            w.write_array(&self.active_namespaces, |w, namespace| w.write_string(namespace))?;
            w.write_string(&self.character_name)?;
            w.write_string(&self.gamemode.to_string())?;
            w.write_u32(self.total_level);
            w.write_u64(self.currency_amount);
            write_optional_string(w, self.offline_action.as_ref().map(ToString::to_string).as_deref())?;
            w.write_i64(self.tick_timestamp);
            w.write_i64(self.save_timestamp);
            write_optional_string(w, self.mod_profile.as_deref())
        })
    }
}

fn write_optional_string(writer: &mut SaveWriter, value: Option<&str>) -> Result<(), CodecError> {
    writer.write_bool(value.is_some());
    match value {
        Some(value) => writer.write_string(value),
        None => Ok(()),
    }
}

fn read_optional_string(decoder: &mut SaveDecoder<'_>) -> Result<Option<String>, CodecError> {
    if decoder.read_bool()? {
        decoder.read_string().map(Some)
    } else {
        Ok(None)
    }
}

/// Raw header fields as read, before identifiers are parsed.
#[derive(Debug, Default)]
struct HeaderDraft {
    active_namespaces: Vec<String>,
    character_name: String,
    gamemode: String,
    total_level: u32,
    currency_amount: u64,
    offline_action: Option<String>,
    tick_timestamp: i64,
    save_timestamp: i64,
    mod_profile: Option<String>,
}

const HEADER_STEPS: &[FieldStep<HeaderDraft, ()>] = &[
    FieldStep::added(MIN_SUPPORTED_VERSION, "active_namespaces", read_namespaces),
    FieldStep::added(MIN_SUPPORTED_VERSION, "character_name", read_character_name),
    FieldStep::added(MIN_SUPPORTED_VERSION, "gamemode", read_gamemode),
    FieldStep::added(MIN_SUPPORTED_VERSION, "total_level", read_total_level),
    FieldStep::added(MIN_SUPPORTED_VERSION, "currency_amount", read_currency_amount),
    FieldStep::added(MIN_SUPPORTED_VERSION, "offline_action", read_offline_action),
    FieldStep::added(MIN_SUPPORTED_VERSION, "timestamps", read_timestamps),
    FieldStep::added(HEADER_MOD_PROFILE, "mod_profile", read_mod_profile),
];

const HEADER_LADDER: FieldLadder<HeaderDraft, ()> = FieldLadder::new("header", HEADER_STEPS);

fn read_namespaces(
    decoder: &mut SaveDecoder<'_>,
    _context: &(),
    draft: &mut HeaderDraft,
) -> Result<(), CodecError> {
    draft.active_namespaces = decoder.read_array(SaveReader::read_string)?;
    Ok(())
}

fn read_character_name(
    decoder: &mut SaveDecoder<'_>,
    _context: &(),
    draft: &mut HeaderDraft,
) -> Result<(), CodecError> {
    draft.character_name = decoder.read_string()?;
    Ok(())
}

fn read_gamemode(
    decoder: &mut SaveDecoder<'_>,
    _context: &(),
    draft: &mut HeaderDraft,
) -> Result<(), CodecError> {
    draft.gamemode = decoder.read_string()?;
    Ok(())
}

fn read_total_level(
    decoder: &mut SaveDecoder<'_>,
    _context: &(),
    draft: &mut HeaderDraft,
) -> Result<(), CodecError> {
    draft.total_level = decoder.read_u32()?;
    Ok(())
}

fn read_currency_amount(
    decoder: &mut SaveDecoder<'_>,
    _context: &(),
    draft: &mut HeaderDraft,
) -> Result<(), CodecError> {
    draft.currency_amount = decoder.read_u64()?;
    Ok(())
}

fn read_offline_action(
    decoder: &mut SaveDecoder<'_>,
    _context: &(),
    draft: &mut HeaderDraft,
) -> Result<(), CodecError> {
    draft.offline_action = read_optional_string(decoder)?;
    Ok(())
}

fn read_timestamps(
    decoder: &mut SaveDecoder<'_>,
    _context: &(),
    draft: &mut HeaderDraft,
) -> Result<(), CodecError> {
    draft.tick_timestamp = decoder.read_i64()?;
    draft.save_timestamp = decoder.read_i64()?;
    Ok(())
}

fn read_mod_profile(
    decoder: &mut SaveDecoder<'_>,
    _context: &(),
    draft: &mut HeaderDraft,
) -> Result<(), CodecError> {
    draft.mod_profile = read_optional_string(decoder)?;
    Ok(())
}

fn parse_id(raw: &str) -> Result<NamespacedId, SaveError> {
    NamespacedId::parse(raw).map_err(|err| SaveError::corrupt(format!("bad identifier in header: {err}")))
}

/// Read the signature, version and header region of binary save bytes,
/// leaving `reader` just past the header.
pub fn read_binary_header(reader: &mut SaveReader<'_>) -> Result<SaveHeader, SaveError> {
    reader
        .expect_signature(SIGNATURE)
        .map_err(SaveError::from_decode)?;
    let version = reader.read_u32().map_err(SaveError::from_decode)?;
    if version > CURRENT_VERSION {
        return Err(SaveError::InvalidVersion {
            found: version,
            supported: CURRENT_VERSION,
        });
    }
    if version < MIN_SUPPORTED_VERSION {
        return Err(SaveError::corrupt(format!(
            "save version {version} predates the oldest supported version {MIN_SUPPORTED_VERSION}"
        )));
    }

    let region = reader.read_prefixed_bytes().map_err(SaveError::from_decode)?;
    // Header fields are plain strings; no references to resolve.
    let no_references = ReferenceManifest::new();
    let mut decoder = SaveDecoder::new(SaveReader::new(region), &no_references, version);
    let mut draft = HeaderDraft::default();
    HEADER_LADDER
        .apply(&mut decoder, &(), &mut draft)
        .map_err(SaveError::from_decode)?;

    Ok(SaveHeader {
        format: SaveFormat::Binary { version },
        active_namespaces: draft.active_namespaces,
        character_name: draft.character_name,
        gamemode: parse_id(&draft.gamemode)?,
        total_level: draft.total_level,
        currency_amount: draft.currency_amount,
        offline_action: draft.offline_action.as_deref().map(parse_id).transpose()?,
        tick_timestamp: draft.tick_timestamp,
        save_timestamp: draft.save_timestamp,
        mod_profile: draft.mod_profile,
    })
}

/// Reads save headers without decoding bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderReader<'a> {
    manifest: Option<&'a IdManifest>,
}

impl<'a> HeaderReader<'a> {
    /// A reader that names legacy content through `manifest` when one is
    /// available.
    pub const fn new(manifest: Option<&'a IdManifest>) -> Self {
        Self { manifest }
    }

    /// Preview a save string in either format.
    pub fn read(&self, raw: &str) -> Result<SaveHeader, SaveError> {
        match envelope::open(raw)? {
            Opened::Binary(bytes) => read_binary_header(&mut SaveReader::new(&bytes)),
            Opened::Legacy(legacy) => Ok(SaveHeader::from_legacy(&legacy, self.manifest)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn header() -> SaveHeader {
        SaveHeader {
            format: SaveFormat::Binary {
                version: CURRENT_VERSION,
            },
            active_namespaces: vec!["idlewild".to_owned(), "gems_mod".to_owned()],
            character_name: "Ash".to_owned(),
            gamemode: NamespacedId::base("hardcore"),
            total_level: 57,
            currency_amount: 1_234,
            offline_action: Some(NamespacedId::base("chop_oak")),
            tick_timestamp: 1_700_000_000_000,
            save_timestamp: 1_700_000_000_500,
            mod_profile: Some("gems".to_owned()),
        }
    }

    fn binary(version: u32, header: &SaveHeader) -> Vec<u8> {
        let mut writer = SaveWriter::new();
        writer.write_bytes(SIGNATURE);
        writer.write_u32(version);
        header.write(&mut writer).unwrap();
        writer.write_bytes(b"body that the preview never reads");
        writer.into_bytes().unwrap()
    }

    #[test]
    fn reads_header_without_body() {
        let header = header();
        let sealed = envelope::seal(&binary(CURRENT_VERSION, &header)).unwrap();
        assert_eq!(HeaderReader::default().read(&sealed).unwrap(), header);
    }

    #[test]
    fn mod_profile_absent_before_its_version() {
        let mut expected = header();
        expected.mod_profile = None;
        expected.format = SaveFormat::Binary { version: 114 };

        // A v114 writer never wrote the profile flag.
        let mut writer = SaveWriter::new();
        writer.write_bytes(SIGNATURE);
        writer.write_u32(114);
        writer
            .write_region(|w| {
                w.write_array(&expected.active_namespaces, |w, ns| w.write_string(ns))?;
                w.write_string("Ash")?;
                w.write_string("idlewild:hardcore")?;
                w.write_u32(57);
                w.write_u64(1_234);
                write_optional_string(w, Some("idlewild:chop_oak"))?;
                w.write_i64(1_700_000_000_000);
                w.write_i64(1_700_000_000_500);
                Ok(())
            })
            .unwrap();
        let bytes = writer.into_bytes().unwrap();
        let header = read_binary_header(&mut SaveReader::new(&bytes)).unwrap();
        assert_eq!(header, expected);
    }

    #[test]
    fn newer_version_is_invalid_not_corrupt() {
        let sealed = envelope::seal(&binary(CURRENT_VERSION.saturating_add(1), &header())).unwrap();
        assert_eq!(
            HeaderReader::default().read(&sealed).unwrap_err(),
            SaveError::InvalidVersion {
                found: CURRENT_VERSION.saturating_add(1),
                supported: CURRENT_VERSION,
            }
        );
    }

    #[test]
    fn legacy_preview_synthesizes_placeholders() {
        let legacy: LegacySave = serde_json::from_str(
            r#"{"characterName": "Old", "gamemode": 3, "gp": 90, "offlineAction": 1,
                "skillXp": {"0": 83.0, "1": 0.0}}"#,
        )
        .unwrap();
        let sealed = envelope::seal(&serde_json::to_vec(&legacy).unwrap()).unwrap();

        let mut manifest = IdManifest::default();
        manifest.actions.insert(1, NamespacedId::base("fish_shrimp"));
        let header = HeaderReader::new(Some(&manifest)).read(&sealed).unwrap();
        assert_eq!(header.format, SaveFormat::Legacy);
        assert!(header.gamemode.is_placeholder());
        assert_eq!(header.offline_action, Some(NamespacedId::base("fish_shrimp")));
        assert_eq!(header.total_level, 3);
        assert_eq!(header.currency_amount, 90);

        let without = HeaderReader::default().read(&sealed).unwrap();
        assert!(without.offline_action.unwrap().is_placeholder());
    }
}
