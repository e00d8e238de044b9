//! Player settings that affect simulation.

use idlewild_codec::{CodecError, FieldLadder, FieldStep, SaveDecoder, SaveEncoder};

use crate::legacy::LegacySettings;
use crate::version::{MIN_SUPPORTED_VERSION, SETTINGS_OFFLINE_COMBAT};

/// Persisted settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Eat food automatically in combat.
    pub auto_eat: bool,
    /// Show notifications.
    pub notifications: bool,
    /// Whether combat may continue while the player is away.
    pub offline_combat: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_eat: false,
            notifications: true,
            offline_combat: true,
        }
    }
}

impl Settings {
    /// Write the current-version encoding.
    pub fn encode(&self, encoder: &mut SaveEncoder) -> Result<(), CodecError> {
        encoder.write_bool(self.auto_eat);
        encoder.write_bool(self.notifications);
        encoder.write_bool(self.offline_combat);
        Ok(())
    }

    /// Decode settings written at `decoder.version()`. Fields newer than
    /// the stream keep their defaults.
    pub fn decode(decoder: &mut SaveDecoder<'_>) -> Result<Self, CodecError> {
        let mut settings = Self::default();
        SETTINGS_LADDER.apply(decoder, &(), &mut settings)?;
        Ok(settings)
    }

    /// Convert the legacy settings block.
    pub fn convert_legacy(legacy: &LegacySettings) -> Self {
        Self {
            auto_eat: legacy.auto_eat,
            notifications: legacy.notifications,
            ..Self::default()
        }
    }
}

const SETTINGS_STEPS: &[FieldStep<Settings, ()>] = &[
    FieldStep::added(MIN_SUPPORTED_VERSION, "auto_eat", read_auto_eat),
    FieldStep::added(MIN_SUPPORTED_VERSION, "notifications", read_notifications),
    FieldStep::added(SETTINGS_OFFLINE_COMBAT, "offline_combat", read_offline_combat),
];

const SETTINGS_LADDER: FieldLadder<Settings, ()> = FieldLadder::new("settings", SETTINGS_STEPS);

fn read_auto_eat(
    decoder: &mut SaveDecoder<'_>,
    _context: &(),
    settings: &mut Settings,
) -> Result<(), CodecError> {
    settings.auto_eat = decoder.read_bool()?;
    Ok(())
}

fn read_notifications(
    decoder: &mut SaveDecoder<'_>,
    _context: &(),
    settings: &mut Settings,
) -> Result<(), CodecError> {
    settings.notifications = decoder.read_bool()?;
    Ok(())
}

fn read_offline_combat(
    decoder: &mut SaveDecoder<'_>,
    _context: &(),
    settings: &mut Settings,
) -> Result<(), CodecError> {
    settings.offline_combat = decoder.read_bool()?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use idlewild_codec::SaveReader;

    use super::*;
    use crate::version::CURRENT_VERSION;

    fn decode_at(body: &[u8], version: u32) -> Settings {
        let manifest = idlewild_codec::ReferenceManifest::new();
        let mut decoder = SaveDecoder::new(SaveReader::new(body), &manifest, version);
        let settings = Settings::decode(&mut decoder).unwrap();
        assert!(decoder.is_exhausted());
        settings
    }

    #[test]
    fn current_round_trip() {
        let settings = Settings {
            auto_eat: true,
            notifications: false,
            offline_combat: false,
        };
        let mut encoder = SaveEncoder::with_capacity(0);
        settings.encode(&mut encoder).unwrap();
        let (_, body) = encoder.finish().unwrap();
        assert_eq!(decode_at(&body, CURRENT_VERSION), settings);
    }

    #[test]
    fn version_109_defaults_offline_combat() {
        let mut encoder = SaveEncoder::with_capacity(0);
        encoder.write_bool(true);
        encoder.write_bool(false);
        let (_, body) = encoder.finish().unwrap();
        let settings = decode_at(&body, 109);
        assert!(settings.auto_eat);
        assert!(!settings.notifications);
        assert!(settings.offline_combat);
    }
}
