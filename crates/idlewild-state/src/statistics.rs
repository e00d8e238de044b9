//! Lifetime counters.

use idlewild_codec::{CodecError, FieldLadder, FieldStep, SaveDecoder, SaveEncoder};

use crate::legacy::LegacyStats;
use crate::version::{MIN_SUPPORTED_VERSION, STATISTICS_OFFLINE_TICKS};

/// Persisted statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    /// Ticks ever simulated.
    pub total_ticks: u64,
    /// Action repetitions ever completed.
    pub actions_completed: u64,
    /// Ticks simulated during offline catch-up.
    pub offline_ticks: u64,
}

impl Statistics {
    /// Count one simulated tick.
    pub const fn record_tick(&mut self, offline: bool) {
        self.total_ticks = self.total_ticks.saturating_add(1);
        if offline {
            self.offline_ticks = self.offline_ticks.saturating_add(1);
        }
    }

    /// Count one completed action repetition.
    pub const fn record_completion(&mut self) {
        self.actions_completed = self.actions_completed.saturating_add(1);
    }

    /// Write the current-version encoding.
    pub fn encode(&self, encoder: &mut SaveEncoder) -> Result<(), CodecError> {
        encoder.write_u64(self.total_ticks);
        encoder.write_u64(self.actions_completed);
        encoder.write_u64(self.offline_ticks);
        Ok(())
    }

    /// Decode statistics written at `decoder.version()`.
    pub fn decode(decoder: &mut SaveDecoder<'_>) -> Result<Self, CodecError> {
        let mut statistics = Self::default();
        STATISTICS_LADDER.apply(decoder, &(), &mut statistics)?;
        Ok(statistics)
    }

    /// Convert the legacy statistics block.
    pub const fn convert_legacy(legacy: &LegacyStats) -> Self {
        Self {
            total_ticks: legacy.total_ticks,
            actions_completed: legacy.actions_completed,
            offline_ticks: 0,
        }
    }
}

const STATISTICS_STEPS: &[FieldStep<Statistics, ()>] = &[
    FieldStep::added(MIN_SUPPORTED_VERSION, "total_ticks", read_total_ticks),
    FieldStep::added(MIN_SUPPORTED_VERSION, "actions_completed", read_actions_completed),
    FieldStep::added(STATISTICS_OFFLINE_TICKS, "offline_ticks", read_offline_ticks),
];

const STATISTICS_LADDER: FieldLadder<Statistics, ()> =
    FieldLadder::new("statistics", STATISTICS_STEPS);

fn read_total_ticks(
    decoder: &mut SaveDecoder<'_>,
    _context: &(),
    statistics: &mut Statistics,
) -> Result<(), CodecError> {
    statistics.total_ticks = decoder.read_u64()?;
    Ok(())
}

fn read_actions_completed(
    decoder: &mut SaveDecoder<'_>,
    _context: &(),
    statistics: &mut Statistics,
) -> Result<(), CodecError> {
    statistics.actions_completed = decoder.read_u64()?;
    Ok(())
}

fn read_offline_ticks(
    decoder: &mut SaveDecoder<'_>,
    _context: &(),
    statistics: &mut Statistics,
) -> Result<(), CodecError> {
    statistics.offline_ticks = decoder.read_u64()?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use idlewild_codec::{ReferenceManifest, SaveReader};

    use super::*;

    #[test]
    fn version_110_stream_skips_offline_ticks() {
        let mut encoder = SaveEncoder::with_capacity(0);
        encoder.write_u64(900);
        encoder.write_u64(30);
        encoder.write_u8(0x5A);
        let (_, body) = encoder.finish().unwrap();

        let manifest = ReferenceManifest::new();
        let mut decoder = SaveDecoder::new(SaveReader::new(&body), &manifest, 110);
        let statistics = Statistics::decode(&mut decoder).unwrap();
        assert_eq!(statistics.total_ticks, 900);
        assert_eq!(statistics.actions_completed, 30);
        assert_eq!(statistics.offline_ticks, 0);
        // The next field is still where the writer put it.
        assert_eq!(decoder.read_u8().unwrap(), 0x5A);
    }

    #[test]
    fn offline_ticks_counted_separately() {
        let mut statistics = Statistics::default();
        statistics.record_tick(false);
        statistics.record_tick(true);
        statistics.record_tick(true);
        assert_eq!(statistics.total_ticks, 3);
        assert_eq!(statistics.offline_ticks, 2);
    }
}
