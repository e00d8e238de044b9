//! The action the player left running.

use std::sync::Arc;

use idlewild_codec::{CodecError, SaveDecoder, SaveEncoder};
use idlewild_types::{Action, Registries};

use crate::legacy::{LegacyResolver, LegacySave};

/// A repeating action in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveAction {
    /// The action.
    pub action: Arc<Action>,
    /// Ticks into the current repetition.
    pub progress_ticks: u32,
}

impl ActiveAction {
    /// Start `action` from the beginning of a repetition.
    pub const fn start(action: Arc<Action>) -> Self {
        Self {
            action,
            progress_ticks: 0,
        }
    }

    /// Whether the next [`advance`](Self::advance) completes a repetition.
    pub fn completes_next_tick(&self) -> bool {
        self.progress_ticks.saturating_add(1) >= self.action.interval_ticks.max(1)
    }

    /// Advance one tick. Returns `true` when a repetition completes, after
    /// which progress restarts from zero.
    pub fn advance(&mut self) -> bool {
        self.progress_ticks = self.progress_ticks.saturating_add(1);
        if self.progress_ticks >= self.action.interval_ticks.max(1) {
            self.progress_ticks = 0;
            return true;
        }
        false
    }

    /// Write `active` as a presence flag plus a region.
    pub fn encode(active: Option<&Self>, encoder: &mut SaveEncoder) -> Result<(), CodecError> {
        encoder.write_bool(active.is_some());
        if let Some(active) = active {
            encoder.write_region(|encoder| {
                encoder.write_ref(active.action.as_ref())?;
                encoder.write_u32(active.progress_ticks);
                Ok(())
            })?;
        }
        Ok(())
    }

    /// Decode the active action. An action that no longer resolves
    /// degrades to no active action.
    pub fn decode(
        decoder: &mut SaveDecoder<'_>,
        registries: &Registries,
    ) -> Result<Option<Self>, CodecError> {
        if !decoder.read_bool()? {
            return Ok(None);
        }
        decoder.read_region(|region| {
            let Some(action) = region.read_ref(&registries.actions)?.resolved() else {
                return Ok(None);
            };
            let progress_ticks = region.read_u32()?;
            Ok(Some(Self {
                action,
                progress_ticks,
            }))
        })
    }

    /// Recover the action running when a legacy save was written.
    pub fn convert_legacy(legacy: &LegacySave, resolver: &mut LegacyResolver<'_>) -> Option<Self> {
        let registries = resolver.registries();
        let action = resolver.resolve(&registries.actions, legacy.offline_action?)?;
        let progress_ticks = legacy
            .action_progress
            .min(action.interval_ticks.saturating_sub(1));
        Some(Self {
            action,
            progress_ticks,
        })
    }
}
