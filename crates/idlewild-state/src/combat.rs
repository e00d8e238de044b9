//! Combat progress: hitpoints, equipment and kill counts.
//!
//! Maximum hitpoints are derived from the hitpoints skill level and are
//! never persisted; [`Combat::recompute`] restores them after a decode.

use std::collections::BTreeMap;
use std::sync::Arc;

use idlewild_codec::{CodecError, FieldLadder, FieldStep, SaveDecoder, SaveEncoder};
use idlewild_types::{Item, Monster, NamespacedId, Registries};

use crate::legacy::{LegacyResolver, LegacySave};
use crate::version::MIN_SUPPORTED_VERSION;

/// Maximum hitpoints granted per hitpoints level.
pub const HITPOINTS_PER_LEVEL: u32 = 10;

/// Combat substate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Combat {
    /// Current hitpoints.
    pub hitpoints: u32,
    /// Equipped items.
    pub equipment: Vec<Arc<Item>>,
    kills: BTreeMap<NamespacedId, (Arc<Monster>, u64)>,
    max_hitpoints: u32,
}

impl Combat {
    /// Create a combat state at full health for `hitpoints_level`.
    pub fn new(hitpoints_level: u32) -> Self {
        let mut combat = Self::default();
        combat.recompute(hitpoints_level);
        combat.hitpoints = combat.max_hitpoints;
        combat
    }

    /// Derived maximum hitpoints.
    pub const fn max_hitpoints(&self) -> u32 {
        self.max_hitpoints
    }

    /// Recompute derived values from the hitpoints skill level.
    pub fn recompute(&mut self, hitpoints_level: u32) {
        self.max_hitpoints = hitpoints_level.saturating_mul(HITPOINTS_PER_LEVEL);
        self.hitpoints = self.hitpoints.min(self.max_hitpoints);
    }

    /// Count one kill of `monster`.
    pub fn record_kill(&mut self, monster: &Arc<Monster>) {
        let entry = self
            .kills
            .entry(monster.id.clone())
            .or_insert_with(|| (Arc::clone(monster), 0));
        entry.1 = entry.1.saturating_add(1);
    }

    /// Kills of `id`.
    pub fn kills(&self, id: &NamespacedId) -> u64 {
        self.kills.get(id).map_or(0, |(_, count)| *count)
    }

    /// Every monster killed at least once, with its count.
    pub fn kill_counts(&self) -> impl Iterator<Item = (&Arc<Monster>, u64)> {
        self.kills.values().map(|(monster, count)| (monster, *count))
    }

    /// Write the current-version encoding.
    pub fn encode(&self, encoder: &mut SaveEncoder) -> Result<(), CodecError> {
        encoder.write_u32(self.hitpoints);
        encoder.write_len(self.equipment.len())?;
        for item in &self.equipment {
            encoder.write_ref(item.as_ref())?;
        }
        encoder.write_len(self.kills.len())?;
        for (monster, count) in self.kills.values() {
            encoder.write_ref(monster.as_ref())?;
            encoder.write_u64(*count);
        }
        Ok(())
    }

    /// Decode combat state written at `decoder.version()`.
    ///
    /// Equipment and kill entries that no longer resolve are dropped.
    /// Derived values are left at zero until [`Combat::recompute`].
    pub fn decode(decoder: &mut SaveDecoder<'_>, registries: &Registries) -> Result<Self, CodecError> {
        let mut combat = Self::default();
        COMBAT_LADDER.apply(decoder, registries, &mut combat)?;
        Ok(combat)
    }

    /// Build combat state from a legacy save.
    pub fn convert_legacy(legacy: &LegacySave, resolver: &mut LegacyResolver<'_>) -> Self {
        let registries = resolver.registries();
        let mut combat = Self {
            hitpoints: legacy.hitpoints,
            ..Self::default()
        };
        for &old in &legacy.equipment {
            if let Some(item) = resolver.resolve(&registries.items, old) {
                combat.equipment.push(item);
            }
        }
        for (&old, &count) in &legacy.monster_kills {
            if let Some(monster) = resolver.resolve(&registries.monsters, old) {
                combat
                    .kills
                    .insert(monster.id.clone(), (monster, count));
            }
        }
        combat
    }
}

const COMBAT_STEPS: &[FieldStep<Combat, Registries>] = &[
    FieldStep::added(MIN_SUPPORTED_VERSION, "hitpoints", read_hitpoints),
    FieldStep::added(MIN_SUPPORTED_VERSION, "equipment", read_equipment),
    FieldStep::added(MIN_SUPPORTED_VERSION, "kills", read_kills),
];

const COMBAT_LADDER: FieldLadder<Combat, Registries> = FieldLadder::new("combat", COMBAT_STEPS);

fn read_hitpoints(
    decoder: &mut SaveDecoder<'_>,
    _registries: &Registries,
    combat: &mut Combat,
) -> Result<(), CodecError> {
    combat.hitpoints = decoder.read_u32()?;
    Ok(())
}

fn read_equipment(
    decoder: &mut SaveDecoder<'_>,
    registries: &Registries,
    combat: &mut Combat,
) -> Result<(), CodecError> {
    let count = decoder.read_len()?;
    for _ in 0..count {
        if let Some(item) = decoder.read_ref(&registries.items)?.resolved() {
            combat.equipment.push(item);
        }
    }
    Ok(())
}

fn read_kills(
    decoder: &mut SaveDecoder<'_>,
    registries: &Registries,
    combat: &mut Combat,
) -> Result<(), CodecError> {
    let count = decoder.read_len()?;
    for _ in 0..count {
        let monster = decoder.read_ref(&registries.monsters)?.resolved();
        let kills = decoder.read_u64()?;
        if let Some(monster) = monster {
            combat.kills.insert(monster.id.clone(), (monster, kills));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use idlewild_codec::SaveReader;

    use super::*;
    use crate::version::CURRENT_VERSION;

    fn chicken() -> Monster {
        Monster {
            id: NamespacedId::base("chicken"),
            name: "Chicken".to_owned(),
            hitpoints: 3,
        }
    }

    #[test]
    fn max_hitpoints_are_derived() {
        let mut combat = Combat::new(10);
        assert_eq!(combat.max_hitpoints(), 100);
        assert_eq!(combat.hitpoints, 100);

        combat.recompute(5);
        assert_eq!(combat.max_hitpoints(), 50);
        assert_eq!(combat.hitpoints, 50);
    }

    #[test]
    fn kills_round_trip_without_derived_fields() {
        let mut registries = Registries::new();
        let chicken = registries.monsters.register(chicken()).unwrap();

        let mut combat = Combat::new(10);
        combat.hitpoints = 42;
        combat.record_kill(&chicken);
        combat.record_kill(&chicken);

        let mut encoder = SaveEncoder::with_capacity(0);
        combat.encode(&mut encoder).unwrap();
        let (manifest, body) = encoder.finish().unwrap();

        let mut decoder = SaveDecoder::new(SaveReader::new(&body), &manifest, CURRENT_VERSION);
        let mut decoded = Combat::decode(&mut decoder, &registries).unwrap();
        assert!(decoder.is_exhausted());
        assert_eq!(decoded.kills(&chicken.id), 2);
        assert_eq!(decoded.max_hitpoints(), 0);

        decoded.recompute(10);
        assert_eq!(decoded, combat);
    }
}
