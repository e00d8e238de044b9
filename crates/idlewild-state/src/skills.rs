//! Per-skill progress.
//!
//! Each skill is written in its own length-prefixed region keyed by the
//! skill reference. A region whose skill no longer resolves (an extension
//! was uninstalled) is skipped whole; the rest of the stream is unaffected.
//! Levels are derived from experience and recomputed after decode.

use std::collections::BTreeMap;
use std::sync::Arc;

use idlewild_codec::{CodecError, FieldLadder, FieldStep, SaveDecoder, SaveEncoder};
use idlewild_types::{NamespacedId, Registries, Skill, xp};

use crate::legacy::LegacyResolver;
use crate::version::{MIN_SUPPORTED_VERSION, SKILL_MASTERY_POOL};

/// Progress in one skill.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillProgress {
    /// The skill.
    pub skill: Arc<Skill>,
    /// Experience earned.
    pub xp: f64,
    /// Experience banked in the mastery pool.
    pub mastery_pool_xp: f64,
    level: u32,
}

impl SkillProgress {
    /// Fresh progress at level 1.
    pub fn new(skill: Arc<Skill>) -> Self {
        Self {
            skill,
            xp: 0.0,
            mastery_pool_xp: 0.0,
            level: 1,
        }
    }

    /// Derived level.
    pub const fn level(&self) -> u32 {
        self.level
    }

    fn recompute(&mut self) {
        self.level = xp::level_for_xp(self.xp);
    }
}

/// Progress in every known skill, keyed by skill identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skills {
    entries: BTreeMap<NamespacedId, SkillProgress>,
}

impl Skills {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `skill` at zero experience if it is not tracked yet.
    pub fn track(&mut self, skill: &Arc<Skill>) {
        self.entries
            .entry(skill.id.clone())
            .or_insert_with(|| SkillProgress::new(Arc::clone(skill)));
    }

    /// Progress in `id`.
    pub fn get(&self, id: &NamespacedId) -> Option<&SkillProgress> {
        self.entries.get(id)
    }

    /// Level in `id`; untracked skills are level 1.
    pub fn level(&self, id: &NamespacedId) -> u32 {
        self.get(id).map_or(1, SkillProgress::level)
    }

    /// Every tracked skill in identity order.
    pub fn iter(&self) -> impl Iterator<Item = &SkillProgress> {
        self.entries.values()
    }

    /// Number of tracked skills.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no skill is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all tracked skill levels.
    pub fn total_level(&self) -> u32 {
        self.entries
            .values()
            .fold(0_u32, |total, progress| total.saturating_add(progress.level))
    }

    /// Grant `amount` experience in `skill`. Returns the new level if it
    /// went up.
    #[allow(clippy::arithmetic_side_effects)]
    pub fn add_xp(&mut self, skill: &Arc<Skill>, amount: f64) -> Option<u32> {
        self.track(skill);
        let progress = self.entries.get_mut(&skill.id)?;
        let before = progress.level;
        progress.xp += amount.max(0.0);
        progress.recompute();
        (progress.level > before).then_some(progress.level)
    }

    /// Recompute every derived level from experience.
    pub fn recompute(&mut self) {
        for progress in self.entries.values_mut() {
            progress.recompute();
        }
    }

    /// Write the current-version encoding.
    pub fn encode(&self, encoder: &mut SaveEncoder) -> Result<(), CodecError> {
        encoder.write_len(self.entries.len())?;
        for progress in self.entries.values() {
            encoder.write_region(|encoder| {
                encoder.write_ref(progress.skill.as_ref())?;
                encoder.write_f64(progress.xp);
                encoder.write_f64(progress.mastery_pool_xp);
                Ok(())
            })?;
        }
        Ok(())
    }

    /// Decode skills written at `decoder.version()`.
    ///
    /// Levels are left at 1 until [`Skills::recompute`].
    pub fn decode(decoder: &mut SaveDecoder<'_>, registries: &Registries) -> Result<Self, CodecError> {
        let mut skills = Self::new();
        let count = decoder.read_len()?;
        for _ in 0..count {
            let decoded = decoder.read_region(|region| {
                let Some(skill) = region.read_ref(&registries.skills)?.resolved() else {
                    return Ok(None);
                };
                let mut progress = SkillProgress::new(skill);
                SKILL_LADDER.apply(region, &(), &mut progress)?;
                Ok(Some(progress))
            })?;
            if let Some(progress) = decoded {
                skills.entries.insert(progress.skill.id.clone(), progress);
            }
        }
        Ok(skills)
    }

    /// Build skill progress from the legacy experience table.
    pub fn convert_legacy(skill_xp: &BTreeMap<u32, f64>, resolver: &mut LegacyResolver<'_>) -> Self {
        let registries = resolver.registries();
        let mut skills = Self::new();
        for (&old, &xp) in skill_xp {
            if let Some(skill) = resolver.resolve(&registries.skills, old) {
                let mut progress = SkillProgress::new(skill);
                progress.xp = xp.max(0.0);
                skills.entries.insert(progress.skill.id.clone(), progress);
            }
        }
        skills
    }
}

// The skill reference itself is read before the ladder runs so an
// unresolved region can be abandoned.
const SKILL_STEPS: &[FieldStep<SkillProgress, ()>] = &[
    FieldStep::added(MIN_SUPPORTED_VERSION, "xp", read_xp),
    FieldStep::added(SKILL_MASTERY_POOL, "mastery_pool_xp", read_mastery_pool_xp),
];

const SKILL_LADDER: FieldLadder<SkillProgress, ()> = FieldLadder::new("skill", SKILL_STEPS);

fn read_xp(
    decoder: &mut SaveDecoder<'_>,
    _context: &(),
    progress: &mut SkillProgress,
) -> Result<(), CodecError> {
    progress.xp = decoder.read_f64()?;
    Ok(())
}

fn read_mastery_pool_xp(
    decoder: &mut SaveDecoder<'_>,
    _context: &(),
    progress: &mut SkillProgress,
) -> Result<(), CodecError> {
    progress.mastery_pool_xp = decoder.read_f64()?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use idlewild_codec::SaveReader;

    use super::*;
    use crate::version::CURRENT_VERSION;

    fn skill(namespace: &str, local: &str) -> Skill {
        Skill {
            id: NamespacedId::new(namespace, local),
            name: local.to_owned(),
        }
    }

    #[test]
    fn add_xp_reports_level_up() {
        let woodcutting = Arc::new(skill("idlewild", "woodcutting"));
        let mut skills = Skills::new();
        assert_eq!(skills.add_xp(&woodcutting, 50.0), None);
        assert_eq!(skills.add_xp(&woodcutting, 50.0), Some(2));
        assert_eq!(skills.total_level(), 2);
    }

    #[test]
    fn unresolved_skill_region_is_skipped() {
        let mut registries = Registries::new();
        let fishing = registries.skills.register(skill("idlewild", "fishing")).unwrap();
        let mut skills = Skills::new();
        skills.add_xp(&Arc::new(skill("gone_mod", "alchemy")), 5_000.0);
        skills.add_xp(&fishing, 1_000.0);

        let mut encoder = SaveEncoder::with_capacity(0);
        skills.encode(&mut encoder).unwrap();
        encoder.write_u32(77);
        let (manifest, body) = encoder.finish().unwrap();

        let mut decoder = SaveDecoder::new(SaveReader::new(&body), &manifest, CURRENT_VERSION);
        let mut decoded = Skills::decode(&mut decoder, &registries).unwrap();
        assert_eq!(decoder.read_u32().unwrap(), 77);
        assert_eq!(decoder.unresolved().len(), 1);
        assert_eq!(decoded.len(), 1);

        decoded.recompute();
        assert_eq!(decoded.level(&fishing.id), skills.level(&fishing.id));
    }

    #[test]
    fn version_117_region_has_no_mastery_pool() {
        let mut registries = Registries::new();
        let fishing = registries.skills.register(skill("idlewild", "fishing")).unwrap();

        let mut encoder = SaveEncoder::with_capacity(0);
        encoder.write_len(1).unwrap();
        encoder
            .write_region(|encoder| {
                encoder.write_ref(fishing.as_ref())?;
                encoder.write_f64(83.0);
                Ok(())
            })
            .unwrap();
        let (manifest, body) = encoder.finish().unwrap();

        let mut decoder = SaveDecoder::new(SaveReader::new(&body), &manifest, 117);
        let mut decoded = Skills::decode(&mut decoder, &registries).unwrap();
        decoded.recompute();
        let progress = decoded.get(&fishing.id).unwrap();
        assert_eq!(progress.level(), 2);
        assert!(progress.mastery_pool_xp.abs() < f64::EPSILON);
    }
}
