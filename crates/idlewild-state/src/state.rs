//! The persisted player state graph.
//!
//! [`GameState`] owns every substate and knows the body layout: scheduler
//! timestamps, the active action, then one length-prefixed region per
//! subsystem and finally the per-skill regions. Profile fields (name,
//! gamemode, mod profile) live in the save header, so the body decode
//! receives them from the caller instead of reading them.

use idlewild_codec::{
    CodecError, FieldLadder, FieldStep, SaveDecoder, SaveEncoder, UnresolvedReference,
};
use idlewild_core::{SimulationTime, Snapshot, TrackedKind};
use idlewild_types::{NamespacedId, ObjectKind, Registries, xp};
use tracing::{debug, info};

use crate::action::ActiveAction;
use crate::bank::Bank;
use crate::combat::Combat;
use crate::legacy::{IdManifest, LegacyResolver, LegacySave};
use crate::settings::Settings;
use crate::skills::Skills;
use crate::statistics::Statistics;
use crate::version::MIN_SUPPORTED_VERSION;
use crate::wallet::Wallet;

/// Local ID of the skill whose level sets maximum hitpoints.
pub const HITPOINTS_SKILL: &str = "hitpoints";

/// Hitpoints level of a new character.
pub const STARTING_HITPOINTS_LEVEL: u32 = 10;

/// Identity fields stored in the save header rather than the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Character name.
    pub character_name: String,
    /// Gamemode identity. May be a placeholder when converted from a
    /// legacy save whose gamemode no longer exists.
    pub gamemode: NamespacedId,
    /// Name of the mod profile the save was played with.
    pub mod_profile: Option<String>,
}

impl Profile {
    /// A profile with no mod profile.
    pub fn new(character_name: impl Into<String>, gamemode: NamespacedId) -> Self {
        Self {
            character_name: character_name.into(),
            gamemode,
            mod_profile: None,
        }
    }
}

/// Full persisted state plus derived values.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    /// Header identity fields.
    pub profile: Profile,
    /// Scheduler timestamps.
    pub time: SimulationTime,
    /// Action in progress, if any.
    pub active_action: Option<ActiveAction>,
    /// Item storage.
    pub bank: Bank,
    /// Combat progress.
    pub combat: Combat,
    /// Currency balances.
    pub wallet: Wallet,
    /// Player settings.
    pub settings: Settings,
    /// Lifetime counters.
    pub statistics: Statistics,
    /// Per-skill progress.
    pub skills: Skills,
}

impl GameState {
    /// A new character tracking every registered skill.
    pub fn new(profile: Profile, registries: &Registries, time: SimulationTime) -> Self {
        let mut skills = Skills::new();
        for skill in registries.skills.iter() {
            skills.track(skill);
        }
        if let Some(hitpoints) = registries.skills.get(&NamespacedId::base(HITPOINTS_SKILL)) {
            let floor = xp::xp_for_level(STARTING_HITPOINTS_LEVEL);
            skills.add_xp(hitpoints, floor);
        }
        let mut state = Self {
            profile,
            time,
            active_action: None,
            bank: Bank::new(),
            combat: Combat::default(),
            wallet: Wallet::new(),
            settings: Settings::default(),
            statistics: Statistics::default(),
            skills,
        };
        state.combat = Combat::new(state.hitpoints_level());
        state
    }

    /// Sum of all skill levels.
    pub fn total_level(&self) -> u32 {
        self.skills.total_level()
    }

    /// Current hitpoints skill level.
    pub fn hitpoints_level(&self) -> u32 {
        self.skills.level(&NamespacedId::base(HITPOINTS_SKILL))
    }

    /// Recompute every derived value from persisted progress.
    pub fn recompute_derived(&mut self) {
        self.skills.recompute();
        let level = self.hitpoints_level();
        self.combat.recompute(level);
    }

    /// Write the body in the current schema.
    pub fn encode_body(&self, encoder: &mut SaveEncoder) -> Result<(), CodecError> {
        encoder.write_i64(self.time.tick_timestamp);
        encoder.write_i64(self.time.save_timestamp);
        ActiveAction::encode(self.active_action.as_ref(), encoder)?;
        encoder.write_region(|encoder| self.bank.encode(encoder))?;
        encoder.write_region(|encoder| self.combat.encode(encoder))?;
        encoder.write_region(|encoder| self.wallet.encode(encoder))?;
        encoder.write_region(|encoder| self.settings.encode(encoder))?;
        encoder.write_region(|encoder| self.statistics.encode(encoder))?;
        self.skills.encode(encoder)
    }

    /// Decode a body written at `decoder.version()` and recompute derived
    /// values. Unresolved references are left on the decoder.
    pub fn decode_body(
        decoder: &mut SaveDecoder<'_>,
        registries: &Registries,
        profile: Profile,
    ) -> Result<Self, CodecError> {
        let mut draft = BodyDraft::default();
        BODY_LADDER.apply(decoder, registries, &mut draft)?;

        let mut state = Self {
            profile,
            time: SimulationTime {
                tick_timestamp: draft.tick_timestamp,
                save_timestamp: draft.save_timestamp,
                previous_tick_time: 0.0,
            },
            active_action: draft.active_action,
            bank: draft.bank,
            combat: draft.combat,
            wallet: draft.wallet,
            settings: draft.settings,
            statistics: draft.statistics,
            skills: draft.skills,
        };
        state.recompute_derived();
        debug!(
            version = decoder.version(),
            skills = state.skills.len(),
            bank_slots = state.bank.slots().len(),
            "decoded state body"
        );
        Ok(state)
    }

    /// Convert a legacy save, subsystem by subsystem.
    ///
    /// Returns the state and every reference that failed to map.
    pub fn from_legacy(
        legacy: &LegacySave,
        manifest: &IdManifest,
        registries: &Registries,
    ) -> (Self, Vec<UnresolvedReference>) {
        let mut resolver = LegacyResolver::new(manifest, registries);
        let gamemode = resolver
            .resolve(&registries.gamemodes, legacy.gamemode)
            .map_or_else(
                || manifest.lookup_or_placeholder(ObjectKind::Gamemode, legacy.gamemode),
                |gamemode| gamemode.id.clone(),
            );

        let mut skills = Skills::convert_legacy(&legacy.skill_xp, &mut resolver);
        for skill in registries.skills.iter() {
            skills.track(skill);
        }

        let mut state = Self {
            profile: Profile::new(legacy.character_name.clone(), gamemode),
            time: SimulationTime {
                tick_timestamp: legacy.tick_timestamp,
                save_timestamp: legacy.save_timestamp,
                previous_tick_time: 0.0,
            },
            active_action: ActiveAction::convert_legacy(legacy, &mut resolver),
            bank: Bank::convert_legacy(&legacy.bank, &mut resolver),
            combat: Combat::convert_legacy(legacy, &mut resolver),
            wallet: Wallet::convert_legacy(legacy, &mut resolver),
            settings: Settings::convert_legacy(&legacy.settings),
            statistics: Statistics::convert_legacy(&legacy.stats),
            skills,
        };
        state.recompute_derived();

        let unresolved = resolver.into_unresolved();
        info!(
            character = %state.profile.character_name,
            unresolved = unresolved.len(),
            "converted legacy save"
        );
        (state, unresolved)
    }

    /// Value copy of every tracked quantity.
    #[allow(clippy::cast_precision_loss)]
    pub fn capture_snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::new();
        for progress in self.skills.iter() {
            let id = progress.skill.id.clone();
            snapshot.record(TrackedKind::SkillXp, id.clone(), progress.xp);
            snapshot.record(TrackedKind::SkillLevel, id, f64::from(progress.level()));
        }
        for balance in self.wallet.balances() {
            snapshot.record(
                TrackedKind::Currency,
                balance.currency.id.clone(),
                balance.amount as f64,
            );
        }
        for slot in self.bank.slots() {
            snapshot.record(TrackedKind::Item, slot.item.id.clone(), slot.quantity as f64);
        }
        for (monster, count) in self.combat.kill_counts() {
            snapshot.record(TrackedKind::Kills, monster.id.clone(), count as f64);
        }
        snapshot
    }
}

/// Body fields as they come off the stream, before derived values.
#[derive(Debug, Default)]
struct BodyDraft {
    tick_timestamp: i64,
    save_timestamp: i64,
    active_action: Option<ActiveAction>,
    bank: Bank,
    combat: Combat,
    wallet: Wallet,
    settings: Settings,
    statistics: Statistics,
    skills: Skills,
}

const BODY_STEPS: &[FieldStep<BodyDraft, Registries>] = &[
    FieldStep::added(MIN_SUPPORTED_VERSION, "tick_timestamp", read_tick_timestamp),
    FieldStep::added(MIN_SUPPORTED_VERSION, "save_timestamp", read_save_timestamp),
    FieldStep::added(MIN_SUPPORTED_VERSION, "active_action", read_active_action),
    FieldStep::added(MIN_SUPPORTED_VERSION, "bank", read_bank),
    FieldStep::added(MIN_SUPPORTED_VERSION, "combat", read_combat),
    FieldStep::added(MIN_SUPPORTED_VERSION, "wallet", read_wallet),
    FieldStep::added(MIN_SUPPORTED_VERSION, "settings", read_settings),
    FieldStep::added(MIN_SUPPORTED_VERSION, "statistics", read_statistics),
    FieldStep::added(MIN_SUPPORTED_VERSION, "skills", read_skills),
];

const BODY_LADDER: FieldLadder<BodyDraft, Registries> = FieldLadder::new("body", BODY_STEPS);

fn read_tick_timestamp(
    decoder: &mut SaveDecoder<'_>,
    _registries: &Registries,
    draft: &mut BodyDraft,
) -> Result<(), CodecError> {
    draft.tick_timestamp = decoder.read_i64()?;
    Ok(())
}

fn read_save_timestamp(
    decoder: &mut SaveDecoder<'_>,
    _registries: &Registries,
    draft: &mut BodyDraft,
) -> Result<(), CodecError> {
    draft.save_timestamp = decoder.read_i64()?;
    Ok(())
}

fn read_active_action(
    decoder: &mut SaveDecoder<'_>,
    registries: &Registries,
    draft: &mut BodyDraft,
) -> Result<(), CodecError> {
    draft.active_action = ActiveAction::decode(decoder, registries)?;
    Ok(())
}

fn read_bank(
    decoder: &mut SaveDecoder<'_>,
    registries: &Registries,
    draft: &mut BodyDraft,
) -> Result<(), CodecError> {
    draft.bank = decoder.read_region(|region| Bank::decode(region, registries))?;
    Ok(())
}

fn read_combat(
    decoder: &mut SaveDecoder<'_>,
    registries: &Registries,
    draft: &mut BodyDraft,
) -> Result<(), CodecError> {
    draft.combat = decoder.read_region(|region| Combat::decode(region, registries))?;
    Ok(())
}

fn read_wallet(
    decoder: &mut SaveDecoder<'_>,
    registries: &Registries,
    draft: &mut BodyDraft,
) -> Result<(), CodecError> {
    draft.wallet = decoder.read_region(|region| Wallet::decode(region, registries))?;
    Ok(())
}

fn read_settings(
    decoder: &mut SaveDecoder<'_>,
    _registries: &Registries,
    draft: &mut BodyDraft,
) -> Result<(), CodecError> {
    draft.settings = decoder.read_region(Settings::decode)?;
    Ok(())
}

fn read_statistics(
    decoder: &mut SaveDecoder<'_>,
    _registries: &Registries,
    draft: &mut BodyDraft,
) -> Result<(), CodecError> {
    draft.statistics = decoder.read_region(Statistics::decode)?;
    Ok(())
}

fn read_skills(
    decoder: &mut SaveDecoder<'_>,
    registries: &Registries,
    draft: &mut BodyDraft,
) -> Result<(), CodecError> {
    draft.skills = Skills::decode(decoder, registries)?;
    Ok(())
}
