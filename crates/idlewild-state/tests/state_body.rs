//! Integration tests for the versioned state body: decoding older
//! layouts, unresolved content and legacy conversion.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use idlewild_codec::{SaveDecoder, SaveEncoder, SaveReader};
use idlewild_core::SimulationTime;
use idlewild_state::{
    ActiveAction, CURRENT_VERSION, GameState, IdManifest, LegacySave, Profile, starting_registries,
};
use idlewild_types::{NamespacedId, ObjectKind, Registries};
use proptest::prelude::*;

fn base(local: &str) -> NamespacedId {
    NamespacedId::base(local)
}

fn new_state(registries: &Registries) -> GameState {
    GameState::new(
        Profile::new("Ash", base("standard")),
        registries,
        SimulationTime::default(),
    )
}

fn round_trip(state: &GameState, registries: &Registries) -> GameState {
    let mut encoder = SaveEncoder::with_capacity(0);
    state.encode_body(&mut encoder).unwrap();
    let (manifest, body) = encoder.finish().unwrap();
    let mut decoder = SaveDecoder::new(SaveReader::new(&body), &manifest, CURRENT_VERSION);
    let decoded = GameState::decode_body(&mut decoder, registries, state.profile.clone()).unwrap();
    assert!(decoder.is_exhausted());
    assert!(decoder.unresolved().is_empty());
    decoded
}

#[derive(Debug, Clone)]
struct Progress {
    skill_xp: Vec<f64>,
    items: Vec<(usize, u64, bool)>,
    gold_earned: u64,
    gold_spent: u64,
    kills: u8,
    action: Option<(usize, u32)>,
    auto_eat: bool,
    offline_combat: bool,
    ticks: (u64, u64, u64),
    timestamps: (i64, i64),
}

fn progress() -> impl Strategy<Value = Progress> {
    (
        prop::collection::vec(0.0_f64..14_000_000.0, 4),
        prop::collection::vec((0_usize..5, 1_u64..1_000_000, any::<bool>()), 0..6),
        (0_u64..1_000_000, 0_u64..1_000_000),
        any::<u8>(),
        prop::option::of((0_usize..4, 0_u32..40)),
        (any::<bool>(), any::<bool>()),
        (any::<u64>(), any::<u64>(), any::<u64>()),
        (0_i64..4_000_000_000_000, 0_i64..4_000_000_000_000),
    )
        .prop_map(
            |(skill_xp, items, (gold_earned, gold_spent), kills, action, (auto_eat, offline_combat), ticks, timestamps)| {
                Progress {
                    skill_xp,
                    items,
                    gold_earned,
                    gold_spent,
                    kills,
                    action,
                    auto_eat,
                    offline_combat,
                    ticks,
                    timestamps,
                }
            },
        )
}

fn build(registries: &Registries, progress: &Progress) -> GameState {
    let mut state = new_state(registries);
    let skills: Vec<_> = registries.skills.iter().cloned().collect();
    for (skill, xp) in skills.iter().zip(&progress.skill_xp) {
        state.skills.add_xp(skill, *xp);
    }
    let items: Vec<_> = registries.items.iter().cloned().collect();
    for &(index, quantity, locked) in &progress.items {
        let item = items.get(index).unwrap();
        state.bank.add(item, quantity).unwrap();
        if locked {
            state.bank.set_locked(&item.id, true);
        }
    }
    let gold = Arc::clone(registries.currencies.get(&base("gold")).unwrap());
    state.wallet.earn(&gold, progress.gold_earned);
    state.wallet.spend(&gold.id, progress.gold_spent);
    let chicken = registries.monsters.get(&base("chicken")).unwrap();
    for _ in 0..progress.kills {
        state.combat.record_kill(chicken);
    }
    let actions: Vec<_> = registries.actions.iter().cloned().collect();
    state.active_action = progress.action.map(|(index, ticks)| {
        let action = Arc::clone(actions.get(index).unwrap());
        ActiveAction {
            progress_ticks: ticks.min(action.interval_ticks.saturating_sub(1)),
            action,
        }
    });
    state.settings.auto_eat = progress.auto_eat;
    state.settings.offline_combat = progress.offline_combat;
    state.statistics.total_ticks = progress.ticks.0;
    state.statistics.actions_completed = progress.ticks.1;
    state.statistics.offline_ticks = progress.ticks.2;
    state.time.tick_timestamp = progress.timestamps.0;
    state.time.save_timestamp = progress.timestamps.1;
    state.recompute_derived();
    state
}

proptest! {
    #[test]
    fn body_round_trips(progress in progress()) {
        let registries = starting_registries().unwrap();
        let state = build(&registries, &progress);
        let decoded = round_trip(&state, &registries);
        prop_assert_eq!(decoded, state);
    }
}

#[test]
fn derived_values_are_recomputed_after_decode() {
    let registries = starting_registries().unwrap();
    let mut state = new_state(&registries);
    let hitpoints = Arc::clone(registries.skills.get(&base("hitpoints")).unwrap());
    state.skills.add_xp(&hitpoints, 200_000.0);
    state.recompute_derived();
    let max = state.combat.max_hitpoints();
    assert!(max > 100);

    let decoded = round_trip(&state, &registries);
    assert_eq!(decoded.combat.max_hitpoints(), max);
    assert_eq!(decoded.total_level(), state.total_level());
}

/// Body as a version 110 build wrote it: the bank still carries its
/// default-tab byte, statistics have no offline counter and skills have
/// no mastery pool.
#[test]
fn version_110_body_decodes_with_defaults() {
    let registries = starting_registries().unwrap();
    let logs = registries.items.get(&base("logs")).unwrap();
    let gold = registries.currencies.get(&base("gold")).unwrap();
    let fishing = registries.skills.get(&base("fishing")).unwrap();
    let chop = registries.actions.get(&base("chop_normal")).unwrap();

    let mut encoder = SaveEncoder::with_capacity(0);
    encoder.write_i64(1_700_000_000_000);
    encoder.write_i64(1_700_000_005_000);
    encoder.write_bool(true);
    encoder
        .write_region(|e| {
            e.write_ref(chop.as_ref())?;
            e.write_u32(7);
            Ok(())
        })
        .unwrap();
    encoder
        .write_region(|e| {
            e.write_u8(3); // default_tab
            e.write_len(1)?;
            e.write_ref(logs.as_ref())?;
            e.write_u64(25);
            e.write_bool(true);
            Ok(())
        })
        .unwrap();
    encoder
        .write_region(|e| {
            e.write_u32(40);
            e.write_len(0)?;
            e.write_len(0)?;
            Ok(())
        })
        .unwrap();
    encoder
        .write_region(|e| {
            e.write_len(1)?;
            e.write_ref(gold.as_ref())?;
            e.write_u64(300);
            e.write_u64(900);
            Ok(())
        })
        .unwrap();
    encoder
        .write_region(|e| {
            e.write_bool(true);
            e.write_bool(true);
            e.write_bool(false);
            Ok(())
        })
        .unwrap();
    encoder
        .write_region(|e| {
            e.write_u64(5_000);
            e.write_u64(80);
            Ok(())
        })
        .unwrap();
    encoder.write_len(1).unwrap();
    encoder
        .write_region(|e| {
            e.write_ref(fishing.as_ref())?;
            e.write_f64(83.0);
            Ok(())
        })
        .unwrap();
    let (manifest, body) = encoder.finish().unwrap();

    let mut decoder = SaveDecoder::new(SaveReader::new(&body), &manifest, 110);
    let profile = Profile::new("Old", base("standard"));
    let state = GameState::decode_body(&mut decoder, &registries, profile).unwrap();
    assert!(decoder.is_exhausted());

    assert_eq!(state.time.tick_timestamp, 1_700_000_000_000);
    assert_eq!(state.active_action.as_ref().map(|a| a.progress_ticks), Some(7));
    let slot = state.bank.slots().first().unwrap();
    assert_eq!(slot.quantity, 25);
    assert!(slot.locked);
    assert_eq!(state.wallet.primary_amount(), 300);
    assert_eq!(state.wallet.balances().first().unwrap().lifetime_earned, 900);
    assert!(!state.settings.offline_combat);
    assert_eq!(state.statistics.total_ticks, 5_000);
    assert_eq!(state.statistics.offline_ticks, 0);
    let fishing = state.skills.get(&base("fishing")).unwrap();
    assert_eq!(fishing.level(), 2);
    assert!(fishing.mastery_pool_xp.abs() < f64::EPSILON);
    assert_eq!(state.combat.hitpoints, 10);
}

#[test]
fn legacy_conversion_maps_numbers_and_reports_misses() {
    let registries = starting_registries().unwrap();
    let mut manifest = IdManifest::default();
    manifest.skills.insert(0, base("woodcutting"));
    manifest.skills.insert(9, NamespacedId::new("magic_mod", "runecraft"));
    manifest.items.insert(0, base("logs"));
    manifest.actions.insert(2, base("chop_oak"));
    manifest.monsters.insert(1, base("chicken"));
    manifest.gamemodes.insert(0, base("standard"));

    let legacy: LegacySave = serde_json::from_str(
        r#"{
            "characterName": "Rowan",
            "gamemode": 0,
            "tickTimestamp": 1600000000000,
            "saveTimestamp": 1600000001000,
            "offlineAction": 2,
            "actionProgress": 12,
            "bank": [{"id": 0, "qty": 40}, {"id": 5, "qty": 1}],
            "gp": 750,
            "skillXp": {"0": 1200.5, "9": 50.0},
            "monsterKills": {"1": 3},
            "hitpoints": 100,
            "settings": {"autoEat": true},
            "stats": {"totalTicks": 10, "actionsCompleted": 2}
        }"#,
    )
    .unwrap();

    let (state, unresolved) = GameState::from_legacy(&legacy, &manifest, &registries);
    assert_eq!(state.profile.character_name, "Rowan");
    assert_eq!(state.profile.gamemode, base("standard"));
    assert_eq!(state.active_action.as_ref().unwrap().action.id, base("chop_oak"));
    assert_eq!(state.bank.quantity(&base("logs")), 40);
    assert_eq!(state.wallet.primary_amount(), 750);
    assert_eq!(state.combat.kills(&base("chicken")), 3);
    assert!(state.settings.auto_eat);
    assert!(state.settings.offline_combat);
    assert_eq!(state.skills.len(), registries.skills.len());
    // Hitpoints xp was never in the legacy table, so the level is 1 and
    // current hitpoints are clamped to the derived maximum.
    assert_eq!(state.combat.hitpoints, state.combat.max_hitpoints());

    assert_eq!(unresolved.len(), 2);
    assert!(unresolved.iter().any(|miss| miss.kind == ObjectKind::Item && miss.id.is_placeholder()));
    assert!(unresolved.iter().any(|miss| miss.kind == ObjectKind::Skill));
}

#[test]
fn legacy_gamemode_missing_from_manifest_becomes_placeholder() {
    let registries = starting_registries().unwrap();
    let legacy: LegacySave = serde_json::from_str(r#"{"gamemode": 4}"#).unwrap();
    let (state, unresolved) = GameState::from_legacy(&legacy, &IdManifest::default(), &registries);
    assert!(state.profile.gamemode.is_placeholder());
    assert_eq!(unresolved.len(), 1);
}
