//! [`Game`]: the state graph as a [`Simulation`].
//!
//! One tick advances the active action by one step. When a repetition
//! completes it grants experience, its product and its kill, and the
//! statistics record whether the tick ran during offline catch-up.
//!
//! A tick either applies in full or fails with no change: the completion
//! is resolved and checked against the bank before anything is written.

use std::sync::Arc;

use idlewild_core::{Diagnostics, Simulation, SimulationTime, Snapshot, TickFault};
use idlewild_types::{Action, BASE_NAMESPACE, Item, Monster, NamespacedId, Registries, Skill};
use tracing::{debug, info};

use crate::action::ActiveAction;
use crate::error::StateError;
use crate::state::{GameState, HITPOINTS_SKILL};
use crate::wallet::PRIMARY_CURRENCY;

/// Live game: persisted state plus the content it refers to.
#[derive(Debug, Clone)]
pub struct Game {
    state: GameState,
    registries: Arc<Registries>,
    offline: bool,
}

impl Game {
    /// Wrap a loaded or freshly created state.
    pub const fn new(state: GameState, registries: Arc<Registries>) -> Self {
        Self {
            state,
            registries,
            offline: false,
        }
    }

    /// The persisted state.
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Mutable access to the persisted state.
    pub const fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    /// The content registries.
    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    /// Whether offline catch-up is running.
    pub const fn is_offline(&self) -> bool {
        self.offline
    }

    /// Start repeating the action registered as `id`, replacing any
    /// action in progress.
    pub fn start_action(&mut self, id: &NamespacedId) -> Result<(), StateError> {
        let action = self
            .registries
            .actions
            .get(id)
            .ok_or_else(|| StateError::UnknownAction(id.clone()))?;
        info!(action = %id, "action started");
        self.state.active_action = Some(ActiveAction::start(Arc::clone(action)));
        Ok(())
    }

    /// Stop the action in progress, returning it.
    pub fn stop_action(&mut self) -> Option<ActiveAction> {
        let stopped = self.state.active_action.take();
        if let Some(active) = &stopped {
            info!(action = %active.action.id, "action stopped");
        }
        stopped
    }

    /// Consume the game, returning its state.
    pub fn into_state(self) -> GameState {
        self.state
    }

    /// Resolve everything a completion of `action` touches and check that
    /// it fits, without changing any state.
    fn prepare(&self, action: &Action) -> Result<Completion, StateError> {
        let skill = self
            .registries
            .skills
            .get(&action.skill)
            .ok_or_else(|| StateError::UnknownSkill(action.skill.clone()))?;
        let product = match &action.product {
            Some(product) => {
                let item = self
                    .registries
                    .items
                    .get(product)
                    .ok_or_else(|| StateError::UnknownItem(product.clone()))?;
                if !self.state.bank.can_store(&item.id) {
                    return Err(StateError::BankFull {
                        item: item.id.clone(),
                    });
                }
                Some(Arc::clone(item))
            }
            None => None,
        };
        let monster = match &action.monster {
            Some(monster_id) => Some(Arc::clone(
                self.registries
                    .monsters
                    .get(monster_id)
                    .ok_or_else(|| StateError::UnknownMonster(monster_id.clone()))?,
            )),
            None => None,
        };
        Ok(Completion {
            skill: Arc::clone(skill),
            xp: action.xp,
            product,
            monster,
        })
    }

    fn apply(&mut self, completion: &Completion) -> Result<(), StateError> {
        if let Some(item) = &completion.product {
            self.state.bank.add(item, 1)?;
        }

        let skill = &completion.skill;
        if let Some(level) = self.state.skills.add_xp(skill, completion.xp) {
            debug!(skill = %skill.id, level, "level up");
            if skill.id.local_id() == HITPOINTS_SKILL && skill.id.namespace() == BASE_NAMESPACE {
                self.state.combat.recompute(level);
            }
        }

        if let Some(monster) = &completion.monster {
            self.state.combat.record_kill(monster);
            let gold = NamespacedId::base(PRIMARY_CURRENCY);
            if let Some(currency) = self.registries.currencies.get(&gold) {
                self.state
                    .wallet
                    .earn(currency, u64::from(monster.hitpoints));
            }
        }

        self.state.statistics.record_completion();
        Ok(())
    }
}

/// Resolved effects of one action repetition.
#[derive(Debug)]
struct Completion {
    skill: Arc<Skill>,
    xp: f64,
    product: Option<Arc<Item>>,
    monster: Option<Arc<Monster>>,
}

impl Simulation for Game {
    fn tick(&mut self) -> Result<(), TickFault> {
        // A tick that cannot complete its repetition changes nothing.
        let completion = match &self.state.active_action {
            Some(active) if active.completes_next_tick() => Some(
                self.prepare(&active.action)
                    .map_err(|err| TickFault::new(err.to_string()))?,
            ),
            _ => None,
        };
        self.state.statistics.record_tick(self.offline);
        if let Some(active) = self.state.active_action.as_mut() {
            active.advance();
        }
        if let Some(completion) = completion {
            self.apply(&completion)
                .map_err(|err| TickFault::new(err.to_string()))?;
        }
        Ok(())
    }

    fn has_meaningful_work(&self) -> bool {
        self.state
            .active_action
            .as_ref()
            .is_some_and(|active| active.action.offline_allowed)
    }

    fn blocks_offline(&self) -> bool {
        self.state
            .active_action
            .as_ref()
            .is_some_and(|active| active.action.monster.is_some())
            && !self.state.settings.offline_combat
    }

    fn capture(&self) -> Snapshot {
        self.state.capture_snapshot()
    }

    fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            active_action: self
                .state
                .active_action
                .as_ref()
                .map(|active| active.action.id.to_string()),
            equipment: self
                .state
                .combat
                .equipment
                .iter()
                .map(|item| item.id.to_string())
                .collect(),
            extensions: self
                .registries
                .namespaces()
                .filter(|namespace| *namespace != BASE_NAMESPACE)
                .map(str::to_owned)
                .collect(),
        }
    }

    fn time(&self) -> &SimulationTime {
        &self.state.time
    }

    fn time_mut(&mut self) -> &mut SimulationTime {
        &mut self.state.time
    }

    fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use idlewild_core::TrackedKind;

    use super::*;
    use crate::bank::BANK_CAPACITY;
    use crate::starting_content::starting_registries;
    use crate::state::Profile;

    fn game() -> Game {
        let registries = Arc::new(starting_registries().unwrap());
        let state = GameState::new(
            Profile::new("Ash", NamespacedId::base("standard")),
            &registries,
            SimulationTime::default(),
        );
        Game::new(state, registries)
    }

    #[test]
    fn completing_an_action_grants_xp_and_product() {
        let mut game = game();
        game.start_action(&NamespacedId::base("chop_normal")).unwrap();
        let interval = game.state().active_action.as_ref().unwrap().action.interval_ticks;
        for _ in 0..interval {
            game.tick().unwrap();
        }
        assert_eq!(game.state().bank.quantity(&NamespacedId::base("logs")), 1);
        assert_eq!(game.state().statistics.actions_completed, 1);
        let before = Snapshot::new();
        let delta = before.diff(&game.capture());
        assert!(delta.change_for(TrackedKind::SkillXp, &NamespacedId::base("woodcutting")).is_some());
    }

    #[test]
    fn full_bank_fails_the_tick_without_granting_xp() {
        let mut game = game();
        for index in 0..BANK_CAPACITY {
            let filler = Arc::new(Item {
                id: NamespacedId::base(format!("filler_{index}")),
                name: String::new(),
                sell_price: 0,
            });
            game.state_mut().bank.add(&filler, 1).unwrap();
        }
        game.start_action(&NamespacedId::base("chop_normal")).unwrap();
        let interval = game.state().active_action.as_ref().unwrap().action.interval_ticks;
        for _ in 1..interval {
            game.tick().unwrap();
        }
        let before = game.state().clone();

        let fault = game.tick().unwrap_err();
        assert!(fault.message.contains("bank is full"));
        assert_eq!(game.state(), &before);
        let woodcutting = game.state().skills.get(&NamespacedId::base("woodcutting"));
        assert!(woodcutting.is_none_or(|progress| progress.xp < 1.0));
        assert_eq!(game.state().statistics.actions_completed, 0);
    }

    #[test]
    fn offline_ticks_are_counted() {
        let mut game = game();
        game.set_offline(true);
        game.tick().unwrap();
        game.set_offline(false);
        game.tick().unwrap();
        assert_eq!(game.state().statistics.total_ticks, 2);
        assert_eq!(game.state().statistics.offline_ticks, 1);
    }

    #[test]
    fn combat_blocks_offline_only_when_disabled() {
        let mut game = game();
        game.start_action(&NamespacedId::base("fight_chicken")).unwrap();
        assert!(!game.blocks_offline());
        game.state_mut().settings.offline_combat = false;
        assert!(game.blocks_offline());
    }

    #[test]
    fn idle_game_has_no_meaningful_work() {
        let mut game = game();
        assert!(!game.has_meaningful_work());
        game.start_action(&NamespacedId::base("fish_shrimp")).unwrap();
        assert!(game.has_meaningful_work());
        assert!(game.stop_action().is_some());
        assert!(!game.has_meaningful_work());
    }

    #[test]
    fn unknown_action_is_rejected() {
        let mut game = game();
        let err = game.start_action(&NamespacedId::base("juggle")).unwrap_err();
        assert!(matches!(err, StateError::UnknownAction(_)));
    }

    #[test]
    fn diagnostics_list_extensions() {
        let mut registries = starting_registries().unwrap();
        registries.install_namespace("gems_mod");
        let registries = Arc::new(registries);
        let state = GameState::new(
            Profile::new("Ash", NamespacedId::base("standard")),
            &registries,
            SimulationTime::default(),
        );
        let game = Game::new(state, registries);
        assert_eq!(game.diagnostics().extensions, vec!["gems_mod".to_owned()]);
    }
}
