//! Built-in base content.
//!
//! A small content set in the base namespace: four skills, a handful of
//! items, one currency, two gamemodes, one monster and the actions that
//! tie them together. Enough for a new character to idle on.

use idlewild_types::{
    Action, Currency, Gamemode, Item, Monster, NamespacedId, Registries, Skill,
};

use crate::error::StateError;

/// Helper to build a skill.
fn skill(local: &str, name: &str) -> Skill {
    Skill {
        id: NamespacedId::base(local),
        name: name.to_owned(),
    }
}

/// Helper to build an item.
fn item(local: &str, name: &str, sell_price: u64) -> Item {
    Item {
        id: NamespacedId::base(local),
        name: name.to_owned(),
        sell_price,
    }
}

/// Helper to build a skilling action that yields `product`.
fn gather(local: &str, name: &str, skill: &str, interval_ticks: u32, xp: f64, product: &str) -> Action {
    Action {
        id: NamespacedId::base(local),
        name: name.to_owned(),
        skill: NamespacedId::base(skill),
        interval_ticks,
        xp,
        product: Some(NamespacedId::base(product)),
        monster: None,
        offline_allowed: true,
    }
}

/// Registries holding the base content.
pub fn starting_registries() -> Result<Registries, StateError> {
    let mut registries = Registries::new();

    registries.skills.register(skill("woodcutting", "Woodcutting"))?;
    registries.skills.register(skill("fishing", "Fishing"))?;
    registries.skills.register(skill("attack", "Attack"))?;
    registries.skills.register(skill("hitpoints", "Hitpoints"))?;

    registries.items.register(item("logs", "Logs", 1))?;
    registries.items.register(item("oak_logs", "Oak Logs", 5))?;
    registries.items.register(item("raw_shrimp", "Raw Shrimp", 2))?;
    registries.items.register(item("feathers", "Feathers", 1))?;
    registries.items.register(item("bronze_axe", "Bronze Axe", 10))?;

    registries.currencies.register(Currency {
        id: NamespacedId::base("gold"),
        name: "Gold".to_owned(),
    })?;

    registries.gamemodes.register(Gamemode {
        id: NamespacedId::base("standard"),
        name: "Standard".to_owned(),
    })?;
    registries.gamemodes.register(Gamemode {
        id: NamespacedId::base("hardcore"),
        name: "Hardcore".to_owned(),
    })?;

    registries.monsters.register(Monster {
        id: NamespacedId::base("chicken"),
        name: "Chicken".to_owned(),
        hitpoints: 3,
    })?;

    // 50 ms ticks: 60 ticks is three seconds.
    registries
        .actions
        .register(gather("chop_normal", "Cut Normal Tree", "woodcutting", 60, 10.0, "logs"))?;
    registries
        .actions
        .register(gather("chop_oak", "Cut Oak Tree", "woodcutting", 80, 15.0, "oak_logs"))?;
    registries
        .actions
        .register(gather("fish_shrimp", "Fish Shrimp", "fishing", 100, 10.0, "raw_shrimp"))?;
    registries.actions.register(Action {
        id: NamespacedId::base("fight_chicken"),
        name: "Fight Chicken".to_owned(),
        skill: NamespacedId::base("attack"),
        interval_ticks: 48,
        xp: 12.0,
        product: Some(NamespacedId::base("feathers")),
        monster: Some(NamespacedId::base("chicken")),
        offline_allowed: true,
    })?;

    Ok(registries)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn starting_content_is_consistent() {
        let registries = starting_registries().unwrap();
        for action in registries.actions.iter() {
            assert!(registries.skills.get(&action.skill).is_some(), "{}", action.id);
            if let Some(product) = &action.product {
                assert!(registries.items.get(product).is_some(), "{}", action.id);
            }
            if let Some(monster) = &action.monster {
                assert!(registries.monsters.get(monster).is_some(), "{}", action.id);
            }
            assert!(action.interval_ticks > 0);
        }
    }
}
