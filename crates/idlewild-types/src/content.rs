//! Static content definitions referenced by persisted state.
//!
//! These are the live objects a save's compact references resolve to.
//! Loading them from data files is the content loader's job; this module
//! only defines their shape and the [`Content`] capability every
//! registrable kind implements.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::NamespacedId;

/// The kinds of domain object a save can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// A trainable skill.
    Skill,
    /// A bankable item.
    Item,
    /// A currency balance holder.
    Currency,
    /// A game mode.
    Gamemode,
    /// A combat opponent.
    Monster,
    /// A repeatable action (skilling or combat).
    Action,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Skill => "skill",
            Self::Item => "item",
            Self::Currency => "currency",
            Self::Gamemode => "gamemode",
            Self::Monster => "monster",
            Self::Action => "action",
        };
        f.write_str(label)
    }
}

/// A registrable content definition.
pub trait Content {
    /// The object kind this definition belongs to.
    const KIND: ObjectKind;

    /// The object's stable identity.
    fn id(&self) -> &NamespacedId;

    /// Human-readable name.
    fn name(&self) -> &str;
}

/// Generates a `Content` impl for a definition with `id` and `name` fields.
macro_rules! impl_content {
    ($ty:ty, $kind:expr) => {
        impl Content for $ty {
            const KIND: ObjectKind = $kind;

            fn id(&self) -> &NamespacedId {
                &self.id
            }

            fn name(&self) -> &str {
                &self.name
            }
        }
    };
}

/// A trainable skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    /// Stable identity.
    pub id: NamespacedId,
    /// Display name.
    pub name: String,
}

/// A bankable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Stable identity.
    pub id: NamespacedId,
    /// Display name.
    pub name: String,
    /// Price paid in the primary currency when sold.
    pub sell_price: u64,
}

/// A currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// Stable identity.
    pub id: NamespacedId,
    /// Display name.
    pub name: String,
}

/// A game mode (standard, hardcore, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gamemode {
    /// Stable identity.
    pub id: NamespacedId,
    /// Display name.
    pub name: String,
}

/// A combat opponent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monster {
    /// Stable identity.
    pub id: NamespacedId,
    /// Display name.
    pub name: String,
    /// Hitpoints at spawn.
    pub hitpoints: u32,
}

/// A repeatable action the player can keep active while idle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Stable identity.
    pub id: NamespacedId,
    /// Display name.
    pub name: String,
    /// Skill that receives experience on completion.
    pub skill: NamespacedId,
    /// Ticks needed to complete one repetition.
    pub interval_ticks: u32,
    /// Experience granted per completion.
    pub xp: f64,
    /// Item added to the bank per completion.
    #[serde(default)]
    pub product: Option<NamespacedId>,
    /// Monster defeated per completion (combat actions).
    #[serde(default)]
    pub monster: Option<NamespacedId>,
    /// Whether the action may keep running while the player is away.
    #[serde(default = "default_offline_allowed")]
    pub offline_allowed: bool,
}

const fn default_offline_allowed() -> bool {
    true
}

impl_content!(Skill, ObjectKind::Skill);
impl_content!(Item, ObjectKind::Item);
impl_content!(Currency, ObjectKind::Currency);
impl_content!(Gamemode, ObjectKind::Gamemode);
impl_content!(Monster, ObjectKind::Monster);
impl_content!(Action, ObjectKind::Action);
