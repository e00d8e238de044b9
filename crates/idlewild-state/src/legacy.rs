//! Pre-binary save format.
//!
//! Saves written before the binary format are a JSON object keyed by
//! numeric content IDs. Those IDs are meaningless without the external
//! [`IdManifest`], which maps each historical number to a current
//! [`NamespacedId`]. Each subsystem converts its own slice of a
//! [`LegacySave`] through a [`LegacyResolver`]; nothing here is reachable
//! from the versioned binary decode.

use std::collections::BTreeMap;

use idlewild_codec::UnresolvedReference;
use idlewild_types::{NamespacedId, ObjectKind, Registries, Registry};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Historical numeric IDs mapped to namespaced IDs, one table per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdManifest {
    /// Skill numbers.
    #[serde(default)]
    pub skills: BTreeMap<u32, NamespacedId>,
    /// Item numbers.
    #[serde(default)]
    pub items: BTreeMap<u32, NamespacedId>,
    /// Currency numbers.
    #[serde(default)]
    pub currencies: BTreeMap<u32, NamespacedId>,
    /// Gamemode numbers.
    #[serde(default)]
    pub gamemodes: BTreeMap<u32, NamespacedId>,
    /// Monster numbers.
    #[serde(default)]
    pub monsters: BTreeMap<u32, NamespacedId>,
    /// Action numbers.
    #[serde(default)]
    pub actions: BTreeMap<u32, NamespacedId>,
}

impl IdManifest {
    /// The table for `kind`.
    pub const fn table(&self, kind: ObjectKind) -> &BTreeMap<u32, NamespacedId> {
        match kind {
            ObjectKind::Skill => &self.skills,
            ObjectKind::Item => &self.items,
            ObjectKind::Currency => &self.currencies,
            ObjectKind::Gamemode => &self.gamemodes,
            ObjectKind::Monster => &self.monsters,
            ObjectKind::Action => &self.actions,
        }
    }

    /// Current identifier for historical number `old` of `kind`.
    pub fn lookup(&self, kind: ObjectKind, old: u32) -> Option<&NamespacedId> {
        self.table(kind).get(&old)
    }

    /// Like [`lookup`](Self::lookup), but a number missing from the
    /// manifest becomes a placeholder identifier instead of `None`.
    pub fn lookup_or_placeholder(&self, kind: ObjectKind, old: u32) -> NamespacedId {
        self.lookup(kind, old)
            .cloned()
            .unwrap_or_else(|| NamespacedId::placeholder(format!("{kind}_{old}")))
    }
}

/// The legacy JSON save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySave {
    /// Character name.
    #[serde(default)]
    pub character_name: String,
    /// Gamemode number.
    #[serde(default)]
    pub gamemode: u32,
    /// Last simulated wall-clock instant.
    #[serde(default)]
    pub tick_timestamp: i64,
    /// Wall-clock instant of the save.
    #[serde(default)]
    pub save_timestamp: i64,
    /// Number of the action running when the game was closed.
    #[serde(default)]
    pub offline_action: Option<u32>,
    /// Ticks into the current repetition of that action.
    #[serde(default)]
    pub action_progress: u32,
    /// Bank contents.
    #[serde(default)]
    pub bank: Vec<LegacyBankEntry>,
    /// Gold pieces; the only currency the legacy format knew.
    #[serde(default)]
    pub gp: u64,
    /// Experience per skill number.
    #[serde(default)]
    pub skill_xp: BTreeMap<u32, f64>,
    /// Kills per monster number.
    #[serde(default)]
    pub monster_kills: BTreeMap<u32, u64>,
    /// Current hitpoints.
    #[serde(default)]
    pub hitpoints: u32,
    /// Equipped item numbers.
    #[serde(default)]
    pub equipment: Vec<u32>,
    /// Player settings.
    #[serde(default)]
    pub settings: LegacySettings,
    /// Lifetime counters.
    #[serde(default)]
    pub stats: LegacyStats,
}

/// One legacy bank entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyBankEntry {
    /// Item number.
    pub id: u32,
    /// Quantity held.
    pub qty: u64,
}

/// Legacy settings block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySettings {
    /// Eat food automatically in combat.
    #[serde(default)]
    pub auto_eat: bool,
    /// Show notifications.
    #[serde(default = "default_true")]
    pub notifications: bool,
}

impl Default for LegacySettings {
    fn default() -> Self {
        Self {
            auto_eat: false,
            notifications: true,
        }
    }
}

/// Legacy statistics block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyStats {
    /// Ticks ever simulated.
    #[serde(default)]
    pub total_ticks: u64,
    /// Action repetitions ever completed.
    #[serde(default)]
    pub actions_completed: u64,
}

const fn default_true() -> bool {
    true
}

/// Resolves legacy numbers to live objects, recording every miss.
#[derive(Debug)]
pub struct LegacyResolver<'a> {
    manifest: &'a IdManifest,
    registries: &'a Registries,
    unresolved: Vec<UnresolvedReference>,
}

impl<'a> LegacyResolver<'a> {
    /// Create a resolver over `manifest` and `registries`.
    pub const fn new(manifest: &'a IdManifest, registries: &'a Registries) -> Self {
        Self {
            manifest,
            registries,
            unresolved: Vec::new(),
        }
    }

    /// The registries being resolved against.
    pub const fn registries(&self) -> &'a Registries {
        self.registries
    }

    /// The manifest being resolved through.
    pub const fn manifest(&self) -> &'a IdManifest {
        self.manifest
    }

    /// Map `old` through the manifest and resolve it in `registry`.
    pub fn resolve<R: Registry>(&mut self, registry: &R, old: u32) -> Option<R::Object> {
        let kind = registry.kind();
        let id = self.manifest.lookup_or_placeholder(kind, old);
        self.resolve_id(registry, id)
    }

    /// Resolve an already namespaced `id` in `registry`.
    pub fn resolve_id<R: Registry>(&mut self, registry: &R, id: NamespacedId) -> Option<R::Object> {
        if let Some(object) = registry.resolve(&id) {
            return Some(object);
        }
        let kind = registry.kind();
        warn!(%kind, %id, "unresolved reference in legacy save");
        self.unresolved.push(UnresolvedReference { kind, id });
        None
    }

    /// Misses recorded so far.
    pub fn unresolved(&self) -> &[UnresolvedReference] {
        &self.unresolved
    }

    /// Consume the resolver, returning its misses.
    pub fn into_unresolved(self) -> Vec<UnresolvedReference> {
        self.unresolved
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use idlewild_types::Item;

    use super::*;

    #[test]
    fn manifest_parses_numeric_keys() {
        let json = r#"{"items": {"0": "idlewild:logs", "7": "gems_mod:ruby"}}"#;
        let manifest: IdManifest = serde_json::from_str(json).unwrap();
        assert_eq!(
            manifest.lookup(ObjectKind::Item, 7),
            Some(&NamespacedId::new("gems_mod", "ruby"))
        );
        assert!(manifest.skills.is_empty());
        assert!(
            manifest
                .lookup_or_placeholder(ObjectKind::Gamemode, 3)
                .is_placeholder()
        );
    }

    #[test]
    fn legacy_save_fields_default() {
        let save: LegacySave =
            serde_json::from_str(r#"{"characterName": "Ash", "gp": 12}"#).unwrap();
        assert_eq!(save.character_name, "Ash");
        assert_eq!(save.gp, 12);
        assert!(save.settings.notifications);
        assert!(save.bank.is_empty());
    }

    #[test]
    fn resolver_records_misses() {
        let mut registries = Registries::new();
        registries
            .items
            .register(Item {
                id: NamespacedId::base("logs"),
                name: "Logs".to_owned(),
                sell_price: 1,
            })
            .unwrap();
        let mut manifest = IdManifest::default();
        manifest.items.insert(0, NamespacedId::base("logs"));
        manifest.items.insert(1, NamespacedId::base("removed"));

        let mut resolver = LegacyResolver::new(&manifest, &registries);
        let items = &resolver.registries().items;
        assert!(resolver.resolve(items, 0).is_some());
        assert!(resolver.resolve(items, 1).is_none());
        assert!(resolver.resolve(items, 99).is_none());

        let misses = resolver.into_unresolved();
        assert_eq!(misses.len(), 2);
        assert!(misses.iter().any(|miss| miss.id.is_placeholder()));
    }
}
