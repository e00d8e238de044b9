//! Before/after snapshots of trackable player state.
//!
//! A [`Snapshot`] is a value copy taken at offline entry and again at
//! offline exit. Diffing reports net change per tracked value only: an item
//! spent and regained inside the window nets to zero and does not appear.

use std::collections::BTreeMap;
use std::fmt;

use idlewild_types::NamespacedId;
use serde::Serialize;

/// Values below this magnitude are treated as unchanged.
const CHANGE_EPSILON: f64 = 1e-9;

/// Category of a tracked value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedKind {
    /// Experience in a skill.
    SkillXp,
    /// Level in a skill.
    SkillLevel,
    /// Amount of a currency.
    Currency,
    /// Quantity of an item held.
    Item,
    /// Kills of a monster.
    Kills,
}

impl fmt::Display for TrackedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::SkillXp => "skill_xp",
            Self::SkillLevel => "skill_level",
            Self::Currency => "currency",
            Self::Item => "item",
            Self::Kills => "kills",
        };
        f.write_str(label)
    }
}

/// Stable identity of one tracked value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TrackedKey {
    /// What the value measures.
    pub kind: TrackedKind,
    /// The domain object it belongs to.
    pub id: NamespacedId,
}

/// Immutable value copy of trackable state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    values: BTreeMap<TrackedKey, f64>,
}

impl Snapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value, replacing any earlier value for the same key.
    pub fn record(&mut self, kind: TrackedKind, id: NamespacedId, value: f64) {
        self.values.insert(TrackedKey { kind, id }, value);
    }

    /// Value recorded for `kind` / `id`.
    pub fn get(&self, kind: TrackedKind, id: &NamespacedId) -> Option<f64> {
        let key = TrackedKey {
            kind,
            id: id.clone(),
        };
        self.values.get(&key).copied()
    }

    /// Number of tracked values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Tracked values in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&TrackedKey, f64)> {
        self.values.iter().map(|(key, value)| (key, *value))
    }

    /// Compare this (earlier) snapshot against `after`.
    ///
    /// Keys missing on one side count as zero on that side.
    #[allow(clippy::arithmetic_side_effects)]
    pub fn diff(&self, after: &Self) -> SnapshotDelta {
        let mut delta = SnapshotDelta::default();
        let keys = self.values.keys().chain(
            after
                .values
                .keys()
                .filter(|key| !self.values.contains_key(*key)),
        );
        for key in keys {
            let before_value = self.values.get(key).copied().unwrap_or(0.0);
            let after_value = after.values.get(key).copied().unwrap_or(0.0);
            let change = after_value - before_value;
            if change.abs() <= CHANGE_EPSILON {
                continue;
            }
            let entry = Change {
                key: key.clone(),
                before: before_value,
                after: after_value,
            };
            if change > 0.0 {
                delta.gains.push(entry);
            } else {
                delta.losses.push(entry);
            }
        }
        delta.gains.sort_by(|a, b| a.key.cmp(&b.key));
        delta.losses.sort_by(|a, b| a.key.cmp(&b.key));
        delta
    }
}

/// One tracked value that differs between two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change {
    /// Which value changed.
    pub key: TrackedKey,
    /// Value in the earlier snapshot.
    pub before: f64,
    /// Value in the later snapshot.
    pub after: f64,
}

impl Change {
    /// Signed net change.
    #[allow(clippy::arithmetic_side_effects)]
    pub fn amount(&self) -> f64 {
        self.after - self.before
    }
}

/// Net changes between two snapshots, gains and losses kept apart.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SnapshotDelta {
    /// Values that increased, in key order.
    pub gains: Vec<Change>,
    /// Values that decreased, in key order.
    pub losses: Vec<Change>,
}

impl SnapshotDelta {
    /// Whether nothing changed.
    pub fn is_empty(&self) -> bool {
        self.gains.is_empty() && self.losses.is_empty()
    }

    /// Gain or loss recorded for `kind` / `id`.
    pub fn change_for(&self, kind: TrackedKind, id: &NamespacedId) -> Option<&Change> {
        self.gains
            .iter()
            .chain(&self.losses)
            .find(|change| change.key.kind == kind && change.key.id == *id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn id(local: &str) -> NamespacedId {
        NamespacedId::base(local)
    }

    #[test]
    fn reports_gains_and_losses_separately() {
        let mut before = Snapshot::new();
        before.record(TrackedKind::Item, id("logs"), 10.0);
        before.record(TrackedKind::Item, id("bread"), 5.0);
        before.record(TrackedKind::SkillXp, id("woodcutting"), 100.0);

        let mut after = Snapshot::new();
        after.record(TrackedKind::Item, id("logs"), 250.0);
        after.record(TrackedKind::SkillXp, id("woodcutting"), 900.0);
        after.record(TrackedKind::Currency, id("gold"), 40.0);

        let delta = before.diff(&after);
        assert_eq!(delta.gains.len(), 3);
        assert_eq!(delta.losses.len(), 1);

        let bread = delta.change_for(TrackedKind::Item, &id("bread")).unwrap();
        assert!((bread.amount() + 5.0).abs() < f64::EPSILON);
        assert!(bread.after.abs() < f64::EPSILON);

        let gold = delta.change_for(TrackedKind::Currency, &id("gold")).unwrap();
        assert!((gold.before).abs() < f64::EPSILON);
        assert!((gold.amount() - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn consumed_then_regained_nets_to_nothing() {
        let mut before = Snapshot::new();
        before.record(TrackedKind::Item, id("arrows"), 50.0);
        let mut after = Snapshot::new();
        after.record(TrackedKind::Item, id("arrows"), 50.0);

        assert!(before.diff(&after).is_empty());
    }

    #[test]
    fn same_id_different_kind_are_distinct() {
        let mut before = Snapshot::new();
        before.record(TrackedKind::SkillXp, id("attack"), 0.0);
        before.record(TrackedKind::SkillLevel, id("attack"), 1.0);
        let mut after = before.clone();
        after.record(TrackedKind::SkillXp, id("attack"), 83.0);

        let delta = before.diff(&after);
        assert_eq!(delta.gains.len(), 1);
        assert_eq!(delta.gains.first().map(|c| c.key.kind), Some(TrackedKind::SkillXp));
        let level = after.get(TrackedKind::SkillLevel, &id("attack")).unwrap();
        assert!((level - 1.0).abs() < f64::EPSILON);
    }
}
