//! Experience-to-level table.
//!
//! Levels are derived data: saves persist experience only and recompute
//! levels after decoding.

use std::sync::LazyLock;

/// Highest attainable skill level.
pub const MAX_LEVEL: u32 = 99;

/// Cumulative experience required to reach each level, indexed by
/// `level - 1`.
static XP_TABLE: LazyLock<Vec<f64>> = LazyLock::new(build_table);

#[allow(clippy::arithmetic_side_effects)]
fn build_table() -> Vec<f64> {
    let mut table = Vec::with_capacity(99);
    let mut points = 0.0_f64;
    table.push(0.0);
    for level in 1..MAX_LEVEL {
        let level = f64::from(level);
        points += (level + 300.0 * 2.0_f64.powf(level / 7.0)).floor();
        table.push((points / 4.0).floor());
    }
    table
}

/// Experience required to reach `level` (clamped to `1..=MAX_LEVEL`).
pub fn xp_for_level(level: u32) -> f64 {
    let index = usize::try_from(level.clamp(1, MAX_LEVEL).saturating_sub(1)).unwrap_or(0);
    XP_TABLE.get(index).copied().unwrap_or(0.0)
}

/// Level reached with `xp` experience. Negative or NaN experience is
/// treated as zero.
pub fn level_for_xp(xp: f64) -> u32 {
    let reached = XP_TABLE.iter().take_while(|threshold| xp >= **threshold).count();
    u32::try_from(reached).unwrap_or(MAX_LEVEL).clamp(1, MAX_LEVEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_one_at_zero_xp() {
        assert_eq!(level_for_xp(0.0), 1);
        assert_eq!(level_for_xp(-5.0), 1);
        assert_eq!(level_for_xp(f64::NAN), 1);
    }

    #[test]
    fn known_thresholds() {
        assert!((xp_for_level(2) - 83.0).abs() < f64::EPSILON);
        assert_eq!(level_for_xp(82.9), 1);
        assert_eq!(level_for_xp(83.0), 2);
        assert!((xp_for_level(99) - 13_034_431.0).abs() <= 1.0);
    }

    #[test]
    fn level_caps_at_max() {
        assert_eq!(level_for_xp(1.0e12), MAX_LEVEL);
    }
}
