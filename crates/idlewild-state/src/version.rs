//! Save schema versions.
//!
//! Every persisted field carries an implicit "present since version X"
//! contract. The named constants below are the rungs the field ladders in
//! this crate refer to; bump [`CURRENT_VERSION`] whenever one is added.

/// Version written by this build.
pub const CURRENT_VERSION: u32 = 118;

/// Oldest binary version this build still decodes.
pub const MIN_SUPPORTED_VERSION: u32 = 100;

/// Bank slots gain a `locked` flag.
pub const BANK_LOCKED_SLOTS: u32 = 104;

/// Wallet balances gain `lifetime_earned`.
pub const WALLET_LIFETIME_EARNED: u32 = 108;

/// Settings gain `offline_combat`.
pub const SETTINGS_OFFLINE_COMBAT: u32 = 110;

/// The bank's `default_tab` byte stops being written.
pub const BANK_DEFAULT_TAB_REMOVED: u32 = 112;

/// Statistics gain `offline_ticks`.
pub const STATISTICS_OFFLINE_TICKS: u32 = 113;

/// The header gains the optional mod profile name.
pub const HEADER_MOD_PROFILE: u32 = 115;

/// Skills gain `mastery_pool_xp`.
pub const SKILL_MASTERY_POOL: u32 = 118;

/// Whether a binary save at `version` can be decoded by this build.
pub const fn is_supported(version: u32) -> bool {
    version >= MIN_SUPPORTED_VERSION && version <= CURRENT_VERSION
}
