//! Persisted player state for the Idlewild simulation.
//!
//! This crate owns the state graph a save carries: what is persisted, how
//! each subsystem reads every historical version of its own bytes, how a
//! pre-binary legacy save is converted, and what is derived after load.
//!
//! # Modules
//!
//! - [`state`] -- [`GameState`], the body layout and derived-value
//!   recomputation
//! - [`game`] -- [`Game`], the state graph driven as a
//!   [`Simulation`](idlewild_core::Simulation)
//! - [`action`] -- The active action and its unresolved-degrades-to-none
//!   decode
//! - [`bank`] / [`combat`] / [`wallet`] / [`settings`] / [`statistics`] /
//!   [`skills`] -- One substate each, with its version ladder and legacy
//!   conversion
//! - [`legacy`] -- The legacy JSON save, the [`IdManifest`] and
//!   [`LegacyResolver`]
//! - [`version`] -- Schema version constants
//! - [`starting_content`] -- Built-in base content
//! - [`error`] -- [`StateError`]

pub mod action;
pub mod bank;
pub mod combat;
pub mod error;
pub mod game;
pub mod legacy;
pub mod settings;
pub mod skills;
pub mod starting_content;
pub mod state;
pub mod statistics;
pub mod version;
pub mod wallet;

pub use action::ActiveAction;
pub use bank::{BANK_CAPACITY, Bank, BankSlot};
pub use combat::Combat;
pub use error::StateError;
pub use game::Game;
pub use legacy::{IdManifest, LegacyResolver, LegacySave};
pub use settings::Settings;
pub use skills::{SkillProgress, Skills};
pub use starting_content::starting_registries;
pub use state::{GameState, HITPOINTS_SKILL, Profile};
pub use statistics::Statistics;
pub use version::{CURRENT_VERSION, MIN_SUPPORTED_VERSION};
pub use wallet::{Balance, PRIMARY_CURRENCY, Wallet};
