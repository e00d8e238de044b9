//! Shared type definitions for the Idlewild simulation.
//!
//! This crate is the single source of truth for identities and content
//! shapes used across the workspace: the save codec, the scheduler and the
//! state graph all agree on these types.
//!
//! # Modules
//!
//! - [`ids`] -- Namespaced identifiers and the resolved/unresolved
//!   reference sentinel
//! - [`content`] -- Static content definitions (skills, items, currencies,
//!   gamemodes, monsters, actions)
//! - [`registry`] -- Per-kind registries and the [`Registries`] bundle
//! - [`xp`] -- Experience-to-level table

pub mod content;
pub mod ids;
pub mod registry;
pub mod xp;

// Re-export all public types at crate root for convenience.
pub use content::{Action, Content, Currency, Gamemode, Item, Monster, ObjectKind, Skill};
pub use ids::{BASE_NAMESPACE, IdError, NamespacedId, PLACEHOLDER_NAMESPACE, Reference};
pub use registry::{ContentRegistry, Registries, Registry, RegistryError};
