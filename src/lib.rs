//! # Grounds - a multi-universe world model
//!
//! Grounds is the entity/attribute core of a text-based multi-user world. A
//! process hosts a [`Registry`](world::Registry) of named universes
//! ([`Namespace`](world::Namespace)s); each universe holds entities (things,
//! places, players, links and extensions) keyed by UUID. Entities carry typed,
//! named attributes, a set of contained entity ids, and a permission policy.
//! References between entities are stored as `<universe>::<uuid>` specs and
//! resolved lazily, so a removed entity leaves a dangling reference behind
//! rather than a crash.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use grounds::world::{relocate, Attr, Entity, Player, Registry};
//!
//! fn main() -> Result<(), grounds::world::WorldError> {
//!     let registry = Registry::new();
//!     let dunes = registry.create_namespace("dunes")?;
//!     let origin = dunes.origin()?;
//!
//!     let alice = dunes.add_entity(Entity::Player(Player::new("alice", "dunes")));
//!     alice.set_attr(Attr::integer("hp", 10));
//!     relocate(&alice, None, &origin);
//!
//!     let here = alice.location(&registry)?.expect("alice is somewhere");
//!     assert_eq!(here.id(), origin.id());
//!     registry.save_to_file(std::path::Path::new("world.json"), true)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`world`] - entities, attributes, universes, the registry and persistence
//! - [`config`] - TOML configuration for the `grounds` tool
//! - [`logutil`] - log setup and single-line escaping
//! - [`validation`] - name rules for universes, entities and attributes

pub mod config;
pub mod logutil;
pub mod validation;
pub mod world;
