//! The world model: entities, their attributes, the universes that hold them,
//! and the multiverse registry that resolves references between them.
//!
//! Everything here is synchronous and in-memory apart from [`store`] and the
//! file save/load helpers. Locks are short and never held across a call into
//! another entity.

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod attr;
pub mod entity;
pub mod entity_ref;
pub mod errors;
mod files;
pub mod kinds;
pub mod namespace;
pub mod policy;
pub mod registry;
pub mod store;

pub use attr::{Attr, AttrKind, AttrValue};
pub use entity::{relocate, Entity, EntityCore, EntityKind};
pub use entity_ref::EntityRef;
pub use errors::WorldError;
pub use kinds::{build_entity, ActorId, Extension, Link, Place, Player, Thing};
pub use namespace::Namespace;
pub use policy::{Category, Policy, Role};
pub use registry::{Registry, VOID_NAMESPACE};
pub use store::{WorldStore, WorldStoreBuilder};

/// Lock a mutex, recovering the data if a previous holder panicked. Every
/// critical section in this module leaves its data consistent.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
