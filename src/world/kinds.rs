//! The concrete entity kinds and their `build` factories.
//!
//! Every factory takes the new entity's name, the universe it is built in, the
//! raw build arguments from the command layer, and the registry for resolving
//! references. The entity is returned unattached; adding it to the universe is
//! up to the caller.

use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::world::attr::{Attr, AttrKind};
use crate::world::entity::{expect_thing_in_attr, Entity, EntityCore, EntityKind};
use crate::world::entity_ref::EntityRef;
use crate::world::errors::WorldError;
use crate::world::lock;
use crate::world::namespace::Namespace;
use crate::world::policy::Role;
use crate::world::registry::Registry;

macro_rules! entity_kind_core {
    ($kind:ident) => {
        impl $kind {
            pub fn core(&self) -> &EntityCore {
                &self.core
            }
        }

        impl Deref for $kind {
            type Target = EntityCore;

            fn deref(&self) -> &EntityCore {
                &self.core
            }
        }
    };
}

fn expect_arity(args: &[String], expected: usize) -> Result<(), WorldError> {
    if args.len() != expected {
        return Err(WorldError::ArgumentArity {
            expected,
            found: args.len(),
        });
    }
    Ok(())
}

/// A generic thing with no kind-specific behavior.
#[derive(Debug)]
pub struct Thing {
    core: EntityCore,
}

entity_kind_core!(Thing);

impl Thing {
    pub fn new(name: &str, namespace: &str) -> Self {
        Self::with_id(name, namespace, Uuid::new_v4())
    }

    pub fn with_id(name: &str, namespace: &str, id: Uuid) -> Self {
        Self {
            core: EntityCore::new(name, namespace, id),
        }
    }

    pub(crate) fn from_core(core: EntityCore) -> Self {
        Self { core }
    }

    pub fn build(
        name: &str,
        namespace: &Namespace,
        args: &[String],
        _registry: &Registry,
    ) -> Result<Entity, WorldError> {
        expect_arity(args, 0)?;
        Ok(Entity::Thing(Self::new(name, namespace.name())))
    }
}

/// A location node.
#[derive(Debug)]
pub struct Place {
    core: EntityCore,
}

entity_kind_core!(Place);

impl Place {
    pub fn new(name: &str, namespace: &str) -> Self {
        Self {
            core: EntityCore::new(name, namespace, Uuid::new_v4()),
        }
    }

    pub(crate) fn from_core(core: EntityCore) -> Self {
        Self { core }
    }

    /// Expects no arguments.
    pub fn build(
        name: &str,
        namespace: &Namespace,
        args: &[String],
        _registry: &Registry,
    ) -> Result<Entity, WorldError> {
        expect_arity(args, 0)?;
        Ok(Entity::Place(Self::new(name, namespace.name())))
    }
}

/// Identifier of the live session driving a player. Process-local only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorId(pub String);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A player. The current actor binding is never persisted.
#[derive(Debug)]
pub struct Player {
    core: EntityCore,
    current_actor: Mutex<Option<ActorId>>,
}

entity_kind_core!(Player);

impl Player {
    pub fn new(name: &str, namespace: &str) -> Self {
        Self::with_id(name, namespace, Uuid::new_v4())
    }

    pub fn with_id(name: &str, namespace: &str, id: Uuid) -> Self {
        Self::from_core(EntityCore::new(name, namespace, id))
    }

    pub(crate) fn from_core(core: EntityCore) -> Self {
        Self {
            core,
            current_actor: Mutex::new(None),
        }
    }

    /// The player's location, which must be a place.
    pub fn location_as_place(
        &self,
        registry: &Registry,
    ) -> Result<Option<Arc<Entity>>, WorldError> {
        match self.location(registry)? {
            None => Ok(None),
            Some(location) => {
                location.expect_kind(EntityKind::Place)?;
                Ok(Some(location))
            }
        }
    }

    pub fn current_actor(&self) -> Option<ActorId> {
        lock(&self.current_actor).clone()
    }

    /// Bind an actor, or pass `None` to leave the player idle.
    pub fn set_current_actor(&self, actor: Option<ActorId>) {
        *lock(&self.current_actor) = actor;
    }

    /// Swap in `actor` only if the current binding equals `expected`. Passing
    /// `None` for `expected` claims an idle player.
    pub fn try_set_current_actor(
        &self,
        actor: Option<ActorId>,
        expected: Option<&ActorId>,
    ) -> bool {
        let mut current = lock(&self.current_actor);
        if current.as_ref() != expected {
            return false;
        }
        *current = actor;
        true
    }

    /// Expects one argument, the player's initial role in `namespace`.
    pub fn build(
        name: &str,
        namespace: &Namespace,
        args: &[String],
        _registry: &Registry,
    ) -> Result<Entity, WorldError> {
        expect_arity(args, 1)?;
        let role = Role::parse_assignable(&args[0])
            .ok_or_else(|| WorldError::malformed(&args[0], "unknown role"))?;
        let player = Self::new(name, namespace.name());
        namespace.add_role(player.id(), role);
        Ok(Entity::Player(player))
    }
}

/// A link between two places. Each end is an ATTR attribute wrapping a THING
/// reference, named with the display name used from that side.
#[derive(Debug)]
pub struct Link {
    core: EntityCore,
}

entity_kind_core!(Link);

impl Link {
    pub const SOURCE: &'static str = "source";
    pub const DESTINATION: &'static str = "destination";

    pub fn new(
        name: &str,
        namespace: &str,
        source: (&str, EntityRef),
        destination: (&str, EntityRef),
    ) -> Self {
        let core = EntityCore::new(name, namespace, Uuid::new_v4());
        core.set_attr(Attr::attr(Self::SOURCE, Attr::thing(source.0, source.1)));
        core.set_attr(Attr::attr(
            Self::DESTINATION,
            Attr::thing(destination.0, destination.1),
        ));
        Self { core }
    }

    /// Fails unless both ends are present and well formed.
    pub(crate) fn from_core(core: EntityCore) -> Result<Self, WorldError> {
        for end in [Self::SOURCE, Self::DESTINATION] {
            let attr = core.require_attr(end, AttrKind::Attr)?;
            expect_thing_in_attr(&attr)?;
        }
        Ok(Self { core })
    }

    fn end(&self, which: &str) -> Result<(String, EntityRef), WorldError> {
        let attr = self.require_attr(which, AttrKind::Attr)?;
        let (name, target) = expect_thing_in_attr(&attr)?;
        Ok((name.to_string(), target.clone()))
    }

    pub fn source_name(&self) -> Result<String, WorldError> {
        Ok(self.end(Self::SOURCE)?.0)
    }

    pub fn source_ref(&self) -> Result<EntityRef, WorldError> {
        Ok(self.end(Self::SOURCE)?.1)
    }

    pub fn destination_name(&self) -> Result<String, WorldError> {
        Ok(self.end(Self::DESTINATION)?.0)
    }

    pub fn destination_ref(&self) -> Result<EntityRef, WorldError> {
        Ok(self.end(Self::DESTINATION)?.1)
    }

    fn end_place(
        &self,
        which: &str,
        registry: &Registry,
    ) -> Result<Option<Arc<Entity>>, WorldError> {
        let (_, target) = self.end(which)?;
        Ok(registry
            .resolve_ref(&target)
            .filter(|e| e.kind() == EntityKind::Place))
    }

    /// The source place, or `None` if it no longer exists.
    pub fn source_place(&self, registry: &Registry) -> Result<Option<Arc<Entity>>, WorldError> {
        self.end_place(Self::SOURCE, registry)
    }

    pub fn destination_place(
        &self,
        registry: &Registry,
    ) -> Result<Option<Arc<Entity>>, WorldError> {
        self.end_place(Self::DESTINATION, registry)
    }

    /// True if either end refers to the place with id `place`.
    pub fn links_to(&self, place: Uuid) -> bool {
        [Self::SOURCE, Self::DESTINATION]
            .into_iter()
            .filter_map(|which| self.end(which).ok())
            .any(|(_, target)| target.id() == place)
    }

    /// The end opposite `place`, with the display name used from `place`'s
    /// side.
    pub fn other_side(&self, place: Uuid) -> Option<(String, EntityRef)> {
        let source = self.end(Self::SOURCE).ok()?;
        let destination = self.end(Self::DESTINATION).ok()?;
        if source.1.id() == place {
            Some((source.0, destination.1))
        } else if destination.1.id() == place {
            Some((destination.0, source.1))
        } else {
            None
        }
    }

    /// Expects four arguments: source place, source-side name, destination
    /// place, destination-side name. Places may be given as full entity specs
    /// or as bare ids in `namespace`.
    pub fn build(
        name: &str,
        namespace: &Namespace,
        args: &[String],
        registry: &Registry,
    ) -> Result<Entity, WorldError> {
        expect_arity(args, 4)?;
        let source = find_place(namespace, registry, &args[0])?;
        let destination = find_place(namespace, registry, &args[2])?;
        Ok(Entity::Link(Self::new(
            name,
            namespace.name(),
            (args[1].as_str(), source.entity_ref()),
            (args[3].as_str(), destination.entity_ref()),
        )))
    }
}

fn find_place(
    namespace: &Namespace,
    registry: &Registry,
    arg: &str,
) -> Result<Arc<Entity>, WorldError> {
    let target = EntityRef::parse_in(namespace.name(), arg)?;
    let found = if target.namespace() == namespace.name() {
        namespace.get_entity(target.id())
    } else {
        registry.resolve_ref(&target)
    };
    found
        .filter(|e| e.kind() == EntityKind::Place)
        .ok_or_else(|| WorldError::NotFound(format!("place {}", arg)))
}

/// A holder for scripted behavior. Listener attributes are ATTRLIST
/// attributes whose names start with `^`.
#[derive(Debug)]
pub struct Extension {
    core: EntityCore,
}

entity_kind_core!(Extension);

impl Extension {
    pub const LISTENER_PREFIX: char = '^';

    pub fn new(name: &str, namespace: &str) -> Self {
        Self {
            core: EntityCore::new(name, namespace, Uuid::new_v4()),
        }
    }

    pub(crate) fn from_core(core: EntityCore) -> Self {
        Self { core }
    }

    pub fn listener_attrs(&self) -> Vec<Attr> {
        self.attrs()
            .into_iter()
            .filter(|a| {
                a.name().starts_with(Self::LISTENER_PREFIX) && a.kind() == AttrKind::AttrList
            })
            .collect()
    }

    pub fn build(
        name: &str,
        namespace: &Namespace,
        args: &[String],
        _registry: &Registry,
    ) -> Result<Entity, WorldError> {
        expect_arity(args, 0)?;
        Ok(Entity::Extension(Self::new(name, namespace.name())))
    }
}

/// Dispatch to the factory for `kind`.
pub fn build_entity(
    kind: EntityKind,
    name: &str,
    namespace: &Namespace,
    args: &[String],
    registry: &Registry,
) -> Result<Entity, WorldError> {
    match kind {
        EntityKind::Thing => Thing::build(name, namespace, args, registry),
        EntityKind::Place => Place::build(name, namespace, args, registry),
        EntityKind::Player => Player::build(name, namespace, args, registry),
        EntityKind::Link => Link::build(name, namespace, args, registry),
        EntityKind::Extension => Extension::build(name, namespace, args, registry),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::entity::ATTR_NAME;
    use crate::world::policy::Policy;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn world() -> (Registry, Arc<Namespace>) {
        let registry = Registry::new();
        let ns = registry.create_namespace("test").expect("create");
        (registry, ns)
    }

    #[test]
    fn place_build_rejects_arguments() {
        let (registry, ns) = world();
        let place = Place::build("origin", &ns, &[], &registry).expect("build");
        assert_eq!(place.kind(), EntityKind::Place);
        assert_eq!(place.universe_name(), "test");
        assert!(matches!(
            Place::build("origin", &ns, &args(&["x"]), &registry),
            Err(WorldError::ArgumentArity {
                expected: 0,
                found: 1
            })
        ));
    }

    #[test]
    fn link_build_resolves_places() {
        let (registry, ns) = world();
        let origin = Arc::new(Place::build("origin", &ns, &[], &registry).unwrap());
        let lab = Arc::new(Place::build("lab", &ns, &[], &registry).unwrap());
        ns.add_entity(Arc::clone(&origin));
        ns.add_entity(Arc::clone(&lab));

        let link = Link::build(
            "door",
            &ns,
            &args(&[&origin.id().to_string(), "out", &lab.spec(), "in"]),
            &registry,
        )
        .expect("link");
        let link = link.as_link().expect("is a link");
        assert_eq!(link.source_name().unwrap(), "out");
        assert_eq!(link.destination_name().unwrap(), "in");
        assert_eq!(link.source_ref().unwrap(), origin.entity_ref());
        assert!(link.links_to(lab.id()));
        assert_eq!(
            link.other_side(origin.id()),
            Some(("out".to_string(), lab.entity_ref()))
        );
        assert_eq!(
            link.destination_place(&registry).unwrap().map(|p| p.id()),
            Some(lab.id())
        );
    }

    #[test]
    fn link_build_checks_arity_and_places() {
        let (registry, ns) = world();
        let origin = Arc::new(Place::build("origin", &ns, &[], &registry).unwrap());
        ns.add_entity(Arc::clone(&origin));
        let id = origin.id().to_string();
        assert!(matches!(
            Link::build("door", &ns, &args(&[&id, "out", &id]), &registry),
            Err(WorldError::ArgumentArity { expected: 4, .. })
        ));
        let stranger = Uuid::new_v4().to_string();
        assert!(matches!(
            Link::build("door", &ns, &args(&[&id, "out", &stranger, "in"]), &registry),
            Err(WorldError::NotFound(_))
        ));
    }

    #[test]
    fn link_without_destination_is_rejected() {
        let origin = EntityRef::new("test", Uuid::new_v4());
        let result = Entity::from_parts(
            EntityKind::Link,
            Uuid::new_v4(),
            vec![
                Attr::string(ATTR_NAME, "door"),
                Attr::string("universe", "test"),
                Attr::attr(Link::SOURCE, Attr::thing("out", origin)),
            ],
            vec![],
            Policy::default_policy(),
        );
        assert!(matches!(
            result,
            Err(WorldError::MissingAttribute { ref attr, .. }) if attr == "destination"
        ));
    }

    #[test]
    fn player_build_assigns_role() {
        let (registry, ns) = world();
        let player = Player::build("alice", &ns, &args(&["denizen"]), &registry).expect("player");
        assert!(ns.has_role(player.id(), Role::Denizen));
        assert!(matches!(
            Player::build("bob", &ns, &[], &registry),
            Err(WorldError::ArgumentArity { expected: 1, .. })
        ));
        assert!(Player::build("carol", &ns, &args(&["emperor"]), &registry).is_err());
    }

    #[test]
    fn player_actor_binding_swaps_atomically() {
        let player = Player::new("alice", "test");
        let a = ActorId("a".to_string());
        let b = ActorId("b".to_string());
        assert!(player.try_set_current_actor(Some(a.clone()), None));
        assert!(!player.try_set_current_actor(Some(b.clone()), None));
        assert!(player.try_set_current_actor(Some(b.clone()), Some(&a)));
        assert_eq!(player.current_actor(), Some(b));
        player.set_current_actor(None);
        assert_eq!(player.current_actor(), None);
    }

    #[test]
    fn extension_lists_listener_attrs() {
        let ext = Extension::new("bell", "test");
        ext.set_attr(Attr::attr_list(
            "^onArrival",
            vec![Attr::string("eventType", "ArrivalEvent")],
        ));
        ext.set_attr(Attr::string("^notAList", "x"));
        ext.set_attr(Attr::attr_list("helpers", vec![]));
        let listeners = ext.listener_attrs();
        assert_eq!(listeners.len(), 1);
        assert_eq!(listeners[0].name(), "^onArrival");
    }
}
