//! Universes: named, independently persisted collections of entities.
//!
//! The entity table and the role table each have their own lock. Neither is
//! held while calling into an entity, so lookups never wait on an entity's
//! attribute or contents lock.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use crate::world::entity::{Entity, EntityCore, EntityDocument, EntityKind};
use crate::world::errors::WorldError;
use crate::world::files::{read_locked, write_locked};
use crate::world::kinds::Place;
use crate::world::lock;
use crate::world::policy::{Category, Role};

pub const ORIGIN_NAME: &str = "ORIGIN";
pub const LOST_AND_FOUND_NAME: &str = "LOST+FOUND";
pub const GUEST_HOME_NAME: &str = "GUEST HOME";

#[derive(Debug, Clone, Copy, Default)]
struct SpecialPlaces {
    origin: Option<Uuid>,
    lost_and_found: Option<Uuid>,
    guest_home: Option<Uuid>,
}

pub struct Namespace {
    name: String,
    entities: Mutex<HashMap<Uuid, Arc<Entity>>>,
    roles: Mutex<HashMap<Uuid, BTreeSet<Role>>>,
    special: Mutex<SpecialPlaces>,
}

impl Namespace {
    /// An empty universe.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entities: Mutex::new(HashMap::new()),
            roles: Mutex::new(HashMap::new()),
            special: Mutex::new(SpecialPlaces::default()),
        }
    }

    /// A universe holding the three special places: its origin, its
    /// lost-and-found, and its guest home.
    pub fn with_special_places(name: impl Into<String>) -> Self {
        let ns = Self::new(name);
        let origin = ns.add_entity(Entity::Place(Place::new(ORIGIN_NAME, &ns.name)));
        let laf = ns.add_entity(Entity::Place(Place::new(LOST_AND_FOUND_NAME, &ns.name)));
        let home = ns.add_entity(Entity::Place(Place::new(GUEST_HOME_NAME, &ns.name)));
        *lock(&ns.special) = SpecialPlaces {
            origin: Some(origin.id()),
            lost_and_found: Some(laf.id()),
            guest_home: Some(home.id()),
        };
        ns
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // -- entity table --------------------------------------------------------

    pub fn get_entity(&self, id: Uuid) -> Option<Arc<Entity>> {
        lock(&self.entities).get(&id).cloned()
    }

    /// Like [`get_entity`](Self::get_entity), failing if the entity is of
    /// another kind.
    pub fn get_entity_as(
        &self,
        id: Uuid,
        kind: EntityKind,
    ) -> Result<Option<Arc<Entity>>, WorldError> {
        match self.get_entity(id) {
            None => Ok(None),
            Some(entity) => {
                entity.expect_kind(kind)?;
                Ok(Some(entity))
            }
        }
    }

    /// Linear scan by name. When several entities share the name, which one is
    /// returned is unspecified.
    pub fn get_entity_by_name(&self, name: &str, kind: Option<EntityKind>) -> Option<Arc<Entity>> {
        self.entities()
            .into_iter()
            .filter(|e| kind.map_or(true, |k| e.kind() == k))
            .find(|e| e.name() == name)
    }

    /// Insert (or replace) an entity, keyed by its id.
    pub fn add_entity(&self, entity: impl Into<Arc<Entity>>) -> Arc<Entity> {
        let entity = entity.into();
        if entity.universe_name() != self.name {
            warn!(
                "{} {} claims universe {} but is being added to {}",
                entity.kind(),
                entity.id(),
                entity.universe_name(),
                self.name
            );
        }
        debug!("{}: add {} {}", self.name, entity.kind(), entity.id());
        lock(&self.entities).insert(entity.id(), Arc::clone(&entity));
        entity
    }

    /// Remove an entity; `None` is a no-op.
    pub fn remove_entity(&self, entity: Option<&EntityCore>) -> Option<Arc<Entity>> {
        let entity = entity?;
        self.remove_entity_id(entity.id())
    }

    pub fn remove_entity_id(&self, id: Uuid) -> Option<Arc<Entity>> {
        let removed = lock(&self.entities).remove(&id);
        if removed.is_some() {
            debug!("{}: removed {}", self.name, id);
        }
        removed
    }

    pub fn contains(&self, id: Uuid) -> bool {
        lock(&self.entities).contains_key(&id)
    }

    pub fn len(&self) -> usize {
        lock(&self.entities).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entities).is_empty()
    }

    /// Snapshot of every entity.
    pub fn entities(&self) -> Vec<Arc<Entity>> {
        lock(&self.entities).values().cloned().collect()
    }

    pub fn entities_of_kind(&self, kind: EntityKind) -> Vec<Arc<Entity>> {
        lock(&self.entities)
            .values()
            .filter(|e| e.kind() == kind)
            .cloned()
            .collect()
    }

    /// Links with either end at `place`.
    pub fn find_links(&self, place: Uuid) -> Vec<Arc<Entity>> {
        self.entities_of_kind(EntityKind::Link)
            .into_iter()
            .filter(|e| e.as_link().is_some_and(|l| l.links_to(place)))
            .collect()
    }

    /// Some link joining `a` and `b`, in either direction.
    pub fn find_link(&self, a: Uuid, b: Uuid) -> Option<Arc<Entity>> {
        self.entities_of_kind(EntityKind::Link)
            .into_iter()
            .find(|e| e.as_link().is_some_and(|l| l.links_to(a) && l.links_to(b)))
    }

    // -- roles -----------------------------------------------------------------

    pub fn roles_of(&self, player: Uuid) -> BTreeSet<Role> {
        lock(&self.roles).get(&player).cloned().unwrap_or_default()
    }

    pub fn has_role(&self, player: Uuid, role: Role) -> bool {
        lock(&self.roles)
            .get(&player)
            .is_some_and(|roles| roles.contains(&role))
    }

    /// Grant a role, returning the player's roles afterwards.
    pub fn add_role(&self, player: Uuid, role: Role) -> BTreeSet<Role> {
        let mut roles = lock(&self.roles);
        let held = roles.entry(player).or_default();
        held.insert(role);
        held.clone()
    }

    pub fn remove_role(&self, player: Uuid, role: Role) -> BTreeSet<Role> {
        let mut roles = lock(&self.roles);
        match roles.get_mut(&player) {
            Some(held) => {
                held.remove(&role);
                held.clone()
            }
            None => BTreeSet::new(),
        }
    }

    pub fn remove_all_roles(&self, player: Uuid) {
        lock(&self.roles).remove(&player);
    }

    pub fn role_assignments(&self) -> BTreeMap<Uuid, BTreeSet<Role>> {
        lock(&self.roles)
            .iter()
            .map(|(id, roles)| (*id, roles.clone()))
            .collect()
    }

    /// Whether `actor`, with the roles it holds here, passes `target`'s gate.
    pub fn permits(&self, target: &EntityCore, category: Category, actor: &EntityCore) -> bool {
        target.passes(category, actor, &self.roles_of(actor.id()))
    }

    // -- special places ----------------------------------------------------------

    fn special_place(&self, id: Option<Uuid>, what: &str) -> Result<Arc<Entity>, WorldError> {
        let id = id.ok_or_else(|| WorldError::NotFound(format!("{} in {}", what, self.name)))?;
        self.get_entity_as(id, EntityKind::Place)?
            .ok_or_else(|| WorldError::NotFound(format!("{} {} in {}", what, id, self.name)))
    }

    fn check_special(&self, place: &Entity) -> Result<Uuid, WorldError> {
        place.expect_kind(EntityKind::Place)?;
        if !self.contains(place.id()) {
            return Err(WorldError::NotFound(format!(
                "place {} in {}",
                place.id(),
                self.name
            )));
        }
        Ok(place.id())
    }

    pub fn origin_id(&self) -> Option<Uuid> {
        lock(&self.special).origin
    }

    /// The default place and starting point of this universe.
    pub fn origin(&self) -> Result<Arc<Entity>, WorldError> {
        self.special_place(self.origin_id(), "origin")
    }

    pub fn set_origin(&self, place: &Entity) -> Result<(), WorldError> {
        let id = self.check_special(place)?;
        lock(&self.special).origin = Some(id);
        Ok(())
    }

    pub fn lost_and_found_id(&self) -> Option<Uuid> {
        lock(&self.special).lost_and_found
    }

    /// Where the contents of destroyed things go.
    pub fn lost_and_found(&self) -> Result<Arc<Entity>, WorldError> {
        self.special_place(self.lost_and_found_id(), "lost+found")
    }

    pub fn set_lost_and_found(&self, place: &Entity) -> Result<(), WorldError> {
        let id = self.check_special(place)?;
        lock(&self.special).lost_and_found = Some(id);
        Ok(())
    }

    pub fn guest_home_id(&self) -> Option<Uuid> {
        lock(&self.special).guest_home
    }

    /// Where guests appear.
    pub fn guest_home(&self) -> Result<Arc<Entity>, WorldError> {
        self.special_place(self.guest_home_id(), "guest home")
    }

    pub fn set_guest_home(&self, place: &Entity) -> Result<(), WorldError> {
        let id = self.check_special(place)?;
        lock(&self.special).guest_home = Some(id);
        Ok(())
    }

    /// Remove every guest player, taking each out of its location and dropping
    /// its role assignments. Returns how many were removed.
    pub fn remove_guests(&self) -> usize {
        let guests: Vec<Arc<Entity>> = self
            .entities_of_kind(EntityKind::Player)
            .into_iter()
            .filter(|p| self.has_role(p.id(), Role::Guest))
            .collect();
        for guest in &guests {
            if let Ok(Some(location)) = guest.location_ref() {
                if location.namespace() == self.name {
                    if let Some(place) = self.get_entity(location.id()) {
                        place.take(guest);
                    }
                }
            }
            self.remove_all_roles(guest.id());
            self.remove_entity_id(guest.id());
        }
        if !guests.is_empty() {
            info!("{}: removed {} guest(s)", self.name, guests.len());
        }
        guests.len()
    }

    // -- persistence ---------------------------------------------------------------

    pub fn to_json(&self) -> Result<String, WorldError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, WorldError> {
        serde_json::from_str::<NamespaceDocument>(text)?.into_namespace()
    }

    pub fn save_to_file(&self, path: &Path, safe: bool) -> Result<(), WorldError> {
        write_locked(path, &self.to_json()?, safe)?;
        info!("Saved universe {} to {}", self.name, path.display());
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self, WorldError> {
        let ns = Self::from_json(&read_locked(path)?)?;
        info!(
            "Loaded universe {} ({} things) from {}",
            ns.name,
            ns.len(),
            path.display()
        );
        Ok(ns)
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("name", &self.name)
            .field("things", &self.len())
            .finish()
    }
}

#[derive(Serialize)]
struct NamespaceDocumentRef<'a> {
    name: &'a str,
    things: Vec<&'a Entity>,
    role_assignments: BTreeMap<Uuid, BTreeSet<Role>>,
    origin_id: Option<Uuid>,
    lost_and_found_id: Option<Uuid>,
    guest_home_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub(crate) struct NamespaceDocument {
    name: String,
    #[serde(default)]
    things: Vec<EntityDocument>,
    #[serde(default)]
    role_assignments: BTreeMap<Uuid, BTreeSet<Role>>,
    #[serde(default)]
    origin_id: Option<Uuid>,
    #[serde(default)]
    lost_and_found_id: Option<Uuid>,
    #[serde(default)]
    guest_home_id: Option<Uuid>,
}

impl Serialize for Namespace {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut snapshot = self.entities();
        snapshot.sort_by_key(|e| e.id());
        let special = *lock(&self.special);
        NamespaceDocumentRef {
            name: &self.name,
            things: snapshot.iter().map(|e| &**e).collect(),
            role_assignments: self.role_assignments(),
            origin_id: special.origin,
            lost_and_found_id: special.lost_and_found,
            guest_home_id: special.guest_home,
        }
        .serialize(serializer)
    }
}

impl NamespaceDocument {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Build the universe, rejecting any entity that breaks its invariants and
    /// any id that appears twice.
    pub(crate) fn into_namespace(self) -> Result<Namespace, WorldError> {
        let ns = Namespace::new(self.name);
        for thing in self.things {
            let id = thing.id();
            if ns.contains(id) {
                return Err(WorldError::malformed(
                    &id.to_string(),
                    format!("duplicate entity id in universe {}", ns.name),
                ));
            }
            ns.add_entity(thing.into_entity()?);
        }
        *lock(&ns.roles) = self.role_assignments.into_iter().collect();
        *lock(&ns.special) = SpecialPlaces {
            origin: self.origin_id,
            lost_and_found: self.lost_and_found_id,
            guest_home: self.guest_home_id,
        };
        Ok(ns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::attr::Attr;
    use crate::world::entity::relocate;
    use crate::world::entity_ref::EntityRef;
    use crate::world::kinds::{Link, Player, Thing};

    #[test]
    fn add_get_remove() {
        let ns = Namespace::new("test");
        let rock = ns.add_entity(Entity::Thing(Thing::new("rock", "test")));
        assert_eq!(ns.get_entity(rock.id()), Some(Arc::clone(&rock)));
        assert_eq!(ns.len(), 1);
        assert!(ns.remove_entity(None).is_none());
        assert!(ns.remove_entity(Some(rock.core())).is_some());
        assert!(ns.get_entity(rock.id()).is_none());
        assert!(ns.is_empty());
    }

    #[test]
    fn lookup_by_name_and_kind() {
        let ns = Namespace::new("test");
        ns.add_entity(Entity::Thing(Thing::new("lamp", "test")));
        let place = ns.add_entity(Entity::Place(Place::new("lamp", "test")));
        let found = ns
            .get_entity_by_name("lamp", Some(EntityKind::Place))
            .expect("place named lamp");
        assert_eq!(found.id(), place.id());
        assert!(ns.get_entity_by_name("lamp", None).is_some());
        assert!(ns.get_entity_by_name("lamp", Some(EntityKind::Player)).is_none());
        assert!(matches!(
            ns.get_entity_as(place.id(), EntityKind::Thing),
            Err(WorldError::WrongKind { .. })
        ));
    }

    #[test]
    fn special_places_exist_and_can_move() {
        let ns = Namespace::with_special_places("test");
        assert_eq!(ns.len(), 3);
        assert_eq!(ns.origin().unwrap().name(), ORIGIN_NAME);
        assert_eq!(ns.lost_and_found().unwrap().name(), LOST_AND_FOUND_NAME);
        assert_eq!(ns.guest_home().unwrap().name(), GUEST_HOME_NAME);

        let plaza = ns.add_entity(Entity::Place(Place::new("plaza", "test")));
        ns.set_origin(&plaza).unwrap();
        assert_eq!(ns.origin().unwrap().id(), plaza.id());

        let stray = Entity::Place(Place::new("stray", "test"));
        assert!(matches!(ns.set_origin(&stray), Err(WorldError::NotFound(_))));
        let rock = ns.add_entity(Entity::Thing(Thing::new("rock", "test")));
        assert!(matches!(
            ns.set_guest_home(&rock),
            Err(WorldError::WrongKind { .. })
        ));
        assert!(Namespace::new("bare").origin().is_err());
    }

    #[test]
    fn roles_and_permits() {
        let ns = Namespace::new("test");
        let chest = ns.add_entity(Entity::Thing(Thing::new("chest", "test")));
        let bob = ns.add_entity(Entity::Player(Player::new("bob", "test")));
        assert!(!ns.permits(&chest, Category::Read, &bob));
        ns.add_role(bob.id(), Role::Denizen);
        assert!(ns.permits(&chest, Category::Read, &bob));
        assert!(!ns.permits(&chest, Category::Write, &bob));
        assert_eq!(
            ns.add_role(bob.id(), Role::Bard),
            BTreeSet::from([Role::Bard, Role::Denizen])
        );
        assert!(ns.permits(&chest, Category::Write, &bob));
        assert_eq!(ns.remove_role(bob.id(), Role::Bard), BTreeSet::from([Role::Denizen]));
        ns.remove_all_roles(bob.id());
        assert!(ns.roles_of(bob.id()).is_empty());
    }

    #[test]
    fn remove_guests_cleans_up_location_and_roles() {
        let ns = Namespace::with_special_places("test");
        let home = ns.guest_home().unwrap();
        let guest = ns.add_entity(Entity::Player(Player::new("guest1", "test")));
        let member = ns.add_entity(Entity::Player(Player::new("alice", "test")));
        ns.add_role(guest.id(), Role::Guest);
        ns.add_role(member.id(), Role::Denizen);
        relocate(&guest, None, &home);
        relocate(&member, None, &home);

        assert_eq!(ns.remove_guests(), 1);
        assert!(!ns.contains(guest.id()));
        assert!(ns.contains(member.id()));
        assert!(!home.has(&guest));
        assert!(home.has(&member));
        assert!(ns.roles_of(guest.id()).is_empty());
    }

    #[test]
    fn finds_links_between_places() {
        let ns = Namespace::new("test");
        let a = ns.add_entity(Entity::Place(Place::new("a", "test")));
        let b = ns.add_entity(Entity::Place(Place::new("b", "test")));
        let c = ns.add_entity(Entity::Place(Place::new("c", "test")));
        let ab = ns.add_entity(Entity::Link(Link::new(
            "ab",
            "test",
            ("east", a.entity_ref()),
            ("west", b.entity_ref()),
        )));
        assert_eq!(ns.find_links(a.id()), vec![Arc::clone(&ab)]);
        assert_eq!(ns.find_link(b.id(), a.id()), Some(ab));
        assert!(ns.find_link(a.id(), c.id()).is_none());
        assert!(ns.find_links(c.id()).is_empty());
    }

    #[test]
    fn json_round_trip_keeps_kinds_and_tables() {
        let ns = Namespace::with_special_places("test");
        let origin = ns.origin().unwrap();
        let lab = ns.add_entity(Entity::Place(Place::new("lab", "test")));
        let alice = ns.add_entity(Entity::Player(Player::new("alice", "test")));
        ns.add_entity(Entity::Link(Link::new(
            "door",
            "test",
            ("out", origin.entity_ref()),
            ("in", lab.entity_ref()),
        )));
        alice.set_attr(Attr::integer("hp", 10));
        alice.set_attr(Attr::thing("home", EntityRef::new("test", lab.id())));
        ns.add_role(alice.id(), Role::Adept);
        relocate(&alice, None, &origin);

        let text = ns.to_json().expect("encode");
        let back = Namespace::from_json(&text).expect("decode");
        assert_eq!(back.name(), "test");
        assert_eq!(back.len(), ns.len());
        assert_eq!(back.origin_id(), ns.origin_id());
        assert_eq!(back.guest_home_id(), ns.guest_home_id());
        assert!(back.has_role(alice.id(), Role::Adept));
        for original in ns.entities() {
            let copy = back.get_entity(original.id()).expect("entity survives");
            assert_eq!(copy.kind(), original.kind());
            assert_eq!(copy.attrs(), original.attrs());
            assert_eq!(copy.contents(), original.contents());
            assert_eq!(copy.policy(), original.policy());
        }
        assert_eq!(back.to_json().unwrap(), text);
    }

    #[test]
    fn decoding_rejects_nameless_things() {
        let text = format!(
            r#"{{"name":"test","things":[{{"kind":"place","id":"{}","attrs":[{{"name":"universe","type":"STRING","value":"test"}}]}}]}}"#,
            Uuid::new_v4()
        );
        let err = Namespace::from_json(&text).expect_err("missing name");
        assert!(
            matches!(err, WorldError::MissingAttribute { ref attr, .. } if attr == "name"),
            "{err}"
        );
    }

    #[test]
    fn decoding_rejects_duplicate_ids() {
        let ns = Namespace::new("test");
        let rock = ns.add_entity(Entity::Thing(Thing::new("rock", "test")));
        let thing = rock.to_json().unwrap();
        let text = format!(r#"{{"name":"test","things":[{thing},{thing}]}}"#);
        assert!(matches!(
            Namespace::from_json(&text),
            Err(WorldError::MalformedSpec { .. })
        ));
    }
}
