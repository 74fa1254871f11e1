//! Entities: identity, attributes, contents and the permission gate.
//!
//! [`EntityCore`] holds the record shared by every kind. Its attribute map,
//! contents set and policy each sit behind their own lock. No two of them are
//! held together and none is held across a call into another entity.
//! [`Entity`] is the closed set of concrete kinds, each wrapping an
//! `EntityCore`.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::{Arc, Mutex};

use log::debug;
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use crate::logutil::escape_log;
use crate::world::attr::{Attr, AttrKind, AttrValue};
use crate::world::entity_ref::EntityRef;
use crate::world::errors::WorldError;
use crate::world::kinds::{Extension, Link, Place, Player, Thing};
use crate::world::lock;
use crate::world::namespace::Namespace;
use crate::world::policy::{Category, Policy, Role};
use crate::world::registry::Registry;

pub const ATTR_NAME: &str = "name";
pub const ATTR_DESCRIPTION: &str = "description";
pub const ATTR_UNIVERSE: &str = "universe";
pub const ATTR_LOCATION: &str = "location";
pub const ATTR_OWNER: &str = "owner";

/// Attributes every entity must carry.
pub const RESERVED_ATTRS: [&str; 2] = [ATTR_NAME, ATTR_UNIVERSE];

/// The placeholder entity NOTHING.
pub const NOTHING_ID: Uuid = Uuid::from_u64_pair(0, 0);
/// The placeholder entity EVERYTHING.
pub const EVERYTHING_ID: Uuid = Uuid::from_u64_pair(0, 1);
/// The administrative super-user, GOD.
pub const GOD_ID: Uuid = Uuid::from_u64_pair(1, 0);

/// The record shared by all entity kinds.
pub struct EntityCore {
    id: Uuid,
    attrs: Mutex<HashMap<String, Attr>>,
    contents: Mutex<HashSet<Uuid>>,
    policy: Mutex<Policy>,
}

impl EntityCore {
    /// A fresh record with the reserved attributes and the default policy.
    pub fn new(name: &str, namespace: &str, id: Uuid) -> Self {
        let attrs = HashMap::from([
            (ATTR_NAME.to_string(), Attr::string(ATTR_NAME, name)),
            (ATTR_UNIVERSE.to_string(), Attr::string(ATTR_UNIVERSE, namespace)),
        ]);
        Self {
            id,
            attrs: Mutex::new(attrs),
            contents: Mutex::new(HashSet::new()),
            policy: Mutex::new(Policy::default_policy()),
        }
    }

    /// Rebuild a record from persisted parts. Fails if `name` or `universe` is
    /// missing.
    pub fn from_parts(
        id: Uuid,
        attrs: impl IntoIterator<Item = Attr>,
        contents: impl IntoIterator<Item = Uuid>,
        policy: Policy,
    ) -> Result<Self, WorldError> {
        let attrs: HashMap<String, Attr> = attrs
            .into_iter()
            .map(|a| (a.name().to_string(), a))
            .collect();
        for reserved in RESERVED_ATTRS {
            if !attrs.contains_key(reserved) {
                return Err(WorldError::missing(reserved, format!("thing {}", id)));
            }
        }
        Ok(Self {
            id,
            attrs: Mutex::new(attrs),
            contents: Mutex::new(contents.into_iter().collect()),
            policy: Mutex::new(policy),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> String {
        self.get_attr(ATTR_NAME)
            .map(|a| a.value_string())
            .unwrap_or_default()
    }

    pub fn description(&self) -> Option<String> {
        self.get_attr(ATTR_DESCRIPTION).map(|a| a.value_string())
    }

    pub fn set_description(&self, description: Option<&str>) {
        match description {
            Some(text) => self.set_attr(Attr::string(ATTR_DESCRIPTION, text)),
            None => {
                self.remove_attr(ATTR_DESCRIPTION);
            }
        }
    }

    /// Name of the universe this entity claims to live in.
    pub fn universe_name(&self) -> String {
        self.get_attr(ATTR_UNIVERSE)
            .map(|a| a.value_string())
            .unwrap_or_default()
    }

    pub fn universe(&self, registry: &Registry) -> Result<Arc<Namespace>, WorldError> {
        registry.get_namespace(&self.universe_name())
    }

    pub fn set_universe(&self, namespace: &Namespace) {
        self.set_attr(Attr::string(ATTR_UNIVERSE, namespace.name()));
    }

    /// Fully-qualified reference to this entity.
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.universe_name(), self.id)
    }

    /// The entity spec string, `<universe>::<id>`.
    pub fn spec(&self) -> String {
        self.entity_ref().to_string()
    }

    // -- attributes --------------------------------------------------------

    /// Snapshot of all attributes, sorted by name.
    pub fn attrs(&self) -> Vec<Attr> {
        let mut attrs: Vec<Attr> = lock(&self.attrs).values().cloned().collect();
        attrs.sort_by(|a, b| a.name().cmp(b.name()));
        attrs
    }

    pub fn get_attr(&self, name: &str) -> Option<Attr> {
        lock(&self.attrs).get(name).cloned()
    }

    /// Insert or replace the attribute with the same name.
    pub fn set_attr(&self, attr: Attr) {
        debug!("{} set {}", self.id, escape_log(&attr.to_attr_spec()));
        lock(&self.attrs).insert(attr.name().to_string(), attr);
    }

    /// Remove an attribute. The reserved attributes cannot be removed.
    pub fn remove_attr(&self, name: &str) -> Option<Attr> {
        if RESERVED_ATTRS.contains(&name) {
            debug!("{} refusing to remove reserved attribute {}", self.id, name);
            return None;
        }
        lock(&self.attrs).remove(name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        lock(&self.attrs).contains_key(name)
    }

    /// Atomically add `delta` to an INTEGER attribute, returning the new value.
    pub fn add_to_attr(&self, name: &str, delta: i64) -> Result<i64, WorldError> {
        let mut attrs = lock(&self.attrs);
        let current = attrs
            .get(name)
            .ok_or_else(|| WorldError::missing(name, self.id))?
            .as_integer()?;
        let updated = current.wrapping_add(delta);
        attrs.insert(name.to_string(), Attr::integer(name, updated));
        Ok(updated)
    }

    pub fn incr_attr(&self, name: &str) -> Result<i64, WorldError> {
        self.add_to_attr(name, 1)
    }

    pub fn decr_attr(&self, name: &str) -> Result<i64, WorldError> {
        self.add_to_attr(name, -1)
    }

    /// Atomically set a BOOLEAN attribute to `value` if it currently equals
    /// `expect`. Returns whether the swap happened.
    pub fn compare_and_set_attr(
        &self,
        name: &str,
        expect: bool,
        value: bool,
    ) -> Result<bool, WorldError> {
        let mut attrs = lock(&self.attrs);
        let current = attrs
            .get(name)
            .ok_or_else(|| WorldError::missing(name, self.id))?
            .as_boolean()?;
        if current != expect {
            return Ok(false);
        }
        attrs.insert(name.to_string(), Attr::boolean(name, value));
        Ok(true)
    }

    /// Atomically replace a BOOLEAN attribute, returning the old value.
    pub fn get_and_set_attr(&self, name: &str, value: bool) -> Result<bool, WorldError> {
        let mut attrs = lock(&self.attrs);
        let old = attrs
            .get(name)
            .ok_or_else(|| WorldError::missing(name, self.id))?
            .as_boolean()?;
        attrs.insert(name.to_string(), Attr::boolean(name, value));
        Ok(old)
    }

    /// Read a required attribute of a given kind.
    pub fn require_attr(&self, name: &str, kind: AttrKind) -> Result<Attr, WorldError> {
        let attr = self
            .get_attr(name)
            .ok_or_else(|| WorldError::missing(name, self.id))?;
        if attr.kind() != kind {
            return Err(WorldError::TypeMismatch {
                name: name.to_string(),
                expected: kind,
                found: attr.kind(),
            });
        }
        Ok(attr)
    }

    fn ref_attr(&self, name: &str) -> Result<Option<EntityRef>, WorldError> {
        match self.get_attr(name) {
            None => Ok(None),
            Some(attr) => Ok(Some(attr.as_entity_ref()?.clone())),
        }
    }

    fn set_ref_attr(&self, name: &str, target: Option<&EntityCore>) {
        match target {
            Some(target) => self.set_attr(Attr::thing(name, target.entity_ref())),
            None => {
                self.remove_attr(name);
            }
        }
    }

    pub fn location_ref(&self) -> Result<Option<EntityRef>, WorldError> {
        self.ref_attr(ATTR_LOCATION)
    }

    /// Where this entity is. A location that no longer exists reads as `None`.
    pub fn location(&self, registry: &Registry) -> Result<Option<Arc<Entity>>, WorldError> {
        Ok(self
            .location_ref()?
            .and_then(|target| registry.resolve_ref(&target)))
    }

    /// Point the location attribute at `place`, or remove it. Contents are not
    /// touched; see [`relocate`].
    pub fn set_location(&self, place: Option<&EntityCore>) {
        self.set_ref_attr(ATTR_LOCATION, place);
    }

    pub fn owner_ref(&self) -> Result<Option<EntityRef>, WorldError> {
        self.ref_attr(ATTR_OWNER)
    }

    pub fn owner(&self, registry: &Registry) -> Result<Option<Arc<Entity>>, WorldError> {
        Ok(self
            .owner_ref()?
            .and_then(|target| registry.resolve_ref(&target)))
    }

    pub fn set_owner(&self, owner: Option<&EntityCore>) {
        self.set_ref_attr(ATTR_OWNER, owner);
    }

    // -- contents ----------------------------------------------------------

    /// Snapshot of the ids this entity holds.
    pub fn contents(&self) -> HashSet<Uuid> {
        lock(&self.contents).clone()
    }

    pub fn has(&self, other: &EntityCore) -> bool {
        self.has_id(other.id)
    }

    pub fn has_id(&self, id: Uuid) -> bool {
        lock(&self.contents).contains(&id)
    }

    pub fn give(&self, other: &EntityCore) {
        self.give_id(other.id);
    }

    pub fn give_id(&self, id: Uuid) {
        lock(&self.contents).insert(id);
    }

    pub fn take(&self, other: &EntityCore) {
        self.take_id(other.id);
    }

    pub fn take_id(&self, id: Uuid) {
        lock(&self.contents).remove(&id);
    }

    // -- permissions -------------------------------------------------------

    pub fn policy(&self) -> Policy {
        lock(&self.policy).clone()
    }

    pub fn set_policy(&self, policy: Policy) {
        *lock(&self.policy) = policy;
    }

    /// Check the permission gate for `actor`, who holds `actor_roles` in the
    /// relevant universe. GOD always passes, and so does an entity acting on
    /// itself. The owner of this entity additionally holds [`Role::Owner`].
    pub fn passes(
        &self,
        category: Category,
        actor: &EntityCore,
        actor_roles: &BTreeSet<Role>,
    ) -> bool {
        if actor.id == GOD_ID || actor.id == self.id {
            return true;
        }
        let owned = matches!(self.owner_ref(), Ok(Some(owner)) if owner.id() == actor.id);
        let policy = lock(&self.policy);
        if owned {
            let mut roles = actor_roles.clone();
            roles.insert(Role::Owner);
            policy.passes(category, &roles)
        } else {
            policy.passes(category, actor_roles)
        }
    }

    fn to_document(&self, kind: EntityKind) -> EntityDocument {
        let mut contents: Vec<Uuid> = self.contents().into_iter().collect();
        contents.sort();
        EntityDocument {
            kind,
            id: self.id,
            attrs: self.attrs(),
            contents,
            policy: self.policy(),
        }
    }
}

impl fmt::Debug for EntityCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityCore")
            .field("id", &self.id)
            .field("name", &self.name())
            .finish()
    }
}

impl PartialEq for EntityCore {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EntityCore {}

impl Hash for EntityCore {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Concrete entity kinds, as tagged in persisted documents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Thing,
    Place,
    Player,
    Link,
    Extension,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Thing => "thing",
            EntityKind::Place => "place",
            EntityKind::Player => "player",
            EntityKind::Link => "link",
            EntityKind::Extension => "extension",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "thing" => Some(EntityKind::Thing),
            "place" => Some(EntityKind::Place),
            "player" => Some(EntityKind::Player),
            "link" => Some(EntityKind::Link),
            "extension" => Some(EntityKind::Extension),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entity of one of the fixed concrete kinds. Dereferences to its
/// [`EntityCore`]; equality and hashing use the id only.
#[derive(Debug)]
pub enum Entity {
    Thing(Thing),
    Place(Place),
    Player(Player),
    Link(Link),
    Extension(Extension),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Thing(_) => EntityKind::Thing,
            Entity::Place(_) => EntityKind::Place,
            Entity::Player(_) => EntityKind::Player,
            Entity::Link(_) => EntityKind::Link,
            Entity::Extension(_) => EntityKind::Extension,
        }
    }

    pub fn core(&self) -> &EntityCore {
        match self {
            Entity::Thing(t) => t.core(),
            Entity::Place(p) => p.core(),
            Entity::Player(p) => p.core(),
            Entity::Link(l) => l.core(),
            Entity::Extension(e) => e.core(),
        }
    }

    pub fn as_place(&self) -> Option<&Place> {
        match self {
            Entity::Place(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_player(&self) -> Option<&Player> {
        match self {
            Entity::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_link(&self) -> Option<&Link> {
        match self {
            Entity::Link(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_extension(&self) -> Option<&Extension> {
        match self {
            Entity::Extension(e) => Some(e),
            _ => None,
        }
    }

    /// Fail with [`WorldError::WrongKind`] unless this entity is of `kind`.
    pub fn expect_kind(&self, kind: EntityKind) -> Result<&Self, WorldError> {
        if self.kind() == kind {
            Ok(self)
        } else {
            Err(WorldError::WrongKind {
                id: self.id().to_string(),
                expected: kind.as_str(),
                found: self.kind().as_str(),
            })
        }
    }

    /// Rebuild an entity of `kind` from persisted parts, checking both the
    /// shared and the kind-specific invariants.
    pub fn from_parts(
        kind: EntityKind,
        id: Uuid,
        attrs: impl IntoIterator<Item = Attr>,
        contents: impl IntoIterator<Item = Uuid>,
        policy: Policy,
    ) -> Result<Self, WorldError> {
        let core = EntityCore::from_parts(id, attrs, contents, policy)?;
        Ok(match kind {
            EntityKind::Thing => Entity::Thing(Thing::from_core(core)),
            EntityKind::Place => Entity::Place(Place::from_core(core)),
            EntityKind::Player => Entity::Player(Player::from_core(core)),
            EntityKind::Link => Entity::Link(Link::from_core(core)?),
            EntityKind::Extension => Entity::Extension(Extension::from_core(core)),
        })
    }

    pub fn to_json(&self) -> Result<String, WorldError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode an entity document. A document that parses but breaks an
    /// entity invariant fails with that invariant's error, not a JSON error.
    pub fn from_json(text: &str) -> Result<Self, WorldError> {
        serde_json::from_str::<EntityDocument>(text)?.into_entity()
    }
}

impl Deref for Entity {
    type Target = EntityCore;

    fn deref(&self) -> &EntityCore {
        self.core()
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

/// On-disk shape of an entity.
#[derive(Serialize, Deserialize)]
pub(crate) struct EntityDocument {
    kind: EntityKind,
    id: Uuid,
    attrs: Vec<Attr>,
    #[serde(default)]
    contents: Vec<Uuid>,
    #[serde(default = "Policy::default_policy")]
    policy: Policy,
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.core().to_document(self.kind()).serialize(serializer)
    }
}

impl EntityDocument {
    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn into_entity(self) -> Result<Entity, WorldError> {
        Entity::from_parts(self.kind, self.id, self.attrs, self.contents, self.policy)
    }
}

/// Move `entity` out of `from` (if any) and into `to`, then point its location
/// at `to`. The steps run in that order, each under its own lock, so a
/// concurrent reader may briefly see the entity in neither container or see a
/// stale location.
pub fn relocate(entity: &EntityCore, from: Option<&EntityCore>, to: &EntityCore) {
    if let Some(from) = from {
        from.take(entity);
    }
    to.give(entity);
    entity.set_location(Some(to));
    debug!("relocated {} to {}", entity.id(), to.id());
}

/// Helper for kinds that need an attribute value of an exact shape.
pub(crate) fn expect_thing_in_attr(outer: &Attr) -> Result<(&str, &EntityRef), WorldError> {
    let inner = outer.as_attr()?;
    match inner.value() {
        AttrValue::Thing(target) => Ok((inner.name(), target)),
        _ => Err(WorldError::TypeMismatch {
            name: format!("{}.{}", outer.name(), inner.name()),
            expected: AttrKind::Thing,
            found: inner.kind(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn core(name: &str) -> EntityCore {
        EntityCore::new(name, "test", Uuid::new_v4())
    }

    #[test]
    fn new_entity_carries_reserved_attrs() {
        let e = core("rock");
        assert_eq!(e.name(), "rock");
        assert_eq!(e.universe_name(), "test");
        assert_eq!(e.spec(), format!("test::{}", e.id()));
        assert!(e.remove_attr(ATTR_NAME).is_none());
        assert!(e.has_attr(ATTR_NAME));
    }

    #[test]
    fn from_parts_requires_name_and_universe() {
        let id = Uuid::new_v4();
        let no_name = EntityCore::from_parts(
            id,
            vec![Attr::string(ATTR_UNIVERSE, "test")],
            vec![],
            Policy::empty(),
        );
        assert!(matches!(no_name, Err(WorldError::MissingAttribute { ref attr, .. }) if attr == "name"));
        let no_universe = EntityCore::from_parts(
            id,
            vec![Attr::string(ATTR_NAME, "x")],
            vec![],
            Policy::empty(),
        );
        assert!(matches!(no_universe, Err(WorldError::MissingAttribute { ref attr, .. }) if attr == "universe"));
    }

    #[test]
    fn add_to_attr_applies_delta() {
        let e = core("fighter");
        e.set_attr(Attr::integer("ad", 3));
        assert_eq!(e.add_to_attr("ad", -5).unwrap(), -2);
        assert_eq!(e.get_attr("ad").unwrap().as_integer().unwrap(), -2);
        assert_eq!(e.incr_attr("ad").unwrap(), -1);
        assert_eq!(e.decr_attr("ad").unwrap(), -2);
    }

    #[test]
    fn add_to_attr_fails_when_absent_or_not_integer() {
        let e = core("fighter");
        assert!(matches!(
            e.add_to_attr("ad", 1),
            Err(WorldError::MissingAttribute { .. })
        ));
        e.set_attr(Attr::string("ad", "3"));
        assert!(matches!(
            e.add_to_attr("ad", 1),
            Err(WorldError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn compare_and_set_only_swaps_on_expected_value() {
        let e = core("door");
        e.set_attr(Attr::boolean("flag", true));
        assert!(!e.compare_and_set_attr("flag", false, true).unwrap());
        assert!(e.get_attr("flag").unwrap().as_boolean().unwrap());
        assert!(e.compare_and_set_attr("flag", true, false).unwrap());
        assert!(!e.get_attr("flag").unwrap().as_boolean().unwrap());
        assert!(!e.get_and_set_attr("flag", true).unwrap());
        e.set_attr(Attr::integer("count", 1));
        assert!(matches!(
            e.compare_and_set_attr("count", true, false),
            Err(WorldError::TypeMismatch { .. })
        ));
        assert!(matches!(
            e.compare_and_set_attr("missing", true, false),
            Err(WorldError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn identity_ignores_attributes() {
        let id = Uuid::new_v4();
        let a = EntityCore::new("twin", "test", id);
        let b = EntityCore::new("twin", "test", Uuid::new_v4());
        assert_ne!(a, b);
        let a2 = EntityCore::new("other", "elsewhere", id);
        assert_eq!(a, a2);
        a.set_attr(Attr::integer("hp", 10));
        a.set_description(Some("changed"));
        assert_eq!(a, a);
    }

    #[test]
    fn set_owner_none_removes_attribute() {
        let e = core("sword");
        let owner = core("alice");
        e.set_owner(Some(&owner));
        assert_eq!(e.owner_ref().unwrap(), Some(owner.entity_ref()));
        e.set_owner(None);
        assert!(!e.has_attr(ATTR_OWNER));
        assert_eq!(e.owner_ref().unwrap(), None);
    }

    #[test]
    fn passes_honours_god_self_and_owner() {
        let target = core("chest");
        target.set_policy(Policy::default_policy());
        let god = EntityCore::new("GOD", "VOID", GOD_ID);
        let bob = core("bob");
        let none = BTreeSet::new();
        let denizen = BTreeSet::from([Role::Denizen]);

        assert!(target.passes(Category::Write, &god, &none));
        assert!(target.passes(Category::Write, &target, &none));
        assert!(!target.passes(Category::Write, &bob, &denizen));
        assert!(target.passes(Category::Read, &bob, &denizen));
        target.set_owner(Some(&bob));
        assert!(target.passes(Category::Write, &bob, &denizen));
    }

    #[test]
    fn relocate_updates_both_sides() {
        let rock = core("rock");
        let here = core("here");
        let there = core("there");
        relocate(&rock, None, &here);
        assert!(here.has(&rock));
        relocate(&rock, Some(&here), &there);
        assert!(!here.has(&rock));
        assert!(there.has(&rock));
        assert_eq!(rock.location_ref().unwrap(), Some(there.entity_ref()));
    }

    #[test]
    fn concurrent_give_and_take_lose_nothing() {
        let container = Arc::new(core("bag"));
        let keep: Vec<Uuid> = (0..10_000).map(|_| Uuid::new_v4()).collect();
        let churn: Vec<Uuid> = (0..10_000).map(|_| Uuid::new_v4()).collect();
        for id in &churn {
            container.give_id(*id);
        }

        let giver = {
            let container = Arc::clone(&container);
            let keep = keep.clone();
            thread::spawn(move || keep.iter().for_each(|id| container.give_id(*id)))
        };
        let taker = {
            let container = Arc::clone(&container);
            let churn = churn.clone();
            thread::spawn(move || churn.iter().for_each(|id| container.take_id(*id)))
        };
        giver.join().expect("giver");
        taker.join().expect("taker");

        let contents = container.contents();
        assert_eq!(contents.len(), keep.len());
        assert!(keep.iter().all(|id| contents.contains(id)));
    }

    #[test]
    fn entity_kind_names_parse() {
        assert_eq!(EntityKind::parse("Place"), Some(EntityKind::Place));
        assert_eq!(EntityKind::parse("portal"), None);
        assert_eq!(EntityKind::Extension.to_string(), "extension");
    }
}
