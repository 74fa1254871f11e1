//! The multiverse: every universe in the process, by name.
//!
//! A [`Registry`] is created once at startup and handed to whatever needs to
//! follow entity references. Creating it seeds the `VOID` universe with the
//! NOTHING and EVERYTHING placeholders and the GOD player; the void universe
//! and its sentinels cannot be removed.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use crate::logutil::escape_log;
use crate::validation::validate_namespace_name;
use crate::world::entity::{Entity, EntityKind, EVERYTHING_ID, GOD_ID, NOTHING_ID};
use crate::world::entity_ref::EntityRef;
use crate::world::errors::WorldError;
use crate::world::files::{read_locked, write_locked};
use crate::world::kinds::{Player, Thing};
use crate::world::lock;
use crate::world::namespace::{Namespace, NamespaceDocument};

pub const VOID_NAMESPACE: &str = "VOID";

pub struct Registry {
    namespaces: Mutex<HashMap<String, Arc<Namespace>>>,
}

fn sentinel(id: Uuid) -> Entity {
    if id == GOD_ID {
        Entity::Player(Player::with_id("GOD", VOID_NAMESPACE, id))
    } else if id == EVERYTHING_ID {
        Entity::Thing(Thing::with_id("EVERYTHING", VOID_NAMESPACE, id))
    } else {
        Entity::Thing(Thing::with_id("NOTHING", VOID_NAMESPACE, id))
    }
}

/// Make sure `void` holds all three sentinels.
fn seed_void(void: &Namespace) {
    for id in [NOTHING_ID, EVERYTHING_ID, GOD_ID] {
        if !void.contains(id) {
            void.add_entity(sentinel(id));
        }
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::from_namespaces(Vec::new())
    }

    fn from_namespaces(namespaces: Vec<Namespace>) -> Self {
        let mut table: HashMap<String, Arc<Namespace>> = namespaces
            .into_iter()
            .map(|ns| (ns.name().to_string(), Arc::new(ns)))
            .collect();
        let void = table
            .entry(VOID_NAMESPACE.to_string())
            .or_insert_with(|| Arc::new(Namespace::new(VOID_NAMESPACE)));
        seed_void(void);
        Self {
            namespaces: Mutex::new(table),
        }
    }

    fn void(&self) -> Arc<Namespace> {
        let mut table = lock(&self.namespaces);
        let void = table
            .entry(VOID_NAMESPACE.to_string())
            .or_insert_with(|| Arc::new(Namespace::new(VOID_NAMESPACE)));
        Arc::clone(void)
    }

    fn sentinel(&self, id: Uuid) -> Arc<Entity> {
        let void = self.void();
        void.get_entity(id)
            .unwrap_or_else(|| void.add_entity(sentinel(id)))
    }

    /// Universal "no such thing" placeholder.
    pub fn nothing(&self) -> Arc<Entity> {
        self.sentinel(NOTHING_ID)
    }

    /// Universal "all things" placeholder.
    pub fn everything(&self) -> Arc<Entity> {
        self.sentinel(EVERYTHING_ID)
    }

    /// The administrative super-user; passes every permission gate.
    pub fn god(&self) -> Arc<Entity> {
        self.sentinel(GOD_ID)
    }

    pub fn get_namespace(&self, name: &str) -> Result<Arc<Namespace>, WorldError> {
        lock(&self.namespaces)
            .get(name)
            .cloned()
            .ok_or_else(|| WorldError::UnknownNamespace(name.to_string()))
    }

    pub fn has_namespace(&self, name: &str) -> bool {
        lock(&self.namespaces).contains_key(name)
    }

    /// Insert or replace a universe by name. Replacing `VOID` re-seeds the
    /// sentinels into the new table.
    pub fn put_namespace(&self, namespace: impl Into<Arc<Namespace>>) -> Arc<Namespace> {
        let namespace = namespace.into();
        if namespace.name() == VOID_NAMESPACE {
            seed_void(&namespace);
        }
        let previous = lock(&self.namespaces)
            .insert(namespace.name().to_string(), Arc::clone(&namespace));
        debug!(
            "{} universe {}",
            if previous.is_some() { "replaced" } else { "added" },
            escape_log(namespace.name())
        );
        namespace
    }

    /// Create a universe with its special places. Fails if the name is invalid
    /// or already taken.
    pub fn create_namespace(&self, name: &str) -> Result<Arc<Namespace>, WorldError> {
        validate_namespace_name(name)?;
        let mut table = lock(&self.namespaces);
        if table.contains_key(name) {
            return Err(WorldError::InvalidName(format!(
                "universe {} already exists",
                name
            )));
        }
        let namespace = Arc::new(Namespace::with_special_places(name));
        table.insert(name.to_string(), Arc::clone(&namespace));
        info!("Created universe {}", name);
        Ok(namespace)
    }

    /// Remove a universe. `VOID` is never removed.
    pub fn remove_namespace(&self, name: &str) -> Option<Arc<Namespace>> {
        if name == VOID_NAMESPACE {
            warn!("refusing to remove the {} universe", VOID_NAMESPACE);
            return None;
        }
        let removed = lock(&self.namespaces).remove(name);
        if removed.is_some() {
            info!("Removed universe {}", escape_log(name));
        }
        removed
    }

    /// Sorted universe names.
    pub fn namespace_names(&self) -> Vec<String> {
        let mut names: Vec<String> = lock(&self.namespaces).keys().cloned().collect();
        names.sort();
        names
    }

    pub fn namespaces(&self) -> Vec<Arc<Namespace>> {
        let mut all: Vec<Arc<Namespace>> = lock(&self.namespaces).values().cloned().collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }

    /// Resolve `<namespace>::<uuid>`. Any malformation, an unknown universe
    /// or a missing entity all give `None`.
    pub fn resolve(&self, spec: &str) -> Option<Arc<Entity>> {
        let target: EntityRef = match spec.parse() {
            Ok(target) => target,
            Err(_) => {
                debug!("unresolvable spec {}", escape_log(spec));
                return None;
            }
        };
        self.resolve_ref(&target)
    }

    pub fn resolve_ref(&self, target: &EntityRef) -> Option<Arc<Entity>> {
        let namespace = lock(&self.namespaces).get(target.namespace()).cloned()?;
        namespace.get_entity(target.id())
    }

    /// Like [`resolve`](Self::resolve), failing if the entity is of another
    /// kind.
    pub fn resolve_as(
        &self,
        spec: &str,
        kind: EntityKind,
    ) -> Result<Option<Arc<Entity>>, WorldError> {
        match self.resolve(spec) {
            None => Ok(None),
            Some(entity) => {
                entity.expect_kind(kind)?;
                Ok(Some(entity))
            }
        }
    }

    /// Links anywhere in the multiverse with an end at `place`.
    pub fn find_links(&self, place: Uuid) -> Vec<Arc<Entity>> {
        self.namespaces()
            .iter()
            .flat_map(|ns| ns.find_links(place))
            .collect()
    }

    pub fn find_link(&self, a: Uuid, b: Uuid) -> Option<Arc<Entity>> {
        self.namespaces().iter().find_map(|ns| ns.find_link(a, b))
    }

    // -- persistence ---------------------------------------------------------------

    pub fn to_json(&self) -> Result<String, WorldError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, WorldError> {
        serde_json::from_str::<RegistryDocument>(text)?.into_registry()
    }

    /// Write the whole multiverse to `path`. See
    /// [`write_locked`](crate::world::files) for what `safe` changes.
    pub fn save_to_file(&self, path: &Path, safe: bool) -> Result<(), WorldError> {
        let content = self.to_json()?;
        write_locked(path, &content, safe)?;
        info!(
            "Saved {} universe(s) to {}",
            lock(&self.namespaces).len(),
            path.display()
        );
        Ok(())
    }

    /// Replace the namespace table with the contents of `path`, dropping
    /// guests from every loaded universe. Returns the number of universes now
    /// in the table, `VOID` included.
    pub fn load_from_file(&self, path: &Path) -> Result<usize, WorldError> {
        let loaded = Self::from_json(&read_locked(path)?)?;
        let table = std::mem::take(&mut *lock(&loaded.namespaces));
        let count = table.len();
        *lock(&self.namespaces) = table;
        for namespace in self.namespaces() {
            namespace.remove_guests();
        }
        info!("Loaded {} universe(s) from {}", count, path.display());
        Ok(count)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("namespaces", &self.namespace_names())
            .finish()
    }
}

#[derive(Serialize)]
struct RegistryDocumentRef<'a> {
    namespaces: BTreeMap<&'a str, &'a Namespace>,
}

#[derive(Deserialize)]
struct RegistryDocument {
    #[serde(default)]
    namespaces: BTreeMap<String, NamespaceDocument>,
}

impl Serialize for Registry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let snapshot = self.namespaces();
        RegistryDocumentRef {
            namespaces: snapshot.iter().map(|ns| (ns.name(), &**ns)).collect(),
        }
        .serialize(serializer)
    }
}

impl RegistryDocument {
    fn into_registry(self) -> Result<Registry, WorldError> {
        let mut namespaces = Vec::with_capacity(self.namespaces.len());
        for (key, doc) in self.namespaces {
            if key != doc.name() {
                return Err(WorldError::malformed(
                    &key,
                    format!("holds universe {}", doc.name()),
                ));
            }
            namespaces.push(doc.into_namespace()?);
        }
        Ok(Registry::from_namespaces(namespaces))
    }
}
