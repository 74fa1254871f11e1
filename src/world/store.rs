use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info};
use sled::{Batch, IVec};

use crate::world::errors::WorldError;
use crate::world::namespace::{Namespace, NamespaceDocument};
use crate::world::registry::Registry;

const TREE_NAMESPACES: &str = "grounds_namespaces";
const TREE_META: &str = "grounds_meta";

const META_SCHEMA_VERSION: &str = "schema_version";
const META_SAVED_AT: &str = "saved_at";

/// Bumped whenever the stored namespace document changes shape.
pub const WORLD_SCHEMA_VERSION: u32 = 1;

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct WorldStoreBuilder {
    path: PathBuf,
    seed_namespace: Option<String>,
}

impl WorldStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seed_namespace: None,
        }
    }

    /// Create `name`, with its special places, if the store holds no
    /// universes yet.
    pub fn seed_namespace(mut self, name: impl Into<String>) -> Self {
        self.seed_namespace = Some(name.into());
        self
    }

    pub fn open(self) -> Result<WorldStore, WorldError> {
        WorldStore::open_with_options(self.path, self.seed_namespace.as_deref())
    }
}

/// Sled-backed persistence of universes, one JSON document per universe.
pub struct WorldStore {
    _db: sled::Db,
    namespaces: sled::Tree,
    meta: sled::Tree,
}

impl WorldStore {
    /// Open (or create) the store rooted at `path` without seeding anything.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, WorldError> {
        Self::open_with_options(path, None)
    }

    fn open_with_options<P: AsRef<Path>>(path: P, seed: Option<&str>) -> Result<Self, WorldError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let namespaces = db.open_tree(TREE_NAMESPACES)?;
        let meta = db.open_tree(TREE_META)?;
        let store = Self {
            _db: db,
            namespaces,
            meta,
        };
        store.check_schema_version()?;

        if let Some(name) = seed {
            store.seed_namespace_if_needed(name)?;
        }

        Ok(store)
    }

    fn check_schema_version(&self) -> Result<(), WorldError> {
        match self.meta.get(META_SCHEMA_VERSION)? {
            None => {
                self.meta.insert(
                    META_SCHEMA_VERSION,
                    WORLD_SCHEMA_VERSION.to_string().as_bytes(),
                )?;
                Ok(())
            }
            Some(bytes) => {
                let stored = String::from_utf8_lossy(&bytes).to_string();
                if stored == WORLD_SCHEMA_VERSION.to_string() {
                    Ok(())
                } else {
                    Err(WorldError::malformed(
                        &stored,
                        format!("unsupported store schema, expected {}", WORLD_SCHEMA_VERSION),
                    ))
                }
            }
        }
    }

    fn namespace_key(name: &str) -> Vec<u8> {
        format!("namespaces:{}", name).into_bytes()
    }

    fn namespace_prefix() -> &'static [u8] {
        b"namespaces:"
    }

    fn deserialize(bytes: IVec) -> Result<Namespace, WorldError> {
        serde_json::from_slice::<NamespaceDocument>(&bytes)?.into_namespace()
    }

    /// Insert or replace a universe.
    pub fn put_namespace(&self, namespace: &Namespace) -> Result<(), WorldError> {
        let bytes = serde_json::to_vec(namespace)?;
        self.namespaces
            .insert(Self::namespace_key(namespace.name()), bytes)?;
        self.namespaces.flush()?;
        debug!("stored universe {}", namespace.name());
        Ok(())
    }

    pub fn get_namespace(&self, name: &str) -> Result<Namespace, WorldError> {
        let bytes = self
            .namespaces
            .get(Self::namespace_key(name))?
            .ok_or_else(|| WorldError::NotFound(format!("stored universe {}", name)))?;
        Self::deserialize(bytes)
    }

    /// Names of every stored universe, sorted.
    pub fn list_namespaces(&self) -> Result<Vec<String>, WorldError> {
        let prefix = Self::namespace_prefix();
        let mut names = Vec::new();
        for entry in self.namespaces.scan_prefix(prefix) {
            let (key, _) = entry?;
            names.push(String::from_utf8_lossy(&key[prefix.len()..]).to_string());
        }
        names.sort();
        Ok(names)
    }

    /// Returns false if nothing was stored under `name`.
    pub fn delete_namespace(&self, name: &str) -> Result<bool, WorldError> {
        let removed = self.namespaces.remove(Self::namespace_key(name))?;
        self.namespaces.flush()?;
        Ok(removed.is_some())
    }

    pub fn seed_namespace_if_needed(&self, name: &str) -> Result<bool, WorldError> {
        if self
            .namespaces
            .scan_prefix(Self::namespace_prefix())
            .next()
            .is_some()
        {
            return Ok(false);
        }
        self.put_namespace(&Namespace::with_special_places(name))?;
        info!("Seeded empty world store with universe {}", name);
        Ok(true)
    }

    /// Store every universe in `registry` and drop stored universes it no
    /// longer has, as one atomic batch. Returns the number stored.
    pub fn save_registry(&self, registry: &Registry) -> Result<usize, WorldError> {
        let namespaces = registry.namespaces();
        let live: HashSet<&str> = namespaces.iter().map(|ns| ns.name()).collect();
        let mut batch = Batch::default();
        for stale in self
            .list_namespaces()?
            .iter()
            .filter(|name| !live.contains(name.as_str()))
        {
            batch.remove(Self::namespace_key(stale));
            debug!("dropping stale universe {}", stale);
        }
        for namespace in &namespaces {
            batch.insert(
                Self::namespace_key(namespace.name()),
                serde_json::to_vec(&**namespace)?,
            );
        }
        self.namespaces.apply_batch(batch)?;
        self.meta
            .insert(META_SAVED_AT, Utc::now().to_rfc3339().as_bytes())?;
        self.namespaces.flush()?;
        self.meta.flush()?;
        info!("Saved {} universe(s) to world store", namespaces.len());
        Ok(namespaces.len())
    }

    /// Put every stored universe into `registry`, replacing any of the same
    /// name. Returns the number loaded.
    pub fn load_registry(&self, registry: &Registry) -> Result<usize, WorldError> {
        let mut loaded = 0usize;
        for entry in self.namespaces.scan_prefix(Self::namespace_prefix()) {
            let (_, bytes) = entry?;
            registry.put_namespace(Self::deserialize(bytes)?);
            loaded += 1;
        }
        info!("Loaded {} universe(s) from world store", loaded);
        Ok(loaded)
    }

    /// When [`save_registry`](Self::save_registry) last ran.
    pub fn saved_at(&self) -> Result<Option<DateTime<Utc>>, WorldError> {
        Ok(self
            .meta
            .get(META_SAVED_AT)?
            .and_then(|bytes| {
                DateTime::parse_from_rfc3339(&String::from_utf8_lossy(&bytes)).ok()
            })
            .map(|ts| ts.with_timezone(&Utc)))
    }
}
