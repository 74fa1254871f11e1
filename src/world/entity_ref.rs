//! Fully-qualified entity references.
//!
//! Every reference to an entity carries the name of the universe that holds it,
//! so there is a single resolution path through the [`Registry`]. The textual
//! form is `<universe>::<uuid>`.
//!
//! [`Registry`]: crate::world::registry::Registry

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::world::errors::WorldError;

/// Separator between the universe name and the entity id in a spec string.
pub const SPEC_SEPARATOR: &str = "::";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityRef {
    namespace: String,
    id: Uuid,
}

impl EntityRef {
    pub fn new(namespace: impl Into<String>, id: Uuid) -> Self {
        Self {
            namespace: namespace.into(),
            id,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Short form for display inside the referenced universe: just the id.
    pub fn display_local(&self) -> String {
        self.id.to_string()
    }

    /// Parse either a full spec string or a bare id; a bare id is taken to live
    /// in `default_namespace`.
    pub fn parse_in(default_namespace: &str, s: &str) -> Result<Self, WorldError> {
        if s.contains(SPEC_SEPARATOR) {
            return s.parse();
        }
        let id = Uuid::parse_str(s.trim())
            .map_err(|e| WorldError::malformed(s, format!("bad id: {}", e)))?;
        Ok(Self::new(default_namespace, id))
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.namespace, SPEC_SEPARATOR, self.id)
    }
}

impl FromStr for EntityRef {
    type Err = WorldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((namespace, id)) = s.split_once(SPEC_SEPARATOR) else {
            return Err(WorldError::malformed(s, "missing :: separator"));
        };
        if namespace.is_empty() {
            return Err(WorldError::malformed(s, "empty universe name"));
        }
        let id =
            Uuid::parse_str(id).map_err(|e| WorldError::malformed(s, format!("bad id: {}", e)))?;
        Ok(Self::new(namespace, id))
    }
}

impl Serialize for EntityRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntityRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_displays_spec() {
        let id = Uuid::new_v4();
        let spec = format!("test::{}", id);
        let r: EntityRef = spec.parse().expect("parse");
        assert_eq!(r.namespace(), "test");
        assert_eq!(r.id(), id);
        assert_eq!(r.to_string(), spec);
        assert_eq!(r.display_local(), id.to_string());
    }

    #[test]
    fn rejects_missing_separator_and_bad_id() {
        assert!(matches!(
            "test".parse::<EntityRef>(),
            Err(WorldError::MalformedSpec { .. })
        ));
        assert!(matches!(
            "test::not-a-uuid".parse::<EntityRef>(),
            Err(WorldError::MalformedSpec { .. })
        ));
        assert!("::00000000-0000-0000-0000-000000000000"
            .parse::<EntityRef>()
            .is_err());
    }

    #[test]
    fn bare_id_uses_default_namespace() {
        let id = Uuid::new_v4();
        let r = EntityRef::parse_in("home", &id.to_string()).expect("bare id");
        assert_eq!(r, EntityRef::new("home", id));
        let r = EntityRef::parse_in("home", &format!("away::{}", id)).expect("full spec");
        assert_eq!(r.namespace(), "away");
    }
}
