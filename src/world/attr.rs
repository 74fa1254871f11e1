//! Typed, named attribute values.
//!
//! An [`Attr`] carries its value as a native payload ([`AttrValue`]); the
//! string form only exists at the edges, in the attrSpec text format
//! (`name[KIND]=value`) and in the structured JSON document
//! (`{"name": .., "type": .., "value": ".."}`), where `value` is always a
//! string regardless of kind.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};

use crate::world::entity::Entity;
use crate::world::entity_ref::EntityRef;
use crate::world::errors::WorldError;
use crate::world::registry::Registry;

/// Attribute kinds, spelled the way they appear in attrSpec strings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttrKind {
    #[default]
    String,
    Integer,
    Boolean,
    Thing,
    Attr,
    AttrList,
}

impl AttrKind {
    pub const ALL: [AttrKind; 6] = [
        AttrKind::String,
        AttrKind::Integer,
        AttrKind::Boolean,
        AttrKind::Thing,
        AttrKind::Attr,
        AttrKind::AttrList,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttrKind::String => "STRING",
            AttrKind::Integer => "INTEGER",
            AttrKind::Boolean => "BOOLEAN",
            AttrKind::Thing => "THING",
            AttrKind::Attr => "ATTR",
            AttrKind::AttrList => "ATTRLIST",
        }
    }
}

impl fmt::Display for AttrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttrKind {
    type Err = WorldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AttrKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| WorldError::malformed(s, "unknown attribute type"))
    }
}

/// The payload of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttrValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    Thing(EntityRef),
    Attr(Box<Attr>),
    AttrList(Vec<Attr>),
}

impl AttrValue {
    pub fn kind(&self) -> AttrKind {
        match self {
            AttrValue::String(_) => AttrKind::String,
            AttrValue::Integer(_) => AttrKind::Integer,
            AttrValue::Boolean(_) => AttrKind::Boolean,
            AttrValue::Thing(_) => AttrKind::Thing,
            AttrValue::Attr(_) => AttrKind::Attr,
            AttrValue::AttrList(_) => AttrKind::AttrList,
        }
    }

    /// Encode the payload as a string. Nested attributes encode as their JSON
    /// documents.
    pub fn encode(&self) -> String {
        match self {
            AttrValue::String(s) => s.clone(),
            AttrValue::Integer(i) => i.to_string(),
            AttrValue::Boolean(b) => b.to_string(),
            AttrValue::Thing(r) => r.to_string(),
            AttrValue::Attr(a) => a.to_json_value().to_string(),
            AttrValue::AttrList(list) => list_to_json_value(list).to_string(),
        }
    }

    /// Decode a string payload of the given kind.
    pub fn decode(kind: AttrKind, text: &str) -> Result<Self, WorldError> {
        Ok(match kind {
            AttrKind::String => AttrValue::String(text.to_string()),
            AttrKind::Integer => AttrValue::Integer(
                text.trim()
                    .parse()
                    .map_err(|_| WorldError::malformed(text, "not an integer"))?,
            ),
            AttrKind::Boolean => {
                if text.eq_ignore_ascii_case("true") {
                    AttrValue::Boolean(true)
                } else if text.eq_ignore_ascii_case("false") {
                    AttrValue::Boolean(false)
                } else {
                    return Err(WorldError::malformed(text, "not a boolean"));
                }
            }
            AttrKind::Thing => AttrValue::Thing(text.parse()?),
            AttrKind::Attr => AttrValue::Attr(Box::new(Attr::from_json(text)?)),
            AttrKind::AttrList => AttrValue::AttrList(Attr::list_from_json(text)?),
        })
    }
}

/// A named, typed value attached to an entity. Two attributes are equal when
/// their names, kinds and values all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attr {
    name: String,
    value: AttrValue,
}

impl Attr {
    pub fn new(name: impl Into<String>, value: AttrValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, AttrValue::String(value.into()))
    }

    pub fn integer(name: impl Into<String>, value: i64) -> Self {
        Self::new(name, AttrValue::Integer(value))
    }

    pub fn boolean(name: impl Into<String>, value: bool) -> Self {
        Self::new(name, AttrValue::Boolean(value))
    }

    pub fn thing(name: impl Into<String>, target: EntityRef) -> Self {
        Self::new(name, AttrValue::Thing(target))
    }

    pub fn attr(name: impl Into<String>, inner: Attr) -> Self {
        Self::new(name, AttrValue::Attr(Box::new(inner)))
    }

    pub fn attr_list(name: impl Into<String>, list: Vec<Attr>) -> Self {
        Self::new(name, AttrValue::AttrList(list))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AttrKind {
        self.value.kind()
    }

    pub fn value(&self) -> &AttrValue {
        &self.value
    }

    /// The value as a string. Always available, whatever the kind.
    pub fn value_string(&self) -> String {
        self.value.encode()
    }

    fn mismatch(&self, expected: AttrKind) -> WorldError {
        WorldError::TypeMismatch {
            name: self.name.clone(),
            expected,
            found: self.kind(),
        }
    }

    pub fn as_str(&self) -> Result<&str, WorldError> {
        match &self.value {
            AttrValue::String(s) => Ok(s),
            _ => Err(self.mismatch(AttrKind::String)),
        }
    }

    pub fn as_integer(&self) -> Result<i64, WorldError> {
        match self.value {
            AttrValue::Integer(i) => Ok(i),
            _ => Err(self.mismatch(AttrKind::Integer)),
        }
    }

    pub fn as_boolean(&self) -> Result<bool, WorldError> {
        match self.value {
            AttrValue::Boolean(b) => Ok(b),
            _ => Err(self.mismatch(AttrKind::Boolean)),
        }
    }

    pub fn as_entity_ref(&self) -> Result<&EntityRef, WorldError> {
        match &self.value {
            AttrValue::Thing(r) => Ok(r),
            _ => Err(self.mismatch(AttrKind::Thing)),
        }
    }

    /// Resolve a THING attribute through the registry. A reference to an entity
    /// that no longer exists resolves to `None`.
    pub fn as_entity(&self, registry: &Registry) -> Result<Option<Arc<Entity>>, WorldError> {
        let target = self.as_entity_ref()?;
        Ok(registry.resolve_ref(target))
    }

    pub fn as_attr(&self) -> Result<&Attr, WorldError> {
        match &self.value {
            AttrValue::Attr(a) => Ok(a),
            _ => Err(self.mismatch(AttrKind::Attr)),
        }
    }

    pub fn as_attr_list(&self) -> Result<&[Attr], WorldError> {
        match &self.value {
            AttrValue::AttrList(list) => Ok(list),
            _ => Err(self.mismatch(AttrKind::AttrList)),
        }
    }

    /// The attribute list keyed by inner attribute name. Later duplicates win.
    pub fn as_attr_list_map(&self) -> Result<HashMap<String, Attr>, WorldError> {
        Ok(self
            .as_attr_list()?
            .iter()
            .map(|a| (a.name.clone(), a.clone()))
            .collect())
    }

    /// First attribute named `name` inside an ATTRLIST value.
    pub fn find_in_attr_list(&self, name: &str) -> Result<Option<&Attr>, WorldError> {
        Ok(self.as_attr_list()?.iter().find(|a| a.name == name))
    }

    /// The attrSpec form: `name[KIND]=value`.
    pub fn to_attr_spec(&self) -> String {
        format!("{}[{}]={}", self.name, self.kind(), self.value_string())
    }

    /// Parse an attrSpec string. The typed form `name[KIND]=value` wins
    /// whenever it matches with a known kind; otherwise `name=value`, with no
    /// `[` in the name, is a STRING attribute.
    pub fn from_attr_spec(spec: &str) -> Result<Self, WorldError> {
        let typed = split_typed_spec(spec).and_then(|(name, kind, value)| {
            kind.parse::<AttrKind>()
                .map(|kind| (name, kind, value))
                .map_err(|_| WorldError::malformed(spec, "unknown attribute type"))
        });
        let (name, kind, value) = match (typed, spec.split_once('=')) {
            (Ok(parts), _) => parts,
            (Err(_), Some((name, value))) if !name.contains('[') => {
                (name, AttrKind::String, value)
            }
            (Err(e), _) => return Err(e),
        };
        if name.is_empty() {
            return Err(WorldError::malformed(spec, "empty attribute name"));
        }
        let value = AttrValue::decode(kind, value).map_err(|e| match e {
            WorldError::MalformedSpec { reason, .. } => WorldError::malformed(spec, reason),
            other => other,
        })?;
        Ok(Self::new(name, value))
    }

    fn to_json_value(&self) -> Value {
        json!({
            "name": self.name,
            "type": self.kind().as_str(),
            "value": self.value_string(),
        })
    }

    pub fn to_json(&self) -> String {
        self.to_json_value().to_string()
    }

    pub fn from_json(text: &str) -> Result<Self, WorldError> {
        serde_json::from_str(text).map_err(|e| WorldError::malformed(text, e.to_string()))
    }

    pub fn list_to_json(list: &[Attr]) -> String {
        list_to_json_value(list).to_string()
    }

    pub fn list_from_json(text: &str) -> Result<Vec<Self>, WorldError> {
        serde_json::from_str(text).map_err(|e| WorldError::malformed(text, e.to_string()))
    }
}

fn list_to_json_value(list: &[Attr]) -> Value {
    Value::Array(list.iter().map(Attr::to_json_value).collect())
}

/// Split `name[KIND]=value` on the first `[`, the next `]` and the `=` right
/// after it.
fn split_typed_spec(spec: &str) -> Result<(&str, &str, &str), WorldError> {
    let Some((name, rest)) = spec.split_once('[') else {
        return Err(WorldError::malformed(spec, "expected name[TYPE]=value"));
    };
    let Some((kind, rest)) = rest.split_once(']') else {
        return Err(WorldError::malformed(spec, "unterminated type"));
    };
    let Some(value) = rest.strip_prefix('=') else {
        return Err(WorldError::malformed(spec, "expected = after type"));
    };
    Ok((name, kind, value))
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_attr_spec())
    }
}

/// On-disk shape of an attribute.
#[derive(Serialize, Deserialize)]
struct AttrDocument {
    name: String,
    #[serde(rename = "type", default)]
    kind: AttrKind,
    value: String,
}

impl Serialize for Attr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        AttrDocument {
            name: self.name.clone(),
            kind: self.kind(),
            value: self.value_string(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Attr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let doc = AttrDocument::deserialize(deserializer)?;
        let value = AttrValue::decode(doc.kind, &doc.value).map_err(serde::de::Error::custom)?;
        Ok(Attr::new(doc.name, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn samples() -> Vec<Attr> {
        let place = EntityRef::new("test", Uuid::new_v4());
        vec![
            Attr::string("desc", "A dusty room. [It smells.]"),
            Attr::integer("hp", -12),
            Attr::boolean("lit", true),
            Attr::thing("home", place.clone()),
            Attr::attr("source", Attr::thing("out", place)),
            Attr::attr_list(
                "stats",
                vec![Attr::integer("str", 14), Attr::string("class", "bard")],
            ),
        ]
    }

    #[test]
    fn parses_integer_attr_spec() {
        let attr = Attr::from_attr_spec("hp[INTEGER]=10").expect("parse");
        assert_eq!(attr.name(), "hp");
        assert_eq!(attr.kind(), AttrKind::Integer);
        assert_eq!(attr.value_string(), "10");
        assert_eq!(attr.as_integer().unwrap(), 10);
    }

    #[test]
    fn rejects_malformed_attr_specs() {
        for bad in [
            "broken",
            "hp[INTEGER",
            "hp[INTEGER]10",
            "hp[NUMBER]=10",
            "hp[INTEGER]=ten",
            "lit[BOOLEAN]=maybe",
            "[STRING]=x",
            "home[THING]=nowhere",
        ] {
            assert!(
                matches!(
                    Attr::from_attr_spec(bad),
                    Err(WorldError::MalformedSpec { .. })
                ),
                "{} should be malformed",
                bad
            );
        }
    }

    #[test]
    fn shorthand_is_string() {
        let attr = Attr::from_attr_spec("motd=Welcome [friend]=yes").expect("parse");
        assert_eq!(attr.name(), "motd");
        assert_eq!(attr.as_str().unwrap(), "Welcome [friend]=yes");
    }

    #[test]
    fn typed_form_wins_over_shorthand() {
        let attr = Attr::string("a=b", "x");
        assert_eq!(attr.to_attr_spec(), "a=b[STRING]=x");
        assert_eq!(Attr::from_attr_spec(&attr.to_attr_spec()).expect("parse"), attr);

        let count = Attr::from_attr_spec("k=v[INTEGER]=3").expect("parse");
        assert_eq!(count, Attr::integer("k=v", 3));
    }

    #[test]
    fn attr_spec_round_trips_every_kind() {
        for attr in samples() {
            let spec = attr.to_attr_spec();
            let parsed = Attr::from_attr_spec(&spec).expect("reparse");
            assert_eq!(parsed, attr, "round trip of {}", spec);
        }
    }

    #[test]
    fn json_round_trips_and_keeps_kind() {
        for attr in samples() {
            let text = serde_json::to_string(&attr).expect("encode");
            let back: Attr = serde_json::from_str(&text).expect("decode");
            assert_eq!(back.kind(), attr.kind());
            assert_eq!(back, attr);
        }
        let list = samples();
        let back = Attr::list_from_json(&Attr::list_to_json(&list)).expect("list");
        assert_eq!(back, list);
    }

    #[test]
    fn structured_value_is_always_a_string() {
        let doc: Value = serde_json::from_str(&Attr::integer("hp", 3).to_json()).unwrap();
        assert_eq!(doc["type"], "INTEGER");
        assert_eq!(doc["value"], "3");
        let missing_type: Attr =
            serde_json::from_str(r#"{"name":"n","value":"plain"}"#).expect("default type");
        assert_eq!(missing_type.kind(), AttrKind::String);
    }

    #[test]
    fn accessors_never_coerce() {
        for attr in samples() {
            let kind = attr.kind();
            assert_eq!(attr.as_str().is_ok(), kind == AttrKind::String);
            assert_eq!(attr.as_integer().is_ok(), kind == AttrKind::Integer);
            assert_eq!(attr.as_boolean().is_ok(), kind == AttrKind::Boolean);
            assert_eq!(attr.as_entity_ref().is_ok(), kind == AttrKind::Thing);
            assert_eq!(attr.as_attr().is_ok(), kind == AttrKind::Attr);
            assert_eq!(attr.as_attr_list().is_ok(), kind == AttrKind::AttrList);
            if kind != AttrKind::Integer {
                assert!(matches!(
                    attr.as_integer(),
                    Err(WorldError::TypeMismatch {
                        expected: AttrKind::Integer,
                        ..
                    })
                ));
            }
        }
    }

    #[test]
    fn equality_covers_name_kind_and_value() {
        assert_eq!(Attr::integer("a", 1), Attr::integer("a", 1));
        assert_ne!(Attr::integer("a", 1), Attr::integer("b", 1));
        assert_ne!(Attr::integer("a", 1), Attr::string("a", "1"));
        assert_ne!(Attr::integer("a", 1), Attr::integer("a", 2));
    }

    #[test]
    fn attr_list_lookups() {
        let all = samples();
        let stats = &all[5];
        assert_eq!(
            stats.find_in_attr_list("str").unwrap(),
            Some(&Attr::integer("str", 14))
        );
        assert!(stats.find_in_attr_list("dex").unwrap().is_none());
        let map = stats.as_attr_list_map().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["class"].as_str().unwrap(), "bard");
    }
}
