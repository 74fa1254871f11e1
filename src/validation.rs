//! Name validation for universes, entities and attributes.
//!
//! Universe names end up in entity specs (`<universe>::<uuid>`), sled keys and
//! save files, so they get the strictest rules. Attribute names must not
//! collide with the attrSpec delimiters.

use crate::world::entity_ref::SPEC_SEPARATOR;
use crate::world::errors::WorldError;

/// Rules for one family of names.
#[derive(Debug, Clone)]
pub struct NameRules {
    pub what: &'static str,
    pub max_length: usize,
    pub allow_spaces: bool,
    pub allow_unicode: bool,
    /// Characters that are never allowed, on top of control characters.
    pub forbidden: &'static [char],
}

impl NameRules {
    pub fn namespace() -> Self {
        NameRules {
            what: "universe name",
            max_length: 64,
            allow_spaces: false,
            allow_unicode: false,
            forbidden: &['/', '\\', ':', '*', '?', '"', '<', '>', '|'],
        }
    }

    pub fn entity() -> Self {
        NameRules {
            what: "entity name",
            max_length: 128,
            allow_spaces: true,
            allow_unicode: true,
            forbidden: &[],
        }
    }

    pub fn attribute() -> Self {
        NameRules {
            what: "attribute name",
            max_length: 64,
            allow_spaces: false,
            allow_unicode: true,
            forbidden: &['[', ']', '='],
        }
    }
}

/// Check `name` against `rules`, returning it unchanged on success.
pub fn validate_name<'a>(name: &'a str, rules: &NameRules) -> Result<&'a str, WorldError> {
    let invalid =
        |reason: String| WorldError::InvalidName(format!("{} {:?}: {}", rules.what, name, reason));

    if name.trim().is_empty() {
        return Err(invalid("must not be empty".to_string()));
    }
    if name.trim() != name {
        return Err(invalid("must not start or end with whitespace".to_string()));
    }
    let length = name.chars().count();
    if length > rules.max_length {
        return Err(invalid(format!("longer than {} characters", rules.max_length)));
    }
    if name.contains(SPEC_SEPARATOR) {
        return Err(invalid(format!("contains {:?}", SPEC_SEPARATOR)));
    }

    let mut bad: Vec<char> = name
        .chars()
        .filter(|&c| {
            c.is_control()
                || rules.forbidden.contains(&c)
                || (c == ' ' && !rules.allow_spaces)
                || (!c.is_ascii() && !rules.allow_unicode)
        })
        .collect();
    if !bad.is_empty() {
        bad.sort_unstable();
        bad.dedup();
        let chars: String = bad.iter().map(|c| c.escape_default().to_string()).collect();
        return Err(invalid(format!("contains invalid characters {}", chars)));
    }
    Ok(name)
}

pub fn validate_namespace_name(name: &str) -> Result<&str, WorldError> {
    validate_name(name, &NameRules::namespace())
}

pub fn validate_entity_name(name: &str) -> Result<&str, WorldError> {
    validate_name(name, &NameRules::entity())
}

pub fn validate_attr_name(name: &str) -> Result<&str, WorldError> {
    validate_name(name, &NameRules::attribute())
}
