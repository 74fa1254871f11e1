use thiserror::Error;

use crate::world::attr::AttrKind;

/// Errors that can arise while reading or mutating the world model.
#[derive(Debug, Error)]
pub enum WorldError {
    /// A required attribute is absent (`name`, `universe`, a link endpoint, ...).
    #[error("missing attribute {attr} on {owner}")]
    MissingAttribute { attr: String, owner: String },

    /// A typed accessor was used on an attribute of another kind.
    #[error("attribute {name} is type {found}, not {expected}")]
    TypeMismatch {
        name: String,
        expected: AttrKind,
        found: AttrKind,
    },

    /// An attrSpec or entity spec string does not match its grammar.
    #[error("malformed spec {spec:?}: {reason}")]
    MalformedSpec { spec: String, reason: String },

    /// A build factory received the wrong number of arguments.
    #[error("expected {expected} build argument(s), got {found}")]
    ArgumentArity { expected: usize, found: usize },

    /// A referenced entity could not be found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The registry holds no namespace by this name.
    #[error("multiverse does not contain universe {0}")]
    UnknownNamespace(String),

    /// An entity exists but is not of the expected concrete kind.
    #[error("entity {id} is a {found}, not a {expected}")]
    WrongKind {
        id: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A namespace, entity or attribute name failed validation.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// Wrapper around JSON encoding and decoding errors.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Wrapper around IO errors (save files, directory creation).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
}

impl WorldError {
    pub(crate) fn malformed(spec: &str, reason: impl Into<String>) -> Self {
        WorldError::MalformedSpec {
            spec: spec.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(attr: &str, owner: impl std::fmt::Display) -> Self {
        WorldError::MissingAttribute {
            attr: attr.to_string(),
            owner: owner.to_string(),
        }
    }
}
