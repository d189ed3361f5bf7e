//! Namespaced identifiers used to address registries and their entries.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Namespace assumed when an identifier is written without one.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// Errors produced while parsing an identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("Identifier '{raw}' has an empty {part}")]
    Empty { raw: String, part: &'static str },

    #[error("Invalid character '{character}' in {part} of identifier '{raw}'")]
    InvalidCharacter {
        raw: String,
        part: &'static str,
        character: char,
    },
}

/// A `namespace:path` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier {
    namespace: String,
    path: String,
}

impl Identifier {
    /// Create an identifier from its two parts, validating both.
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Result<Self, IdentifierError> {
        let namespace = namespace.into();
        let path = path.into();
        let raw = format!("{namespace}:{path}");

        validate(&raw, "namespace", &namespace, is_namespace_char)?;
        validate(&raw, "path", &path, is_path_char)?;

        Ok(Self { namespace, path })
    }

    /// Create an identifier in the default namespace.
    pub fn vanilla(path: impl Into<String>) -> Result<Self, IdentifierError> {
        Self::new(DEFAULT_NAMESPACE, path)
    }

    /// Identifier for a name baked into the engine.
    pub(crate) fn builtin(path: &'static str) -> Self {
        debug_assert!(path.chars().all(is_path_char), "invalid built-in path {path}");
        Self {
            namespace: DEFAULT_NAMESPACE.to_owned(),
            path: path.to_owned(),
        }
    }

    /// Parse `namespace:path`, or a bare `path` in the default namespace.
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        match raw.split_once(':') {
            Some((namespace, path)) => Self::new(namespace, path),
            None => Self::new(DEFAULT_NAMESPACE, raw),
        }
    }

    #[inline]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }
}

fn validate(
    raw: &str,
    part: &'static str,
    value: &str,
    allowed: fn(char) -> bool,
) -> Result<(), IdentifierError> {
    if value.is_empty() {
        return Err(IdentifierError::Empty { raw: raw.to_owned(), part });
    }

    match value.chars().find(|c| !allowed(*c)) {
        Some(character) => Err(IdentifierError::InvalidCharacter {
            raw: raw.to_owned(),
            part,
            character,
        }),
        None => Ok(()),
    }
}

const fn is_namespace_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.')
}

const fn is_path_char(c: char) -> bool {
    is_namespace_char(c) || c == '/'
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(de::Error::custom)
    }
}
