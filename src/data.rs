use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{BurrowError, Result};

/// Identifier of an indexed document.
///
/// Serialized untagged, so integer ids persist as JSON numbers and string ids
/// as JSON strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocId {
    Int(u64),
    Str(String),
}

impl DocId {
    /// Returns the integer value if this is an Int variant.
    pub fn as_int(&self) -> Option<u64> {
        match self {
            DocId::Int(i) => Some(*i),
            DocId::Str(_) => None,
        }
    }

    /// Returns the string value if this is a Str variant.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DocId::Str(s) => Some(s),
            DocId::Int(_) => None,
        }
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocId::Int(i) => write!(f, "{i}"),
            DocId::Str(s) => f.write_str(s),
        }
    }
}

impl From<u64> for DocId {
    fn from(value: u64) -> Self {
        DocId::Int(value)
    }
}

impl From<&str> for DocId {
    fn from(value: &str) -> Self {
        DocId::Str(value.to_string())
    }
}

impl From<String> for DocId {
    fn from(value: String) -> Self {
        DocId::Str(value)
    }
}

/// How raw source keys are turned into [`DocId`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyFormat {
    #[default]
    Integer,
    String,
}

impl KeyFormat {
    /// Parse a raw key according to this format.
    pub fn parse(&self, raw: &str) -> Result<DocId> {
        let raw = raw.trim();
        match self {
            KeyFormat::Integer => raw.parse::<u64>().map(DocId::Int).map_err(|e| {
                BurrowError::invalid_argument(format!("key {raw:?} is not an integer: {e}"))
            }),
            KeyFormat::String => Ok(DocId::Str(raw.to_string())),
        }
    }

    /// Whether `id` is of the kind this format produces.
    pub fn admits(&self, id: &DocId) -> bool {
        matches!(
            (self, id),
            (KeyFormat::Integer, DocId::Int(_)) | (KeyFormat::String, DocId::Str(_))
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyFormat::Integer => "integer",
            KeyFormat::String => "string",
        }
    }
}

/// A single source record: an identifier plus raw text per field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: DocId,
    pub fields: IndexMap<String, String>,
}

impl Record {
    pub fn new(id: impl Into<DocId>) -> Self {
        Self {
            id: id.into(),
            fields: IndexMap::new(),
        }
    }

    /// Add a field value, builder style.
    pub fn field(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.fields.insert(name.into(), text.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}
