//! Per-category, per-phase index storage.
//!
//! A [`Bundle`] holds the four structures a category needs for one index
//! phase: the inverted index, token weights, the similarity index and a small
//! configuration map. All maps preserve insertion order so that generation
//! and lookups are deterministic.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::data::DocId;

/// Token to ordered, duplicate-free identifiers.
pub type Inverted = IndexMap<String, Vec<DocId>>;
/// Token to relevance weight.
pub type Weights = IndexMap<String, f64>;
/// Phonetic code to ordered candidate tokens.
pub type Similarity = IndexMap<String, Vec<String>>;
/// Scalar metadata such as the source key format.
pub type Configuration = IndexMap<String, String>;

/// Index phase of a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Exact,
    Partial,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Exact => "exact",
            Phase::Partial => "partial",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address of a bundle inside a backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BundleKey {
    pub index: String,
    pub category: String,
    pub phase: Phase,
}

impl BundleKey {
    pub fn new(index: impl Into<String>, category: impl Into<String>, phase: Phase) -> Self {
        Self {
            index: index.into(),
            category: category.into(),
            phase,
        }
    }
}

impl fmt::Display for BundleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.index, self.category, self.phase)
    }
}

/// The indexes held for one category in one phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    pub inverted: Inverted,
    pub weights: Weights,
    pub similarity: Similarity,
    pub configuration: Configuration,
}

impl Bundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifiers for a token, empty when the token is unknown.
    pub fn ids(&self, token: &str) -> &[DocId] {
        self.inverted.get(token).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Weight for a token; a missing entry counts as `0`.
    pub fn weight(&self, token: &str) -> f64 {
        self.weights.get(token).copied().unwrap_or(0.0)
    }

    /// Candidate tokens stored under a phonetic code.
    pub fn similar(&self, code: &str) -> &[String] {
        self.similarity.get(code).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn setting(&self, key: &str) -> Option<&str> {
        self.configuration.get(key).map(String::as_str)
    }

    /// Record an identifier for a token, ignoring repeats.
    pub fn add(&mut self, token: &str, id: DocId) {
        let ids = self.inverted.entry(token.to_string()).or_default();
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.inverted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inverted.is_empty()
    }
}
