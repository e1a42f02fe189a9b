//! Partial index generation.
//!
//! A partial index maps fragments of full tokens to the identifiers of every
//! full token that produced the fragment. Fragments are selected with a
//! character-offset window: for each offset `o` inside the window, the prefix
//! ending at `o` and the suffix starting at `o` become keys. Offsets may be
//! negative, counting from the end of the token.
//!
//! With the default window `from: -3, to: -1`, `picky` yields the prefixes
//! `picky`, `pick`, `pic` and the suffixes `cky`, `ky`, `y`.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::bundle::{Inverted, Weights};
use crate::data::DocId;

/// Strategy for deriving partial keys from a full token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PartialStrategy {
    /// No partial index; partial lookups fall back to the exact index.
    None,
    /// Prefixes and suffixes anchored at each offset in `from..=to`.
    Substring { from: i32, to: i32 },
}

impl Default for PartialStrategy {
    fn default() -> Self {
        PartialStrategy::Substring { from: -3, to: -1 }
    }
}

impl PartialStrategy {
    pub fn substring(from: i32, to: i32) -> Self {
        PartialStrategy::Substring { from, to }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, PartialStrategy::None)
    }

    /// All distinct keys generated for `token`, in generation order.
    pub fn keys_for(&self, token: &str) -> Vec<String> {
        let (from, to) = match self {
            PartialStrategy::None => return Vec::new(),
            PartialStrategy::Substring { from, to } => (*from, *to),
        };

        let chars: Vec<char> = token.chars().collect();
        if chars.is_empty() {
            return Vec::new();
        }
        let last = chars.len() as i64 - 1;
        let resolve = |offset: i32| -> i64 {
            let offset = offset as i64;
            let absolute = if offset < 0 { last + 1 + offset } else { offset };
            absolute.clamp(0, last)
        };
        let (a, b) = (resolve(from), resolve(to));
        let (lo, hi) = (a.min(b) as usize, a.max(b) as usize);

        let mut seen = AHashSet::new();
        let mut keys = Vec::new();
        let mut push = |key: String| {
            if !key.is_empty() && seen.insert(key.clone()) {
                keys.push(key);
            }
        };
        for end in (lo..=hi).rev() {
            push(chars[..=end].iter().collect());
        }
        for start in lo..=hi {
            push(chars[start..].iter().collect());
        }
        keys
    }

    /// Derive the partial inverted index and weights from an exact index.
    ///
    /// Keys produced by several tokens merge their identifier lists in
    /// token order, dropping duplicate identifiers, and sum the token weights.
    pub fn generate(&self, exact: &Inverted, exact_weights: &Weights) -> (Inverted, Weights) {
        let mut inverted = Inverted::new();
        let mut weights = Weights::new();
        if self.is_none() {
            return (inverted, weights);
        }

        let mut members: AHashMap<String, AHashSet<DocId>> = AHashMap::new();
        for (token, ids) in exact {
            let token_weight = exact_weights.get(token).copied().unwrap_or(0.0);
            for key in self.keys_for(token) {
                let seen = members.entry(key.clone()).or_default();
                let list = inverted.entry(key.clone()).or_default();
                for id in ids {
                    if seen.insert(id.clone()) {
                        list.push(id.clone());
                    }
                }
                *weights.entry(key).or_insert(0.0) += token_weight;
            }
        }

        (inverted, weights)
    }
}
