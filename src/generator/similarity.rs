//! Similarity index generation.

use serde::{Deserialize, Serialize};

use crate::bundle::{Inverted, Similarity, Weights};
use crate::generator::phonetic::PhoneticEncoder;

/// Default number of candidate tokens kept per phonetic code.
pub const DEFAULT_MAX_CANDIDATES: usize = 3;

fn default_max_candidates() -> usize {
    DEFAULT_MAX_CANDIDATES
}

/// Strategy for bucketing tokens by how they sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimilarityStrategy {
    /// Similarity disabled; the similarity index stays empty.
    #[default]
    None,
    Phonetic {
        encoder: PhoneticEncoder,
        #[serde(default = "default_max_candidates")]
        max_candidates: usize,
    },
}

impl SimilarityStrategy {
    pub fn phonetic(encoder: PhoneticEncoder) -> Self {
        SimilarityStrategy::Phonetic {
            encoder,
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, SimilarityStrategy::None)
    }

    /// Phonetic codes for a token, empty when similarity is disabled.
    pub fn codes_for(&self, token: &str) -> Vec<String> {
        match self {
            SimilarityStrategy::None => Vec::new(),
            SimilarityStrategy::Phonetic { encoder, .. } => encoder.encode(token),
        }
    }

    /// Build the similarity index from an exact inverted index.
    ///
    /// Each bucket lists its tokens by descending weight; equal weights keep
    /// the order in which tokens appear in `exact`. Buckets are truncated to
    /// `max_candidates`.
    pub fn generate(&self, exact: &Inverted, weights: &Weights) -> Similarity {
        let max_candidates = match self {
            SimilarityStrategy::None => return Similarity::new(),
            SimilarityStrategy::Phonetic { max_candidates, .. } => *max_candidates,
        };

        let mut similarity = Similarity::new();
        for token in exact.keys() {
            for code in self.codes_for(token) {
                let bucket: &mut Vec<String> = similarity.entry(code).or_default();
                if !bucket.contains(token) {
                    bucket.push(token.clone());
                }
            }
        }

        let weight_of = |token: &String| weights.get(token).copied().unwrap_or(0.0);
        for bucket in similarity.values_mut() {
            // Stable sort keeps first-seen order among equal weights.
            bucket.sort_by(|a, b| weight_of(b).total_cmp(&weight_of(a)));
            bucket.truncate(max_candidates);
        }

        similarity
    }
}
