//! Token weight strategies.

use serde::{Deserialize, Serialize};

use crate::bundle::{Inverted, Weights};

/// How a token's occurrence count turns into a relevance weight.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WeightStrategy {
    /// `ln(count) + 1` for a positive count, `0` otherwise.
    #[default]
    Logarithmic,
    /// The same weight for every token that occurs at least once.
    Constant { weight: f64 },
}

impl WeightStrategy {
    /// Weight for a token seen in `count` documents. Never negative.
    pub fn weight_for(&self, count: usize) -> f64 {
        if count == 0 {
            return 0.0;
        }
        match self {
            WeightStrategy::Logarithmic => (count as f64).ln() + 1.0,
            WeightStrategy::Constant { weight } => weight.max(0.0),
        }
    }

    /// Compute the weight of every token in an inverted index, in index order.
    pub fn generate(&self, inverted: &Inverted) -> Weights {
        inverted
            .iter()
            .map(|(token, ids)| (token.clone(), self.weight_for(ids.len())))
            .collect()
    }
}
