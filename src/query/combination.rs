//! One (token, category) pairing resolved at query time.

use std::sync::Arc;

use crate::category::IndexedCategory;
use crate::data::DocId;
use crate::query::token::Token;

/// A token resolved against one category.
///
/// Similar tokens are first looked up as typed; when that finds nothing the
/// category's similarity cursor is advanced until a candidate matches or the
/// candidates run out. The typed text stays available through
/// [`original`](Combination::original).
#[derive(Debug, Clone)]
pub struct Combination {
    token: Token,
    category: Arc<IndexedCategory>,
    resolved: String,
    ids: Vec<DocId>,
    weight: f64,
}

impl Combination {
    pub fn resolve(token: Token, category: Arc<IndexedCategory>) -> Self {
        let partial = token.is_partial();
        let mut resolved = category.lookup_text(&token).to_string();
        let mut ids = category.ids_for(&token).into_owned();

        if ids.is_empty() && token.is_similar() {
            let mut cursor = category.similarity_cursor(&token);
            while let Some(candidate) = cursor.next_in(category.exact()) {
                if candidate == token.text() {
                    continue;
                }
                let found = category.lookup(candidate, false);
                if !found.is_empty() {
                    ids = found.into_owned();
                    resolved = candidate.to_string();
                    break;
                }
            }
        }

        let weight = if ids.is_empty() {
            0.0
        } else {
            category.weight() * category.weight_of(&resolved, partial)
        };

        Self {
            token,
            category,
            resolved,
            ids,
            weight,
        }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn category(&self) -> &IndexedCategory {
        &self.category
    }

    pub fn category_name(&self) -> &str {
        self.category.name()
    }

    /// The text as typed.
    pub fn original(&self) -> &str {
        self.token.original()
    }

    /// The text actually matched; differs from the token for similar hits.
    pub fn resolved(&self) -> &str {
        &self.resolved
    }

    pub fn ids(&self) -> &[DocId] {
        &self.ids
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Tokenizer;
    use crate::backend::MemoryBackend;
    use crate::category::Category;
    use crate::data::{KeyFormat, Record};
    use crate::engine::config::CategoryConfig;
    use crate::generator::{PhoneticEncoder, SimilarityStrategy, WeightStrategy};
    use crate::query::qualifiers::QualifierRegistry;
    use crate::source::MemorySource;

    fn authors() -> Arc<IndexedCategory> {
        let category = Category::new(
            "books",
            CategoryConfig::new("author")
                .weight(2.0)
                .weights(WeightStrategy::Constant { weight: 1.5 })
                .similarity(SimilarityStrategy::phonetic(PhoneticEncoder::Soundex)),
            Arc::new(MemoryBackend::new()),
        )
        .unwrap();
        category
            .index(
                &MemorySource::new(vec![
                    Record::new(9).field("author", "smyth"),
                    Record::new(3).field("author", "smith jones"),
                ]),
                &Tokenizer::default(),
                KeyFormat::Integer,
            )
            .unwrap();
        category.snapshot().unwrap()
    }

    fn token(text: &str) -> Token {
        Token::processed(text, &QualifierRegistry::new())
    }

    #[test]
    fn test_exact_weight_includes_category_boost() {
        let combination = Combination::resolve(token("jones"), authors());
        assert_eq!(combination.ids(), &[DocId::Int(3)]);
        assert_eq!(combination.weight(), 3.0);
        assert_eq!(combination.resolved(), "jones");
    }

    #[test]
    fn test_similar_prefers_own_text() {
        let combination = Combination::resolve(token("smith~"), authors());
        assert_eq!(combination.ids(), &[DocId::Int(3)]);
        assert_eq!(combination.resolved(), "smith");
    }

    #[test]
    fn test_similar_advances_to_candidate() {
        let combination = Combination::resolve(token("Smithe~"), authors());
        assert_eq!(combination.original(), "Smithe~");
        // equal weights keep first-seen order, smyth was indexed first
        assert_eq!(combination.resolved(), "smyth");
        assert_eq!(combination.ids(), &[DocId::Int(9)]);
    }

    #[test]
    fn test_exhausted_similarity_is_empty() {
        let combination = Combination::resolve(token("brown~"), authors());
        assert!(combination.is_empty());
        assert_eq!(combination.weight(), 0.0);
        assert_eq!(combination.resolved(), "brown");
    }
}
