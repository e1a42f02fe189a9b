//! Configurable tokenizer.
//!
//! The same configuration drives both sides of the engine:
//!
//! - [`Tokenizer::tokenize`] turns a source value into index tokens
//!   (normalized, lowercased, split, stopwords and short tokens dropped).
//! - [`Tokenizer::split`] turns raw query text into words, keeping case and
//!   query markers intact so that [`Token`](crate::query::token::Token)
//!   processing can still see them.
//! - [`Tokenizer::query_words`] splits the text of a processed token the way
//!   indexing splits, so punctuation dropped at index time is dropped there too.

use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::Result;

/// A regex replacement applied to every word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub pattern: String,
    pub replacement: String,
}

/// Tokenizer options. Patterns are regular expressions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Decompose and strip combining marks, e.g. `café` becomes `cafe`.
    pub normalizes_unicode: bool,
    /// Characters removed from the text before splitting.
    pub removes_characters: Option<String>,
    /// Word normalizations, applied in order.
    pub substitutes: Vec<Substitution>,
    /// Split pattern. Unset means word boundaries when indexing and
    /// whitespace when splitting queries.
    pub splits_text_on: Option<String>,
    /// Words matching this pattern as a whole are dropped.
    pub stopwords: Option<String>,
    pub case_sensitive: bool,
    pub max_words: Option<usize>,
    /// Index tokens shorter than this many characters are rejected.
    pub min_token_length: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            normalizes_unicode: false,
            removes_characters: None,
            substitutes: Vec::new(),
            splits_text_on: None,
            stopwords: None,
            case_sensitive: false,
            max_words: None,
            min_token_length: 1,
        }
    }
}

impl TokenizerConfig {
    pub fn removes_characters(mut self, pattern: impl Into<String>) -> Self {
        self.removes_characters = Some(pattern.into());
        self
    }

    pub fn splits_text_on(mut self, pattern: impl Into<String>) -> Self {
        self.splits_text_on = Some(pattern.into());
        self
    }

    pub fn stopwords(mut self, pattern: impl Into<String>) -> Self {
        self.stopwords = Some(pattern.into());
        self
    }

    pub fn substitute(mut self, pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.substitutes.push(Substitution {
            pattern: pattern.into(),
            replacement: replacement.into(),
        });
        self
    }

    pub fn normalizes_unicode(mut self, normalizes: bool) -> Self {
        self.normalizes_unicode = normalizes;
        self
    }

    pub fn max_words(mut self, max_words: usize) -> Self {
        self.max_words = Some(max_words);
        self
    }

    pub fn min_token_length(mut self, min_token_length: usize) -> Self {
        self.min_token_length = min_token_length;
        self
    }
}

/// A compiled [`TokenizerConfig`].
#[derive(Debug, Clone)]
pub struct Tokenizer {
    config: TokenizerConfig,
    removes: Option<Regex>,
    substitutes: Vec<(Regex, String)>,
    splits: Option<Regex>,
    stopwords: Option<Regex>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self {
            config: TokenizerConfig::default(),
            removes: None,
            substitutes: Vec::new(),
            splits: None,
            stopwords: None,
        }
    }
}

impl Tokenizer {
    /// Compile a configuration. Invalid patterns are configuration errors.
    pub fn new(config: TokenizerConfig) -> Result<Self> {
        let removes = config.removes_characters.as_deref().map(Regex::new).transpose()?;
        let splits = config.splits_text_on.as_deref().map(Regex::new).transpose()?;
        let stopwords = config
            .stopwords
            .as_deref()
            .map(|pattern| Regex::new(&format!("^(?:{pattern})$")))
            .transpose()?;
        let substitutes = config
            .substitutes
            .iter()
            .map(|s| Ok((Regex::new(&s.pattern)?, s.replacement.clone())))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            config,
            removes,
            substitutes,
            splits,
            stopwords,
        })
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    fn preprocess(&self, text: &str) -> String {
        let mut text = if self.config.normalizes_unicode {
            text.nfkd().filter(|c| !is_combining_mark(*c)).collect()
        } else {
            text.to_string()
        };
        if let Some(removes) = &self.removes {
            text = removes.replace_all(&text, "").into_owned();
        }
        text
    }

    fn substitute(&self, word: &str) -> String {
        self.substitutes
            .iter()
            .fold(word.to_string(), |word, (pattern, replacement)| {
                pattern.replace_all(&word, replacement.as_str()).into_owned()
            })
    }

    fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.as_ref().is_some_and(|s| s.is_match(word))
    }

    /// Tokens to index for a source value.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let mut text = self.preprocess(text);
        if !self.config.case_sensitive {
            text = text.to_lowercase();
        }

        let words: Vec<&str> = match &self.splits {
            Some(splits) => splits.split(&text).collect(),
            None => text.unicode_words().collect(),
        };

        let mut tokens: Vec<String> = words
            .into_iter()
            .filter(|word| !word.is_empty() && !self.is_stopword(word))
            .map(|word| self.substitute(word))
            .filter(|word| word.chars().count() >= self.config.min_token_length.max(1))
            .collect();
        if let Some(max_words) = self.config.max_words {
            tokens.truncate(max_words);
        }
        tokens
    }

    /// Words of a raw query, markers and case preserved.
    ///
    /// Stopwords are only removed when at least one word survives.
    pub fn split(&self, text: &str) -> Vec<String> {
        let text = self.preprocess(text);
        let words: Vec<&str> = match &self.splits {
            Some(splits) => splits.split(&text).filter(|w| !w.is_empty()).collect(),
            None => text.split_whitespace().collect(),
        };

        let kept: Vec<&str> = words
            .iter()
            .copied()
            .filter(|word| !self.is_stopword(&word.to_lowercase()))
            .collect();
        let words = if kept.is_empty() { words } else { kept };

        let mut words: Vec<String> = words.into_iter().map(str::to_string).collect();
        if let Some(max_words) = self.config.max_words {
            words.truncate(max_words);
        }
        words
    }

    /// Lookup words for the marker-free text of one query token.
    ///
    /// Without a split pattern this uses the word boundaries indexing uses,
    /// so `(hobbit),` yields `hobbit` and `well-known` yields two words.
    pub fn query_words(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = match &self.splits {
            Some(_) => vec![text],
            None => text.unicode_words().collect(),
        };
        words
            .into_iter()
            .map(|word| self.substitute(word))
            .filter(|word| !word.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tokenize() {
        let tokenizer = Tokenizer::default();
        assert_eq!(
            tokenizer.tokenize("The Hobbit, or There and Back Again"),
            vec!["the", "hobbit", "or", "there", "and", "back", "again"]
        );
        assert!(tokenizer.tokenize("   ").is_empty());
    }

    #[test]
    fn test_configured_tokenize() {
        let config = TokenizerConfig::default()
            .removes_characters(r"[^a-zA-Z0-9\s]")
            .stopwords("the|and|or")
            .substitute("ae", "a")
            .min_token_length(2)
            .splits_text_on(r"\s+");
        let tokenizer = Tokenizer::new(config).unwrap();
        assert_eq!(
            tokenizer.tokenize("The Hobbit, or Taerza's B"),
            vec!["hobbit", "tarzas"]
        );
    }

    #[test]
    fn test_unicode_normalization() {
        let tokenizer =
            Tokenizer::new(TokenizerConfig::default().normalizes_unicode(true)).unwrap();
        assert_eq!(tokenizer.tokenize("Café Müller"), vec!["cafe", "muller"]);
    }

    #[test]
    fn test_split_keeps_markers() {
        let tokenizer = Tokenizer::default();
        assert_eq!(
            tokenizer.split("title:Hobbit  smith~ \"exact\" pic*"),
            vec!["title:Hobbit", "smith~", "\"exact\"", "pic*"]
        );
    }

    #[test]
    fn test_query_words_follow_index_boundaries() {
        let tokenizer = Tokenizer::default();
        for text in ["hobbit", "hobbit,", "(hobbit)", "«hobbit»"] {
            assert_eq!(tokenizer.query_words(text), vec!["hobbit"], "{text}");
        }
        assert_eq!(tokenizer.query_words("well-known"), vec!["well", "known"]);
        assert_eq!(tokenizer.query_words("47.3769"), vec!["47.3769"]);
        assert!(tokenizer.query_words("(),").is_empty());

        let text = "The Hobbit, or (well-known) tale";
        let indexed = tokenizer.tokenize(text);
        let queried: Vec<String> = text
            .to_lowercase()
            .split_whitespace()
            .flat_map(|word| tokenizer.query_words(word))
            .collect();
        assert_eq!(indexed, queried);
    }

    #[test]
    fn test_query_words_with_split_pattern() {
        let config = TokenizerConfig::default()
            .splits_text_on(r"\s+")
            .substitute("ae", "a");
        let tokenizer = Tokenizer::new(config).unwrap();
        assert_eq!(tokenizer.query_words("taerza"), vec!["tarza"]);
        assert_eq!(tokenizer.query_words("a-b"), vec!["a-b"]);
    }

    #[test]
    fn test_split_keeps_lone_stopword() {
        let tokenizer = Tokenizer::new(TokenizerConfig::default().stopwords("the")).unwrap();
        assert_eq!(tokenizer.split("the hobbit"), vec!["hobbit"]);
        assert_eq!(tokenizer.split("The"), vec!["The"]);
    }

    #[test]
    fn test_max_words() {
        let tokenizer = Tokenizer::new(TokenizerConfig::default().max_words(2)).unwrap();
        assert_eq!(tokenizer.tokenize("a b c"), vec!["a", "b"]);
        assert_eq!(tokenizer.split("a b c"), vec!["a", "b"]);
    }

    #[test]
    fn test_invalid_pattern_is_error() {
        let result = Tokenizer::new(TokenizerConfig::default().removes_characters("[unclosed"));
        assert!(result.is_err());
    }
}
