//! Raw query text to token groups.

use std::fmt;
use std::sync::Arc;

use crate::analysis::Tokenizer;
use crate::query::qualifiers::QualifierRegistry;
use crate::query::token::Token;

/// Alternative tokens for one query position.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenGroup {
    tokens: Vec<Token>,
}

impl TokenGroup {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    pub fn single(token: Token) -> Self {
        Self::new(vec![token])
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// A parsed query: an ordered sequence of token groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    groups: Vec<TokenGroup>,
}

impl Query {
    pub fn new(groups: Vec<TokenGroup>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[TokenGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, group) in self.groups.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            for (j, token) in group.tokens().iter().enumerate() {
                if j > 0 {
                    f.write_str("|")?;
                }
                write!(f, "{token}")?;
            }
        }
        Ok(())
    }
}

/// Splits raw text with a tokenizer and processes each word into a token.
#[derive(Debug, Clone)]
pub struct QueryParser {
    tokenizer: Tokenizer,
    registry: Arc<QualifierRegistry>,
    partialize_last: bool,
}

impl QueryParser {
    pub fn new(tokenizer: Tokenizer, registry: Arc<QualifierRegistry>) -> Self {
        Self {
            tokenizer,
            registry,
            partialize_last: false,
        }
    }

    /// Treat the last word as partial unless it is quoted or similar.
    pub fn partialize_last(mut self, partialize: bool) -> Self {
        self.partialize_last = partialize;
        self
    }

    pub fn registry(&self) -> &QualifierRegistry {
        &self.registry
    }

    /// Parse raw query text.
    ///
    /// Each word is processed into a token, then its text is split into the
    /// words indexing would produce. A word splitting into several lookup
    /// words keeps its qualifiers on all of them and its marker on the last.
    pub fn parse(&self, text: &str) -> Query {
        let downcase = !self.tokenizer.config().case_sensitive;
        let mut tokens: Vec<Token> = Vec::new();
        for word in self.tokenizer.split(text) {
            let token = Token::processed_with(&word, &self.registry, downcase);
            let words = self.tokenizer.query_words(token.text());
            let last = words.len().saturating_sub(1);
            tokens.extend(
                words
                    .iter()
                    .enumerate()
                    .map(|(i, word)| token.with_text(word, i == last)),
            );
        }

        if self.partialize_last {
            if let Some(last) = tokens.pop() {
                tokens.push(last.partialize());
            }
        }

        Query::new(tokens.into_iter().map(TokenGroup::single).collect())
    }
}
