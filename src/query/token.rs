//! Query tokens.
//!
//! A token remembers the text the user typed (after the qualifier prefix),
//! the normalized lookup text, the categories it is restricted to and
//! whether it asks for a partial (`pic*`) or similarity (`smith~`) lookup.
//! A trailing quote (`"picky"`) forces an exact lookup.

use std::fmt;
use std::sync::Arc;

use log::warn;

use crate::query::qualifiers::QualifierRegistry;

const QUALIFIER_SEPARATOR: char = ':';
const QUALIFIER_LIST_SEPARATOR: &str = ",";
const ESCAPE: char = '\\';
const PARTIAL_MARKER: char = '*';
const SIMILAR_MARKER: char = '~';
const EXACT_MARKER: char = '"';

/// A processed query token.
#[derive(Debug, Clone)]
pub struct Token {
    original: String,
    text: Arc<str>,
    value: Arc<str>,
    qualifiers: Vec<String>,
    partial: bool,
    similar: bool,
}

impl Token {
    /// Process raw query text, lowercasing it.
    pub fn processed(raw: &str, registry: &QualifierRegistry) -> Token {
        Self::processed_with(raw, registry, true)
    }

    /// Process raw query text.
    ///
    /// Steps, in order: split off qualifiers and normalize them through the
    /// registry (unknown aliases are dropped), remember the original text,
    /// lowercase, detect the partial and similarity markers, strip all
    /// markers.
    pub fn processed_with(raw: &str, registry: &QualifierRegistry, downcase: bool) -> Token {
        let (qualifier_text, text) = split_qualifiers(raw);

        let mut qualifiers: Vec<String> = Vec::new();
        for alias in qualifier_text
            .iter()
            .flat_map(|q| q.split(QUALIFIER_LIST_SEPARATOR))
            .map(str::trim)
            .filter(|alias| !alias.is_empty())
        {
            match registry.normalize(alias) {
                Some(category) => {
                    if !qualifiers.iter().any(|q| q == category) {
                        qualifiers.push(category.to_string());
                    }
                }
                None => warn!("dropping unknown qualifier {alias:?}"),
            }
        }

        let original = text.clone();
        let text = if downcase { text.to_lowercase() } else { text };

        let quoted = text.ends_with(EXACT_MARKER);
        let partial = !quoted && text.ends_with(PARTIAL_MARKER);
        let similar = !quoted && text.ends_with(SIMILAR_MARKER);

        let text: String = text
            .chars()
            .filter(|c| !matches!(*c, PARTIAL_MARKER | SIMILAR_MARKER | EXACT_MARKER))
            .collect();

        let text: Arc<str> = Arc::from(text.trim());
        Token {
            original,
            value: Arc::clone(&text),
            text,
            qualifiers,
            partial,
            similar,
        }
    }

    /// An unqualified exact token, used for indexed values and tests.
    pub fn exact(text: &str) -> Token {
        let text: Arc<str> = Arc::from(text);
        Token {
            original: text.to_string(),
            value: Arc::clone(&text),
            text,
            qualifiers: Vec::new(),
            partial: false,
            similar: false,
        }
    }

    /// Normalized lookup text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The processed text before it was split into lookup words. Ranged
    /// categories read numbers from it, signs included.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// A copy looking up `text`. Markers survive only with `keep_markers`.
    pub fn with_text(&self, text: &str, keep_markers: bool) -> Token {
        Token {
            original: self.original.clone(),
            text: Arc::from(text),
            value: Arc::clone(&self.value),
            qualifiers: self.qualifiers.clone(),
            partial: keep_markers && self.partial,
            similar: keep_markers && self.similar,
        }
    }

    /// Shared handle to the normalized lookup text.
    pub fn symbol(&self) -> Arc<str> {
        Arc::clone(&self.text)
    }

    /// The text as entered, without qualifiers.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Canonical category names this token is restricted to. Empty means
    /// every category is eligible.
    pub fn qualifiers(&self) -> &[String] {
        &self.qualifiers
    }

    pub fn is_qualified(&self) -> bool {
        !self.qualifiers.is_empty()
    }

    pub fn is_partial(&self) -> bool {
        self.partial && !self.similar
    }

    pub fn is_similar(&self) -> bool {
        self.similar
    }

    /// A blank token places no constraint on the query.
    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }

    /// Whether the original text was quote-terminated.
    pub fn is_quoted(&self) -> bool {
        self.original.ends_with(EXACT_MARKER)
    }

    /// Mark the token partial unless it is quoted or similar.
    pub fn partialize(mut self) -> Token {
        if !self.is_quoted() && !self.similar {
            self.partial = true;
        }
        self
    }

    /// Restrict the token to the given categories.
    pub fn qualified_by<I, S>(mut self, categories: I) -> Token
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.qualifiers = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the token may be looked up in `category`.
    pub fn allows(&self, category: &str) -> bool {
        self.qualifiers.is_empty() || self.qualifiers.iter().any(|q| q == category)
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.original == other.original && self.text == other.text
    }
}

impl Eq for Token {}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.qualifiers.is_empty() {
            write!(
                f,
                "{}{QUALIFIER_SEPARATOR}",
                self.qualifiers.join(QUALIFIER_LIST_SEPARATOR)
            )?;
        }
        f.write_str(&self.text)
    }
}

/// Split at the first unescaped qualifier separator.
///
/// Returns the qualifier prefix (if any) and the remaining text with
/// escaped separators unescaped.
fn split_qualifiers(raw: &str) -> (Option<String>, String) {
    let mut escaped = false;
    let mut split_at = None;
    for (i, c) in raw.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == ESCAPE {
            escaped = true;
        } else if c == QUALIFIER_SEPARATOR {
            split_at = Some(i);
            break;
        }
    }

    let unescape = |s: &str| {
        s.replace(
            &format!("{ESCAPE}{QUALIFIER_SEPARATOR}"),
            &QUALIFIER_SEPARATOR.to_string(),
        )
    };

    match split_at {
        Some(i) => (
            Some(raw[..i].to_string()),
            unescape(&raw[i + QUALIFIER_SEPARATOR.len_utf8()..]),
        ),
        None => (None, unescape(raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> QualifierRegistry {
        let mut registry = QualifierRegistry::new();
        registry.register("title", "title").unwrap();
        registry.register("t", "title").unwrap();
        registry.register("author", "author").unwrap();
        registry
    }

    #[test]
    fn test_plain_token() {
        let token = Token::processed("Hobbit", &registry());
        assert_eq!(token.text(), "hobbit");
        assert_eq!(token.original(), "Hobbit");
        assert!(!token.is_partial());
        assert!(!token.is_similar());
        assert!(!token.is_qualified());
    }

    #[test]
    fn test_qualifiers_are_normalized() {
        let token = Token::processed("t,author,title,unknown:Hobbit", &registry());
        assert_eq!(token.qualifiers(), &["title".to_string(), "author".to_string()]);
        assert_eq!(token.text(), "hobbit");
        assert!(token.allows("author"));
        assert!(!token.allows("isbn"));
        assert_eq!(token.to_string(), "title,author:hobbit");
    }

    #[test]
    fn test_unknown_qualifiers_are_dropped() {
        let token = Token::processed("nope:hobbit", &registry());
        assert!(!token.is_qualified());
        assert!(token.allows("anything"));
        assert_eq!(token.text(), "hobbit");
    }

    #[test]
    fn test_markers() {
        let partial = Token::processed("pic*", &registry());
        assert!(partial.is_partial());
        assert!(!partial.is_similar());
        assert_eq!(partial.text(), "pic");
        assert_eq!(partial.original(), "pic*");

        let similar = Token::processed("smith~", &registry());
        assert!(similar.is_similar());
        assert!(!similar.is_partial());
        assert_eq!(similar.text(), "smith");
    }

    #[test]
    fn test_quote_wins() {
        for raw in ["\"picky\"", "picky*\"", "picky~\""] {
            let token = Token::processed(raw, &registry());
            assert!(!token.is_partial(), "{raw}");
            assert!(!token.is_similar(), "{raw}");
            assert_eq!(token.text(), "picky");
            assert!(!token.partialize().is_partial());
        }
    }

    #[test]
    fn test_blank_after_qualifier() {
        let token = Token::processed("title:", &registry());
        assert!(token.is_blank());
        assert_eq!(token.qualifiers(), &["title".to_string()]);

        assert!(Token::processed("*", &registry()).is_blank());
        assert!(Token::processed("", &registry()).is_blank());
    }

    #[test]
    fn test_escaped_separator() {
        let token = Token::processed(r"title:10\:30", &registry());
        assert_eq!(token.qualifiers(), &["title".to_string()]);
        assert_eq!(token.text(), "10:30");

        let token = Token::processed(r"10\:30", &registry());
        assert!(!token.is_qualified());
        assert_eq!(token.text(), "10:30");
    }

    #[test]
    fn test_equality_ignores_qualifiers() {
        let a = Token::processed("title:hobbit", &registry());
        let b = Token::processed("author:hobbit", &registry());
        let c = Token::processed("Hobbit", &registry());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_with_text() {
        let token = Token::processed("title:-well-known*", &registry());
        assert_eq!(token.value(), "-well-known");

        let well = token.with_text("well", false);
        assert_eq!(well.text(), "well");
        assert_eq!(well.value(), "-well-known");
        assert_eq!(well.qualifiers(), &["title".to_string()]);
        assert!(!well.is_partial());

        let known = token.with_text("known", true);
        assert!(known.is_partial());
        assert_eq!(known.original(), "-well-known*");
    }

    #[test]
    fn test_partialize() {
        let token = Token::processed("hob", &registry()).partialize();
        assert!(token.is_partial());
        let token = Token::processed("hob~", &registry()).partialize();
        assert!(!token.is_partial());
    }
}
