//! Searchable categories.
//!
//! A [`Category`] indexes one source field into an exact and a partial
//! [`Bundle`], persists both through a [`Backend`] and publishes them for
//! queries as one immutable [`IndexedCategory`]. Re-indexing builds a fresh
//! structure and swaps it in only after every step succeeded, so readers see
//! either the old or the new bundles, never a mix.

pub mod ranged;

use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ahash::AHashSet;
use log::{debug, info, warn};
use parking_lot::RwLock;

use crate::analysis::Tokenizer;
use crate::backend::Backend;
use crate::bundle::{Bundle, BundleKey, Phase};
use crate::data::{DocId, KeyFormat};
use crate::engine::config::CategoryConfig;
use crate::error::{BurrowError, Result};
use crate::generator::{PartialStrategy, SimilarityStrategy};
use crate::query::token::Token;
use crate::source::Source;

pub use ranged::RangeConfig;

/// Configuration keys recorded in every bundle.
pub const KEY_FORMAT_SETTING: &str = "key_format";
pub const PHASE_SETTING: &str = "phase";

/// The published, read-only indexes of a category.
#[derive(Debug)]
pub struct IndexedCategory {
    name: String,
    weight: f64,
    exact: Bundle,
    partial: Bundle,
    partial_strategy: PartialStrategy,
    similarity: SimilarityStrategy,
    ranged: Option<RangeConfig>,
}

impl IndexedCategory {
    fn new(config: &CategoryConfig, exact: Bundle, partial: Bundle) -> Self {
        Self {
            name: config.name.clone(),
            weight: config.weight,
            exact,
            partial,
            partial_strategy: config.partial,
            similarity: config.similarity,
            ranged: config.ranged,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Static category boost.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn exact(&self) -> &Bundle {
        &self.exact
    }

    pub fn partial(&self) -> &Bundle {
        &self.partial
    }

    pub fn is_ranged(&self) -> bool {
        self.ranged.is_some()
    }

    fn bundle(&self, partial: bool) -> &Bundle {
        if partial && !self.partial_strategy.is_none() && self.ranged.is_none() {
            &self.partial
        } else {
            &self.exact
        }
    }

    /// Identifiers for `text`, from the partial bundle when `partial` is set
    /// and the category has one.
    pub fn lookup(&self, text: &str, partial: bool) -> Cow<'_, [DocId]> {
        match &self.ranged {
            Some(range) => {
                let mut seen = AHashSet::new();
                let ids: Vec<DocId> = range
                    .query_keys(text)
                    .iter()
                    .flat_map(|key| self.exact.ids(key))
                    .filter(|id| seen.insert(*id))
                    .cloned()
                    .collect();
                Cow::Owned(ids)
            }
            None => Cow::Borrowed(self.bundle(partial).ids(text)),
        }
    }

    /// Weight of `text` in the bundle `lookup` would use; `0` when absent.
    pub fn weight_of(&self, text: &str, partial: bool) -> f64 {
        match &self.ranged {
            Some(range) => range
                .query_keys(text)
                .iter()
                .map(|key| self.exact.weight(key))
                .fold(0.0, f64::max),
            None => self.bundle(partial).weight(text),
        }
    }

    /// The part of `token` this category looks up: the unsplit value for
    /// ranged categories, the lookup text otherwise.
    pub fn lookup_text<'t>(&self, token: &'t Token) -> &'t str {
        if self.is_ranged() {
            token.value()
        } else {
            token.text()
        }
    }

    pub fn ids_for(&self, token: &Token) -> Cow<'_, [DocId]> {
        self.lookup(self.lookup_text(token), token.is_partial())
    }

    pub fn weight_for(&self, token: &Token) -> f64 {
        self.weight_of(self.lookup_text(token), token.is_partial())
    }

    /// A cursor over the similar candidates of `token`.
    pub fn similarity_cursor(&self, token: &Token) -> SimilarityCursor {
        SimilarityCursor::new(self.similarity.codes_for(token.text()), &self.exact)
    }

    /// Similar candidate tokens, in generated order.
    pub fn similar_tokens(&self, token: &Token) -> SimilarTokens<'_> {
        SimilarTokens {
            cursor: self.similarity_cursor(token),
            bundle: &self.exact,
        }
    }
}

/// Position in the similarity buckets of a token's phonetic codes.
///
/// Advancing is bounded by the number of stored candidates; [`reset`]
/// restarts the traversal.
///
/// [`reset`]: SimilarityCursor::reset
#[derive(Debug, Clone)]
pub struct SimilarityCursor {
    codes: Vec<String>,
    code: usize,
    item: usize,
    seen: Vec<String>,
    total: usize,
    remaining: usize,
}

impl SimilarityCursor {
    pub fn new(codes: Vec<String>, bundle: &Bundle) -> Self {
        let total = codes.iter().map(|code| bundle.similar(code).len()).sum();
        Self {
            codes,
            code: 0,
            item: 0,
            seen: Vec::new(),
            total,
            remaining: total,
        }
    }

    /// Next unseen candidate.
    pub fn next_in<'b>(&mut self, bundle: &'b Bundle) -> Option<&'b str> {
        while self.remaining > 0 {
            let bucket = bundle.similar(self.codes.get(self.code)?);
            let Some(candidate) = bucket.get(self.item) else {
                self.code += 1;
                self.item = 0;
                continue;
            };
            self.item += 1;
            self.remaining -= 1;
            if !self.seen.contains(candidate) {
                self.seen.push(candidate.clone());
                return Some(candidate.as_str());
            }
        }
        None
    }

    /// Candidates not yet visited.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn reset(&mut self) {
        self.code = 0;
        self.item = 0;
        self.seen.clear();
        self.remaining = self.total;
    }
}

/// Iterator over similar candidates of one token.
pub struct SimilarTokens<'a> {
    cursor: SimilarityCursor,
    bundle: &'a Bundle,
}

impl<'a> Iterator for SimilarTokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.next_in(self.bundle)
    }
}

/// Counters from one indexing run of a category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStats {
    pub records: usize,
    pub tokens: usize,
    pub partial_tokens: usize,
    pub similarity_codes: usize,
    pub duration: Duration,
}

/// A named, searchable field of an index.
#[derive(Debug)]
pub struct Category {
    index_name: String,
    config: CategoryConfig,
    backend: Arc<dyn Backend>,
    published: RwLock<Option<Arc<IndexedCategory>>>,
}

impl Category {
    pub fn new(
        index_name: impl Into<String>,
        config: CategoryConfig,
        backend: Arc<dyn Backend>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            index_name: index_name.into(),
            config,
            backend,
            published: RwLock::new(None),
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn config(&self) -> &CategoryConfig {
        &self.config
    }

    pub fn qualifiers(&self) -> impl Iterator<Item = &str> {
        self.config.all_qualifiers()
    }

    pub fn weight(&self) -> f64 {
        self.config.weight
    }

    fn key(&self, phase: Phase) -> BundleKey {
        BundleKey::new(&self.index_name, &self.config.name, phase)
    }

    fn identifier(&self) -> String {
        format!("{}:{}", self.index_name, self.config.name)
    }

    /// Run the full indexing pipeline and publish the result.
    ///
    /// On failure the previously published bundles stay in place.
    pub fn index(
        &self,
        source: &dyn Source,
        tokenizer: &Tokenizer,
        key_format: KeyFormat,
    ) -> Result<CategoryStats> {
        let started = Instant::now();
        info!("indexing category {}", self.identifier());

        match self.build(source, tokenizer, key_format) {
            Ok((indexed, records)) => {
                let stats = CategoryStats {
                    records,
                    tokens: indexed.exact.len(),
                    partial_tokens: indexed.partial.len(),
                    similarity_codes: indexed.exact.similarity.len(),
                    duration: started.elapsed(),
                };
                self.publish(Some(Arc::new(indexed)));
                info!(
                    "indexed category {}: {} records, {} tokens, {} partial tokens in {:?}",
                    self.identifier(),
                    stats.records,
                    stats.tokens,
                    stats.partial_tokens,
                    stats.duration
                );
                Ok(stats)
            }
            Err(err) => {
                warn!(
                    "indexing category {} failed, keeping previous bundles: {err}",
                    self.identifier()
                );
                Err(err)
            }
        }
    }

    fn build(
        &self,
        source: &dyn Source,
        tokenizer: &Tokenizer,
        key_format: KeyFormat,
    ) -> Result<(IndexedCategory, usize)> {
        let field = self.config.source_field();

        // 1. exact inverted index
        let mut exact = Bundle::new();
        let mut records = 0;
        for record in source.records()? {
            let record = record?;
            if !key_format.admits(&record.id) {
                return Err(BurrowError::index(format!(
                    "record {} of {} does not have a {} key",
                    record.id,
                    self.identifier(),
                    key_format.as_str()
                )));
            }
            records += 1;
            let Some(text) = record.get(field) else {
                continue;
            };
            match &self.config.ranged {
                Some(range) => {
                    for value in text.split_whitespace() {
                        match range.index_key(value) {
                            Some(key) => exact.add(&key, record.id.clone()),
                            None => warn!(
                                "skipping non-numeric or out of range value {value:?} of record {} in {}",
                                record.id,
                                self.identifier()
                            ),
                        }
                    }
                }
                None => {
                    for token in tokenizer.tokenize(text) {
                        exact.add(&token, record.id.clone());
                    }
                }
            }
        }

        // 2. weights
        exact.weights = self.config.weights.generate(&exact.inverted);

        // 3. partial bundle
        let mut partial = Bundle::new();
        if self.config.ranged.is_none() {
            let (inverted, weights) = self
                .config
                .partial
                .generate(&exact.inverted, &exact.weights);
            partial.inverted = inverted;
            partial.weights = weights;
        }

        // 4. similarity
        exact.similarity = self
            .config
            .similarity
            .generate(&exact.inverted, &exact.weights);

        for (bundle, phase) in [(&mut exact, Phase::Exact), (&mut partial, Phase::Partial)] {
            bundle
                .configuration
                .insert(KEY_FORMAT_SETTING.to_string(), key_format.as_str().to_string());
            bundle
                .configuration
                .insert(PHASE_SETTING.to_string(), phase.as_str().to_string());
        }

        // 5. persist
        self.persist(&exact, &partial)?;

        Ok((IndexedCategory::new(&self.config, exact, partial), records))
    }

    /// Dump both bundles. When the partial bundle cannot be written the
    /// exact bundle is put back to what it was, so the backend never pairs
    /// bundles from different runs.
    fn persist(&self, exact: &Bundle, partial: &Bundle) -> Result<()> {
        let exact_key = self.key(Phase::Exact);
        let published = self.published.read().clone();
        let previous = match published {
            Some(published) => Some(published.exact.clone()),
            None if self.backend.exists(&exact_key) => Some(self.backend.load(&exact_key)?),
            None => None,
        };

        self.backend.dump(&exact_key, exact)?;
        if let Err(err) = self.backend.dump(&self.key(Phase::Partial), partial) {
            let restored = match &previous {
                Some(bundle) => self.backend.dump(&exact_key, bundle),
                None => self.backend.clear(&exact_key),
            };
            if let Err(restore_err) = restored {
                warn!("could not restore bundle {exact_key} after a failed dump: {restore_err}");
            }
            return Err(err);
        }
        Ok(())
    }

    fn publish(&self, indexed: Option<Arc<IndexedCategory>>) {
        *self.published.write() = indexed;
    }

    /// Restore both bundles from the backend and publish them.
    pub fn load(&self) -> Result<()> {
        let exact = self.backend.load(&self.key(Phase::Exact))?;
        let partial = self.backend.load(&self.key(Phase::Partial))?;
        debug!(
            "loaded category {} with {} tokens",
            self.identifier(),
            exact.len()
        );
        self.publish(Some(Arc::new(IndexedCategory::new(
            &self.config,
            exact,
            partial,
        ))));
        Ok(())
    }

    /// Remove both bundles from the backend and unpublish them.
    pub fn clear(&self) -> Result<()> {
        self.backend.clear(&self.key(Phase::Exact))?;
        self.backend.clear(&self.key(Phase::Partial))?;
        self.publish(None);
        Ok(())
    }

    /// Fail unless both bundles exist in the backend.
    pub fn check(&self) -> Result<()> {
        for phase in [Phase::Exact, Phase::Partial] {
            let key = self.key(phase);
            if !self.backend.exists(&key) {
                return Err(BurrowError::not_found(format!(
                    "bundle {key} has not been indexed"
                )));
            }
        }
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.published.read().is_some()
    }

    /// The currently published bundles.
    pub fn snapshot(&self) -> Result<Arc<IndexedCategory>> {
        self.published
            .read()
            .clone()
            .ok_or_else(|| BurrowError::not_ready(self.identifier()))
    }

    pub fn ids_for(&self, token: &Token) -> Result<Vec<DocId>> {
        Ok(self.snapshot()?.ids_for(token).into_owned())
    }

    pub fn weight_for(&self, token: &Token) -> Result<f64> {
        Ok(self.snapshot()?.weight_for(token))
    }

    pub fn similar_tokens(&self, token: &Token) -> Result<Vec<String>> {
        let snapshot = self.snapshot()?;
        Ok(snapshot.similar_tokens(token).map(str::to_string).collect())
    }
}
