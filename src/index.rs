//! Indexes: named sets of categories over one source.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ahash::AHashMap;
use log::{info, warn};
use rayon::prelude::*;

use crate::analysis::Tokenizer;
use crate::backend::{Backend, MemoryBackend};
use crate::category::{Category, CategoryStats};
use crate::engine::config::{IndexConfig, SearchOptions};
use crate::error::{BurrowError, Result};
use crate::query::allocation::{Allocation, allocate};
use crate::query::combination::Combination;
use crate::query::parser::Query;
use crate::source::Source;

/// Outcome of indexing one category.
#[derive(Debug)]
pub struct CategoryOutcome {
    pub category: String,
    pub result: Result<CategoryStats>,
    /// Failure to end the snapshot of the category's own source. The
    /// category result stands either way.
    pub snapshot_error: Option<BurrowError>,
}

/// Per-category outcomes of one indexing run.
#[derive(Debug)]
pub struct IndexingReport {
    pub index: String,
    pub outcomes: Vec<CategoryOutcome>,
    /// Failure to end the snapshot of the index source, reported after the
    /// categories were indexed.
    pub snapshot_error: Option<BurrowError>,
    pub duration: Duration,
}

impl IndexingReport {
    pub fn is_success(&self) -> bool {
        self.snapshot_error.is_none()
            && self
                .outcomes
                .iter()
                .all(|o| o.result.is_ok() && o.snapshot_error.is_none())
    }

    pub fn failures(&self) -> impl Iterator<Item = &CategoryOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn stats(&self, category: &str) -> Option<&CategoryStats> {
        self.outcomes
            .iter()
            .find(|o| o.category == category)
            .and_then(|o| o.result.as_ref().ok())
    }
}

/// A named set of categories indexed from one source.
#[derive(Debug)]
pub struct Index {
    config: IndexConfig,
    source: Option<Arc<dyn Source>>,
    category_sources: AHashMap<String, Arc<dyn Source>>,
    tokenizer: Tokenizer,
    categories: Vec<Category>,
}

impl Index {
    pub fn builder(config: IndexConfig) -> IndexBuilder {
        IndexBuilder::new(config)
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name() == name)
    }

    fn source_for(&self, category: &Category) -> Result<&Arc<dyn Source>> {
        self.category_sources
            .get(category.name())
            .or(self.source.as_ref())
            .ok_or_else(|| {
                BurrowError::invalid_config(format!(
                    "no source for category {} of index {}",
                    category.name(),
                    self.name()
                ))
            })
    }

    /// Index every category, one category per worker.
    ///
    /// A failing category is reported and keeps its previous bundles; the
    /// other categories are unaffected.
    pub fn index(&self) -> Result<IndexingReport> {
        let started = Instant::now();
        info!(
            "indexing index {} ({} categories)",
            self.name(),
            self.categories.len()
        );

        if let Some(source) = &self.source {
            if source.is_empty() == Some(true) {
                warn!("source of index {} is empty", self.name());
            }
            source.begin_snapshot()?;
        }

        let threads = num_cpus::get().min(self.categories.len()).max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| BurrowError::internal(format!("failed to build indexing pool: {e}")));

        let outcomes = pool.map(|pool| {
            pool.install(|| {
                self.categories
                    .par_iter()
                    .map(|category| self.index_category(category))
                    .collect::<Vec<_>>()
            })
        });

        let snapshot_error = self.source.as_ref().and_then(|source| source.end_snapshot().err());
        if let Some(err) = &snapshot_error {
            warn!("ending the source snapshot of index {} failed: {err}", self.name());
        }
        let outcomes = outcomes?;

        let report = IndexingReport {
            index: self.name().to_string(),
            outcomes,
            snapshot_error,
            duration: started.elapsed(),
        };
        info!(
            "indexed index {} in {:?}, {} failed categories",
            self.name(),
            report.duration,
            report.failures().count()
        );
        Ok(report)
    }

    fn index_category(&self, category: &Category) -> CategoryOutcome {
        let mut outcome = CategoryOutcome {
            category: category.name().to_string(),
            result: Err(BurrowError::internal("category was not indexed")),
            snapshot_error: None,
        };
        let source = match self.source_for(category) {
            Ok(source) => source,
            Err(err) => {
                outcome.result = Err(err);
                return outcome;
            }
        };

        let own = self.category_sources.contains_key(category.name());
        if own {
            if let Err(err) = source.begin_snapshot() {
                outcome.result = Err(err);
                return outcome;
            }
        }
        outcome.result = category.index(&**source, &self.tokenizer, self.config.key_format);
        if own {
            outcome.snapshot_error = source.end_snapshot().err();
            if let Some(err) = &outcome.snapshot_error {
                warn!(
                    "ending the source snapshot of category {} failed: {err}",
                    category.name()
                );
            }
        }
        outcome
    }

    /// Restore every category from the backend.
    pub fn load(&self) -> Result<()> {
        self.categories.iter().try_for_each(Category::load)
    }

    pub fn clear(&self) -> Result<()> {
        self.categories.iter().try_for_each(Category::clear)
    }

    /// Fail unless every category has been indexed into the backend.
    pub fn check(&self) -> Result<()> {
        self.categories.iter().try_for_each(Category::check)
    }

    pub fn is_ready(&self) -> bool {
        self.categories.iter().all(Category::is_ready)
    }

    /// Resolve a parsed query against this index.
    ///
    /// Every category a token is eligible for must be ready.
    pub fn allocations(&self, query: &Query, options: &SearchOptions) -> Result<Vec<Allocation>> {
        let mut groups = Vec::with_capacity(query.len());
        for group in query.groups() {
            let mut combinations = Vec::new();
            for token in group.tokens() {
                for category in &self.categories {
                    if !token.allows(category.name()) {
                        continue;
                    }
                    let combination = Combination::resolve(token.clone(), category.snapshot()?);
                    if !combination.is_empty() {
                        combinations.push(combination);
                    }
                }
            }
            groups.push(combinations);
        }
        Ok(allocate(self.name(), groups, options))
    }
}

pub struct IndexBuilder {
    config: IndexConfig,
    source: Option<Arc<dyn Source>>,
    category_sources: AHashMap<String, Arc<dyn Source>>,
    backend: Option<Arc<dyn Backend>>,
}

impl IndexBuilder {
    pub fn new(config: IndexConfig) -> Self {
        Self {
            config,
            source: None,
            category_sources: AHashMap::new(),
            backend: None,
        }
    }

    pub fn source(mut self, source: Arc<dyn Source>) -> Self {
        self.source = Some(source);
        self
    }

    /// Read one category from its own source.
    pub fn category_source(mut self, category: impl Into<String>, source: Arc<dyn Source>) -> Self {
        self.category_sources.insert(category.into(), source);
        self
    }

    /// Backend for every category; defaults to a [`MemoryBackend`].
    pub fn backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn build(self) -> Result<Index> {
        self.config.validate()?;
        let tokenizer = Tokenizer::new(self.config.tokenizer.clone())?;
        let backend: Arc<dyn Backend> = match self.backend {
            Some(backend) => backend,
            None => Arc::new(MemoryBackend::new()),
        };

        if let Some(name) = self
            .category_sources
            .keys()
            .find(|name| !self.config.categories.iter().any(|c| &c.name == *name))
        {
            return Err(BurrowError::invalid_config(format!(
                "source given for unknown category {name} of index {}",
                self.config.name
            )));
        }
        let sources = self
            .source
            .iter()
            .map(|source| (None, source))
            .chain(self.category_sources.iter().map(|(name, source)| (Some(name), source)));
        for (category, source) in sources {
            match source.key_format() {
                Some(format) if format != self.config.key_format => {
                    return Err(BurrowError::invalid_config(format!(
                        "source{} of index {} reads {} keys but the index uses {} keys",
                        category.map(|c| format!(" of category {c}")).unwrap_or_default(),
                        self.config.name,
                        format.as_str(),
                        self.config.key_format.as_str()
                    )));
                }
                _ => {}
            }
        }
        if self.source.is_none()
            && self
                .config
                .categories
                .iter()
                .any(|c| !self.category_sources.contains_key(&c.name))
        {
            return Err(BurrowError::invalid_config(format!(
                "index {} has no source",
                self.config.name
            )));
        }

        let categories = self
            .config
            .categories
            .iter()
            .map(|c| Category::new(&self.config.name, c.clone(), Arc::clone(&backend)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Index {
            config: self.config,
            source: self.source,
            category_sources: self.category_sources,
            tokenizer,
            categories,
        })
    }
}
