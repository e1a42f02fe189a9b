pub mod config;
pub mod search;

use std::sync::Arc;
use std::time::Instant;

use ahash::{AHashMap, AHashSet};
use log::debug;
use rayon::prelude::*;

use crate::analysis::Tokenizer;
use crate::backend::Backend;
use crate::data::DocId;
use crate::error::{BurrowError, Result};
use crate::index::{Index, IndexingReport};
use crate::query::{Allocation, QualifierRegistry, QueryParser};
use crate::source::Source;

use self::config::{EngineConfig, SearchOptions};
use self::search::{AllocationInfo, CombinationInfo, Hit, SearchRequest, SearchResults};

/// Search engine over a fixed set of indexes.
///
/// The qualifier registry is built once from every category when the engine
/// is constructed and is read-only afterwards.
#[derive(Debug)]
pub struct Engine {
    indexes: Vec<Index>,
    parser: QueryParser,
    options: SearchOptions,
}

impl Engine {
    pub fn new(indexes: Vec<Index>, options: SearchOptions) -> Result<Self> {
        options.validate()?;

        let mut names = AHashSet::new();
        let mut registry = QualifierRegistry::new();
        for index in &indexes {
            if !names.insert(index.name()) {
                return Err(BurrowError::invalid_config(format!(
                    "duplicate index {}",
                    index.name()
                )));
            }
            for category in index.categories() {
                for alias in category.qualifiers() {
                    registry.register(alias, category.name())?;
                }
            }
        }

        let tokenizer = Tokenizer::new(options.tokenizer.clone())?;
        let parser = QueryParser::new(tokenizer, Arc::new(registry))
            .partialize_last(options.partialize_last);

        Ok(Self {
            indexes,
            parser,
            options,
        })
    }

    /// Build an engine from a loaded configuration. `sources` maps index
    /// names to their sources; every index shares `backend`.
    pub fn from_config<I>(config: EngineConfig, backend: Arc<dyn Backend>, sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, Arc<dyn Source>)>,
    {
        config.validate()?;
        let mut sources: AHashMap<String, Arc<dyn Source>> = sources.into_iter().collect();
        let indexes = config
            .indexes
            .into_iter()
            .map(|index| {
                let mut builder = Index::builder(index.clone()).backend(Arc::clone(&backend));
                if let Some(source) = sources.remove(&index.name) {
                    builder = builder.source(source);
                }
                builder.build()
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(indexes, config.search)
    }

    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    pub fn index(&self, name: &str) -> Option<&Index> {
        self.indexes.iter().find(|index| index.name() == name)
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn qualifiers(&self) -> &QualifierRegistry {
        self.parser.registry()
    }

    /// Index every index in turn.
    pub fn index_all(&self) -> Result<Vec<IndexingReport>> {
        self.indexes.iter().map(Index::index).collect()
    }

    pub fn load_all(&self) -> Result<()> {
        self.indexes.iter().try_for_each(Index::load)
    }

    pub fn clear_all(&self) -> Result<()> {
        self.indexes.iter().try_for_each(Index::clear)
    }

    pub fn check_all(&self) -> Result<()> {
        self.indexes.iter().try_for_each(Index::check)
    }

    fn selected(&self, request: &SearchRequest) -> Result<Vec<&Index>> {
        if request.indexes.is_empty() {
            return Ok(self.indexes.iter().collect());
        }
        request
            .indexes
            .iter()
            .map(|name| {
                self.index(name)
                    .ok_or_else(|| BurrowError::not_found(format!("index {name}")))
            })
            .collect()
    }

    /// Run a query.
    ///
    /// Allocations of all selected indexes are ranked together by score;
    /// equal scores keep index order. Their intersections are concatenated
    /// in rank order, each identifier kept at its best-ranked allocation.
    /// Hits and allocations report each index by its result identifier.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchResults> {
        let started = Instant::now();
        let indexes = self.selected(request)?;
        let query = self.parser.parse(&request.query);
        if query.is_empty() {
            return Ok(SearchResults::empty(request.offset));
        }

        let options = self.options.with_boosts(&request.boosts);
        let mut allocations: Vec<Allocation> = Vec::new();
        for index in &indexes {
            allocations.extend(index.allocations(&query, &options)?);
        }
        let identifiers: AHashMap<&str, &str> = indexes
            .iter()
            .map(|index| (index.name(), index.config().result_identifier()))
            .collect();
        let identifier = |name: &str| -> String {
            identifiers.get(name).copied().unwrap_or(name).to_string()
        };
        allocations.sort_by(|a, b| b.score().total_cmp(&a.score()));

        let intersections: Vec<Vec<DocId>> =
            allocations.par_iter().map(Allocation::intersect).collect();

        let mut seen: AHashSet<(&str, &DocId)> = AHashSet::new();
        let mut found: Vec<Hit> = Vec::new();
        let mut infos = Vec::new();
        for (allocation, ids) in allocations.iter().zip(&intersections) {
            if ids.is_empty() {
                continue;
            }
            for id in ids {
                if seen.insert((allocation.index(), id)) {
                    found.push(Hit {
                        index: identifier(allocation.index()),
                        id: id.clone(),
                    });
                }
            }
            infos.push(allocation_info(allocation, identifier(allocation.index()), ids.len()));
        }

        debug!(
            "query {query} produced {} allocations, {} with results, {} ids",
            allocations.len(),
            infos.len(),
            found.len()
        );

        let total = found.len();
        let hits = found
            .into_iter()
            .skip(request.offset)
            .take(request.limit)
            .collect();

        Ok(SearchResults {
            total,
            hits,
            allocations: infos,
            offset: request.offset,
            duration: started.elapsed(),
        })
    }
}

fn allocation_info(allocation: &Allocation, index: String, count: usize) -> AllocationInfo {
    AllocationInfo {
        index,
        score: allocation.score(),
        count,
        combinations: allocation
            .combinations()
            .iter()
            .map(|c| CombinationInfo {
                category: c.category_name().to_string(),
                original: c.original().to_string(),
                resolved: c.resolved().to_string(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Record;
    use crate::engine::config::{CategoryConfig, IndexConfig};
    use crate::source::MemorySource;

    fn index(name: &str, categories: &[&str], records: Vec<Record>) -> Index {
        let mut config = IndexConfig::builder(name);
        for category in categories {
            config = config.add_category(CategoryConfig::new(*category));
        }
        Index::builder(config.build())
            .source(Arc::new(MemorySource::new(records)))
            .build()
            .unwrap()
    }

    #[test]
    fn test_duplicate_index_names() {
        let result = Engine::new(
            vec![
                index("books", &["title"], Vec::new()),
                index("books", &["title"], Vec::new()),
            ],
            SearchOptions::default(),
        );
        assert!(matches!(result, Err(BurrowError::InvalidConfig(_))));
    }

    #[test]
    fn test_registry_covers_all_indexes() {
        let engine = Engine::new(
            vec![
                index("books", &["title"], Vec::new()),
                index("films", &["director"], Vec::new()),
            ],
            SearchOptions::default(),
        )
        .unwrap();
        assert_eq!(engine.qualifiers().normalize("Director"), Some("director"));
        assert_eq!(engine.qualifiers().normalize("title"), Some("title"));
    }

    #[test]
    fn test_hits_are_unique_per_index() {
        let records = || vec![Record::new(1).field("title", "hobbit")];
        let engine = Engine::new(
            vec![
                index("books", &["title"], records()),
                index("films", &["title"], records()),
            ],
            SearchOptions::default(),
        )
        .unwrap();
        engine.index_all().unwrap();

        let results = engine.search(&SearchRequest::new("hobbit")).unwrap();
        assert_eq!(results.total, 2);
        assert_eq!(results.hits[0].index, "books");
        assert_eq!(results.hits[1].index, "films");

        let results = engine
            .search(&SearchRequest::builder("hobbit").index("films").build())
            .unwrap();
        assert_eq!(results.total, 1);

        let missing = engine.search(&SearchRequest::builder("hobbit").index("music").build());
        assert!(matches!(missing, Err(BurrowError::NotFound(_))));
    }

    #[test]
    fn test_result_identifier_names_hits() {
        let config = IndexConfig::builder("books")
            .result_identifier("Library")
            .add_category(CategoryConfig::new("title"))
            .build();
        let index = Index::builder(config)
            .source(Arc::new(MemorySource::new(vec![
                Record::new(1).field("title", "hobbit"),
            ])))
            .build()
            .unwrap();
        let engine = Engine::new(vec![index], SearchOptions::default()).unwrap();
        engine.index_all().unwrap();

        // selection still goes by index name
        let request = SearchRequest::builder("hobbit").index("books").build();
        let results = engine.search(&request).unwrap();
        assert_eq!(results.hits[0].index, "Library");
        assert_eq!(results.allocations[0].index, "Library");
    }

    #[test]
    fn test_request_boost_overrides_ranking() {
        let engine = Engine::new(
            vec![index(
                "books",
                &["title", "author"],
                vec![
                    Record::new(1).field("title", "tolkien tolkien"),
                    Record::new(2).field("title", "tolkien").field("author", "tolkien"),
                    Record::new(3).field("author", "tolkien"),
                ],
            )],
            SearchOptions::default().max_allocations(1),
        )
        .unwrap();
        engine.index_all().unwrap();

        let plain = engine.search(&SearchRequest::new("tolkien")).unwrap();
        assert_eq!(plain.allocations[0].combinations[0].category, "title");

        let request = SearchRequest::builder("tolkien").boost(["author"], 10.0).build();
        let boosted = engine.search(&request).unwrap();
        assert_eq!(boosted.allocations.len(), 1);
        assert_eq!(boosted.allocations[0].combinations[0].category, "author");
        assert_eq!(
            boosted.hits.iter().map(|h| &h.id).collect::<Vec<_>>(),
            vec![&DocId::Int(2), &DocId::Int(3)]
        );

        // the request boost does not stick to the engine
        assert!(engine.options().boosts.is_empty());
        let again = engine.search(&SearchRequest::new("tolkien")).unwrap();
        assert_eq!(again.allocations[0].combinations[0].category, "title");
    }

    #[test]
    fn test_empty_query() {
        let engine = Engine::new(
            vec![index("books", &["title"], Vec::new())],
            SearchOptions::default(),
        )
        .unwrap();
        let results = engine.search(&SearchRequest::new("  ")).unwrap();
        assert_eq!(results.total, 0);
        assert!(results.is_empty());
    }
}
