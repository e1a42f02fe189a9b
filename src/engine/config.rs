use std::borrow::Cow;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::analysis::tokenizer::TokenizerConfig;
use crate::category::ranged::RangeConfig;
use crate::data::KeyFormat;
use crate::error::{BurrowError, Result};
use crate::generator::{PartialStrategy, SimilarityStrategy, WeightStrategy};

/// Degrees of latitude per kilometre.
const LAT_DEGREES_PER_KM: f64 = 0.00898312;
/// Degrees of longitude per kilometre on the 45th parallel.
const LNG_DEGREES_PER_KM: f64 = 0.01796624;

fn default_weight() -> f64 {
    1.0
}

fn default_max_allocations() -> usize {
    100
}

/// Configuration of one searchable category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Unique name within the index; also the default qualifier.
    pub name: String,
    /// Additional qualifier aliases.
    #[serde(default)]
    pub qualifiers: Vec<String>,
    /// Source field to read; defaults to `name`.
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub partial: PartialStrategy,
    #[serde(default)]
    pub similarity: SimilarityStrategy,
    #[serde(default)]
    pub weights: WeightStrategy,
    /// Static boost multiplied into every token weight.
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub ranged: Option<RangeConfig>,
}

impl CategoryConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qualifiers: Vec::new(),
            from: None,
            partial: PartialStrategy::default(),
            similarity: SimilarityStrategy::default(),
            weights: WeightStrategy::default(),
            weight: default_weight(),
            ranged: None,
        }
    }

    pub fn qualifiers<I, S>(mut self, qualifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.qualifiers = qualifiers.into_iter().map(Into::into).collect();
        self
    }

    pub fn from(mut self, field: impl Into<String>) -> Self {
        self.from = Some(field.into());
        self
    }

    pub fn partial(mut self, partial: PartialStrategy) -> Self {
        self.partial = partial;
        self
    }

    pub fn similarity(mut self, similarity: SimilarityStrategy) -> Self {
        self.similarity = similarity;
        self
    }

    pub fn weights(mut self, weights: WeightStrategy) -> Self {
        self.weights = weights;
        self
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Make the category ranged. Ranged categories have no partial or
    /// similarity index.
    pub fn ranged(mut self, range: f64, precision: u32) -> Self {
        self.ranged = Some(RangeConfig::new(range, precision));
        self.partial = PartialStrategy::None;
        self.similarity = SimilarityStrategy::None;
        self
    }

    /// Source field this category reads.
    pub fn source_field(&self) -> &str {
        self.from.as_deref().unwrap_or(&self.name)
    }

    /// The category name followed by its extra aliases.
    pub fn all_qualifiers(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.qualifiers.iter().map(String::as_str))
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(BurrowError::invalid_config("category name must not be empty"));
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(BurrowError::invalid_config(format!(
                "category {} has invalid weight {}",
                self.name, self.weight
            )));
        }
        if let WeightStrategy::Constant { weight } = self.weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(BurrowError::invalid_config(format!(
                    "category {} has invalid constant weight {weight}",
                    self.name
                )));
            }
        }
        if let SimilarityStrategy::Phonetic { max_candidates: 0, .. } = self.similarity {
            return Err(BurrowError::invalid_config(format!(
                "category {} keeps zero similar candidates",
                self.name
            )));
        }
        if let Some(range) = &self.ranged {
            range.validate()?;
            if !self.partial.is_none() || !self.similarity.is_none() {
                return Err(BurrowError::invalid_config(format!(
                    "ranged category {} cannot use partial or similarity indexes",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// Configuration of an index: a named set of categories over one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    pub name: String,
    /// Index name reported with hits; defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_identifier: Option<String>,
    #[serde(default)]
    pub key_format: KeyFormat,
    #[serde(default)]
    pub tokenizer: TokenizerConfig,
    pub categories: Vec<CategoryConfig>,
}

impl IndexConfig {
    pub fn builder(name: impl Into<String>) -> IndexConfigBuilder {
        IndexConfigBuilder::new(name)
    }

    pub fn result_identifier(&self) -> &str {
        self.result_identifier.as_deref().unwrap_or(&self.name)
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: IndexConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(BurrowError::invalid_config("index name must not be empty"));
        }
        let mut names = AHashSet::new();
        for category in &self.categories {
            category.validate()?;
            if !names.insert(category.name.as_str()) {
                return Err(BurrowError::invalid_config(format!(
                    "duplicate category {} in index {}",
                    category.name, self.name
                )));
            }
        }
        Ok(())
    }
}

pub struct IndexConfigBuilder {
    name: String,
    result_identifier: Option<String>,
    key_format: KeyFormat,
    tokenizer: TokenizerConfig,
    categories: Vec<CategoryConfig>,
}

impl IndexConfigBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            result_identifier: None,
            key_format: KeyFormat::default(),
            tokenizer: TokenizerConfig::default(),
            categories: Vec::new(),
        }
    }

    pub fn result_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.result_identifier = Some(identifier.into());
        self
    }

    pub fn key_format(mut self, key_format: KeyFormat) -> Self {
        self.key_format = key_format;
        self
    }

    pub fn tokenizer(mut self, tokenizer: TokenizerConfig) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn add_category(mut self, category: CategoryConfig) -> Self {
        self.categories.push(category);
        self
    }

    pub fn add_ranged_category(self, name: impl Into<String>, range: f64, precision: u32) -> Self {
        self.add_category(CategoryConfig::new(name).ranged(range, precision))
    }

    /// Two ranged categories approximating a square of `radius_km` around a
    /// point, assuming locations near the 45th parallel.
    pub fn add_geo_categories(
        self,
        lat: impl Into<String>,
        lng: impl Into<String>,
        radius_km: f64,
        precision: u32,
    ) -> Self {
        self.add_ranged_category(lat, radius_km * LAT_DEGREES_PER_KM, precision)
            .add_ranged_category(lng, radius_km * LNG_DEGREES_PER_KM, precision)
    }

    pub fn build(self) -> IndexConfig {
        IndexConfig {
            name: self.name,
            result_identifier: self.result_identifier,
            key_format: self.key_format,
            tokenizer: self.tokenizer,
            categories: self.categories,
        }
    }
}

/// Extra score for allocations hitting exactly these categories, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boost {
    pub categories: Vec<String>,
    pub weight: f64,
}

/// Query-time options of an [`Engine`](crate::engine::Engine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Upper bound on allocations considered per index.
    #[serde(default = "default_max_allocations")]
    pub max_allocations: usize,
    /// Drop query words that match no category instead of failing the
    /// whole query.
    #[serde(default)]
    pub ignore_unassigned_tokens: bool,
    /// Treat the last query word as partial unless marked otherwise.
    #[serde(default)]
    pub partialize_last: bool,
    #[serde(default)]
    pub boosts: Vec<Boost>,
    /// Tokenizer used to split raw query text.
    #[serde(default)]
    pub tokenizer: TokenizerConfig,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_allocations: default_max_allocations(),
            ignore_unassigned_tokens: false,
            partialize_last: false,
            boosts: Vec::new(),
            tokenizer: TokenizerConfig::default(),
        }
    }
}

impl SearchOptions {
    pub fn max_allocations(mut self, max_allocations: usize) -> Self {
        self.max_allocations = max_allocations;
        self
    }

    pub fn ignore_unassigned_tokens(mut self, ignore: bool) -> Self {
        self.ignore_unassigned_tokens = ignore;
        self
    }

    pub fn partialize_last(mut self, partialize: bool) -> Self {
        self.partialize_last = partialize;
        self
    }

    pub fn boost<I, S>(mut self, categories: I, weight: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.boosts.push(Boost {
            categories: categories.into_iter().map(Into::into).collect(),
            weight,
        });
        self
    }

    pub fn tokenizer(mut self, tokenizer: TokenizerConfig) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// These options with `boosts` added, each replacing any configured
    /// boost on the same category sequence.
    pub fn with_boosts(&self, boosts: &[Boost]) -> Cow<'_, SearchOptions> {
        if boosts.is_empty() {
            return Cow::Borrowed(self);
        }
        let mut options = self.clone();
        options
            .boosts
            .retain(|kept| !boosts.iter().any(|b| b.categories == kept.categories));
        options.boosts.extend(boosts.iter().cloned());
        Cow::Owned(options)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_allocations == 0 {
            return Err(BurrowError::invalid_config("max_allocations must be at least 1"));
        }
        Ok(())
    }
}

/// Complete engine configuration, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub indexes: Vec<IndexConfig>,
    #[serde(default)]
    pub search: SearchOptions,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let mut names = AHashSet::new();
        for index in &self.indexes {
            index.validate()?;
            if !names.insert(index.name.as_str()) {
                return Err(BurrowError::invalid_config(format!(
                    "duplicate index {}",
                    index.name
                )));
            }
        }
        self.search.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::PhoneticEncoder;

    #[test]
    fn test_json_defaults() {
        let config = IndexConfig::from_json_str(
            r#"{
                "name": "books",
                "categories": [
                    { "name": "title", "qualifiers": ["t"] },
                    {
                        "name": "author",
                        "partial": { "type": "none" },
                        "similarity": { "type": "phonetic", "encoder": "metaphone" },
                        "weights": { "type": "constant", "weight": 2.0 },
                        "weight": 1.5
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.key_format, KeyFormat::Integer);
        let title = &config.categories[0];
        assert_eq!(title.partial, PartialStrategy::Substring { from: -3, to: -1 });
        assert_eq!(title.similarity, SimilarityStrategy::None);
        assert_eq!(title.weights, WeightStrategy::Logarithmic);
        assert_eq!(title.weight, 1.0);
        assert_eq!(title.all_qualifiers().collect::<Vec<_>>(), vec!["title", "t"]);

        let author = &config.categories[1];
        assert_eq!(author.partial, PartialStrategy::None);
        assert_eq!(
            author.similarity,
            SimilarityStrategy::Phonetic {
                encoder: PhoneticEncoder::Metaphone,
                max_candidates: 3
            }
        );
        assert_eq!(author.weights, WeightStrategy::Constant { weight: 2.0 });
        assert_eq!(author.weight, 1.5);
    }

    #[test]
    fn test_result_identifier() {
        let config = IndexConfig::builder("books").build();
        assert_eq!(config.result_identifier(), "books");

        let config = IndexConfig::from_json_str(
            r#"{ "name": "books", "result_identifier": "Books", "categories": [] }"#,
        )
        .unwrap();
        assert_eq!(config.result_identifier(), "Books");
    }

    #[test]
    fn test_request_boosts_replace_configured_ones() {
        let options = SearchOptions::default()
            .boost(["title"], 1.0)
            .boost(["title", "author"], 2.0);
        assert!(matches!(options.with_boosts(&[]), Cow::Borrowed(_)));

        let merged = options.with_boosts(&[
            Boost {
                categories: vec!["title".into()],
                weight: 5.0,
            },
            Boost {
                categories: vec!["author".into()],
                weight: 3.0,
            },
        ]);
        let boosts: Vec<(Vec<String>, f64)> = merged
            .boosts
            .iter()
            .map(|b| (b.categories.clone(), b.weight))
            .collect();
        assert_eq!(
            boosts,
            vec![
                (vec!["title".to_string(), "author".to_string()], 2.0),
                (vec!["title".to_string()], 5.0),
                (vec!["author".to_string()], 3.0),
            ]
        );
    }

    #[test]
    fn test_unknown_strategy_fails() {
        let result = IndexConfig::from_json_str(
            r#"{ "name": "books", "categories": [ { "name": "title", "partial": { "type": "fuzzy" } } ] }"#,
        );
        assert!(matches!(result, Err(BurrowError::Json(_))));
    }

    #[test]
    fn test_duplicate_category_fails() {
        let config = IndexConfig::builder("books")
            .add_category(CategoryConfig::new("title"))
            .add_category(CategoryConfig::new("title"))
            .build();
        assert!(matches!(config.validate(), Err(BurrowError::InvalidConfig(_))));
    }

    #[test]
    fn test_ranged_category_rejects_partial() {
        let mut category = CategoryConfig::new("price").ranged(10.0, 2);
        assert!(category.validate().is_ok());
        assert_eq!(category.partial, PartialStrategy::None);

        category.partial = PartialStrategy::default();
        assert!(category.validate().is_err());
    }

    #[test]
    fn test_geo_categories() {
        let config = IndexConfig::builder("places")
            .add_geo_categories("lat", "lng", 10.0, 1)
            .build();
        assert_eq!(config.categories.len(), 2);
        let lat = config.categories[0].ranged.unwrap();
        let lng = config.categories[1].ranged.unwrap();
        assert!((lat.range - 0.0898312).abs() < 1e-12);
        assert!((lng.range - 0.1796624).abs() < 1e-12);
    }

    #[test]
    fn test_search_options() {
        let options = SearchOptions::default().boost(["title", "author"], 3.0);
        assert_eq!(options.max_allocations, 100);
        assert_eq!(options.boosts[0].categories, vec!["title", "author"]);
        assert!(options.validate().is_ok());
        assert!(SearchOptions::default().max_allocations(0).validate().is_err());
    }
}
