//! # Burrow
//!
//! A category-oriented text search engine core.
//!
//! ## Features
//!
//! - Per-category exact, partial (substring) and phonetic similarity indexes
//! - Pluggable weight, partial and similarity strategies
//! - Qualified queries (`title:hobbit`), partial (`hob*`), similar (`smith~`)
//!   and exact (`"picky"`) tokens
//! - Best-first allocation ranking with ordered intersections
//! - Memory and file backends, memory and CSV sources
//! - Ranged and geo categories

pub mod analysis;
pub mod backend;
pub mod bundle;
pub mod category;
mod data;
pub mod engine;
mod error;
pub mod generator;
pub mod index;
pub mod query;
pub mod source;

// Re-exports for the public API
pub use analysis::{Tokenizer, TokenizerConfig};
pub use backend::{Backend, FileBackend, MemoryBackend};
pub use bundle::{Bundle, BundleKey, Phase};
pub use category::{Category, CategoryStats, RangeConfig};
pub use data::{DocId, KeyFormat, Record};
pub use engine::Engine;
pub use engine::config::{Boost, CategoryConfig, EngineConfig, IndexConfig, SearchOptions};
pub use engine::search::{Hit, SearchRequest, SearchRequestBuilder, SearchResults};
pub use error::{BurrowError, Result};
pub use generator::{PartialStrategy, PhoneticEncoder, SimilarityStrategy, WeightStrategy};
pub use index::{Index, IndexingReport};
pub use query::{QualifierRegistry, Token};
pub use source::{CsvSource, MemorySource, Source};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
