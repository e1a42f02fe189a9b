use std::time::Duration;

use serde::Serialize;

use crate::data::DocId;
use crate::engine::config::Boost;

/// A search request.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Raw query text, e.g. `title:hobbit tolk*`.
    pub query: String,

    /// Maximum number of hits to return.
    pub limit: usize,

    /// Number of hits to skip before returning (for pagination).
    pub offset: usize,

    /// Indexes to search. Empty means every index.
    pub indexes: Vec<String>,

    /// Boosts for this request only, replacing configured boosts on the same
    /// category sequence.
    pub boosts: Vec<Boost>,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            limit: 20,
            offset: 0,
            indexes: Vec::new(),
            boosts: Vec::new(),
        }
    }
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn builder(query: impl Into<String>) -> SearchRequestBuilder {
        SearchRequestBuilder {
            request: Self::new(query),
        }
    }
}

pub struct SearchRequestBuilder {
    request: SearchRequest,
}

impl SearchRequestBuilder {
    pub fn limit(mut self, limit: usize) -> Self {
        self.request.limit = limit;
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.request.offset = offset;
        self
    }

    /// Restrict the search to one index. Can be called repeatedly.
    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.request.indexes.push(index.into());
        self
    }

    pub fn boost<I, S>(mut self, categories: I, weight: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request.boosts.push(Boost {
            categories: categories.into_iter().map(Into::into).collect(),
            weight,
        });
        self
    }

    pub fn build(self) -> SearchRequest {
        self.request
    }
}

/// One result identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hit {
    pub index: String,
    pub id: DocId,
}

/// How one token was resolved inside an allocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinationInfo {
    pub category: String,
    /// Text as typed.
    pub original: String,
    /// Text that matched; differs from `original` for similar lookups.
    pub resolved: String,
}

/// An allocation that contributed results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationInfo {
    pub index: String,
    pub score: f64,
    /// Identifiers in the allocation's intersection.
    pub count: usize,
    pub combinations: Vec<CombinationInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    /// Distinct identifiers found, before pagination.
    pub total: usize,
    pub hits: Vec<Hit>,
    pub allocations: Vec<AllocationInfo>,
    pub offset: usize,
    pub duration: Duration,
}

impl SearchResults {
    pub fn empty(offset: usize) -> Self {
        Self {
            total: 0,
            hits: Vec::new(),
            allocations: Vec::new(),
            offset,
            duration: Duration::ZERO,
        }
    }

    /// Identifiers of the page, in rank order.
    pub fn ids(&self) -> Vec<&DocId> {
        self.hits.iter().map(|hit| &hit.id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}
