//! Core request and response types.

use crate::error::SearchError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

/// Generic metadata attached to matches and results.
pub type Metadata = Map<String, Value>;

/// Facet name (`by_type`, `by_entity_type`, ...) to value counts.
pub type Facets = BTreeMap<String, BTreeMap<String, usize>>;

/// Default total result budget when a request does not set one.
pub const DEFAULT_TOTAL_LIMIT: usize = 10;

/// Maximum preview length in characters.
pub const PREVIEW_MAX_CHARS: usize = 200;

/// The independently indexed collections the engine can search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionType {
    Document,
    Entity,
    Relationship,
}

impl CollectionType {
    pub const ALL: [CollectionType; 3] = [
        CollectionType::Document,
        CollectionType::Entity,
        CollectionType::Relationship,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionType::Document => "document",
            CollectionType::Entity => "entity",
            CollectionType::Relationship => "relationship",
        }
    }
}

impl fmt::Display for CollectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionType {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "document" | "documents" | "doc" | "docs" => Ok(CollectionType::Document),
            "entity" | "entities" => Ok(CollectionType::Entity),
            "relationship" | "relationships" | "rel" | "rels" => Ok(CollectionType::Relationship),
            other => Err(SearchError::InvalidQuery(format!(
                "unknown result type '{}'",
                other
            ))),
        }
    }
}

/// Inbound search request, as a transport layer would deserialize it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text query
    pub query: String,

    /// Total result budget (default: 10)
    #[serde(default = "default_total_limit")]
    pub limit: usize,

    /// Collection types to search (default: all)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,

    /// Collection-specific filters, e.g. `entity_type` or `document_classification`
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub filters: HashMap<String, String>,

    /// Exact per-collection caps, replacing the even split
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_limit: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_limit: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel_limit: Option<usize>,

    /// Surface per-collection failures as `warnings`
    #[serde(default)]
    pub verbose: bool,
}

fn default_total_limit() -> usize {
    DEFAULT_TOTAL_LIMIT
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: DEFAULT_TOTAL_LIMIT,
            types: None,
            filters: HashMap::new(),
            doc_limit: None,
            entity_limit: None,
            rel_limit: None,
            verbose: false,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn with_collection_limit(mut self, collection: CollectionType, limit: usize) -> Self {
        match collection {
            CollectionType::Document => self.doc_limit = Some(limit),
            CollectionType::Entity => self.entity_limit = Some(limit),
            CollectionType::Relationship => self.rel_limit = Some(limit),
        }
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Validate the request and build an immutable [`Query`].
    pub fn to_query(&self) -> Result<Query, SearchError> {
        let text = self.query.trim();
        if text.is_empty() {
            return Err(SearchError::InvalidQuery("query text is empty".to_string()));
        }
        if self.limit == 0 {
            return Err(SearchError::InvalidQuery(
                "limit must be greater than zero".to_string(),
            ));
        }

        let result_types: BTreeSet<CollectionType> = match &self.types {
            Some(names) if !names.is_empty() => names
                .iter()
                .map(|name| name.parse::<CollectionType>())
                .collect::<Result<_, _>>()?,
            _ => CollectionType::ALL.into_iter().collect(),
        };

        let mut per_collection_limit = BTreeMap::new();
        for (collection, limit) in [
            (CollectionType::Document, self.doc_limit),
            (CollectionType::Entity, self.entity_limit),
            (CollectionType::Relationship, self.rel_limit),
        ] {
            if let Some(limit) = limit {
                if limit == 0 {
                    return Err(SearchError::InvalidQuery(format!(
                        "{} limit must be greater than zero",
                        collection
                    )));
                }
                per_collection_limit.insert(collection, limit);
            }
        }

        Ok(Query {
            text: text.to_string(),
            result_types,
            total_limit: self.limit,
            per_collection_limit,
            filters: self.filters.clone(),
        })
    }
}

/// A validated query. Consumed read-only by every downstream stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    text: String,
    result_types: BTreeSet<CollectionType>,
    total_limit: usize,
    per_collection_limit: BTreeMap<CollectionType, usize>,
    filters: HashMap<String, String>,
}

impl Query {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn result_types(&self) -> &BTreeSet<CollectionType> {
        &self.result_types
    }

    pub fn total_limit(&self) -> usize {
        self.total_limit
    }

    pub fn per_collection_limit(&self) -> &BTreeMap<CollectionType, usize> {
        &self.per_collection_limit
    }

    pub fn limit_override(&self, collection: CollectionType) -> Option<usize> {
        self.per_collection_limit.get(&collection).copied()
    }

    pub fn filters(&self) -> &HashMap<String, String> {
        &self.filters
    }
}

/// An adapter's hit, before score normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMatch {
    pub collection: CollectionType,
    pub id: String,
    /// Adapter-specific distance (lower = closer)
    pub distance: f64,
    pub name: String,
    /// Already truncated to [`PREVIEW_MAX_CHARS`]
    pub preview: String,
    pub metadata: Metadata,
}

/// A normalized, cross-collection comparable search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    #[serde(rename = "type")]
    pub collection: CollectionType,
    pub id: String,
    pub name: String,
    /// Relevance in [0, 1], higher = better
    pub score: f64,
    pub preview: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Why a collection call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Unavailable,
    Timeout,
    Backend,
}

/// A collection that failed during a request. Does not block the response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionFailure {
    pub collection: CollectionType,
    pub reason: String,
    pub kind: FailureKind,
}

/// Final response envelope. Built once per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Query text as searched, with surrounding whitespace trimmed
    pub query: String,
    pub total_results: usize,
    pub results: Vec<ScoredResult>,
    pub facets: Facets,
    /// Per-collection failures, present only for verbose requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<CollectionFailure>>,
}
