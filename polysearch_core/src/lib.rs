//! Hybrid multi-collection semantic search.
//!
//! One free-text query is fanned out concurrently to independently indexed
//! collections (documents, entities, relationships). Their distances are
//! normalized onto a shared [0, 1] scale, merged into a single ranked list
//! under a result budget, and summarized with facets. A collection that fails
//! or misses the deadline degrades the response instead of failing it.
//!
//! # Example
//!
//! ```ignore
//! use polysearch_core::adapters::default_adapters;
//! use polysearch_core::{ConfigStore, HybridSearchService, SearchRequest};
//!
//! let config = ConfigStore::new_default().load()?;
//! let adapters = default_adapters(Some(docs), Some(entities), Some(relationships), &config)?;
//! let service = HybridSearchService::new(adapters, config)?;
//! let response = service
//!     .search(SearchRequest::new("flight logs").with_limit(10))
//!     .await?;
//! ```

pub mod adapters;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod facets;
pub mod merge;
pub mod normalize;
pub mod service;
pub mod types;

pub use adapters::{
    CollectionAdapter, CollectionHit, DocumentAdapter, EntityAdapter, RelationshipAdapter,
    VectorCollection,
};
pub use config::{
    ConfigStore, SearchConfig, DEFAULT_COLLECTION_PRIORITY, DEFAULT_OVERFETCH_FACTOR,
    DEFAULT_TIMEOUT_MS,
};
pub use dispatch::{DispatchOutcome, QueryDispatcher};
pub use error::{BackendError, CollectionError, ConfigError, SearchError};
pub use facets::{FacetAggregator, FacetDimension, BY_TYPE};
pub use merge::ResultMerger;
pub use normalize::{ScoreNormalizer, DEFAULT_MAX_DISTANCE};
pub use service::{HybridSearchService, HybridSearchServiceBuilder};
pub use types::{
    CollectionFailure, CollectionType, Facets, FailureKind, Metadata, Query, RawMatch,
    ScoredResult, SearchRequest, SearchResponse, DEFAULT_TOTAL_LIMIT, PREVIEW_MAX_CHARS,
};
