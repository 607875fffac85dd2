// src/error.rs
use crate::types::{CollectionFailure, CollectionType, FailureKind};

/// Request-level failures returned by [`crate::HybridSearchService::search`].
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("All backends unavailable ({} collection(s) failed)", failures.len())]
    AllBackendsUnavailable { failures: Vec<CollectionFailure> },
}

impl SearchError {
    pub fn code_str(&self) -> &'static str {
        match self {
            SearchError::InvalidQuery(_) => "invalid_query",
            SearchError::AllBackendsUnavailable { .. } => "all_backends_unavailable",
        }
    }
}

/// Failure of a single collection call. Never aborts a request on its own.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CollectionError {
    #[error("Collection unavailable: {0}")]
    Unavailable(String),

    #[error("Timeout after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("Backend error: {0}")]
    Backend(String),
}

impl CollectionError {
    pub fn code_str(&self) -> &'static str {
        match self {
            CollectionError::Unavailable(_) => "collection_unavailable",
            CollectionError::Timeout { .. } => "collection_timeout",
            CollectionError::Backend(_) => "upstream_error",
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            CollectionError::Unavailable(_) => FailureKind::Unavailable,
            CollectionError::Timeout { .. } => FailureKind::Timeout,
            CollectionError::Backend(_) => FailureKind::Backend,
        }
    }

    /// Record this error against the collection it came from.
    pub fn into_failure(self, collection: CollectionType) -> CollectionFailure {
        CollectionFailure {
            collection,
            kind: self.kind(),
            reason: self.to_string(),
        }
    }
}

/// Error surfaced by a [`crate::adapters::VectorCollection`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Collection not initialized: {0}")]
    NotInitialized(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<BackendError> for CollectionError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotInitialized(msg) => CollectionError::Unavailable(msg),
            other => CollectionError::Backend(other.to_string()),
        }
    }
}

/// Errors from loading or saving engine configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
