//! Collection adapters.
//!
//! Each adapter wraps one backing [`VectorCollection`] and translates its
//! native hits into [`RawMatch`] values:
//! - `DocumentAdapter`: source documents and chunks
//! - `EntityAdapter`: extracted entities (people, organizations, places)
//! - `RelationshipAdapter`: edges between entities
//!
//! The dispatcher only sees `dyn CollectionAdapter` and never branches on
//! the concrete type.

mod document;
mod entity;
mod relationship;

pub use document::DocumentAdapter;
pub use entity::EntityAdapter;
pub use relationship::RelationshipAdapter;

use crate::config::SearchConfig;
use crate::error::{BackendError, CollectionError, ConfigError};
use crate::normalize::ScoreNormalizer;
use crate::types::{CollectionType, Metadata, RawMatch, PREVIEW_MAX_CHARS};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// The query primitive every backing store must expose.
///
/// `filter` is a Chroma-style `where` clause: `{"key": "value"}`, or
/// `{"$and": [...]}` / `{"$or": [...]}` over such clauses.
#[async_trait]
pub trait VectorCollection: Send + Sync {
    /// Name of the underlying collection, used in logs.
    fn name(&self) -> &str;

    async fn query_by_text(
        &self,
        text: &str,
        n_results: usize,
        filter: Option<&Value>,
    ) -> Result<Vec<CollectionHit>, BackendError>;
}

/// One hit returned by a [`VectorCollection`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionHit {
    pub id: String,
    pub distance: f64,

    /// Stored text for the hit, if the backend keeps it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,

    #[serde(default)]
    pub metadata: Metadata,
}

impl CollectionHit {
    pub fn new(id: impl Into<String>, distance: f64) -> Self {
        Self {
            id: id.into(),
            distance,
            document: None,
            metadata: Metadata::new(),
        }
    }

    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.document = Some(document.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Capability interface implemented once per collection type.
#[async_trait]
pub trait CollectionAdapter: Send + Sync {
    fn collection_type(&self) -> CollectionType;

    /// Normalizer matching this adapter's distance metric.
    fn normalizer(&self) -> ScoreNormalizer;

    /// Query the backing collection.
    ///
    /// Returns at most `limit` matches. Filter keys this collection does not
    /// understand are ignored. Fails with [`CollectionError::Unavailable`]
    /// when there is no backing collection.
    async fn query(
        &self,
        text: &str,
        limit: usize,
        filters: &HashMap<String, String>,
    ) -> Result<Vec<RawMatch>, CollectionError>;
}

/// Build the standard three adapters, applying per-collection distance
/// scales from `config`. `None` handles produce adapters that report the
/// collection as unavailable.
pub fn default_adapters(
    documents: Option<Arc<dyn VectorCollection>>,
    entities: Option<Arc<dyn VectorCollection>>,
    relationships: Option<Arc<dyn VectorCollection>>,
    config: &SearchConfig,
) -> Result<Vec<Arc<dyn CollectionAdapter>>, ConfigError> {
    let adapters: Vec<Arc<dyn CollectionAdapter>> = vec![
        Arc::new(
            DocumentAdapter::from_handle(documents)
                .with_normalizer(config.normalizer_for(CollectionType::Document)?),
        ),
        Arc::new(
            EntityAdapter::from_handle(entities)
                .with_normalizer(config.normalizer_for(CollectionType::Entity)?),
        ),
        Arc::new(
            RelationshipAdapter::from_handle(relationships)
                .with_normalizer(config.normalizer_for(CollectionType::Relationship)?),
        ),
    ];
    Ok(adapters)
}

/// Run the backend query and cap the hits at `limit`.
async fn fetch_hits(
    handle: Option<&Arc<dyn VectorCollection>>,
    collection: CollectionType,
    text: &str,
    limit: usize,
    filter: Option<Value>,
) -> Result<Vec<CollectionHit>, CollectionError> {
    let handle = handle.ok_or_else(|| {
        CollectionError::Unavailable(format!("{} collection is not initialized", collection))
    })?;

    let mut hits = handle
        .query_by_text(text, limit, filter.as_ref())
        .await
        .map_err(CollectionError::from)?;

    if hits.len() > limit {
        tracing::debug!(
            collection = handle.name(),
            returned = hits.len(),
            limit,
            "Backend returned more hits than requested, truncating"
        );
        hits.truncate(limit);
    }

    Ok(hits)
}

/// Combine filter clauses into one `where` value.
fn where_clause(mut clauses: Vec<Value>) -> Option<Value> {
    match clauses.len() {
        0 => None,
        1 => clauses.pop(),
        _ => Some(json!({ "$and": clauses })),
    }
}

fn log_ignored_filters(
    collection: CollectionType,
    filters: &HashMap<String, String>,
    supported: &[&str],
) {
    for key in filters.keys() {
        if !supported.contains(&key.as_str()) {
            tracing::debug!(%collection, filter = %key, "Ignoring unsupported filter");
        }
    }
}

/// Collapse whitespace and cut to [`PREVIEW_MAX_CHARS`] characters.
pub(crate) fn truncate_preview(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= PREVIEW_MAX_CHARS {
        return collapsed;
    }
    let mut cut: String = collapsed.chars().take(PREVIEW_MAX_CHARS - 3).collect();
    cut.push_str("...");
    cut
}

fn meta_str<'a>(metadata: &'a Metadata, key: &str) -> Option<&'a str> {
    metadata
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
}

/// Copy `from` into `to` under the canonical key, skipping nulls.
fn copy_field(source: &Metadata, target: &mut Metadata, from: &str, to: &str) {
    if let Some(value) = source.get(from) {
        if !value.is_null() {
            target.insert(to.to_string(), value.clone());
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Canned backend that records the filter it was queried with.
    pub struct StubCollection {
        pub hits: Vec<CollectionHit>,
        pub last_filter: Mutex<Option<Value>>,
        pub last_n_results: Mutex<Option<usize>>,
    }

    impl StubCollection {
        pub fn new(hits: Vec<CollectionHit>) -> Arc<Self> {
            Arc::new(Self {
                hits,
                last_filter: Mutex::new(None),
                last_n_results: Mutex::new(None),
            })
        }

        pub fn last_filter(&self) -> Option<Value> {
            self.last_filter.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VectorCollection for StubCollection {
        fn name(&self) -> &str {
            "stub"
        }

        async fn query_by_text(
            &self,
            _text: &str,
            n_results: usize,
            filter: Option<&Value>,
        ) -> Result<Vec<CollectionHit>, BackendError> {
            *self.last_filter.lock().unwrap() = filter.cloned();
            *self.last_n_results.lock().unwrap() = Some(n_results);
            // Ignores n_results so adapters must cap on their own.
            Ok(self.hits.clone())
        }
    }
}
