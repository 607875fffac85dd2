use super::{
    copy_field, fetch_hits, log_ignored_filters, meta_str, truncate_preview, where_clause,
    CollectionAdapter, CollectionHit, VectorCollection,
};
use crate::error::CollectionError;
use crate::normalize::ScoreNormalizer;
use crate::types::{CollectionType, Metadata, RawMatch};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

const SUPPORTED_FILTERS: &[&str] = &["document_classification", "source"];

/// Adapter over the document chunk collection.
pub struct DocumentAdapter {
    collection: Option<Arc<dyn VectorCollection>>,
    normalizer: ScoreNormalizer,
}

impl DocumentAdapter {
    pub fn new(collection: Arc<dyn VectorCollection>) -> Self {
        Self::from_handle(Some(collection))
    }

    /// Adapter whose backing collection has not been created yet.
    pub fn uninitialized() -> Self {
        Self::from_handle(None)
    }

    pub fn from_handle(collection: Option<Arc<dyn VectorCollection>>) -> Self {
        Self {
            collection,
            normalizer: ScoreNormalizer::default(),
        }
    }

    pub fn with_normalizer(mut self, normalizer: ScoreNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    fn to_raw_match(hit: CollectionHit) -> RawMatch {
        let name = meta_str(&hit.metadata, "title")
            .or_else(|| meta_str(&hit.metadata, "filename"))
            .unwrap_or(&hit.id)
            .to_string();
        let preview = truncate_preview(hit.document.as_deref().unwrap_or_default());

        let mut metadata = Metadata::new();
        copy_field(&hit.metadata, &mut metadata, "classification", "document_classification");
        copy_field(&hit.metadata, &mut metadata, "source", "source");
        copy_field(&hit.metadata, &mut metadata, "filename", "filename");
        copy_field(&hit.metadata, &mut metadata, "page", "page");

        RawMatch {
            collection: CollectionType::Document,
            id: hit.id,
            distance: hit.distance,
            name,
            preview,
            metadata,
        }
    }
}

#[async_trait]
impl CollectionAdapter for DocumentAdapter {
    fn collection_type(&self) -> CollectionType {
        CollectionType::Document
    }

    fn normalizer(&self) -> ScoreNormalizer {
        self.normalizer
    }

    async fn query(
        &self,
        text: &str,
        limit: usize,
        filters: &HashMap<String, String>,
    ) -> Result<Vec<RawMatch>, CollectionError> {
        log_ignored_filters(CollectionType::Document, filters, SUPPORTED_FILTERS);

        let mut clauses = Vec::new();
        if let Some(classification) = filters.get("document_classification") {
            clauses.push(json!({ "classification": classification }));
        }
        if let Some(source) = filters.get("source") {
            clauses.push(json!({ "source": source }));
        }

        let hits = fetch_hits(
            self.collection.as_ref(),
            CollectionType::Document,
            text,
            limit,
            where_clause(clauses),
        )
        .await?;

        Ok(hits.into_iter().map(Self::to_raw_match).collect())
    }
}
