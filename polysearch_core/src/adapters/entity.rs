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

const SUPPORTED_FILTERS: &[&str] = &["entity_type"];

/// Adapter over the extracted entity collection.
pub struct EntityAdapter {
    collection: Option<Arc<dyn VectorCollection>>,
    normalizer: ScoreNormalizer,
}

impl EntityAdapter {
    pub fn new(collection: Arc<dyn VectorCollection>) -> Self {
        Self::from_handle(Some(collection))
    }

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
        let name = meta_str(&hit.metadata, "name")
            .unwrap_or(&hit.id)
            .to_string();
        let preview = truncate_preview(
            meta_str(&hit.metadata, "description")
                .or(hit.document.as_deref())
                .unwrap_or_default(),
        );

        let mut metadata = Metadata::new();
        copy_field(&hit.metadata, &mut metadata, "entity_type", "entity_type");
        copy_field(&hit.metadata, &mut metadata, "aliases", "aliases");
        copy_field(&hit.metadata, &mut metadata, "mention_count", "mention_count");

        RawMatch {
            collection: CollectionType::Entity,
            id: hit.id,
            distance: hit.distance,
            name,
            preview,
            metadata,
        }
    }
}

#[async_trait]
impl CollectionAdapter for EntityAdapter {
    fn collection_type(&self) -> CollectionType {
        CollectionType::Entity
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
        log_ignored_filters(CollectionType::Entity, filters, SUPPORTED_FILTERS);

        let clauses = filters
            .get("entity_type")
            .map(|entity_type| vec![json!({ "entity_type": entity_type })])
            .unwrap_or_default();

        let hits = fetch_hits(
            self.collection.as_ref(),
            CollectionType::Entity,
            text,
            limit,
            where_clause(clauses),
        )
        .await?;

        Ok(hits.into_iter().map(Self::to_raw_match).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::testing::StubCollection;

    #[tokio::test]
    async fn test_entity_mapping() {
        let stub = StubCollection::new(vec![
            CollectionHit::new("ent-7", 0.2)
                .with_document("Jane Doe, financier")
                .with_metadata("name", "Jane Doe")
                .with_metadata("entity_type", "person")
                .with_metadata("description", "Financier named in court filings.")
                .with_metadata("mention_count", 42),
            CollectionHit::new("ent-9", 0.6).with_document("Island property"),
        ]);
        let adapter = EntityAdapter::new(stub.clone());

        let mut filters = HashMap::new();
        filters.insert("entity_type".to_string(), "person".to_string());
        filters.insert("document_classification".to_string(), "email".to_string());

        let matches = adapter.query("jane", 10, &filters).await.unwrap();
        assert_eq!(stub.last_filter(), Some(json!({"entity_type": "person"})));

        assert_eq!(matches[0].name, "Jane Doe");
        assert_eq!(matches[0].preview, "Financier named in court filings.");
        assert_eq!(matches[0].metadata["entity_type"], "person");
        assert_eq!(matches[0].metadata["mention_count"], 42);

        assert_eq!(matches[1].name, "ent-9");
        assert_eq!(matches[1].preview, "Island property");
        assert!(matches[1].metadata.is_empty());
    }
}
