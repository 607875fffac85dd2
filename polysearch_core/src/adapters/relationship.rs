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

const SUPPORTED_FILTERS: &[&str] = &["relationship_type", "entity"];

/// Adapter over the entity relationship collection.
///
/// The `entity` filter matches either participant of the relationship.
pub struct RelationshipAdapter {
    collection: Option<Arc<dyn VectorCollection>>,
    normalizer: ScoreNormalizer,
}

impl RelationshipAdapter {
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
        let source = meta_str(&hit.metadata, "source_entity");
        let target = meta_str(&hit.metadata, "target_entity");
        let name = match (source, target) {
            (Some(source), Some(target)) => {
                let verb = meta_str(&hit.metadata, "relationship_type")
                    .map(|t| t.replace('_', " ").to_lowercase())
                    .unwrap_or_else(|| "related to".to_string());
                format!("{} {} {}", source, verb, target)
            }
            _ => hit.id.clone(),
        };
        let preview = truncate_preview(
            meta_str(&hit.metadata, "context")
                .or(hit.document.as_deref())
                .unwrap_or_default(),
        );

        let mut metadata = Metadata::new();
        copy_field(&hit.metadata, &mut metadata, "relationship_type", "relationship_type");
        copy_field(&hit.metadata, &mut metadata, "source_entity", "source_entity");
        copy_field(&hit.metadata, &mut metadata, "target_entity", "target_entity");

        RawMatch {
            collection: CollectionType::Relationship,
            id: hit.id,
            distance: hit.distance,
            name,
            preview,
            metadata,
        }
    }
}

#[async_trait]
impl CollectionAdapter for RelationshipAdapter {
    fn collection_type(&self) -> CollectionType {
        CollectionType::Relationship
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
        log_ignored_filters(CollectionType::Relationship, filters, SUPPORTED_FILTERS);

        let mut clauses = Vec::new();
        if let Some(relationship_type) = filters.get("relationship_type") {
            clauses.push(json!({ "relationship_type": relationship_type }));
        }
        if let Some(entity) = filters.get("entity") {
            clauses.push(json!({
                "$or": [
                    { "source_entity": entity },
                    { "target_entity": entity },
                ]
            }));
        }

        let hits = fetch_hits(
            self.collection.as_ref(),
            CollectionType::Relationship,
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
    async fn test_relationship_mapping() {
        let stub = StubCollection::new(vec![
            CollectionHit::new("rel-1", 0.3)
                .with_document("Alice and Bob met in 2002.")
                .with_metadata("source_entity", "Alice")
                .with_metadata("target_entity", "Bob")
                .with_metadata("relationship_type", "ASSOCIATED_WITH"),
            CollectionHit::new("rel-2", 0.8).with_metadata("context", "Unlabeled edge"),
        ]);
        let adapter = RelationshipAdapter::new(stub);

        let matches = adapter.query("alice", 10, &HashMap::new()).await.unwrap();
        assert_eq!(matches[0].name, "Alice associated with Bob");
        assert_eq!(matches[0].preview, "Alice and Bob met in 2002.");
        assert_eq!(matches[0].metadata["relationship_type"], "ASSOCIATED_WITH");
        assert_eq!(matches[0].metadata["target_entity"], "Bob");

        assert_eq!(matches[1].name, "rel-2");
        assert_eq!(matches[1].preview, "Unlabeled edge");
    }

    #[tokio::test]
    async fn test_combined_filters() {
        let stub = StubCollection::new(Vec::new());
        let adapter = RelationshipAdapter::new(stub.clone());

        let mut filters = HashMap::new();
        filters.insert("relationship_type".to_string(), "EMPLOYED_BY".to_string());
        filters.insert("entity".to_string(), "Alice".to_string());

        let matches = adapter.query("alice", 5, &filters).await.unwrap();
        assert!(matches.is_empty());
        assert_eq!(
            stub.last_filter(),
            Some(json!({"$and": [
                {"relationship_type": "EMPLOYED_BY"},
                {"$or": [{"source_entity": "Alice"}, {"target_entity": "Alice"}]}
            ]}))
        );
    }
}
