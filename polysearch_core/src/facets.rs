//! Facet counts over the final result list.

use crate::types::{Facets, ScoredResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Facet counting results per collection type. Always present for a
/// non-empty result list.
pub const BY_TYPE: &str = "by_type";

/// A metadata key that produces a facet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetDimension {
    /// Metadata key read from each result
    pub key: String,

    /// Facet name in the response (e.g. `by_entity_type`)
    pub facet: String,
}

impl FacetDimension {
    /// Dimension named `by_<key>`.
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            facet: format!("by_{}", key),
            key,
        }
    }
}

pub(crate) fn default_dimensions() -> Vec<FacetDimension> {
    vec![
        FacetDimension::new("entity_type"),
        FacetDimension::new("document_classification"),
        FacetDimension::new("relationship_type"),
    ]
}

/// Counts results by type and by each configured metadata dimension.
///
/// A dimension facet is only emitted when at least one result carries its
/// key, and its counts always sum to the number of results that do.
#[derive(Debug, Clone)]
pub struct FacetAggregator {
    dimensions: Vec<FacetDimension>,
}

impl Default for FacetAggregator {
    fn default() -> Self {
        Self::new(default_dimensions())
    }
}

impl FacetAggregator {
    pub fn new(dimensions: Vec<FacetDimension>) -> Self {
        Self { dimensions }
    }

    pub fn aggregate(&self, results: &[ScoredResult]) -> Facets {
        let mut facets = Facets::new();

        for result in results {
            *facets
                .entry(BY_TYPE.to_string())
                .or_default()
                .entry(result.collection.as_str().to_string())
                .or_default() += 1;
        }

        for dimension in &self.dimensions {
            let mut counts: BTreeMap<String, usize> = BTreeMap::new();
            for result in results {
                if let Some(value) = result.metadata.get(&dimension.key).and_then(facet_value) {
                    *counts.entry(value).or_default() += 1;
                }
            }
            if !counts.is_empty() {
                facets.insert(dimension.facet.clone(), counts);
            }
        }

        facets
    }
}

/// Scalar metadata values become facet buckets; null and nested values
/// do not count as carrying the key.
fn facet_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CollectionType, Metadata};
    use serde_json::json;

    fn result(collection: CollectionType, id: &str, metadata: Value) -> ScoredResult {
        let metadata: Metadata = match metadata {
            Value::Object(map) => map,
            _ => Metadata::new(),
        };
        ScoredResult {
            collection,
            id: id.to_string(),
            name: id.to_string(),
            score: 0.5,
            preview: String::new(),
            metadata,
        }
    }

    #[test]
    fn test_by_type_and_dimensions() {
        let results = vec![
            result(CollectionType::Entity, "e1", json!({"entity_type": "person"})),
            result(CollectionType::Entity, "e2", json!({"entity_type": "person"})),
            result(CollectionType::Entity, "e3", json!({"entity_type": "organization"})),
            result(
                CollectionType::Document,
                "d1",
                json!({"document_classification": "email"}),
            ),
            result(CollectionType::Document, "d2", json!({})),
        ];

        let facets = FacetAggregator::default().aggregate(&results);

        assert_eq!(facets[BY_TYPE]["entity"], 3);
        assert_eq!(facets[BY_TYPE]["document"], 2);
        assert!(facets[BY_TYPE].get("relationship").is_none());
        assert_eq!(facets["by_entity_type"]["person"], 2);
        assert_eq!(facets["by_entity_type"]["organization"], 1);
        assert_eq!(facets["by_document_classification"]["email"], 1);
        assert!(facets.get("by_relationship_type").is_none());
    }

    #[test]
    fn test_facet_sums_match_carriers() {
        let results = vec![
            result(CollectionType::Entity, "e1", json!({"entity_type": "person"})),
            result(CollectionType::Entity, "e2", json!({"entity_type": null})),
            result(CollectionType::Entity, "e3", json!({"entity_type": ["nested"]})),
            result(CollectionType::Relationship, "r1", json!({"relationship_type": "KNOWS"})),
        ];
        let aggregator = FacetAggregator::default();
        let facets = aggregator.aggregate(&results);

        let type_total: usize = facets[BY_TYPE].values().sum();
        assert_eq!(type_total, results.len());

        for dimension in default_dimensions() {
            let carriers = results
                .iter()
                .filter(|r| r.metadata.get(&dimension.key).and_then(facet_value).is_some())
                .count();
            let total: usize = facets
                .get(&dimension.facet)
                .map(|counts| counts.values().sum())
                .unwrap_or(0);
            assert_eq!(total, carriers, "facet {}", dimension.facet);
        }
    }

    #[test]
    fn test_custom_dimension_and_empty_results() {
        let aggregator = FacetAggregator::new(vec![FacetDimension::new("source")]);
        assert!(aggregator.aggregate(&[]).is_empty());

        let facets = aggregator.aggregate(&[result(
            CollectionType::Document,
            "d1",
            json!({"source": "court", "entity_type": "person"}),
        )]);
        assert_eq!(facets["by_source"]["court"], 1);
        assert!(facets.get("by_entity_type").is_none());
    }
}
