#![allow(dead_code)]

use async_trait::async_trait;
use polysearch_core::{
    BackendError, CollectionAdapter, CollectionHit, DocumentAdapter, EntityAdapter,
    RelationshipAdapter, VectorCollection,
};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// In-memory backend with fixed distances and Chroma-style `where` support.
pub struct FakeCollection {
    name: String,
    hits: Vec<CollectionHit>,
    delay: Option<Duration>,
    error: Option<String>,
    calls: AtomicUsize,
}

impl FakeCollection {
    pub fn new(name: &str, hits: Vec<CollectionHit>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            hits,
            delay: None,
            error: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(name: &str, error: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            hits: Vec::new(),
            delay: None,
            error: Some(error.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn slow(name: &str, hits: Vec<CollectionHit>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            hits,
            delay: Some(delay),
            error: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn matches_filter(hit: &CollectionHit, filter: &Value) -> bool {
    let Some(clause) = filter.as_object() else {
        return true;
    };
    clause.iter().all(|(key, expected)| match key.as_str() {
        "$and" => expected
            .as_array()
            .map(|parts| parts.iter().all(|p| matches_filter(hit, p)))
            .unwrap_or(true),
        "$or" => expected
            .as_array()
            .map(|parts| parts.iter().any(|p| matches_filter(hit, p)))
            .unwrap_or(true),
        _ => hit.metadata.get(key) == Some(expected),
    })
}

#[async_trait]
impl VectorCollection for FakeCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn query_by_text(
        &self,
        _text: &str,
        n_results: usize,
        filter: Option<&Value>,
    ) -> Result<Vec<CollectionHit>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.error {
            return Err(BackendError::Query(error.clone()));
        }

        let mut hits: Vec<_> = self
            .hits
            .iter()
            .filter(|hit| filter.map(|f| matches_filter(hit, f)).unwrap_or(true))
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(n_results);
        Ok(hits)
    }
}

pub fn documents() -> Vec<CollectionHit> {
    let classifications = ["email", "flight_log", "deposition"];
    (0..8)
        .map(|i| {
            CollectionHit::new(format!("doc-{}", i), 0.3 + i as f64 * 0.15)
                .with_document(format!("Document {} mentions Epstein and travel records.", i))
                .with_metadata("filename", format!("file_{}.pdf", i))
                .with_metadata("classification", classifications[i % 3])
        })
        .collect()
}

pub fn entities() -> Vec<CollectionHit> {
    let types = ["person", "organization", "location"];
    (0..8)
        .map(|i| {
            CollectionHit::new(format!("ent-{}", i), 0.25 + i as f64 * 0.2)
                .with_metadata("name", format!("Entity {}", i))
                .with_metadata("entity_type", types[i % 3])
                .with_metadata("description", format!("Entity {} description", i))
        })
        .collect()
}

pub fn relationships() -> Vec<CollectionHit> {
    (0..8)
        .map(|i| {
            CollectionHit::new(format!("rel-{}", i), 0.35 + i as f64 * 0.1)
                .with_document(format!("Entity {} knows Entity {}", i, i + 1))
                .with_metadata("source_entity", format!("Entity {}", i))
                .with_metadata("target_entity", format!("Entity {}", i + 1))
                .with_metadata("relationship_type", "KNOWS")
        })
        .collect()
}

pub fn adapters(
    docs: Arc<FakeCollection>,
    ents: Arc<FakeCollection>,
    rels: Arc<FakeCollection>,
) -> Vec<Arc<dyn CollectionAdapter>> {
    vec![
        Arc::new(DocumentAdapter::new(docs)),
        Arc::new(EntityAdapter::new(ents)),
        Arc::new(RelationshipAdapter::new(rels)),
    ]
}

pub fn healthy_adapters() -> Vec<Arc<dyn CollectionAdapter>> {
    adapters(
        FakeCollection::new("documents", documents()),
        FakeCollection::new("entities", entities()),
        FakeCollection::new("relationships", relationships()),
    )
}
