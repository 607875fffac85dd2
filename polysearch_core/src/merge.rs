//! Global ranking of per-collection matches.

use crate::config::DEFAULT_COLLECTION_PRIORITY;
use crate::normalize::ScoreNormalizer;
use crate::types::{CollectionType, RawMatch, ScoredResult};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Normalizes matches and merges them into one ranked list.
///
/// Ordering is score descending, then collection priority, then id, so the
/// output depends only on the input content and never on the order in which
/// collections answered.
#[derive(Debug, Clone)]
pub struct ResultMerger {
    normalizers: HashMap<CollectionType, ScoreNormalizer>,
    priority: Vec<CollectionType>,
}

impl Default for ResultMerger {
    fn default() -> Self {
        Self::new(DEFAULT_COLLECTION_PRIORITY.to_vec())
    }
}

impl ResultMerger {
    /// Create a merger with the given tie-break order, highest first.
    pub fn new(priority: Vec<CollectionType>) -> Self {
        Self {
            normalizers: HashMap::new(),
            priority,
        }
    }

    /// Builder method to set the normalizer for a collection.
    pub fn with_normalizer(mut self, collection: CollectionType, normalizer: ScoreNormalizer) -> Self {
        self.normalizers.insert(collection, normalizer);
        self
    }

    fn priority_rank(&self, collection: CollectionType) -> usize {
        self.priority
            .iter()
            .position(|c| *c == collection)
            .unwrap_or(self.priority.len())
    }

    fn compare(&self, a: &ScoredResult, b: &ScoredResult) -> Ordering {
        b.score
            .total_cmp(&a.score)
            .then_with(|| {
                self.priority_rank(a.collection)
                    .cmp(&self.priority_rank(b.collection))
            })
            .then_with(|| a.id.cmp(&b.id))
    }

    /// Convert one match into a scored result.
    pub fn normalize(&self, raw: RawMatch) -> ScoredResult {
        let score = self
            .normalizers
            .get(&raw.collection)
            .copied()
            .unwrap_or_default()
            .normalize(raw.distance);

        ScoredResult {
            collection: raw.collection,
            id: raw.id,
            name: raw.name,
            score,
            preview: raw.preview,
            metadata: raw.metadata,
        }
    }

    /// Merge all collections into one list of at most `total_limit` results.
    pub fn merge(
        &self,
        raw: HashMap<CollectionType, Vec<RawMatch>>,
        total_limit: usize,
    ) -> Vec<ScoredResult> {
        self.merge_with_caps(raw, total_limit, &BTreeMap::new())
    }

    /// Like [`merge`](Self::merge), but first keeps only the best `cap`
    /// results of each collection listed in `caps`.
    pub fn merge_with_caps(
        &self,
        raw: HashMap<CollectionType, Vec<RawMatch>>,
        total_limit: usize,
        caps: &BTreeMap<CollectionType, usize>,
    ) -> Vec<ScoredResult> {
        // Concatenate in key order so the stable sort sees the same input
        // regardless of HashMap iteration order.
        let mut by_collection: Vec<_> = raw.into_iter().collect();
        by_collection.sort_by_key(|(collection, _)| *collection);

        let mut merged = Vec::new();
        for (collection, matches) in by_collection {
            let mut scored: Vec<ScoredResult> =
                matches.into_iter().map(|m| self.normalize(m)).collect();

            if let Some(&cap) = caps.get(&collection) {
                scored.sort_by(|a, b| self.compare(a, b));
                scored.truncate(cap);
            }

            merged.extend(scored);
        }

        merged.sort_by(|a, b| self.compare(a, b));
        merged.truncate(total_limit);
        merged
    }
}
