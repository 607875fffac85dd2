//! Concurrent fan-out of one query to every active collection.

use crate::adapters::CollectionAdapter;
use crate::config::SearchConfig;
use crate::error::CollectionError;
use crate::types::{CollectionFailure, CollectionType, Query, RawMatch};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout_at;
use tracing::{debug, warn};

/// Per-collection matches and failures of one dispatch.
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// Matches keyed by collection. Treated as unordered downstream.
    pub matches: HashMap<CollectionType, Vec<RawMatch>>,

    /// Collections that errored or missed the deadline, sorted by collection
    pub failures: Vec<CollectionFailure>,
}

impl DispatchOutcome {
    /// Check if every queried collection failed.
    pub fn all_failed(&self) -> bool {
        self.matches.is_empty() && !self.failures.is_empty()
    }

    pub fn candidate_count(&self) -> usize {
        self.matches.values().map(Vec::len).sum()
    }
}

/// Issues a query to all registered adapters concurrently.
pub struct QueryDispatcher {
    adapters: BTreeMap<CollectionType, Arc<dyn CollectionAdapter>>,
    timeout: Duration,
    overfetch_factor: usize,
}

impl QueryDispatcher {
    /// Create a dispatcher. A later adapter for the same collection type
    /// replaces an earlier one.
    pub fn new(adapters: Vec<Arc<dyn CollectionAdapter>>, config: &SearchConfig) -> Self {
        let mut by_type = BTreeMap::new();
        for adapter in adapters {
            let collection = adapter.collection_type();
            if by_type.insert(collection, adapter).is_some() {
                warn!(
                    target: "polysearch.dispatch",
                    %collection,
                    "Duplicate adapter registered, keeping the last one"
                );
            }
        }

        Self {
            adapters: by_type,
            timeout: config.timeout(),
            overfetch_factor: config.overfetch_factor.max(1),
        }
    }

    pub fn adapters(&self) -> impl Iterator<Item = &Arc<dyn CollectionAdapter>> {
        self.adapters.values()
    }

    /// Requested collection types that have a registered adapter.
    pub fn active_collections(&self, query: &Query) -> Vec<CollectionType> {
        query
            .result_types()
            .iter()
            .copied()
            .filter(|c| self.adapters.contains_key(c))
            .collect()
    }

    /// Number of candidates to request from one collection.
    ///
    /// An explicit override is used as-is. Otherwise the collection gets its
    /// even share of the total budget, rounded up, times the overfetch factor.
    pub fn call_limit(&self, query: &Query, collection: CollectionType, active_count: usize) -> usize {
        if let Some(limit) = query.limit_override(collection) {
            return limit;
        }
        query
            .total_limit()
            .div_ceil(active_count.max(1))
            .saturating_mul(self.overfetch_factor)
    }

    /// Query every active collection under one shared deadline.
    pub async fn dispatch(&self, query: &Query) -> DispatchOutcome {
        let active = self.active_collections(query);
        let active_count = active.len();
        let deadline = tokio::time::Instant::now() + self.timeout;
        let timeout_ms = self.timeout.as_millis() as u64;

        let futures: Vec<_> = active
            .iter()
            .filter_map(|collection| self.adapters.get(collection).map(|a| (*collection, a)))
            .map(|(collection, adapter)| {
                let limit = self.call_limit(query, collection, active_count);
                let adapter = Arc::clone(adapter);

                async move {
                    let start = Instant::now();

                    let result = match timeout_at(
                        deadline,
                        adapter.query(query.text(), limit, query.filters()),
                    )
                    .await
                    {
                        Ok(result) => result,
                        Err(_) => Err(CollectionError::Timeout { after_ms: timeout_ms }),
                    };

                    let elapsed_ms = start.elapsed().as_millis() as u64;
                    match &result {
                        Ok(matches) => debug!(
                            target: "polysearch.dispatch",
                            %collection,
                            limit,
                            count = matches.len(),
                            elapsed_ms,
                            "Collection query finished"
                        ),
                        Err(e) => warn!(
                            target: "polysearch.dispatch",
                            %collection,
                            code = e.code_str(),
                            elapsed_ms,
                            "Collection query failed: {}",
                            e
                        ),
                    }

                    (collection, result)
                }
            })
            .collect();

        let results = futures::future::join_all(futures).await;

        let mut outcome = DispatchOutcome::default();
        for (collection, result) in results {
            match result {
                Ok(matches) => {
                    outcome.matches.insert(collection, matches);
                }
                Err(e) => outcome.failures.push(e.into_failure(collection)),
            }
        }
        outcome.failures.sort_by_key(|f| f.collection);

        outcome
    }
}
