//! Public search entry point.
//!
//! Each call runs Validate → Dispatch → Normalize+Merge → Facet → Respond and
//! keeps no state between calls.

use crate::adapters::CollectionAdapter;
use crate::config::SearchConfig;
use crate::dispatch::QueryDispatcher;
use crate::error::{ConfigError, SearchError};
use crate::facets::FacetAggregator;
use crate::merge::ResultMerger;
use crate::types::{SearchRequest, SearchResponse};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Hybrid search over every registered collection.
///
/// Adapters are injected at construction; the service holds only read-only
/// handles, so one instance can serve concurrent requests.
pub struct HybridSearchService {
    dispatcher: QueryDispatcher,
    merger: ResultMerger,
    facets: FacetAggregator,
}

impl HybridSearchService {
    /// Create a service over `adapters`. Each adapter's own normalizer is used
    /// for its collection's scores.
    pub fn new(
        adapters: Vec<Arc<dyn CollectionAdapter>>,
        config: SearchConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let dispatcher = QueryDispatcher::new(adapters, &config);
        let merger = dispatcher.adapters().fold(
            ResultMerger::new(config.collection_priority.clone()),
            |merger, adapter| merger.with_normalizer(adapter.collection_type(), adapter.normalizer()),
        );

        Ok(Self {
            dispatcher,
            merger,
            facets: FacetAggregator::new(config.facet_dimensions),
        })
    }

    pub fn builder() -> HybridSearchServiceBuilder {
        HybridSearchServiceBuilder::default()
    }

    /// Run a search.
    ///
    /// Fails with [`SearchError::InvalidQuery`] before any backend call when
    /// the request is malformed, and with
    /// [`SearchError::AllBackendsUnavailable`] only when every active
    /// collection failed. Partial failures still produce a response.
    pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse, SearchError> {
        let start = Instant::now();
        let query = request.to_query()?;

        let active = self.dispatcher.active_collections(&query);
        if active.is_empty() {
            return Err(SearchError::InvalidQuery(format!(
                "no searchable collection among requested types: {}",
                query
                    .result_types()
                    .iter()
                    .map(|c| c.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        let outcome = self.dispatcher.dispatch(&query).await;
        if outcome.all_failed() {
            warn!(
                target: "polysearch.service",
                failed = outcome.failures.len(),
                "Every active collection failed"
            );
            return Err(SearchError::AllBackendsUnavailable {
                failures: outcome.failures,
            });
        }

        let candidates = outcome.candidate_count();
        let results = self.merger.merge_with_caps(
            outcome.matches,
            query.total_limit(),
            query.per_collection_limit(),
        );
        let facets = self.facets.aggregate(&results);

        info!(
            target: "polysearch.service",
            query_len = query.text().len(),
            active = active.len(),
            candidates,
            results = results.len(),
            failed = outcome.failures.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Search completed"
        );

        let warnings = (request.verbose && !outcome.failures.is_empty()).then_some(outcome.failures);

        Ok(SearchResponse {
            query: query.text().to_string(),
            total_results: results.len(),
            results,
            facets,
            warnings,
        })
    }
}

/// Builder for [`HybridSearchService`].
#[derive(Default)]
pub struct HybridSearchServiceBuilder {
    adapters: Vec<Arc<dyn CollectionAdapter>>,
    config: Option<SearchConfig>,
}

impl HybridSearchServiceBuilder {
    pub fn adapter(mut self, adapter: Arc<dyn CollectionAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    pub fn adapters<I>(mut self, adapters: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn CollectionAdapter>>,
    {
        self.adapters.extend(adapters);
        self
    }

    pub fn config(mut self, config: SearchConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Result<HybridSearchService, ConfigError> {
        HybridSearchService::new(self.adapters, self.config.unwrap_or_default())
    }
}
