//! Run many independent searches on the blocking thread pool.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::cache::HeuristicCache;
use crate::config::BatchConfig;
use crate::graph::Graph;
use crate::search::{AStar, GraphDistanceHeuristic, RoutingRequest, SearchError, SearchResult};
use crate::telemetry::SearchMetrics;

/// Runs searches against one shared graph.
///
/// Every search owns its run state and heuristic; with
/// `share_heuristics` set, heuristics for the same target come from a
/// [`HeuristicCache`] instead.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    graph: Arc<Graph>,
    batch_size: usize,
    cache: Option<HeuristicCache>,
    metrics: SearchMetrics,
}

impl BatchRunner {
    pub fn new(graph: Arc<Graph>, config: &BatchConfig) -> Self {
        Self {
            graph,
            batch_size: config.batch_size.max(1),
            cache: config
                .share_heuristics
                .then(|| HeuristicCache::new(config.heuristic_cache_capacity)),
            metrics: SearchMetrics::default(),
        }
    }

    /// Record into `metrics` instead of a private handle.
    pub fn with_metrics(mut self, metrics: SearchMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &SearchMetrics {
        &self.metrics
    }

    pub fn cache(&self) -> Option<&HeuristicCache> {
        self.cache.as_ref()
    }

    /// Run every request, `batch_size` at a time. Results are in request order.
    pub async fn run(
        &self,
        requests: Vec<RoutingRequest>,
    ) -> Vec<Result<SearchResult, SearchError>> {
        let total = requests.len();
        let mut results = Vec::with_capacity(total);

        for batch in requests.chunks(self.batch_size) {
            let jobs: Vec<_> = batch
                .iter()
                .cloned()
                .map(|request| {
                    let graph = Arc::clone(&self.graph);
                    let cache = self.cache.clone();
                    let metrics = self.metrics.clone();
                    tokio::task::spawn_blocking(move || {
                        search_one(&graph, &request, cache.as_ref(), &metrics)
                    })
                })
                .collect();

            for joined in join_all(jobs).await {
                results.push(joined.unwrap_or_else(|e| {
                    warn!(error = %e, "search worker failed");
                    Err(SearchError::WorkerFailed(e.to_string()))
                }));
            }
        }

        debug!(
            searches = total,
            failed = results.iter().filter(|r| r.is_err()).count(),
            "batch complete"
        );
        results
    }
}

/// Run `requests` against `graph` with the given settings.
pub async fn run_batch(
    graph: Arc<Graph>,
    requests: Vec<RoutingRequest>,
    config: &BatchConfig,
) -> Vec<Result<SearchResult, SearchError>> {
    BatchRunner::new(graph, config).run(requests).await
}

fn search_one(
    graph: &Graph,
    request: &RoutingRequest,
    cache: Option<&HeuristicCache>,
    metrics: &SearchMetrics,
) -> Result<SearchResult, SearchError> {
    let mut astar = AStar::new(graph).with_metrics(metrics);
    match cache {
        Some(cache) => cache.search(&mut astar, request),
        None => astar.search(request, &mut GraphDistanceHeuristic::new()),
    }
}
