//! Shared cache of graph-distance heuristics.
//!
//! Building a [`GraphDistanceHeuristic`] is a Dijkstra from the target, so
//! many requests to the same destination can share one. Each entry sits
//! behind a mutex: one search uses it at a time, and the heuristic reuses
//! its settled distances when the next request's bound parameters match.

use std::sync::{Arc, Mutex};

use moka::sync::Cache as MokaCache;
use tracing::debug;

use crate::graph::VertexId;
use crate::search::{
    AStar, GraphDistanceHeuristic, RoutingRequest, SearchError, SearchResult, TrivialHeuristic,
};

/// Cache key: (target vertex, arrive-by).
type HeuristicKey = (VertexId, bool);

type HeuristicEntry = Arc<Mutex<GraphDistanceHeuristic>>;

/// Graph-distance heuristics keyed by target.
#[derive(Clone)]
pub struct HeuristicCache {
    entries: MokaCache<HeuristicKey, HeuristicEntry>,
}

impl HeuristicCache {
    /// Create a cache holding up to `max_capacity` heuristics.
    pub fn new(max_capacity: u64) -> Self {
        Self {
            entries: MokaCache::builder().max_capacity(max_capacity).build(),
        }
    }

    /// The heuristic for `target`, created empty if absent.
    pub fn get(&self, target: VertexId, arrive_by: bool) -> HeuristicEntry {
        self.entries.get_with((target, arrive_by), || {
            debug!(vertex = ?target, arrive_by, "new cached heuristic");
            Arc::new(Mutex::new(GraphDistanceHeuristic::new()))
        })
    }

    /// Run `request` with the cached heuristic for its target.
    ///
    /// Batch requests and requests without a target don't touch the cache.
    pub fn search(
        &self,
        astar: &mut AStar<'_>,
        request: &RoutingRequest,
    ) -> Result<SearchResult, SearchError> {
        let target = match request.target {
            Some(target) if !request.options.batch => target,
            _ => return astar.search(request, &mut TrivialHeuristic),
        };
        let entry = self.get(target, request.options.arrive_by);
        let mut heuristic = entry
            .lock()
            .map_err(|_| SearchError::HeuristicPoisoned(target))?;
        astar.search(request, &mut *heuristic)
    }

    /// Number of cached heuristics.
    pub fn entry_count(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }
}

impl std::fmt::Debug for HeuristicCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeuristicCache")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}
