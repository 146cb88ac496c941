//! Generic best-first search.
//!
//! One [`AStar`] runs one search at a time over a shared, read-only
//! [`Graph`]. Everything mutable lives in a private run state that is
//! created at the start of a search and handed back inside the
//! [`SearchResult`].

use tracing::{debug, trace, warn};

use super::{
    BinHeap, Deadline, HeuristicContext, RemainingWeightHeuristic, SearchContext, SearchError,
    SearchOptions, SearchTerminationStrategy, ShortestPathTree, SkipEdgeStrategy,
    SkipTraverseResultStrategy, TraverseVisitor, TrivialHeuristic,
};
use crate::graph::{Graph, TraverseContext, VertexId};
use crate::state::{GraphPath, State, StateArena, StateId};
use crate::telemetry::SearchMetrics;

/// Once a path is found, stop when the frontier is this many times heavier.
pub const OVERSEARCH_MULTIPLIER: f64 = 4.0;

/// What to search for.
///
/// `origin` and `target` are in search order: for an arrive-by search the
/// origin is where the traveller wants to end up.
#[derive(Debug, Clone)]
pub struct RoutingRequest {
    pub origin: VertexId,
    /// `None` explores everything reachable.
    pub target: Option<VertexId>,
    pub options: SearchOptions,
    /// Overrides `options.timeout` when set.
    pub deadline: Option<Deadline>,
}

impl RoutingRequest {
    pub fn new(origin: VertexId, target: VertexId, options: SearchOptions) -> Self {
        Self {
            origin,
            target: Some(target),
            options,
            deadline: None,
        }
    }

    /// Explore everything reachable from `origin`.
    pub fn batch(origin: VertexId, options: SearchOptions) -> Self {
        Self {
            origin,
            target: None,
            options: SearchOptions {
                batch: true,
                ..options
            },
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub(crate) fn effective_deadline(&self) -> Deadline {
        self.deadline
            .unwrap_or_else(|| Deadline::from_timeout(self.options.timeout))
    }
}

/// Outcome of a search.
///
/// A timed-out or aborted result is still valid as far as it goes: every
/// state it holds was reached optimally (for A* with an admissible
/// heuristic) when it was expanded.
#[derive(Debug)]
pub struct SearchResult {
    pub arena: StateArena,
    pub tree: ShortestPathTree,
    /// Accepted states at the target, best first.
    pub target_states: Vec<StateId>,
    pub vertices_visited: usize,
    /// Heuristic set-up missed the deadline; the search never started.
    pub timed_out: bool,
    /// The deadline passed mid-search; the tree is partial.
    pub aborted: bool,
    /// State at which a termination strategy stopped the search.
    pub terminated_at: Option<StateId>,
}

impl SearchResult {
    fn never_started(dominance: super::DominanceFunction) -> Self {
        Self {
            arena: StateArena::new(),
            tree: ShortestPathTree::new(dominance),
            target_states: Vec::new(),
            vertices_visited: 0,
            timed_out: true,
            aborted: false,
            terminated_at: None,
        }
    }

    /// False if the search ran out of time.
    pub fn is_complete(&self) -> bool {
        !self.timed_out && !self.aborted
    }

    /// Paths to the accepted target states, in travel order.
    pub fn paths(&self) -> Vec<GraphPath> {
        self.target_states
            .iter()
            .map(|&tip| self.arena.path(tip))
            .collect()
    }

    /// Lowest-weight retained state at `vertex`.
    pub fn best_state(&self, vertex: VertexId) -> Option<&State> {
        self.tree
            .best_state(&self.arena, vertex)
            .map(|id| &self.arena[id])
    }

    pub fn weight_to(&self, vertex: VertexId) -> Option<f64> {
        self.best_state(vertex).map(State::weight)
    }

    /// Path to the lowest-weight retained state at `vertex`.
    pub fn path_to(&self, vertex: VertexId) -> Option<GraphPath> {
        self.tree
            .best_state(&self.arena, vertex)
            .map(|id| self.arena.path(id))
    }
}

/// Mutable state of one search.
struct RunState<'a> {
    graph: &'a Graph,
    options: &'a SearchOptions,
    origins: Vec<VertexId>,
    target: Option<VertexId>,
    deadline: Deadline,
    arena: StateArena,
    tree: ShortestPathTree,
    queue: BinHeap<StateId>,
    target_states: Vec<StateId>,
    max_weight: f64,
    vertices_visited: usize,
    aborted: bool,
    terminated_at: Option<StateId>,
}

impl<'a> RunState<'a> {
    fn context(&self) -> SearchContext<'_> {
        SearchContext {
            graph: self.graph,
            arena: &self.arena,
            tree: &self.tree,
            origins: &self.origins,
            target: self.target,
            options: self.options,
        }
    }

    fn into_result(self) -> SearchResult {
        SearchResult {
            arena: self.arena,
            tree: self.tree,
            target_states: self.target_states,
            vertices_visited: self.vertices_visited,
            timed_out: false,
            aborted: self.aborted,
            terminated_at: self.terminated_at,
        }
    }
}

/// Whether the main loop keeps going.
enum Step {
    Continue,
    Stop,
}

/// A* / Dijkstra search engine.
///
/// Strategies and the visitor are borrowed, so callers can inspect them
/// after the search.
pub struct AStar<'a> {
    graph: &'a Graph,
    visitor: Option<&'a mut dyn TraverseVisitor>,
    termination: Option<&'a mut dyn SearchTerminationStrategy>,
    skip_edge: Option<&'a dyn SkipEdgeStrategy>,
    skip_result: Option<&'a dyn SkipTraverseResultStrategy>,
    metrics: Option<&'a SearchMetrics>,
}

impl<'a> AStar<'a> {
    pub fn new(graph: &'a Graph) -> Self {
        Self {
            graph,
            visitor: None,
            termination: None,
            skip_edge: None,
            skip_result: None,
            metrics: None,
        }
    }

    pub fn with_visitor(mut self, visitor: &'a mut dyn TraverseVisitor) -> Self {
        self.visitor = Some(visitor);
        self
    }

    pub fn with_termination(mut self, strategy: &'a mut dyn SearchTerminationStrategy) -> Self {
        self.termination = Some(strategy);
        self
    }

    pub fn with_skip_edge(mut self, strategy: &'a dyn SkipEdgeStrategy) -> Self {
        self.skip_edge = Some(strategy);
        self
    }

    pub fn with_skip_result(mut self, strategy: &'a dyn SkipTraverseResultStrategy) -> Self {
        self.skip_result = Some(strategy);
        self
    }

    pub fn with_metrics(mut self, metrics: &'a SearchMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Search from a single origin vertex.
    ///
    /// `heuristic` is ignored in batch mode (or without a target), where
    /// the trivial heuristic is used instead.
    pub fn search(
        &mut self,
        request: &RoutingRequest,
        heuristic: &mut dyn RemainingWeightHeuristic,
    ) -> Result<SearchResult, SearchError> {
        self.check_vertex(request.origin)?;
        let origin = State::new(request.origin, &request.options);
        self.search_from_states(
            vec![origin],
            request.target,
            &request.options,
            request.effective_deadline(),
            heuristic,
        )
    }

    /// Search from several origin states at once.
    ///
    /// Each origin is queued at its own weight, so origins reached later
    /// (e.g. after a walk) start behind fresher ones.
    pub fn search_from_states(
        &mut self,
        origins: Vec<State>,
        target: Option<VertexId>,
        options: &SearchOptions,
        deadline: Deadline,
        heuristic: &mut dyn RemainingWeightHeuristic,
    ) -> Result<SearchResult, SearchError> {
        let first = origins.first().ok_or(SearchError::NoOrigin)?.vertex();
        for origin in &origins {
            self.check_vertex(origin.vertex())?;
        }
        let target = if options.batch { None } else { target };
        if let Some(target) = target {
            self.check_vertex(target)?;
        }

        let mut trivial = TrivialHeuristic;
        let heuristic: &mut dyn RemainingWeightHeuristic = match target {
            Some(_) => heuristic,
            None => &mut trivial,
        };

        if let Some(target) = target {
            let cx = HeuristicContext {
                graph: self.graph,
                origin: first,
                target,
                options,
                deadline,
            };
            if heuristic.initialize(&cx).is_err() {
                warn!(origin = %first, target = %target, "heuristic initialisation timed out");
                if let Some(metrics) = self.metrics {
                    metrics.record_search(0, 0, true);
                }
                return Ok(SearchResult::never_started(options.dominance));
            }
        }

        let capacity = (2.0 * ((self.graph.vertex_count() + 1) as f64).sqrt()).ceil() as usize;
        let mut rs = RunState {
            graph: self.graph,
            options,
            origins: origins.iter().map(State::vertex).collect(),
            target,
            deadline,
            arena: StateArena::with_capacity(capacity),
            tree: ShortestPathTree::new(options.dominance),
            queue: BinHeap::with_capacity(capacity),
            target_states: Vec::new(),
            max_weight: options.max_weight,
            vertices_visited: 0,
            aborted: false,
            terminated_at: None,
        };
        for origin in origins {
            let priority = origin.weight();
            if let Some(id) = rs.tree.add(&mut rs.arena, origin) {
                rs.queue.insert(id, priority);
            }
        }

        while let Step::Continue = self.iterate(&mut rs, heuristic)? {}

        debug!(
            origin = %first,
            vertices_visited = rs.vertices_visited,
            states = rs.arena.len(),
            paths = rs.target_states.len(),
            aborted = rs.aborted,
            "search complete"
        );
        if let Some(metrics) = self.metrics {
            metrics.record_search(rs.vertices_visited, rs.arena.len(), rs.aborted);
        }
        Ok(rs.into_result())
    }

    fn check_vertex(&self, vertex: VertexId) -> Result<(), SearchError> {
        if self.graph.contains_vertex(vertex) {
            Ok(())
        } else {
            Err(SearchError::UnknownVertex(vertex))
        }
    }

    /// Expand one state.
    fn iterate(
        &mut self,
        rs: &mut RunState<'_>,
        heuristic: &mut dyn RemainingWeightHeuristic,
    ) -> Result<Step, SearchError> {
        if rs.deadline.is_expired() {
            warn!(
                origin = ?rs.origins.first(),
                vertices_visited = rs.vertices_visited,
                "search deadline passed, returning partial result"
            );
            rs.aborted = true;
            return Ok(Step::Stop);
        }
        if rs.target.is_some() {
            heuristic.do_some_work(rs.graph);
        }

        let Some(id) = rs.queue.extract_min() else {
            return Ok(Step::Stop);
        };
        let u = rs.arena[id];
        if !rs.tree.is_retained(u.vertex(), id) {
            // Dominated since it was queued
            return Ok(Step::Continue);
        }
        if u.weight() > rs.max_weight {
            return Ok(Step::Stop);
        }

        rs.vertices_visited += 1;
        trace!(vertex = %u.vertex(), weight = u.weight(), "visit");
        if let Some(visitor) = self.visitor.as_deref_mut() {
            visitor.visit_vertex(&u);
        }

        self.expand(rs, heuristic, id, &u)?;

        if let Some(termination) = self.termination.as_deref_mut() {
            if termination.should_terminate(&rs.context(), &u) {
                rs.terminated_at = Some(id);
                return Ok(Step::Stop);
            }
        } else if rs.target == Some(u.vertex()) && u.is_final() {
            if rs.options.only_transit_trips && !u.is_ever_boarded() {
                return Ok(Step::Continue);
            }
            if rs.target_states.is_empty() {
                rs.max_weight = rs.max_weight.min(u.weight() * OVERSEARCH_MULTIPLIER);
            }
            rs.target_states.push(id);
            if rs.options.long_distance || rs.target_states.len() >= rs.options.num_itineraries {
                return Ok(Step::Stop);
            }
        }
        Ok(Step::Continue)
    }

    fn expand(
        &mut self,
        rs: &mut RunState<'_>,
        heuristic: &dyn RemainingWeightHeuristic,
        id: StateId,
        u: &State,
    ) -> Result<(), SearchError> {
        let graph = rs.graph;
        let options = rs.options;
        for &edge in graph.edges_from(u.vertex(), options.arrive_by) {
            if let Some(skip) = self.skip_edge {
                if skip.should_skip_edge(&rs.context(), u, edge) {
                    continue;
                }
            }

            let tcx = TraverseContext {
                graph,
                options,
                edge,
                back: id,
            };
            for v in graph.edge(edge).traverse(u, &tcx) {
                if let Some(visitor) = self.visitor.as_deref_mut() {
                    visitor.visit_edge(edge, &v);
                }

                let delta = v.weight() - u.weight();
                if delta < 0.0 {
                    return Err(SearchError::NegativeWeight {
                        edge,
                        vertex: u.vertex(),
                        delta,
                    });
                }

                if let Some(skip) = self.skip_result {
                    if skip.should_skip(&rs.context(), &v) {
                        continue;
                    }
                }

                let remaining = match rs.target {
                    Some(_) => {
                        heuristic.estimate_remaining_weight(graph, &v) * options.heuristic_weight
                    }
                    None => 0.0,
                };
                // Infinite, negative or NaN estimates mean the target is out of reach
                if !(remaining >= 0.0 && remaining.is_finite()) {
                    continue;
                }
                let estimate = v.weight() + remaining;
                if estimate > rs.max_weight || options.is_worst_time_exceeded(v.time()) {
                    continue;
                }

                if let Some(new_id) = rs.tree.add(&mut rs.arena, v) {
                    if let Some(visitor) = self.visitor.as_deref_mut() {
                        visitor.visit_enqueue(&rs.arena[new_id]);
                    }
                    rs.queue.insert(new_id, estimate);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test_edges {
    use crate::graph::{Edge, EdgeKind, Graph, TraverseContext, VertexId};
    use crate::search::SearchOptions;
    use crate::state::State;

    /// Edge with a fixed weight, costing one second per unit of weight.
    #[derive(Debug, Clone)]
    pub struct FixedEdge {
        pub from: VertexId,
        pub to: VertexId,
        pub weight: f64,
    }

    impl Edge for FixedEdge {
        fn from_vertex(&self) -> VertexId {
            self.from
        }

        fn to_vertex(&self) -> VertexId {
            self.to
        }

        fn kind(&self) -> EdgeKind {
            EdgeKind::Other
        }

        fn traverse(&self, s0: &State, cx: &TraverseContext<'_>) -> Vec<State> {
            let mut editor = cx.edit(s0, self);
            editor.increment_weight(self.weight);
            editor.increment_time(self.weight.abs() as i64);
            editor.make_state().into_iter().collect()
        }

        fn weight_lower_bound(&self, _graph: &Graph, _options: &SearchOptions) -> f64 {
            self.weight
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::test_edges::FixedEdge;
    use super::*;
    use crate::graph::{GraphBuilder, ServiceDay};
    use crate::search::GraphDistanceHeuristic;
    use proptest::prelude::*;

    prop_compose! {
        fn arb_graph()(n in 2usize..12)(
            n in Just(n),
            edges in prop::collection::vec((0..n, 0..n, 0u32..20), 1..40),
        ) -> (usize, Vec<(usize, usize, u32)>) {
            (n, edges)
        }
    }

    proptest! {
        /// Goal-directed search finds paths exactly as cheap as Dijkstra's.
        #[test]
        fn graph_distance_astar_matches_dijkstra((n, edges) in arb_graph(), target in 0usize..12) {
            let mut b = GraphBuilder::new(ServiceDay::default());
            let ids: Vec<_> = (0..n).map(|i| b.street_vertex(format!("v{i}"), 0.0, 0.0)).collect();
            for &(from, to, weight) in &edges {
                b.edge(Box::new(FixedEdge { from: ids[from], to: ids[to], weight: f64::from(weight) })).unwrap();
            }
            let graph = b.build();
            let target = ids[target % n];

            let request = RoutingRequest::new(ids[0], target, SearchOptions::default());
            let dijkstra = AStar::new(&graph).search(&request, &mut TrivialHeuristic).unwrap();
            let astar = AStar::new(&graph).search(&request, &mut GraphDistanceHeuristic::new()).unwrap();

            let cost = |r: &SearchResult| r.paths().first().map(|p| p.weight);
            prop_assert_eq!(cost(&dijkstra), cost(&astar));
        }

        /// Nothing in a batch tree beats the exhaustive optimum, and nothing is dominated.
        #[test]
        fn batch_tree_is_optimal((n, edges) in arb_graph()) {
            let mut b = GraphBuilder::new(ServiceDay::default());
            let ids: Vec<_> = (0..n).map(|i| b.street_vertex(format!("v{i}"), 0.0, 0.0)).collect();
            for &(from, to, weight) in &edges {
                b.edge(Box::new(FixedEdge { from: ids[from], to: ids[to], weight: f64::from(weight) })).unwrap();
            }
            let graph = b.build();

            // Bellman-Ford reference
            let mut best = vec![f64::INFINITY; n];
            best[0] = 0.0;
            for _ in 0..n {
                for &(from, to, weight) in &edges {
                    best[to] = best[to].min(best[from] + f64::from(weight));
                }
            }

            let request = RoutingRequest::batch(ids[0], SearchOptions::default());
            let result = AStar::new(&graph).search(&request, &mut TrivialHeuristic).unwrap();
            for (i, &id) in ids.iter().enumerate() {
                let found = result.weight_to(id).unwrap_or(f64::INFINITY);
                prop_assert_eq!(found, best[i]);
                prop_assert!(result.tree.states_at(id).len() <= 1);
            }
        }
    }
}
