//! Remaining-weight heuristics for goal-directed search.
//!
//! Every heuristic here is admissible: it never estimates more than the
//! real remaining weight, so A* with it finds the same optimum as Dijkstra.
//! Scaling estimates by `heuristic_weight > 1` gives that up for speed.

use std::collections::HashMap;

use tracing::{debug, trace};

use super::{BinHeap, Deadline, SearchOptions, TraverseModeSet};
use crate::graph::{Graph, VertexId};
use crate::state::State;

/// How many vertices the graph-distance heuristic settles per `do_some_work`.
const WORK_SLICE: usize = 64;

/// How often (in settled vertices) initialisation checks the deadline.
const DEADLINE_CHECK_INTERVAL: usize = 256;

/// Heuristic set-up ran past the search deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("heuristic initialisation timed out")]
pub struct HeuristicTimeout;

/// What a heuristic needs to prepare for one search.
#[derive(Debug, Clone, Copy)]
pub struct HeuristicContext<'a> {
    pub graph: &'a Graph,
    /// Where the search starts.
    pub origin: VertexId,
    /// Where the search is heading.
    pub target: VertexId,
    pub options: &'a SearchOptions,
    pub deadline: Deadline,
}

/// Lower bound on the weight still needed to reach the target.
pub trait RemainingWeightHeuristic: Send {
    /// Prepare for a search. May do real work, but must stop at the deadline.
    fn initialize(&mut self, cx: &HeuristicContext<'_>) -> Result<(), HeuristicTimeout>;

    /// Estimated remaining weight from `state`. `f64::INFINITY` means the
    /// target can't be reached from here.
    fn estimate_remaining_weight(&self, graph: &Graph, state: &State) -> f64;

    /// Improve the estimates a little. Called once per search iteration.
    fn do_some_work(&mut self, _graph: &Graph) {}
}

/// Always zero: plain Dijkstra.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrivialHeuristic;

impl RemainingWeightHeuristic for TrivialHeuristic {
    fn initialize(&mut self, _cx: &HeuristicContext<'_>) -> Result<(), HeuristicTimeout> {
        Ok(())
    }

    fn estimate_remaining_weight(&self, _graph: &Graph, _state: &State) -> f64 {
        0.0
    }
}

/// Straight-line distance to the target times the cheapest weight per metre
/// of any allowed way of travelling.
#[derive(Debug, Clone, Copy, Default)]
pub struct EuclideanHeuristic {
    target: Option<VertexId>,
    weight_per_metre: f64,
}

impl EuclideanHeuristic {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cheapest weight per straight-line metre under `options`.
    pub fn weight_per_metre(graph: &Graph, options: &SearchOptions) -> f64 {
        let TraverseModeSet { walk, car, transit } = options.modes;
        let mut factors = Vec::with_capacity(4);
        if walk {
            factors.push(options.walk_reluctance / options.walk_speed);
        }
        if car {
            factors.push(1.0 / options.car_speed);
        }
        if transit {
            let index = graph.transit();
            if index.max_hop_speed() > 0.0 {
                factors.push(1.0 / index.max_hop_speed());
            }
            if index.max_transfer_speed() > 0.0 {
                factors.push(options.walk_reluctance / index.max_transfer_speed());
            }
        }
        let min = factors.into_iter().fold(f64::INFINITY, f64::min);
        if min.is_finite() && min > 0.0 { min } else { 0.0 }
    }
}

impl RemainingWeightHeuristic for EuclideanHeuristic {
    fn initialize(&mut self, cx: &HeuristicContext<'_>) -> Result<(), HeuristicTimeout> {
        self.target = Some(cx.target);
        self.weight_per_metre = Self::weight_per_metre(cx.graph, cx.options);
        Ok(())
    }

    fn estimate_remaining_weight(&self, graph: &Graph, state: &State) -> f64 {
        let Some(target) = self.target else {
            return 0.0;
        };
        match (graph.get_vertex(state.vertex()), graph.get_vertex(target)) {
            (Some(here), Some(there)) => here.distance_to(there) * self.weight_per_metre,
            _ => 0.0,
        }
    }
}

/// Options that change edge lower bounds. Two requests that agree on these
/// (and on target and direction) can share a graph-distance heuristic.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BoundParams {
    target: VertexId,
    arrive_by: bool,
    modes: TraverseModeSet,
    walk_speed: f64,
    car_speed: f64,
    walk_reluctance: f64,
    board_cost: f64,
}

impl BoundParams {
    fn new(target: VertexId, options: &SearchOptions) -> Self {
        Self {
            target,
            arrive_by: options.arrive_by,
            modes: options.modes,
            walk_speed: options.walk_speed,
            car_speed: options.car_speed,
            walk_reluctance: options.walk_reluctance,
            board_cost: options.board_cost,
        }
    }
}

/// Exact lower-bound distances to the target, computed lazily.
///
/// Runs Dijkstra outwards from the target against the search direction,
/// using each edge's [`weight_lower_bound`](crate::graph::Edge::weight_lower_bound).
/// Set-up continues until the search origin is settled; after that each
/// `do_some_work` settles a few more vertices. Vertices not yet settled are
/// estimated at the current frontier distance, which no unsettled vertex can
/// beat.
///
/// The settled distances stay valid for any later request with the same
/// target, direction and cost parameters, so one instance can be reused
/// across such a sequence of requests.
#[derive(Debug, Default)]
pub struct GraphDistanceHeuristic {
    params: Option<BoundParams>,
    options: SearchOptions,
    settled: HashMap<VertexId, f64>,
    tentative: HashMap<VertexId, f64>,
    queue: BinHeap<VertexId>,
}

impl GraphDistanceHeuristic {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of vertices with an exact lower bound so far.
    pub fn settled_count(&self) -> usize {
        self.settled.len()
    }

    /// True once every vertex that can reach the target is settled.
    pub fn is_exhausted(&self) -> bool {
        self.params.is_some() && self.queue.is_empty()
    }

    fn reset(&mut self, params: BoundParams, options: &SearchOptions) {
        self.params = Some(params);
        self.options = options.clone();
        self.settled.clear();
        self.tentative.clear();
        self.queue.clear();
        self.tentative.insert(params.target, 0.0);
        self.queue.insert(params.target, 0.0);
    }

    /// Settle the next vertex, if any remain.
    fn settle_one(&mut self, graph: &Graph) -> Option<VertexId> {
        let reverse = !self.params.as_ref()?.arrive_by;
        while let Some((distance, vertex)) = self.queue.extract_min_with_key() {
            if self.settled.contains_key(&vertex) {
                continue;
            }
            self.settled.insert(vertex, distance);
            for &edge in graph.edges_from(vertex, reverse) {
                let bound = graph
                    .edge(edge)
                    .weight_lower_bound(graph, &self.options);
                if !bound.is_finite() {
                    continue;
                }
                let next = graph.far_end(edge, reverse);
                let candidate = distance + bound.max(0.0);
                if self.settled.contains_key(&next) {
                    continue;
                }
                let best = self.tentative.entry(next).or_insert(f64::INFINITY);
                if candidate < *best {
                    *best = candidate;
                    self.queue.insert(next, candidate);
                }
            }
            return Some(vertex);
        }
        None
    }
}

impl RemainingWeightHeuristic for GraphDistanceHeuristic {
    fn initialize(&mut self, cx: &HeuristicContext<'_>) -> Result<(), HeuristicTimeout> {
        let params = BoundParams::new(cx.target, cx.options);
        if self.params != Some(params) {
            self.reset(params, cx.options);
        } else {
            debug!(
                vertex = %cx.target,
                settled = self.settled.len(),
                "reusing graph distance heuristic"
            );
        }

        let mut since_check = 0;
        while !self.settled.contains_key(&cx.origin) {
            if since_check == 0 && cx.deadline.is_expired() {
                return Err(HeuristicTimeout);
            }
            since_check = (since_check + 1) % DEADLINE_CHECK_INTERVAL;
            if self.settle_one(cx.graph).is_none() {
                break;
            }
        }
        trace!(settled = self.settled.len(), "graph distance heuristic initialised");
        Ok(())
    }

    fn estimate_remaining_weight(&self, _graph: &Graph, state: &State) -> f64 {
        if let Some(&distance) = self.settled.get(&state.vertex()) {
            return distance;
        }
        // Stale entries for settled vertices only make this smaller.
        self.queue.peek_min_key().unwrap_or(f64::INFINITY)
    }

    fn do_some_work(&mut self, graph: &Graph) {
        for _ in 0..WORK_SLICE {
            if self.settle_one(graph).is_none() {
                break;
            }
        }
    }
}
