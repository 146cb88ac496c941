//! Best-first search over the traversal graph.
//!
//! [`AStar`] is the engine. It is configured with a heuristic and, where
//! needed, termination and skip strategies; the same loop serves full
//! point-to-point routing, batch reachability and the auxiliary searches in
//! this module.

mod astar;
mod auxiliary;
mod dominance;
mod error;
mod heuristic;
mod options;
mod queue;
mod strategy;
mod visitor;

pub use astar::{AStar, OVERSEARCH_MULTIPLIER, RoutingRequest, SearchResult};
pub use auxiliary::{
    FlagStopCandidate, FlagStopCandidates, NearestVertex, discover_flag_stops,
    find_nearest_permitted_vertex,
};
pub use dominance::{DominanceFunction, ShortestPathTree};
pub use error::SearchError;
pub use heuristic::{
    EuclideanHeuristic, GraphDistanceHeuristic, HeuristicContext, HeuristicTimeout,
    RemainingWeightHeuristic, TrivialHeuristic,
};
pub use options::{Deadline, SearchOptions, SearchOverrides, TraverseModeSet};
pub use queue::BinHeap;
pub use strategy::{
    PermissionTermination, SearchContext, SearchTerminationStrategy, SkipEdgeStrategy,
    SkipTraverseResultStrategy, StreetOnly, WalkDistanceLimit,
};
pub use visitor::{CountingVisitor, TraverseVisitor};

