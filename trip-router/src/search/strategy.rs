//! Pluggable termination and skip rules.
//!
//! The engine doesn't know what these are for. Swapping them is how the
//! same search loop serves point-to-point routing and narrow auxiliary
//! searches. Closures with the right signature implement each trait.

use super::{SearchOptions, ShortestPathTree};
use crate::graph::{EdgeId, EdgeKind, Graph, StreetPermission, VertexId};
use crate::state::{State, StateArena};

/// Read-only view of a running search, handed to strategies.
#[derive(Clone, Copy)]
pub struct SearchContext<'a> {
    pub graph: &'a Graph,
    pub arena: &'a StateArena,
    pub tree: &'a ShortestPathTree,
    pub origins: &'a [VertexId],
    pub target: Option<VertexId>,
    pub options: &'a SearchOptions,
}

/// Decides when the whole search should stop.
///
/// When one is installed the engine no longer stops at the target by itself.
pub trait SearchTerminationStrategy {
    fn should_terminate(&mut self, cx: &SearchContext<'_>, current: &State) -> bool;
}

impl<F> SearchTerminationStrategy for F
where
    F: FnMut(&SearchContext<'_>, &State) -> bool,
{
    fn should_terminate(&mut self, cx: &SearchContext<'_>, current: &State) -> bool {
        self(cx, current)
    }
}

/// Decides whether to try an edge at all.
pub trait SkipEdgeStrategy {
    fn should_skip_edge(&self, cx: &SearchContext<'_>, current: &State, edge: EdgeId) -> bool;
}

impl<F> SkipEdgeStrategy for F
where
    F: Fn(&SearchContext<'_>, &State, EdgeId) -> bool,
{
    fn should_skip_edge(&self, cx: &SearchContext<'_>, current: &State, edge: EdgeId) -> bool {
        self(cx, current, edge)
    }
}

/// Decides whether to drop a freshly produced state before it is queued.
pub trait SkipTraverseResultStrategy {
    fn should_skip(&self, cx: &SearchContext<'_>, state: &State) -> bool;
}

impl<F> SkipTraverseResultStrategy for F
where
    F: Fn(&SearchContext<'_>, &State) -> bool,
{
    fn should_skip(&self, cx: &SearchContext<'_>, state: &State) -> bool {
        self(cx, state)
    }
}

/// Only follow street edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreetOnly;

impl SkipEdgeStrategy for StreetOnly {
    fn should_skip_edge(&self, cx: &SearchContext<'_>, _current: &State, edge: EdgeId) -> bool {
        cx.graph.edge(edge).kind() != EdgeKind::Street
    }
}

/// Drop states that have walked further than a limit.
#[derive(Debug, Clone, Copy)]
pub struct WalkDistanceLimit(pub f64);

impl SkipTraverseResultStrategy for WalkDistanceLimit {
    fn should_skip(&self, _cx: &SearchContext<'_>, state: &State) -> bool {
        state.walk_distance() > self.0
    }
}

/// Stop at the first vertex with a street edge leading on that allows `permission`.
#[derive(Debug, Clone, Copy)]
pub struct PermissionTermination {
    permission: StreetPermission,
    found: Option<VertexId>,
}

impl PermissionTermination {
    pub fn new(permission: StreetPermission) -> Self {
        Self {
            permission,
            found: None,
        }
    }

    /// The vertex the search stopped at, if any.
    pub fn found(&self) -> Option<VertexId> {
        self.found
    }
}

impl SearchTerminationStrategy for PermissionTermination {
    fn should_terminate(&mut self, cx: &SearchContext<'_>, current: &State) -> bool {
        let vertex = current.vertex();
        let touches = cx
            .graph
            .edges_from(vertex, cx.options.arrive_by)
            .iter()
            .filter_map(|&e| cx.graph.edge(e).permission())
            .any(|p| p.allows(self.permission));
        if touches {
            self.found = Some(vertex);
        }
        touches
    }
}
