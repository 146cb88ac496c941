//! The edge traversal contract.

use std::fmt;

use super::{EdgeId, Graph, StreetPermission, VertexId};
use crate::search::SearchOptions;
use crate::state::{State, StateEditor, StateId};

/// Broad category of an edge, used by strategies and RAPTOR to pick edges
/// without knowing their concrete type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Street,
    Transfer,
    PreBoard,
    PreAlight,
    Board,
    Alight,
    Hop,
    Other,
}

/// Everything an edge may look at while producing successors.
#[derive(Clone, Copy)]
pub struct TraverseContext<'a> {
    pub graph: &'a Graph,
    pub options: &'a SearchOptions,
    /// The edge being traversed.
    pub edge: EdgeId,
    /// Handle of the state being extended.
    pub back: StateId,
}

impl<'a> TraverseContext<'a> {
    /// Start a successor of `s0` across `edge`.
    pub fn edit(&self, s0: &State, edge: &dyn Edge) -> StateEditor {
        StateEditor::new(s0, edge, self)
    }
}

/// A traversal rule between two vertices.
///
/// Edges are owned by the graph and shared between concurrent searches, so
/// traversal must be a pure function of the incoming state and the context.
/// In an arrive-by search edges are traversed from `to` back to `from`.
pub trait Edge: fmt::Debug + Send + Sync {
    fn from_vertex(&self) -> VertexId;

    fn to_vertex(&self) -> VertexId;

    fn kind(&self) -> EdgeKind;

    fn name(&self) -> &str {
        ""
    }

    /// Successor states reachable across this edge from `s0`.
    ///
    /// Empty when the edge can't be used; several entries when there is
    /// more than one viable way across (e.g. boarding one of several trips).
    fn traverse(&self, s0: &State, cx: &TraverseContext<'_>) -> Vec<State>;

    /// A lower bound on the weight any traversal of this edge adds.
    ///
    /// Must never exceed the real increment; `f64::INFINITY` means the edge
    /// can never be traversed under `options`.
    fn weight_lower_bound(&self, _graph: &Graph, _options: &SearchOptions) -> f64 {
        0.0
    }

    /// Who may use this edge, for street edges.
    fn permission(&self) -> Option<StreetPermission> {
        None
    }

    /// Physical length in metres, where meaningful.
    fn distance_m(&self) -> f64 {
        0.0
    }
}
