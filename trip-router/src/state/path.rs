//! Paths reconstructed from state chains.

use super::{StateArena, StateId};
use crate::graph::{EdgeId, VertexId};

/// A complete path, in travel order from trip origin to trip destination.
///
/// For an arrive-by search the chain already runs in travel order (the
/// search started at the destination); for a depart-after search it is
/// reversed.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphPath {
    pub states: Vec<StateId>,
    pub edges: Vec<EdgeId>,
    pub vertices: Vec<VertexId>,
    pub weight: f64,
    pub start_time: i64,
    pub end_time: i64,
}

impl GraphPath {
    pub(crate) fn from_tip(arena: &StateArena, tip: StateId) -> Self {
        let chain = arena.chain(tip);
        let tip_state = &arena[tip];

        // A state's back edge leads to it along the search direction, so the
        // edges line up with the chain and flip together with it.
        let mut edges: Vec<EdgeId> = chain
            .iter()
            .filter_map(|&id| arena[id].back_edge())
            .collect();
        let mut states = chain;
        if !tip_state.arrive_by() {
            states.reverse();
            edges.reverse();
        }

        let vertices = states.iter().map(|&id| arena[id].vertex()).collect();

        let first = &arena[states[0]];
        let last = &arena[states[states.len() - 1]];

        Self {
            states,
            edges,
            vertices,
            weight: tip_state.weight(),
            start_time: first.time().min(last.time()),
            end_time: first.time().max(last.time()),
        }
    }

    /// Travel time in seconds.
    pub fn duration(&self) -> i64 {
        self.end_time - self.start_time
    }

    /// Number of edges traversed.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn first_vertex(&self) -> Option<VertexId> {
        self.vertices.first().copied()
    }

    pub fn last_vertex(&self) -> Option<VertexId> {
        self.vertices.last().copied()
    }
}
