//! Observer hooks fired during a search.

use crate::graph::EdgeId;
use crate::state::State;

/// Watches a search without influencing it.
pub trait TraverseVisitor {
    /// A traversal of `edge` produced `state`, before any pruning.
    fn visit_edge(&mut self, _edge: EdgeId, _state: &State) {}

    /// `state` was taken off the queue for expansion.
    fn visit_vertex(&mut self, _state: &State) {}

    /// `state` was accepted into the tree and queued.
    fn visit_enqueue(&mut self, _state: &State) {}
}

/// Counts hook calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountingVisitor {
    pub edges: usize,
    pub vertices: usize,
    pub enqueued: usize,
}

impl TraverseVisitor for CountingVisitor {
    fn visit_edge(&mut self, _edge: EdgeId, _state: &State) {
        self.edges += 1;
    }

    fn visit_vertex(&mut self, _state: &State) {
        self.vertices += 1;
    }

    fn visit_enqueue(&mut self, _state: &State) {
        self.enqueued += 1;
    }
}
