//! Builder for successor states.

use super::State;
use crate::graph::{Edge, TraverseContext, TripRef};

/// Derives a successor state from its parent while an edge is traversed.
///
/// The editor starts as a copy of the parent placed at the far end of the
/// edge (its `to` vertex, or its `from` vertex in an arrive-by search), linked
/// back to the parent. Edges adjust cost, time and vehicle status, then call
/// [`make_state`](Self::make_state).
#[derive(Debug, Clone)]
pub struct StateEditor {
    child: State,
    rejected: bool,
}

impl StateEditor {
    /// Start a successor of `parent` across `edge`.
    pub fn new(parent: &State, edge: &dyn Edge, cx: &TraverseContext<'_>) -> Self {
        let mut child = *parent;
        child.vertex = if parent.arrive_by {
            edge.from_vertex()
        } else {
            edge.to_vertex()
        };
        child.back_state = Some(cx.back);
        child.back_edge = Some(cx.edge);
        Self {
            child,
            rejected: false,
        }
    }

    /// Add routing cost. Non-finite increments reject the state.
    ///
    /// Negative increments are applied as given; the search engine treats a
    /// weight decrease as a data defect.
    pub fn increment_weight(&mut self, delta: f64) {
        if !delta.is_finite() {
            self.rejected = true;
            return;
        }
        self.child.weight += delta;
    }

    /// Move time forward by `seconds` in the direction of the search.
    pub fn increment_time(&mut self, seconds: i64) {
        if self.child.arrive_by {
            self.child.time -= seconds;
        } else {
            self.child.time += seconds;
        }
    }

    /// Set the absolute time.
    pub fn set_time(&mut self, time: i64) {
        self.child.time = time;
    }

    pub fn time(&self) -> i64 {
        self.child.time
    }

    pub fn arrive_by(&self) -> bool {
        self.child.arrive_by
    }

    pub fn increment_walk_distance(&mut self, metres: f64) {
        self.child.walk_distance += metres;
    }

    pub fn walk_distance(&self) -> f64 {
        self.child.walk_distance
    }

    /// Get on `trip`. Counts a boarding in either search direction.
    pub fn board(&mut self, trip: TripRef) {
        self.child.trip = Some(trip);
        self.child.num_boardings += 1;
    }

    /// Leave the current vehicle.
    pub fn alight(&mut self) {
        self.child.trip = None;
    }

    /// Mark the traversal as impossible.
    pub fn reject(&mut self) {
        self.rejected = true;
    }

    /// Finish editing. Returns `None` if the traversal was rejected.
    pub fn make_state(self) -> Option<State> {
        if self.rejected {
            None
        } else {
            Some(self.child)
        }
    }
}
