//! Dominance rules and the per-vertex table of non-dominated states.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::graph::VertexId;
use crate::state::{State, StateArena, StateId};

/// Decides when one state at a vertex makes another redundant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DominanceFunction {
    /// Lower weight wins.
    #[default]
    MinimumWeight,
    /// Less elapsed time wins.
    EarliestArrival,
    /// Less walking wins.
    LeastWalk,
    /// Keep every state not beaten on weight, elapsed time, walking and boardings at once.
    Pareto,
}

impl DominanceFunction {
    /// True if `a` is at least as good as `b` on every metric compared.
    ///
    /// States on different trips (or one on board, one not) are never
    /// comparable: each can lead somewhere the other cannot.
    pub fn better_or_equal(self, a: &State, b: &State) -> bool {
        if a.trip() != b.trip() {
            return false;
        }
        match self {
            Self::MinimumWeight => a.weight() <= b.weight(),
            Self::EarliestArrival => a.elapsed_time() <= b.elapsed_time(),
            Self::LeastWalk => a.walk_distance() <= b.walk_distance(),
            Self::Pareto => {
                a.weight() <= b.weight()
                    && a.elapsed_time() <= b.elapsed_time()
                    && a.walk_distance() <= b.walk_distance()
                    && a.num_boardings() <= b.num_boardings()
            }
        }
    }
}

/// Non-dominated states per vertex, for one search.
///
/// States live in the search's [`StateArena`]; the tree only holds handles.
/// A handle dropped from the tree stays in the arena (later states may
/// still point back through it) but is never expanded again.
#[derive(Debug, Clone, Default)]
pub struct ShortestPathTree {
    dominance: DominanceFunction,
    states: HashMap<VertexId, Vec<StateId>>,
}

impl ShortestPathTree {
    pub fn new(dominance: DominanceFunction) -> Self {
        Self {
            dominance,
            states: HashMap::new(),
        }
    }

    pub fn dominance(&self) -> DominanceFunction {
        self.dominance
    }

    /// Offer a state to the tree.
    ///
    /// Rejected (returns `None`) if some retained state at the same vertex is
    /// at least as good. Otherwise the state is stored in `arena`, every
    /// retained state it dominates is dropped, and its handle is returned.
    pub fn add(&mut self, arena: &mut StateArena, state: State) -> Option<StateId> {
        let dominance = self.dominance;
        let existing = self.states.entry(state.vertex()).or_default();
        if existing
            .iter()
            .any(|&id| dominance.better_or_equal(&arena[id], &state))
        {
            return None;
        }
        existing.retain(|&id| !dominance.better_or_equal(&state, &arena[id]));
        let id = arena.push(state);
        existing.push(id);
        Some(id)
    }

    /// True if `id` is still retained at `vertex`.
    pub fn is_retained(&self, vertex: VertexId, id: StateId) -> bool {
        self.states_at(vertex).contains(&id)
    }

    pub fn states_at(&self, vertex: VertexId) -> &[StateId] {
        self.states
            .get(&vertex)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Lowest-weight retained state at `vertex`.
    pub fn best_state(&self, arena: &StateArena, vertex: VertexId) -> Option<StateId> {
        self.states_at(vertex)
            .iter()
            .copied()
            .min_by(|&a, &b| arena[a].weight().total_cmp(&arena[b].weight()))
    }

    pub fn contains(&self, vertex: VertexId) -> bool {
        !self.states_at(vertex).is_empty()
    }

    /// Vertices with at least one retained state.
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.states
            .iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(&v, _)| v)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices().count()
    }

    pub fn state_count(&self) -> usize {
        self.states.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
fn test_state(weight: f64, elapsed: i64, walk: f64, boardings: u32) -> State {
    use crate::search::SearchOptions;

    let options = SearchOptions::default();
    let mut state = State::at_time(VertexId(0), elapsed, &options)
        .with_weight(weight)
        .with_walk_distance(walk);
    state.num_boardings = boardings;
    state
}
