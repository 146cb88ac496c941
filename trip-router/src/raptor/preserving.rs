//! Store keeping full states, so paths can be rebuilt.

use std::collections::BTreeMap;

use super::store::check_stop;
use super::{RaptorError, RaptorStateStore, StopArrival};
use crate::graph::{Graph, VertexId};
use crate::state::{State, StateArena, StateId};

/// Best state per stop, held as handles into the router's arena.
#[derive(Debug, Clone, Default)]
pub struct PathPreservingStore {
    current: BTreeMap<VertexId, (StateId, i64)>,
    prev: BTreeMap<VertexId, (StateId, i64)>,
}

impl PathPreservingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RaptorStateStore for PathPreservingStore {
    fn put(
        &mut self,
        graph: &Graph,
        arena: &mut StateArena,
        state: State,
    ) -> Result<bool, RaptorError> {
        check_stop(graph, state.vertex())?;
        let elapsed = state.elapsed_time();
        if let Some(&(_, best)) = self.current.get(&state.vertex()) {
            if best <= elapsed {
                return Ok(false);
            }
        }
        // The previous round's entry keeps its own handle
        let id = arena.push(state);
        self.current.insert(state.vertex(), (id, elapsed));
        Ok(true)
    }

    fn get_current(&self, stop: VertexId) -> Option<StopArrival> {
        self.current
            .get(&stop)
            .map(|&(id, _)| StopArrival::Tracked(id))
    }

    fn get_prev(&self, stop: VertexId) -> Option<StopArrival> {
        self.prev.get(&stop).map(|&(id, _)| StopArrival::Tracked(id))
    }

    fn advance_round(&mut self) {
        self.prev.clone_from(&self.current);
    }

    fn iter_current(&self) -> Box<dyn Iterator<Item = (VertexId, StopArrival)> + '_> {
        Box::new(
            self.current
                .iter()
                .map(|(&stop, &(id, _))| (stop, StopArrival::Tracked(id))),
        )
    }

    fn iter_prev(&self) -> Box<dyn Iterator<Item = (VertexId, StopArrival)> + '_> {
        Box::new(
            self.prev
                .iter()
                .map(|(&stop, &(id, _))| (stop, StopArrival::Tracked(id))),
        )
    }

    fn keeps_paths(&self) -> bool {
        true
    }
}
