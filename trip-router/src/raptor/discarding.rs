//! Store keeping only elapsed times.

use std::collections::BTreeMap;

use super::store::check_stop;
use super::{RaptorError, RaptorStateStore, StopArrival};
use crate::graph::{Graph, VertexId};
use crate::search::SearchOptions;
use crate::state::{State, StateArena};

/// Elapsed seconds per stop. Memory is proportional to the number of
/// stops; arrivals come back as fresh states with no history.
#[derive(Debug, Clone)]
pub struct PathDiscardingStore {
    /// Stand-in state; only vertex, time and weight vary per stop.
    template: State,
    current: BTreeMap<VertexId, i64>,
    prev: BTreeMap<VertexId, i64>,
}

impl PathDiscardingStore {
    pub fn new(options: &SearchOptions) -> Self {
        Self {
            template: State::new(VertexId(0), options),
            current: BTreeMap::new(),
            prev: BTreeMap::new(),
        }
    }

    fn synthesize(&self, stop: VertexId, elapsed: i64) -> StopArrival {
        let mut state = self.template;
        state.vertex = stop;
        state.time = if state.arrive_by {
            state.start_time - elapsed
        } else {
            state.start_time + elapsed
        };
        state.weight = elapsed as f64;
        StopArrival::Detached(state)
    }
}

impl RaptorStateStore for PathDiscardingStore {
    fn put(
        &mut self,
        graph: &Graph,
        _arena: &mut StateArena,
        state: State,
    ) -> Result<bool, RaptorError> {
        check_stop(graph, state.vertex())?;
        let elapsed = state.elapsed_time();
        match self.current.get(&state.vertex()) {
            Some(&best) if best <= elapsed => Ok(false),
            _ => {
                self.current.insert(state.vertex(), elapsed);
                Ok(true)
            }
        }
    }

    fn get_current(&self, stop: VertexId) -> Option<StopArrival> {
        self.current
            .get(&stop)
            .map(|&elapsed| self.synthesize(stop, elapsed))
    }

    fn get_prev(&self, stop: VertexId) -> Option<StopArrival> {
        self.prev
            .get(&stop)
            .map(|&elapsed| self.synthesize(stop, elapsed))
    }

    fn advance_round(&mut self) {
        self.prev.clone_from(&self.current);
    }

    fn iter_current(&self) -> Box<dyn Iterator<Item = (VertexId, StopArrival)> + '_> {
        Box::new(
            self.current
                .iter()
                .map(|(&stop, &elapsed)| (stop, self.synthesize(stop, elapsed))),
        )
    }

    fn iter_prev(&self) -> Box<dyn Iterator<Item = (VertexId, StopArrival)> + '_> {
        Box::new(
            self.prev
                .iter()
                .map(|(&stop, &elapsed)| (stop, self.synthesize(stop, elapsed))),
        )
    }

    fn keeps_paths(&self) -> bool {
        false
    }
}
