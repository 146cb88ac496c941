//! The per-stop arrival store shared by both RAPTOR variants.

use std::fmt;

use super::{PathDiscardingStore, PathPreservingStore, RaptorError};
use crate::graph::{Graph, VertexId};
use crate::search::SearchOptions;
use crate::state::{State, StateArena, StateId};

/// Best known arrival at a stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopArrival {
    /// A state in the router's arena, with its full back chain.
    Tracked(StateId),
    /// A stand-in state with no history.
    Detached(State),
}

impl StopArrival {
    /// The arrival as a state.
    pub fn resolve(self, arena: &StateArena) -> State {
        match self {
            Self::Tracked(id) => arena[id],
            Self::Detached(state) => state,
        }
    }

    pub fn state_id(self) -> Option<StateId> {
        match self {
            Self::Tracked(id) => Some(id),
            Self::Detached(_) => None,
        }
    }
}

/// Which store a router uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// Only elapsed times; cheap, no paths.
    #[default]
    PathDiscarding,
    /// Full states; paths can be rebuilt.
    PathPreserving,
}

impl StoreKind {
    pub fn build(self, options: &SearchOptions) -> Box<dyn RaptorStateStore> {
        match self {
            Self::PathDiscarding => Box::new(PathDiscardingStore::new(options)),
            Self::PathPreserving => Box::new(PathPreservingStore::new()),
        }
    }
}

/// Best arrival per transit stop, for the round in progress ("current") and
/// as of the start of that round ("previous").
///
/// `current` starts each round as a copy of the last round's result and only
/// ever improves, so a stop's best elapsed time never gets worse from one
/// round to the next.
pub trait RaptorStateStore: fmt::Debug + Send {
    /// Record `state` if it reaches its stop sooner than anything recorded.
    ///
    /// `Ok(false)` means not an improvement. Errors if the state isn't at a
    /// transit stop.
    fn put(
        &mut self,
        graph: &Graph,
        arena: &mut StateArena,
        state: State,
    ) -> Result<bool, RaptorError>;

    fn get_current(&self, stop: VertexId) -> Option<StopArrival>;

    fn get_prev(&self, stop: VertexId) -> Option<StopArrival>;

    /// Start a new round: previous becomes a snapshot of current.
    fn advance_round(&mut self);

    /// Every stop recorded in the current round, in stop order.
    fn iter_current(&self) -> Box<dyn Iterator<Item = (VertexId, StopArrival)> + '_>;

    /// Every stop recorded as of the previous round, in stop order.
    fn iter_prev(&self) -> Box<dyn Iterator<Item = (VertexId, StopArrival)> + '_>;

    /// True if arrivals are [`StopArrival::Tracked`].
    fn keeps_paths(&self) -> bool;
}

/// Reject anything that isn't a transit stop.
pub(crate) fn check_stop(graph: &Graph, vertex: VertexId) -> Result<(), RaptorError> {
    if graph.is_transit_stop(vertex) {
        Ok(())
    } else {
        Err(RaptorError::NotATransitStop(vertex))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphBuilder, ServiceDay};

    fn fixture() -> (Graph, VertexId, VertexId, VertexId) {
        let mut b = GraphBuilder::new(ServiceDay::default());
        let s1 = b.transit_stop("S1", 0.0, 0.0);
        let s2 = b.transit_stop("S2", 100.0, 0.0);
        let street = b.street_vertex("street", 50.0, 50.0);
        (b.build(), s1, s2, street)
    }

    fn at(stop: VertexId, elapsed: i64, options: &SearchOptions) -> State {
        State::at_time(stop, options.start_time + elapsed, options)
    }

    fn elapsed(arrival: Option<StopArrival>, arena: &StateArena) -> Option<i64> {
        arrival.map(|a| a.resolve(arena).elapsed_time())
    }

    /// After advancing, previous equals what current was, and puts only touch current.
    fn check_round_discipline(kind: StoreKind) {
        let (graph, s1, s2, _) = fixture();
        let options = SearchOptions {
            start_time: 1_000,
            ..SearchOptions::transit()
        };
        let mut arena = StateArena::new();
        let mut store = kind.build(&options);

        assert!(store.put(&graph, &mut arena, at(s1, 300, &options)).unwrap());
        assert_eq!(elapsed(store.get_current(s1), &arena), Some(300));
        assert_eq!(store.get_prev(s1), None);

        store.advance_round();
        for stop in [s1, s2] {
            assert_eq!(
                elapsed(store.get_prev(stop), &arena),
                elapsed(store.get_current(stop), &arena)
            );
        }

        assert!(store.put(&graph, &mut arena, at(s1, 200, &options)).unwrap());
        assert!(store.put(&graph, &mut arena, at(s2, 500, &options)).unwrap());
        assert_eq!(elapsed(store.get_current(s1), &arena), Some(200));
        assert_eq!(elapsed(store.get_prev(s1), &arena), Some(300));
        assert_eq!(store.get_prev(s2), None);

        // Not strictly better
        assert!(!store.put(&graph, &mut arena, at(s1, 200, &options)).unwrap());
        assert!(!store.put(&graph, &mut arena, at(s2, 900, &options)).unwrap());

        let current: Vec<_> = store
            .iter_current()
            .map(|(stop, a)| (stop, a.resolve(&arena).elapsed_time()))
            .collect();
        assert_eq!(current, vec![(s1, 200), (s2, 500)]);
        let prev: Vec<_> = store.iter_prev().map(|(stop, _)| stop).collect();
        assert_eq!(prev, vec![s1]);
    }

    #[test]
    fn path_discarding_round_discipline() {
        check_round_discipline(StoreKind::PathDiscarding);
    }

    #[test]
    fn path_preserving_round_discipline() {
        check_round_discipline(StoreKind::PathPreserving);
    }

    #[test]
    fn put_rejects_non_stops() {
        let (graph, _, _, street) = fixture();
        let options = SearchOptions::transit();
        for kind in [StoreKind::PathDiscarding, StoreKind::PathPreserving] {
            let mut store = kind.build(&options);
            let mut arena = StateArena::new();
            assert_eq!(
                store.put(&graph, &mut arena, State::new(street, &options)),
                Err(RaptorError::NotATransitStop(street))
            );
        }
    }

    #[test]
    fn only_preserving_store_tracks_states() {
        let (graph, s1, _, _) = fixture();
        let options = SearchOptions::transit();
        let mut arena = StateArena::new();

        let mut discarding = StoreKind::PathDiscarding.build(&options);
        discarding
            .put(&graph, &mut arena, State::new(s1, &options))
            .unwrap();
        assert!(!discarding.keeps_paths());
        assert!(matches!(discarding.get_current(s1), Some(StopArrival::Detached(_))));
        assert!(arena.is_empty());

        let mut preserving = StoreKind::PathPreserving.build(&options);
        preserving
            .put(&graph, &mut arena, State::new(s1, &options))
            .unwrap();
        assert!(preserving.keeps_paths());
        assert!(preserving.get_current(s1).unwrap().state_id().is_some());
        assert_eq!(arena.len(), 1);
    }
}
