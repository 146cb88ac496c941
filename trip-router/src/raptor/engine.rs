//! Round-based transit propagation.
//!
//! Seeding walks one transfer out of every access stop. Each round then
//! rides every pattern serving a stop that improved in the previous round,
//! and walks one transfer from every stop the rides improved. After round `k` the store holds the best arrivals using at most
//! `k` transfers.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::{RaptorError, RaptorStateStore, StopArrival, StoreKind};
use crate::graph::{EdgeId, EdgeKind, Graph, PatternId, TraverseContext, TripPattern, VertexId};
use crate::search::SearchOptions;
use crate::state::{GraphPath, State, StateArena, StateId};

/// What one round changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoundSummary {
    pub round: usize,
    /// Stops improved by riding a pattern.
    pub by_transit: usize,
    /// Stops improved by a transfer after riding.
    pub by_transfer: usize,
}

impl RoundSummary {
    pub fn improved(&self) -> usize {
        self.by_transit + self.by_transfer
    }
}

/// Runs RAPTOR rounds over the transit part of a graph.
#[derive(Debug)]
pub struct RaptorRouter<'g> {
    graph: &'g Graph,
    options: SearchOptions,
    store: Box<dyn RaptorStateStore>,
    arena: StateArena,
    /// Stops improved since the last round started.
    marked: BTreeSet<VertexId>,
    rounds_run: usize,
}

impl<'g> RaptorRouter<'g> {
    /// Transit is always enabled, whatever `options.modes` says.
    pub fn new(graph: &'g Graph, mut options: SearchOptions, kind: StoreKind) -> Self {
        options.modes.transit = true;
        let store = kind.build(&options);
        Self {
            graph,
            options,
            store,
            arena: StateArena::new(),
            marked: BTreeSet::new(),
            rounds_run: 0,
        }
    }

    /// Seed the store with access states, one per stop reached by the
    /// access legs, then walk one transfer out of each seeded stop. Their
    /// own history is not kept.
    pub fn begin(&mut self, access: impl IntoIterator<Item = State>) -> Result<(), RaptorError> {
        let mut seeded = BTreeSet::new();
        for mut state in access {
            state.back_state = None;
            state.back_edge = None;
            let stop = state.vertex();
            if self.store.put(self.graph, &mut self.arena, state)? {
                seeded.insert(stop);
            }
        }

        let mut walked = BTreeSet::new();
        for &stop in &seeded {
            self.relax_transfers(stop, &mut walked)?;
        }
        debug!(
            access = seeded.len(),
            by_transfer = walked.difference(&seeded).count(),
            "raptor seeded"
        );
        self.marked.extend(seeded);
        self.marked.extend(walked);
        Ok(())
    }

    /// Seed, then run up to `max_transfers + 1` rounds, stopping early once
    /// a round improves nothing.
    pub fn run(&mut self, access: impl IntoIterator<Item = State>) -> Result<(), RaptorError> {
        self.begin(access)?;
        for _ in 0..=self.options.max_transfers {
            if self.run_round()?.improved() == 0 {
                break;
            }
        }
        Ok(())
    }

    /// Run one round.
    pub fn run_round(&mut self) -> Result<RoundSummary, RaptorError> {
        let round = self.rounds_run;
        if !self.store.keeps_paths() {
            // Nothing in the store points into the arena
            self.arena = StateArena::new();
        }
        self.store.advance_round();
        let marked = std::mem::take(&mut self.marked);

        let mut by_transit = BTreeSet::new();
        for (pattern, start) in self.patterns_to_scan(&marked) {
            self.scan_pattern(pattern, start, &marked, &mut by_transit)?;
        }

        let mut by_transfer = BTreeSet::new();
        for &stop in &by_transit {
            self.relax_transfers(stop, &mut by_transfer)?;
        }

        let summary = RoundSummary {
            round,
            by_transit: by_transit.len(),
            by_transfer: by_transfer.difference(&by_transit).count(),
        };
        self.marked = by_transit.union(&by_transfer).copied().collect();
        self.rounds_run += 1;

        debug!(
            round,
            by_transit = summary.by_transit,
            by_transfer = summary.by_transfer,
            "raptor round complete"
        );
        Ok(summary)
    }

    pub fn rounds_run(&self) -> usize {
        self.rounds_run
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Best arrival per stop after the last round, in stop order.
    pub fn states(&self) -> impl Iterator<Item = (VertexId, StopArrival)> + '_ {
        self.store.iter_current()
    }

    /// [`states`](Self::states) resolved to plain states.
    pub fn arrivals(&self) -> impl Iterator<Item = (VertexId, State)> + '_ {
        self.store
            .iter_current()
            .map(|(stop, arrival)| (stop, arrival.resolve(&self.arena)))
    }

    /// Seconds from the search start to the best arrival at `stop`.
    pub fn best_elapsed(&self, stop: VertexId) -> Option<i64> {
        self.store
            .get_current(stop)
            .map(|arrival| arrival.resolve(&self.arena).elapsed_time())
    }

    /// Path to the best arrival at `stop`, access stop first.
    ///
    /// Needs the path-preserving store.
    pub fn path_to(&self, stop: VertexId) -> Result<Option<GraphPath>, RaptorError> {
        if !self.store.keeps_paths() {
            return Err(RaptorError::PathsDiscarded);
        }
        Ok(self
            .store
            .get_current(stop)
            .and_then(StopArrival::state_id)
            .map(|id| self.arena.path(id)))
    }

    /// Patterns serving a marked stop, with the first marked index in
    /// riding order.
    fn patterns_to_scan(&self, marked: &BTreeSet<VertexId>) -> BTreeMap<PatternId, usize> {
        let transit = self.graph.transit();
        let mut scan: BTreeMap<PatternId, usize> = BTreeMap::new();
        for &stop in marked {
            for &(pattern, index) in transit.patterns_at(stop) {
                scan.entry(pattern)
                    .and_modify(|start| {
                        *start = if self.options.arrive_by {
                            (*start).max(index)
                        } else {
                            (*start).min(index)
                        }
                    })
                    .or_insert(index);
            }
        }
        scan
    }

    fn scan_pattern(
        &mut self,
        pattern: PatternId,
        start: usize,
        marked: &BTreeSet<VertexId>,
        improved: &mut BTreeSet<VertexId>,
    ) -> Result<(), RaptorError> {
        let graph = self.graph;
        let Some(pattern) = graph.transit().pattern(pattern) else {
            return Ok(());
        };
        let order: Box<dyn Iterator<Item = usize>> = if self.options.arrive_by {
            Box::new((0..=start).rev())
        } else {
            Box::new(start..pattern.len())
        };

        let mut riding: Option<(StateId, State)> = None;
        for i in order {
            let stop = pattern.stops()[i];

            if let Some((id, state)) = riding {
                let leave = self.leave_edges(pattern, i);
                for arrival in self.follow(id, state, &leave) {
                    if self.options.is_worst_time_exceeded(arrival.time()) {
                        continue;
                    }
                    if self.store.put(graph, &mut self.arena, arrival)? {
                        improved.insert(stop);
                    }
                }
            }

            if marked.contains(&stop) {
                if let Some(prev) = self.store.get_prev(stop) {
                    let (id, state) = self.materialize(prev);
                    let enter = self.enter_edges(pattern, i);
                    let boarded = self
                        .follow(id, state, &enter)
                        .into_iter()
                        .min_by_key(|s| if s.arrive_by() { -s.time() } else { s.time() });
                    if let Some(boarded) = boarded {
                        let switch = match &riding {
                            None => true,
                            Some((_, current)) => {
                                self.catches_earlier_trip(pattern, i, current, &boarded)
                            }
                        };
                        if switch {
                            riding = Some((self.arena.push(boarded), boarded));
                        }
                    }
                }
            }

            riding = match (riding, self.ride_edge(pattern, i)) {
                (Some((id, state)), Some(hop)) => self
                    .follow(id, state, &[hop])
                    .into_iter()
                    .next()
                    .map(|next| (self.arena.push(next), next)),
                _ => None,
            };
        }
        Ok(())
    }

    fn relax_transfers(
        &mut self,
        stop: VertexId,
        improved: &mut BTreeSet<VertexId>,
    ) -> Result<(), RaptorError> {
        let graph = self.graph;
        let Some(arrival) = self.store.get_current(stop) else {
            return Ok(());
        };
        let (id, state) = self.materialize(arrival);
        for &edge in graph.edges_from(stop, self.options.arrive_by) {
            if graph.edge(edge).kind() != EdgeKind::Transfer {
                continue;
            }
            for next in self.follow(id, state, &[edge]) {
                if self.options.is_worst_time_exceeded(next.time()) {
                    continue;
                }
                let reached = next.vertex();
                if self.store.put(graph, &mut self.arena, next)? {
                    improved.insert(reached);
                }
            }
        }
        Ok(())
    }

    /// True if `boarded` gets on a trip that reaches stop `i` sooner (in
    /// search order) than the one being ridden.
    fn catches_earlier_trip(
        &self,
        pattern: &TripPattern,
        i: usize,
        riding: &State,
        boarded: &State,
    ) -> bool {
        let Some(current) = riding.trip().and_then(|t| pattern.trip(t.trip)) else {
            return true;
        };
        let day = self.graph.transit().service_day();
        if self.options.arrive_by {
            boarded.time() > day.absolute(current.arrival(i))
        } else {
            boarded.time() < day.absolute(current.departure(i))
        }
    }

    /// Stop → on board at `i`, in search direction.
    fn enter_edges(&self, pattern: &TripPattern, i: usize) -> Vec<EdgeId> {
        let transit = self.graph.transit();
        let stop = pattern.stops()[i];
        if self.options.arrive_by {
            [transit.pre_alight_edge(stop), pattern.alight_edge(i)]
        } else {
            [transit.pre_board_edge(stop), pattern.board_edge(i)]
        }
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default()
    }

    /// On board at `i` → stop, in search direction.
    fn leave_edges(&self, pattern: &TripPattern, i: usize) -> Vec<EdgeId> {
        let transit = self.graph.transit();
        let stop = pattern.stops()[i];
        if self.options.arrive_by {
            [pattern.board_edge(i), transit.pre_board_edge(stop)]
        } else {
            [pattern.alight_edge(i), transit.pre_alight_edge(stop)]
        }
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default()
    }

    /// Hop leaving pattern stop `i` in search direction.
    fn ride_edge(&self, pattern: &TripPattern, i: usize) -> Option<EdgeId> {
        if self.options.arrive_by {
            i.checked_sub(1).and_then(|prev| pattern.hop_edge(prev))
        } else {
            pattern.hop_edge(i)
        }
    }

    /// Traverse `edges` in order from `(id, state)`, keeping the first
    /// successor at each intermediate step. Returns every successor of the
    /// last edge, not yet in the arena.
    fn follow(&mut self, id: StateId, state: State, edges: &[EdgeId]) -> Vec<State> {
        let Some((&last, rest)) = edges.split_last() else {
            return Vec::new();
        };
        let (mut id, mut state) = (id, state);
        for &edge in rest {
            match self.traverse(id, &state, edge).into_iter().next() {
                Some(next) => {
                    id = self.arena.push(next);
                    state = next;
                }
                None => return Vec::new(),
            }
        }
        self.traverse(id, &state, last)
    }

    fn traverse(&self, back: StateId, state: &State, edge: EdgeId) -> Vec<State> {
        let cx = TraverseContext {
            graph: self.graph,
            options: &self.options,
            edge,
            back,
        };
        self.graph.edge(edge).traverse(state, &cx)
    }

    fn materialize(&mut self, arrival: StopArrival) -> (StateId, State) {
        match arrival {
            StopArrival::Tracked(id) => (id, self.arena[id]),
            StopArrival::Detached(state) => (self.arena.push(state), state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphBuilder, ServiceDay, TripTimes};

    pub(super) const TEN_AM: i64 = 10 * 3600;

    fn line(times: &[&[&str]]) -> (Graph, Vec<VertexId>) {
        let mut b = GraphBuilder::new(ServiceDay::default());
        let stops: Vec<_> = (0..times[0].len())
            .map(|i| b.transit_stop(format!("S{}", i + 1), i as f64 * 1000.0, 0.0))
            .collect();
        let trips = times
            .iter()
            .enumerate()
            .map(|(n, t)| TripTimes::parse(format!("T{n}"), t).unwrap())
            .collect();
        b.pattern("L1", &stops, trips).unwrap();
        (b.build(), stops)
    }

    pub(super) fn options_at(start_time: i64) -> SearchOptions {
        SearchOptions {
            start_time,
            ..SearchOptions::transit()
        }
    }

    #[test]
    fn single_line_reaches_downstream_stops() {
        for kind in [StoreKind::PathDiscarding, StoreKind::PathPreserving] {
            let (graph, stops) = line(&[&["10:00", "10:05", "10:10"]]);
            let options = options_at(TEN_AM);
            let mut router = RaptorRouter::new(&graph, options.clone(), kind);
            router.begin([State::new(stops[0], &options)]).unwrap();

            let first = router.run_round().unwrap();
            assert_eq!(first.by_transit, 2);
            assert_eq!(router.best_elapsed(stops[1]), Some(300));
            assert_eq!(router.best_elapsed(stops[2]), Some(600));

            let second = router.run_round().unwrap();
            assert_eq!(second.improved(), 0);
            assert_eq!(router.best_elapsed(stops[0]), Some(0));
            assert_eq!(router.best_elapsed(stops[1]), Some(300));
            assert_eq!(router.best_elapsed(stops[2]), Some(600));
        }
    }

    #[test]
    fn run_stops_after_a_round_without_improvement() {
        let (graph, stops) = line(&[&["10:00", "10:05", "10:10"]]);
        let options = SearchOptions {
            max_transfers: 5,
            ..options_at(TEN_AM)
        };
        let mut router = RaptorRouter::new(&graph, options.clone(), StoreKind::PathDiscarding);
        router.run([State::new(stops[0], &options)]).unwrap();
        assert_eq!(router.rounds_run(), 2);
        let reached: Vec<_> = router.arrivals().map(|(s, st)| (s, st.elapsed_time())).collect();
        assert_eq!(reached, vec![(stops[0], 0), (stops[1], 300), (stops[2], 600)]);
    }

    #[test]
    fn missed_trip_boards_the_next_one() {
        let (graph, stops) = line(&[&["10:00", "10:05", "10:10"], &["10:20", "10:25", "10:30"]]);
        let options = options_at(TEN_AM + 60);
        let mut router = RaptorRouter::new(&graph, options.clone(), StoreKind::PathDiscarding);
        router.run([State::new(stops[0], &options)]).unwrap();
        assert_eq!(router.best_elapsed(stops[2]), Some(30 * 60 - 60));
    }

    #[test]
    fn later_boarding_catches_an_earlier_trip() {
        // Reaching S2 early by other means beats staying on the late trip from S1.
        let (graph, stops) = line(&[&["10:00", "10:05", "10:10"], &["10:20", "10:25", "10:30"]]);
        let options = options_at(TEN_AM);
        let mut router = RaptorRouter::new(&graph, options.clone(), StoreKind::PathDiscarding);
        router
            .run([
                State::at_time(stops[0], TEN_AM + 120, &options),
                State::at_time(stops[1], TEN_AM + 240, &options),
            ])
            .unwrap();
        assert_eq!(router.best_elapsed(stops[2]), Some(600));
    }

    fn two_lines() -> (Graph, [VertexId; 4]) {
        let mut b = GraphBuilder::new(ServiceDay::default());
        let s1 = b.transit_stop("S1", 0.0, 0.0);
        let s2 = b.transit_stop("S2", 1000.0, 0.0);
        let s3 = b.transit_stop("S3", 1000.0, 100.0);
        let s4 = b.transit_stop("S4", 2000.0, 100.0);
        b.pattern(
            "L1",
            &[s1, s2],
            vec![TripTimes::parse("A", &["10:00", "10:05"]).unwrap()],
        )
        .unwrap();
        b.transfer(s2, s3, 120).unwrap();
        b.pattern(
            "L2",
            &[s3, s4],
            vec![TripTimes::parse("B", &["10:10", "10:20"]).unwrap()],
        )
        .unwrap();
        (b.build(), [s1, s2, s3, s4])
    }

    fn walk_then_ride() -> (Graph, [VertexId; 3]) {
        let mut b = GraphBuilder::new(ServiceDay::default());
        let s0 = b.transit_stop("S0", 0.0, 0.0);
        let s1 = b.transit_stop("S1", 50.0, 0.0);
        let s2 = b.transit_stop("S2", 1050.0, 0.0);
        b.transfer(s0, s1, 60).unwrap();
        b.pattern(
            "L1",
            &[s1, s2],
            vec![TripTimes::parse("A", &["10:05", "10:10"]).unwrap()],
        )
        .unwrap();
        (b.build(), [s0, s1, s2])
    }

    #[test]
    fn access_stops_transfer_before_the_first_ride() {
        for kind in [StoreKind::PathDiscarding, StoreKind::PathPreserving] {
            let (graph, [s0, s1, s2]) = walk_then_ride();
            let options = SearchOptions {
                max_transfers: 3,
                ..options_at(TEN_AM)
            };
            let mut router = RaptorRouter::new(&graph, options.clone(), kind);
            router.run([State::new(s0, &options)]).unwrap();

            assert_eq!(router.best_elapsed(s0), Some(0));
            assert_eq!(router.best_elapsed(s1), Some(60));
            assert_eq!(router.best_elapsed(s2), Some(600));
            assert_eq!(router.rounds_run(), 2);

            if kind == StoreKind::PathPreserving {
                let path = router.path_to(s2).unwrap().unwrap();
                assert_eq!(path.first_vertex(), Some(s0));
                assert_eq!(path.last_vertex(), Some(s2));
            }
        }
    }

    #[test]
    fn transfers_are_walked_after_riding() {
        let (graph, [s1, s2, s3, s4]) = two_lines();
        let options = options_at(TEN_AM);
        let mut router = RaptorRouter::new(&graph, options.clone(), StoreKind::PathDiscarding);
        router.begin([State::new(s1, &options)]).unwrap();

        let first = router.run_round().unwrap();
        assert_eq!((first.by_transit, first.by_transfer), (1, 1));
        assert_eq!(router.best_elapsed(s2), Some(300));
        assert_eq!(router.best_elapsed(s3), Some(420));
        assert_eq!(router.best_elapsed(s4), None);

        router.run_round().unwrap();
        assert_eq!(router.best_elapsed(s4), Some(1200));
    }

    #[test]
    fn max_transfers_bounds_the_rounds() {
        let (graph, [s1, _, _, s4]) = two_lines();
        let options = SearchOptions {
            max_transfers: 0,
            ..options_at(TEN_AM)
        };
        let mut router = RaptorRouter::new(&graph, options.clone(), StoreKind::PathDiscarding);
        router.run([State::new(s1, &options)]).unwrap();
        assert_eq!(router.rounds_run(), 1);
        assert_eq!(router.best_elapsed(s4), None);
    }

    #[test]
    fn arrive_by_rides_backwards() {
        let (graph, stops) = line(&[&["10:00", "10:05", "10:10"]]);
        let options = SearchOptions {
            arrive_by: true,
            ..options_at(TEN_AM + 20 * 60)
        };
        let mut router = RaptorRouter::new(&graph, options.clone(), StoreKind::PathPreserving);
        router.run([State::new(stops[2], &options)]).unwrap();

        assert_eq!(router.best_elapsed(stops[1]), Some(15 * 60));
        assert_eq!(router.best_elapsed(stops[0]), Some(20 * 60));
        let (_, at_first) = router.arrivals().find(|(s, _)| *s == stops[0]).unwrap();
        assert_eq!(at_first.time(), TEN_AM);
        assert!(!at_first.is_on_board());
    }

    #[test]
    fn preserved_paths_start_at_the_access_stop() {
        let (graph, [s1, _, s3, s4]) = two_lines();
        let options = options_at(TEN_AM);
        let mut router = RaptorRouter::new(&graph, options.clone(), StoreKind::PathPreserving);
        router.run([State::new(s1, &options)]).unwrap();

        let path = router.path_to(s4).unwrap().unwrap();
        assert_eq!(path.first_vertex(), Some(s1));
        assert_eq!(path.last_vertex(), Some(s4));
        assert!(path.vertices.contains(&s3));
        assert_eq!(path.duration(), 1200);
        assert!(router.path_to(VertexId(999)).unwrap().is_none());
    }

    #[test]
    fn discarding_store_has_no_paths() {
        let (graph, stops) = line(&[&["10:00", "10:05"]]);
        let options = options_at(TEN_AM);
        let mut router = RaptorRouter::new(&graph, options.clone(), StoreKind::PathDiscarding);
        router.run([State::new(stops[0], &options)]).unwrap();
        assert_eq!(router.path_to(stops[1]), Err(RaptorError::PathsDiscarded));
    }

    #[test]
    fn access_at_a_street_vertex_is_rejected() {
        let mut b = GraphBuilder::new(ServiceDay::default());
        let street = b.street_vertex("corner", 0.0, 0.0);
        let graph = b.build();
        let options = options_at(TEN_AM);
        let mut router = RaptorRouter::new(&graph, options.clone(), StoreKind::PathDiscarding);
        assert_eq!(
            router.run([State::new(street, &options)]),
            Err(RaptorError::NotATransitStop(street))
        );
    }
}
