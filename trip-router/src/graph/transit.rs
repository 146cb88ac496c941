//! Trip patterns, timetables and the edges that ride them.
//!
//! A stop is wired as
//!
//! ```text
//! stop --pre-board--> depart --board--> pattern stop --hop--> pattern stop --alight--> arrive --pre-alight--> stop
//! ```
//!
//! with one pattern-stop vertex per (pattern, stop index). Boarding picks a
//! trip; hops then follow that trip's timetable.

use std::collections::HashMap;

use super::{
    Edge, EdgeId, EdgeKind, Graph, PatternId, ServiceDay, ServiceTime, TimeError,
    TraverseContext, VertexId,
};
use crate::search::SearchOptions;
use crate::state::State;

/// A specific trip of a specific pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TripRef {
    pub pattern: PatternId,
    pub trip: usize,
}

/// Stop times of one trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripTimes {
    pub trip_id: String,
    arrivals: Vec<ServiceTime>,
    departures: Vec<ServiceTime>,
}

impl TripTimes {
    /// Create a trip with separate arrival and departure times.
    pub fn new(
        trip_id: impl Into<String>,
        arrivals: Vec<ServiceTime>,
        departures: Vec<ServiceTime>,
    ) -> Self {
        Self {
            trip_id: trip_id.into(),
            arrivals,
            departures,
        }
    }

    /// Create a trip that departs each stop the moment it arrives.
    pub fn from_stop_times(trip_id: impl Into<String>, times: Vec<ServiceTime>) -> Self {
        Self::new(trip_id, times.clone(), times)
    }

    /// Parse `HH:MM[:SS]` stop times (no dwell).
    ///
    /// # Examples
    ///
    /// ```
    /// use trip_router::graph::TripTimes;
    ///
    /// let trip = TripTimes::parse("T1", &["10:00", "10:05", "10:10"]).unwrap();
    /// assert_eq!(trip.len(), 3);
    /// assert_eq!(trip.arrival(1).to_string(), "10:05");
    /// ```
    pub fn parse(trip_id: impl Into<String>, times: &[&str]) -> Result<Self, TimeError> {
        let times = times
            .iter()
            .map(|t| ServiceTime::parse(t))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_stop_times(trip_id, times))
    }

    pub fn len(&self) -> usize {
        self.arrivals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrivals.is_empty()
    }

    pub fn arrival(&self, stop_index: usize) -> ServiceTime {
        self.arrivals[stop_index]
    }

    pub fn departure(&self, stop_index: usize) -> ServiceTime {
        self.departures[stop_index]
    }

    /// First stop index where time runs backwards, if any.
    pub(crate) fn first_inconsistency(&self) -> Option<usize> {
        if self.arrivals.len() != self.departures.len() {
            return Some(self.arrivals.len().min(self.departures.len()));
        }
        for i in 0..self.len() {
            if self.departures[i] < self.arrivals[i] {
                return Some(i);
            }
            if i + 1 < self.len() && self.arrivals[i + 1] < self.departures[i] {
                return Some(i + 1);
            }
        }
        None
    }
}

/// An ordered sequence of stops served by a set of trips.
#[derive(Debug, Clone)]
pub struct TripPattern {
    pub id: PatternId,
    pub name: String,
    pub(crate) stops: Vec<VertexId>,
    pub(crate) pattern_stops: Vec<VertexId>,
    pub(crate) trips: Vec<TripTimes>,
    pub(crate) board_edges: Vec<Option<EdgeId>>,
    pub(crate) alight_edges: Vec<Option<EdgeId>>,
    pub(crate) hop_edges: Vec<EdgeId>,
    pub(crate) flag_stop_service: bool,
}

impl TripPattern {
    /// Transit stop vertices, in service order.
    pub fn stops(&self) -> &[VertexId] {
        &self.stops
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn trips(&self) -> &[TripTimes] {
        &self.trips
    }

    pub fn trip(&self, index: usize) -> Option<&TripTimes> {
        self.trips.get(index)
    }

    /// On-board vertex at `stop_index`.
    pub fn pattern_stop(&self, stop_index: usize) -> Option<VertexId> {
        self.pattern_stops.get(stop_index).copied()
    }

    /// Board edge at `stop_index` (none at the last stop).
    pub fn board_edge(&self, stop_index: usize) -> Option<EdgeId> {
        self.board_edges.get(stop_index).copied().flatten()
    }

    /// Alight edge at `stop_index` (none at the first stop).
    pub fn alight_edge(&self, stop_index: usize) -> Option<EdgeId> {
        self.alight_edges.get(stop_index).copied().flatten()
    }

    /// Hop from `stop_index` to `stop_index + 1`.
    pub fn hop_edge(&self, stop_index: usize) -> Option<EdgeId> {
        self.hop_edges.get(stop_index).copied()
    }

    /// True if riders may flag down vehicles between stops.
    pub fn has_flag_stop_service(&self) -> bool {
        self.flag_stop_service
    }

    /// Trips departing `stop_index` at or after `time`, earliest first.
    fn departures_from(
        &self,
        day: &ServiceDay,
        stop_index: usize,
        time: i64,
        limit: usize,
    ) -> Vec<(usize, i64)> {
        let mut found: Vec<(usize, i64)> = self
            .trips
            .iter()
            .enumerate()
            .map(|(i, trip)| (i, day.absolute(trip.departure(stop_index))))
            .filter(|&(_, departs)| departs >= time)
            .collect();
        found.sort_by_key(|&(i, departs)| (departs, i));
        found.truncate(limit);
        found
    }

    /// Trips arriving at `stop_index` at or before `time`, latest first.
    fn arrivals_at(
        &self,
        day: &ServiceDay,
        stop_index: usize,
        time: i64,
        limit: usize,
    ) -> Vec<(usize, i64)> {
        let mut found: Vec<(usize, i64)> = self
            .trips
            .iter()
            .enumerate()
            .map(|(i, trip)| (i, day.absolute(trip.arrival(stop_index))))
            .filter(|&(_, arrives)| arrives <= time)
            .collect();
        found.sort_by_key(|&(i, arrives)| (std::cmp::Reverse(arrives), i));
        found.truncate(limit);
        found
    }
}

/// Lookup tables over the transit part of a graph.
#[derive(Debug, Default)]
pub struct TransitIndex {
    pub(crate) service_day: ServiceDay,
    pub(crate) patterns: Vec<TripPattern>,
    pub(crate) stop_depart: HashMap<VertexId, VertexId>,
    pub(crate) stop_arrive: HashMap<VertexId, VertexId>,
    pub(crate) pre_board: HashMap<VertexId, EdgeId>,
    pub(crate) pre_alight: HashMap<VertexId, EdgeId>,
    pub(crate) patterns_by_stop: HashMap<VertexId, Vec<(PatternId, usize)>>,
    pub(crate) flag_stop_patterns: HashMap<EdgeId, Vec<PatternId>>,
    pub(crate) max_hop_speed: f64,
    pub(crate) max_transfer_speed: f64,
}

impl TransitIndex {
    pub fn service_day(&self) -> &ServiceDay {
        &self.service_day
    }

    pub fn patterns(&self) -> &[TripPattern] {
        &self.patterns
    }

    pub fn pattern(&self, id: PatternId) -> Option<&TripPattern> {
        self.patterns.get(id.index())
    }

    /// Pre-board edge leaving `stop`.
    pub fn pre_board_edge(&self, stop: VertexId) -> Option<EdgeId> {
        self.pre_board.get(&stop).copied()
    }

    /// Pre-alight edge entering `stop`.
    pub fn pre_alight_edge(&self, stop: VertexId) -> Option<EdgeId> {
        self.pre_alight.get(&stop).copied()
    }

    pub fn depart_vertex(&self, stop: VertexId) -> Option<VertexId> {
        self.stop_depart.get(&stop).copied()
    }

    pub fn arrive_vertex(&self, stop: VertexId) -> Option<VertexId> {
        self.stop_arrive.get(&stop).copied()
    }

    /// Patterns serving `stop`, with the stop's index in each.
    pub fn patterns_at(&self, stop: VertexId) -> &[(PatternId, usize)] {
        self.patterns_by_stop
            .get(&stop)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Patterns with flag-stop service along a street edge.
    pub fn flag_stop_patterns(&self, street_edge: EdgeId) -> &[PatternId] {
        self.flag_stop_patterns
            .get(&street_edge)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Fastest straight-line speed of any hop, in m/s.
    pub fn max_hop_speed(&self) -> f64 {
        self.max_hop_speed
    }

    /// Fastest straight-line speed of any transfer, in m/s.
    pub fn max_transfer_speed(&self) -> f64 {
        self.max_transfer_speed
    }
}

/// Enter the departure side of a stop.
#[derive(Debug, Clone)]
pub struct PreBoardEdge {
    pub(crate) stop: VertexId,
    pub(crate) depart: VertexId,
}

impl Edge for PreBoardEdge {
    fn from_vertex(&self) -> VertexId {
        self.stop
    }

    fn to_vertex(&self) -> VertexId {
        self.depart
    }

    fn kind(&self) -> EdgeKind {
        EdgeKind::PreBoard
    }

    fn traverse(&self, s0: &State, cx: &TraverseContext<'_>) -> Vec<State> {
        if s0.is_on_board() || !cx.options.modes.transit {
            return Vec::new();
        }
        cx.edit(s0, self).make_state().into_iter().collect()
    }

    fn weight_lower_bound(&self, _graph: &Graph, options: &SearchOptions) -> f64 {
        if options.modes.transit { 0.0 } else { f64::INFINITY }
    }
}

/// Leave the arrival side of a stop.
#[derive(Debug, Clone)]
pub struct PreAlightEdge {
    pub(crate) arrive: VertexId,
    pub(crate) stop: VertexId,
}

impl Edge for PreAlightEdge {
    fn from_vertex(&self) -> VertexId {
        self.arrive
    }

    fn to_vertex(&self) -> VertexId {
        self.stop
    }

    fn kind(&self) -> EdgeKind {
        EdgeKind::PreAlight
    }

    fn traverse(&self, s0: &State, cx: &TraverseContext<'_>) -> Vec<State> {
        if s0.is_on_board() || !cx.options.modes.transit {
            return Vec::new();
        }
        cx.edit(s0, self).make_state().into_iter().collect()
    }

    fn weight_lower_bound(&self, _graph: &Graph, options: &SearchOptions) -> f64 {
        if options.modes.transit { 0.0 } else { f64::INFINITY }
    }
}

/// Get on or off a vehicle of a pattern at one of its stops.
///
/// A boarding edge runs depart → pattern stop, an alighting edge pattern
/// stop → arrive. Traversed against the search direction the roles swap:
/// an arrive-by search "boards" backwards across alighting edges.
#[derive(Debug, Clone)]
pub struct BoardAlightEdge {
    pub(crate) from: VertexId,
    pub(crate) to: VertexId,
    pub(crate) pattern: PatternId,
    pub(crate) stop_index: usize,
    pub(crate) boarding: bool,
}

impl BoardAlightEdge {
    /// True if traversing this edge in the search direction gets on a vehicle.
    fn gets_on(&self, arrive_by: bool) -> bool {
        self.boarding != arrive_by
    }

    fn get_on(&self, s0: &State, cx: &TraverseContext<'_>) -> Vec<State> {
        if s0.is_on_board() {
            return Vec::new();
        }
        let transit = cx.graph.transit();
        let Some(pattern) = transit.pattern(self.pattern) else {
            return Vec::new();
        };
        let day = transit.service_day();
        let limit = cx.options.max_trip_candidates.max(1);
        let candidates = if s0.arrive_by() {
            pattern.arrivals_at(day, self.stop_index, s0.time(), limit)
        } else {
            pattern.departures_from(day, self.stop_index, s0.time(), limit)
        };

        candidates
            .into_iter()
            .filter_map(|(trip, vehicle_time)| {
                let wait = (vehicle_time - s0.time()).abs();
                let mut editor = cx.edit(s0, self);
                editor.set_time(vehicle_time);
                editor.increment_weight(
                    wait as f64 * cx.options.wait_reluctance + cx.options.board_cost,
                );
                editor.board(TripRef {
                    pattern: self.pattern,
                    trip,
                });
                editor.make_state()
            })
            .collect()
    }

    fn get_off(&self, s0: &State, cx: &TraverseContext<'_>) -> Vec<State> {
        match s0.trip() {
            Some(trip) if trip.pattern == self.pattern => {
                let mut editor = cx.edit(s0, self);
                editor.alight();
                editor.make_state().into_iter().collect()
            }
            _ => Vec::new(),
        }
    }
}

impl Edge for BoardAlightEdge {
    fn from_vertex(&self) -> VertexId {
        self.from
    }

    fn to_vertex(&self) -> VertexId {
        self.to
    }

    fn kind(&self) -> EdgeKind {
        if self.boarding {
            EdgeKind::Board
        } else {
            EdgeKind::Alight
        }
    }

    fn traverse(&self, s0: &State, cx: &TraverseContext<'_>) -> Vec<State> {
        if !cx.options.modes.transit {
            return Vec::new();
        }
        if self.gets_on(s0.arrive_by()) {
            self.get_on(s0, cx)
        } else {
            self.get_off(s0, cx)
        }
    }

    fn weight_lower_bound(&self, _graph: &Graph, options: &SearchOptions) -> f64 {
        if !options.modes.transit {
            f64::INFINITY
        } else if self.gets_on(options.arrive_by) {
            options.board_cost
        } else {
            0.0
        }
    }
}

/// Ride from one stop of a pattern to the next on the boarded trip.
#[derive(Debug, Clone)]
pub struct PatternHopEdge {
    pub(crate) from: VertexId,
    pub(crate) to: VertexId,
    pub(crate) pattern: PatternId,
    pub(crate) stop_index: usize,
}

impl Edge for PatternHopEdge {
    fn from_vertex(&self) -> VertexId {
        self.from
    }

    fn to_vertex(&self) -> VertexId {
        self.to
    }

    fn kind(&self) -> EdgeKind {
        EdgeKind::Hop
    }

    fn traverse(&self, s0: &State, cx: &TraverseContext<'_>) -> Vec<State> {
        let Some(trip_ref) = s0.trip().filter(|t| t.pattern == self.pattern) else {
            return Vec::new();
        };
        let transit = cx.graph.transit();
        let Some(trip) = transit
            .pattern(self.pattern)
            .and_then(|p| p.trip(trip_ref.trip))
        else {
            return Vec::new();
        };
        let day = transit.service_day();

        let next_time = if s0.arrive_by() {
            day.absolute(trip.departure(self.stop_index))
        } else {
            day.absolute(trip.arrival(self.stop_index + 1))
        };
        let ride = (next_time - s0.time()) * if s0.arrive_by() { -1 } else { 1 };

        let mut editor = cx.edit(s0, self);
        editor.set_time(next_time);
        editor.increment_weight(ride as f64);
        editor.make_state().into_iter().collect()
    }
}

/// Walk between two nearby stops.
#[derive(Debug, Clone)]
pub struct TransferEdge {
    pub(crate) from: VertexId,
    pub(crate) to: VertexId,
    pub(crate) seconds: u32,
    pub(crate) distance_m: f64,
}

impl Edge for TransferEdge {
    fn from_vertex(&self) -> VertexId {
        self.from
    }

    fn to_vertex(&self) -> VertexId {
        self.to
    }

    fn kind(&self) -> EdgeKind {
        EdgeKind::Transfer
    }

    fn traverse(&self, s0: &State, cx: &TraverseContext<'_>) -> Vec<State> {
        if s0.is_on_board() {
            return Vec::new();
        }
        let mut editor = cx.edit(s0, self);
        editor.increment_time(i64::from(self.seconds));
        editor.increment_weight(f64::from(self.seconds) * cx.options.walk_reluctance);
        editor.increment_walk_distance(self.distance_m);
        if editor.walk_distance() > cx.options.max_walk_distance {
            editor.reject();
        }
        editor.make_state().into_iter().collect()
    }

    fn weight_lower_bound(&self, _graph: &Graph, options: &SearchOptions) -> f64 {
        f64::from(self.seconds) * options.walk_reluctance
    }

    fn distance_m(&self) -> f64 {
        self.distance_m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn st(s: &str) -> ServiceTime {
        ServiceTime::parse(s).unwrap()
    }

    #[test]
    fn consistent_trip_has_no_inconsistency() {
        let trip = TripTimes::new(
            "T1",
            vec![st("10:00"), st("10:05"), st("10:10")],
            vec![st("10:00"), st("10:06"), st("10:10")],
        );
        assert_eq!(trip.first_inconsistency(), None);
    }

    #[test]
    fn detects_backwards_trip() {
        let trip = TripTimes::parse("T1", &["10:00", "09:55"]).unwrap();
        assert_eq!(trip.first_inconsistency(), Some(1));

        let dwell = TripTimes::new("T2", vec![st("10:05")], vec![st("10:00")]);
        assert_eq!(dwell.first_inconsistency(), Some(0));
    }

    #[test]
    fn mismatched_lengths_are_inconsistent() {
        let trip = TripTimes::new("T1", vec![st("10:00"), st("10:05")], vec![st("10:00")]);
        assert_eq!(trip.first_inconsistency(), Some(1));
    }

    #[test]
    fn trip_parse_rejects_bad_time() {
        assert!(TripTimes::parse("T1", &["10:00", "1005"]).is_err());
    }

    fn two_trip_pattern() -> TripPattern {
        TripPattern {
            id: PatternId(0),
            name: "P".into(),
            stops: vec![VertexId(0), VertexId(1)],
            pattern_stops: vec![VertexId(2), VertexId(3)],
            trips: vec![
                TripTimes::parse("late", &["10:30", "10:40"]).unwrap(),
                TripTimes::parse("early", &["10:00", "10:10"]).unwrap(),
            ],
            board_edges: vec![None, None],
            alight_edges: vec![None, None],
            hop_edges: vec![],
            flag_stop_service: false,
        }
    }

    #[test]
    fn departures_sorted_earliest_first() {
        let pattern = two_trip_pattern();
        let day = ServiceDay::default();
        let found = pattern.departures_from(&day, 0, day.absolute(st("09:00")), 5);
        assert_eq!(
            found,
            vec![(1, day.absolute(st("10:00"))), (0, day.absolute(st("10:30")))]
        );

        let limited = pattern.departures_from(&day, 0, day.absolute(st("10:01")), 5);
        assert_eq!(limited, vec![(0, day.absolute(st("10:30")))]);
    }

    #[test]
    fn arrivals_sorted_latest_first() {
        let pattern = two_trip_pattern();
        let day = ServiceDay::default();
        let found = pattern.arrivals_at(&day, 1, day.absolute(st("11:00")), 1);
        assert_eq!(found, vec![(0, day.absolute(st("10:40")))]);
    }
}
