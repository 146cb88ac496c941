//! Narrow searches built from the generic engine by swapping strategies.

use std::collections::BTreeMap;

use tracing::debug;

use super::{
    AStar, PermissionTermination, RoutingRequest, SearchError, SearchOptions, SearchOverrides,
    StreetOnly, TraverseVisitor, TrivialHeuristic, WalkDistanceLimit,
};
use crate::graph::{EdgeId, Graph, PatternId, StreetPermission, VertexId};
use crate::state::{GraphPath, State};

/// The closest vertex with a street allowing some permission.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestVertex {
    pub vertex: VertexId,
    pub weight: f64,
    pub walk_distance: f64,
    /// Walk from the start to `vertex`, in travel order.
    pub path: GraphPath,
}

/// Walk from `origin` to the nearest vertex from which a street allowing
/// `permission` leads on (e.g. somewhere a car can pick the traveller up).
///
/// Walks against the travel direction when `base.arrive_by` is set.
/// Returns `None` if nothing qualifies within `max_walk_m`.
pub fn find_nearest_permitted_vertex(
    graph: &Graph,
    origin: VertexId,
    base: &SearchOptions,
    permission: StreetPermission,
    max_walk_m: f64,
) -> Result<Option<NearestVertex>, SearchError> {
    let options = SearchOverrides::walking(base.arrive_by)
        .with_max_walk_distance(max_walk_m)
        .with_batch(true)
        .apply(base);
    let request = RoutingRequest::batch(origin, options);

    let mut termination = PermissionTermination::new(permission);
    let limit = WalkDistanceLimit(max_walk_m);
    let result = AStar::new(graph)
        .with_termination(&mut termination)
        .with_skip_edge(&StreetOnly)
        .with_skip_result(&limit)
        .search(&request, &mut TrivialHeuristic)?;

    let nearest = result.terminated_at.map(|tip| {
        let state = &result.arena[tip];
        NearestVertex {
            vertex: state.vertex(),
            weight: state.weight(),
            walk_distance: state.walk_distance(),
            path: result.arena.path(tip),
        }
    });
    debug!(
        origin = %origin,
        found = ?nearest.as_ref().map(|n| n.vertex),
        vertices_visited = result.vertices_visited,
        "nearest permitted vertex search complete"
    );
    Ok(nearest)
}

/// A place along a street where a vehicle of `pattern` could be flagged down
/// (or left).
#[derive(Debug, Clone, PartialEq)]
pub struct FlagStopCandidate {
    pub pattern: PatternId,
    /// Where the traveller meets the vehicle.
    pub vertex: VertexId,
    /// The street edge with flag-stop service.
    pub edge: EdgeId,
    /// Walking weight from the trip end to `vertex`.
    pub weight: f64,
    pub walk_distance: f64,
}

/// Flag-stop candidates around both ends of a trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlagStopCandidates {
    /// Near the trip origin, reached walking forwards.
    pub boarding: Vec<FlagStopCandidate>,
    /// Near the trip destination, reached walking backwards.
    pub alighting: Vec<FlagStopCandidate>,
}

/// Remembers, per pattern, the lightest state produced on a street with
/// flag-stop service for it.
struct FlagStopVisitor<'g> {
    graph: &'g Graph,
    best: BTreeMap<PatternId, (EdgeId, State)>,
}

impl TraverseVisitor for FlagStopVisitor<'_> {
    fn visit_edge(&mut self, edge: EdgeId, state: &State) {
        for &pattern in self.graph.transit().flag_stop_patterns(edge) {
            let better = self
                .best
                .get(&pattern)
                .is_none_or(|(_, seen)| state.weight() < seen.weight());
            if better {
                self.best.insert(pattern, (edge, *state));
            }
        }
    }
}

/// Find where walking from `from` first meets, and walking back from `to`
/// last leaves, streets along which transit patterns run flag-stop service.
///
/// Only finds the candidates; turning them into boardable stops is up to
/// the caller.
pub fn discover_flag_stops(
    graph: &Graph,
    from: VertexId,
    to: VertexId,
    base: &SearchOptions,
    max_walk_m: f64,
) -> Result<FlagStopCandidates, SearchError> {
    Ok(FlagStopCandidates {
        boarding: flag_stop_search(graph, from, base, false, max_walk_m)?,
        alighting: flag_stop_search(graph, to, base, true, max_walk_m)?,
    })
}

fn flag_stop_search(
    graph: &Graph,
    origin: VertexId,
    base: &SearchOptions,
    arrive_by: bool,
    max_walk_m: f64,
) -> Result<Vec<FlagStopCandidate>, SearchError> {
    let options = SearchOverrides::walking(arrive_by)
        .with_max_walk_distance(max_walk_m)
        .with_batch(true)
        .apply(base);
    let request = RoutingRequest::batch(origin, options);

    let mut visitor = FlagStopVisitor {
        graph,
        best: BTreeMap::new(),
    };
    let limit = WalkDistanceLimit(max_walk_m);
    let result = AStar::new(graph)
        .with_visitor(&mut visitor)
        .with_skip_edge(&StreetOnly)
        .with_skip_result(&limit)
        .search(&request, &mut TrivialHeuristic)?;

    let candidates: Vec<FlagStopCandidate> = visitor
        .best
        .into_iter()
        .filter_map(|(pattern, (edge, state))| {
            // The traveller meets the vehicle where the street was entered
            let parent = result.arena.get(state.back_state()?)?;
            Some(FlagStopCandidate {
                pattern,
                vertex: parent.vertex(),
                edge,
                weight: parent.weight(),
                walk_distance: parent.walk_distance(),
            })
        })
        .collect();
    debug!(
        origin = %origin,
        arrive_by,
        candidates = candidates.len(),
        "flag stop search complete"
    );
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphBuilder, ServiceDay, TripTimes};

    /// footpath - footpath - road, 100 m apart, with a car-free alley off the start.
    fn streets() -> (Graph, [VertexId; 4]) {
        let mut b = GraphBuilder::new(ServiceDay::default());
        let start = b.street_vertex("start", 0.0, 0.0);
        let mid = b.street_vertex("mid", 100.0, 0.0);
        let road = b.street_vertex("road", 200.0, 0.0);
        let far = b.street_vertex("far", 300.0, 0.0);
        b.two_way_street(start, mid, StreetPermission::PEDESTRIAN, "path")
            .unwrap();
        b.two_way_street(mid, road, StreetPermission::PEDESTRIAN, "path")
            .unwrap();
        b.two_way_street(road, far, StreetPermission::ALL, "high street")
            .unwrap();
        (b.build(), [start, mid, road, far])
    }

    #[test]
    fn finds_first_car_accessible_vertex() {
        let (graph, [start, mid, road, _]) = streets();
        let options = SearchOptions::transit();
        let nearest =
            find_nearest_permitted_vertex(&graph, start, &options, StreetPermission::CAR, 1_000.0)
                .unwrap()
                .unwrap();
        assert_eq!(nearest.vertex, road);
        assert_eq!(nearest.walk_distance, 200.0);
        assert_eq!(nearest.path.vertices, vec![start, mid, road]);
    }

    #[test]
    fn nearest_vertex_respects_walk_limit() {
        let (graph, [start, ..]) = streets();
        let found = find_nearest_permitted_vertex(
            &graph,
            start,
            &SearchOptions::walking(),
            StreetPermission::CAR,
            150.0,
        )
        .unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn origin_on_car_street_is_its_own_answer() {
        let (graph, [.., road, _]) = streets();
        let nearest = find_nearest_permitted_vertex(
            &graph,
            road,
            &SearchOptions::walking(),
            StreetPermission::CAR,
            1_000.0,
        )
        .unwrap()
        .unwrap();
        assert_eq!(nearest.vertex, road);
        assert_eq!(nearest.weight, 0.0);
        assert!(nearest.path.is_empty());
    }

    #[test]
    fn discovers_flag_stops_at_both_ends() {
        let mut b = GraphBuilder::new(ServiceDay::default());
        let home = b.street_vertex("home", 0.0, 0.0);
        let corner = b.street_vertex("corner", 100.0, 0.0);
        let bend = b.street_vertex("bend", 200.0, 0.0);
        b.two_way_street(home, corner, StreetPermission::PEDESTRIAN, "lane")
            .unwrap();
        let (route_out, route_back) = b
            .two_way_street(corner, bend, StreetPermission::ALL, "rural route")
            .unwrap();

        let work = b.street_vertex("work", 5_000.0, 0.0);
        let gate = b.street_vertex("gate", 5_100.0, 0.0);
        let (drive_in, drive_out) = b
            .two_way_street(gate, work, StreetPermission::ALL, "drive")
            .unwrap();

        let s1 = b.transit_stop("S1", 0.0, 500.0);
        let s2 = b.transit_stop("S2", 5_000.0, 500.0);
        let trip = TripTimes::parse("T1", &["10:00", "10:30"]).unwrap();
        let pattern = b.pattern("Dial-a-ride", &[s1, s2], vec![trip]).unwrap();
        for edge in [route_out, route_back, drive_in, drive_out] {
            b.flag_stop_service(edge, pattern).unwrap();
        }
        let graph = b.build();

        let found =
            discover_flag_stops(&graph, home, work, &SearchOptions::transit(), 1_000.0).unwrap();

        assert_eq!(found.boarding.len(), 1);
        let board = &found.boarding[0];
        assert_eq!(board.pattern, pattern);
        assert_eq!(board.vertex, corner);
        assert_eq!(board.edge, route_out);
        assert_eq!(board.walk_distance, 100.0);

        // Walking backwards from work, the drive is reached from its work end
        assert_eq!(found.alighting.len(), 1);
        let alight = &found.alighting[0];
        assert_eq!(alight.vertex, work);
        assert_eq!(alight.edge, drive_in);
        assert_eq!(alight.weight, 0.0);
    }

    #[test]
    fn no_flag_stops_nearby() {
        let (graph, [start, .., far]) = streets();
        let found =
            discover_flag_stops(&graph, start, far, &SearchOptions::walking(), 1_000.0).unwrap();
        assert_eq!(found, FlagStopCandidates::default());
    }
}
