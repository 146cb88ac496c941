//! Incremental graph construction.

use tracing::debug;

use super::{
    BoardAlightEdge, Edge, EdgeId, EdgeKind, Graph, GraphError, PatternHopEdge, PatternId,
    PreAlightEdge, PreBoardEdge, ServiceDay, StreetEdge, StreetPermission, TransferEdge,
    TripPattern, TripTimes, Vertex, VertexId, VertexKind,
};

/// Slack allowed when comparing an explicit length to the straight line.
const LENGTH_TOLERANCE_M: f64 = 1e-6;

/// Builder for a [`Graph`].
///
/// # Example
///
/// ```
/// use trip_router::graph::{GraphBuilder, ServiceDay, StreetPermission, TripTimes};
///
/// let mut builder = GraphBuilder::new(ServiceDay::default());
/// let a = builder.transit_stop("A", 0.0, 0.0);
/// let b = builder.transit_stop("B", 1000.0, 0.0);
/// let trip = TripTimes::parse("T1", &["10:00", "10:05"]).unwrap();
/// builder.pattern("Line 1", &[a, b], vec![trip]).unwrap();
/// let graph = builder.build();
/// assert_eq!(graph.transit().patterns().len(), 1);
/// ```
#[derive(Debug)]
pub struct GraphBuilder {
    graph: Graph,
}

impl GraphBuilder {
    /// Start an empty graph whose timetables run on `service_day`.
    pub fn new(service_day: ServiceDay) -> Self {
        Self {
            graph: Graph::empty(service_day),
        }
    }

    /// Add a street intersection.
    pub fn street_vertex(&mut self, label: impl Into<String>, x: f64, y: f64) -> VertexId {
        self.graph
            .push_vertex(Vertex::new(label, VertexKind::Street, x, y))
    }

    /// Add a one-way street whose length is the straight line between its ends.
    pub fn street(
        &mut self,
        from: VertexId,
        to: VertexId,
        permission: StreetPermission,
        name: impl Into<String>,
    ) -> Result<EdgeId, GraphError> {
        let length_m = self.straight_line(from, to)?;
        self.graph
            .push_edge(Box::new(StreetEdge::new(from, to, length_m, permission, name)))
    }

    /// Add a one-way street with an explicit length.
    ///
    /// The length may not be shorter than the straight line between the
    /// ends; the straight-line heuristic relies on it.
    pub fn street_with_length(
        &mut self,
        from: VertexId,
        to: VertexId,
        length_m: f64,
        permission: StreetPermission,
        name: impl Into<String>,
    ) -> Result<EdgeId, GraphError> {
        if !length_m.is_finite() || length_m < 0.0 {
            return Err(GraphError::InvalidValue("street length"));
        }
        let straight_m = self.straight_line(from, to)?;
        if length_m + LENGTH_TOLERANCE_M < straight_m {
            return Err(GraphError::ShorterThanStraightLine {
                from,
                to,
                length_m,
                straight_m,
            });
        }
        self.graph
            .push_edge(Box::new(StreetEdge::new(from, to, length_m, permission, name)))
    }

    /// Add a street in both directions.
    pub fn two_way_street(
        &mut self,
        a: VertexId,
        b: VertexId,
        permission: StreetPermission,
        name: &str,
    ) -> Result<(EdgeId, EdgeId), GraphError> {
        let there = self.street(a, b, permission, name)?;
        let back = self.street(b, a, permission, name)?;
        Ok((there, back))
    }

    /// Add a transit stop together with its departure and arrival sides.
    pub fn transit_stop(&mut self, label: impl Into<String>, x: f64, y: f64) -> VertexId {
        let label = label.into();
        let stop = self
            .graph
            .push_vertex(Vertex::new(label.clone(), VertexKind::TransitStop, x, y));
        let depart = self.graph.push_vertex(Vertex::new(
            format!("{label} (depart)"),
            VertexKind::StopDepart { stop },
            x,
            y,
        ));
        let arrive = self.graph.push_vertex(Vertex::new(
            format!("{label} (arrive)"),
            VertexKind::StopArrive { stop },
            x,
            y,
        ));

        // Both ends were just created, so these can't fail.
        let pre_board = self.push_known(Box::new(PreBoardEdge { stop, depart }));
        let pre_alight = self.push_known(Box::new(PreAlightEdge { arrive, stop }));

        let transit = &mut self.graph.transit;
        transit.stop_depart.insert(stop, depart);
        transit.stop_arrive.insert(stop, arrive);
        transit.pre_board.insert(stop, pre_board);
        transit.pre_alight.insert(stop, pre_alight);
        stop
    }

    /// Connect a street vertex and a stop with a pedestrian link each way.
    pub fn link_stop(
        &mut self,
        street: VertexId,
        stop: VertexId,
    ) -> Result<(EdgeId, EdgeId), GraphError> {
        self.expect_stop(stop)?;
        let name = format!("link to {}", self.graph.vertex(stop).label);
        let there = self.street(street, stop, StreetPermission::PEDESTRIAN, name.as_str())?;
        let back = self.street(stop, street, StreetPermission::PEDESTRIAN, name)?;
        Ok((there, back))
    }

    /// Add a one-way walking transfer between two stops.
    pub fn transfer(
        &mut self,
        from: VertexId,
        to: VertexId,
        seconds: u32,
    ) -> Result<EdgeId, GraphError> {
        self.expect_stop(from)?;
        self.expect_stop(to)?;
        let distance_m = self.straight_line(from, to)?;
        let speed = speed(distance_m, i64::from(seconds));
        let id = self.graph.push_edge(Box::new(TransferEdge {
            from,
            to,
            seconds,
            distance_m,
        }))?;
        let transit = &mut self.graph.transit;
        transit.max_transfer_speed = transit.max_transfer_speed.max(speed);
        Ok(id)
    }

    /// Add a trip pattern serving `stops` in order, with its trips.
    ///
    /// Creates one on-board vertex per stop, plus board, alight and hop
    /// edges. Every trip must have one time per stop and never run
    /// backwards.
    pub fn pattern(
        &mut self,
        name: impl Into<String>,
        stops: &[VertexId],
        trips: Vec<TripTimes>,
    ) -> Result<PatternId, GraphError> {
        let name = name.into();
        if stops.len() < 2 {
            return Err(GraphError::PatternTooShort);
        }
        for &stop in stops {
            self.expect_stop(stop)?;
        }
        let id = PatternId(self.graph.transit.patterns.len() as u32);
        for trip in &trips {
            if trip.len() != stops.len() {
                return Err(GraphError::TripLengthMismatch {
                    pattern: id,
                    trip: trip.trip_id.clone(),
                    expected: stops.len(),
                    got: trip.len(),
                });
            }
            if let Some(stop_index) = trip.first_inconsistency() {
                return Err(GraphError::NonMonotonicTrip {
                    trip: trip.trip_id.clone(),
                    stop_index,
                });
            }
        }

        let pattern_stops: Vec<VertexId> = stops
            .iter()
            .enumerate()
            .map(|(stop_index, &stop)| {
                let (x, y) = {
                    let v = self.graph.vertex(stop);
                    (v.x, v.y)
                };
                self.graph.push_vertex(Vertex::new(
                    format!("{name}:{stop_index}"),
                    VertexKind::PatternStop {
                        pattern: id,
                        stop_index,
                    },
                    x,
                    y,
                ))
            })
            .collect();

        let last = stops.len() - 1;
        let mut board_edges = vec![None; stops.len()];
        let mut alight_edges = vec![None; stops.len()];
        let mut hop_edges = Vec::with_capacity(last);

        for (stop_index, &stop) in stops.iter().enumerate() {
            let on_board = pattern_stops[stop_index];
            if stop_index < last {
                let depart = self.side(stop, true)?;
                board_edges[stop_index] = Some(self.push_known(Box::new(BoardAlightEdge {
                    from: depart,
                    to: on_board,
                    pattern: id,
                    stop_index,
                    boarding: true,
                })));
                hop_edges.push(self.push_known(Box::new(PatternHopEdge {
                    from: on_board,
                    to: pattern_stops[stop_index + 1],
                    pattern: id,
                    stop_index,
                })));
            }
            if stop_index > 0 {
                let arrive = self.side(stop, false)?;
                alight_edges[stop_index] = Some(self.push_known(Box::new(BoardAlightEdge {
                    from: on_board,
                    to: arrive,
                    pattern: id,
                    stop_index,
                    boarding: false,
                })));
            }
        }

        let mut fastest: f64 = 0.0;
        for trip in &trips {
            for i in 0..last {
                let distance = self
                    .graph
                    .vertex(stops[i])
                    .distance_to(self.graph.vertex(stops[i + 1]));
                let ride = i64::from(trip.arrival(i + 1).seconds())
                    - i64::from(trip.departure(i).seconds());
                fastest = fastest.max(speed(distance, ride));
            }
        }

        let transit = &mut self.graph.transit;
        for (stop_index, &stop) in stops.iter().enumerate() {
            transit
                .patterns_by_stop
                .entry(stop)
                .or_default()
                .push((id, stop_index));
        }
        transit.max_hop_speed = transit.max_hop_speed.max(fastest);
        transit.patterns.push(TripPattern {
            id,
            name,
            stops: stops.to_vec(),
            pattern_stops,
            trips,
            board_edges,
            alight_edges,
            hop_edges,
            flag_stop_service: false,
        });
        Ok(id)
    }

    /// Record that vehicles of `pattern` may be flagged down along `street_edge`.
    pub fn flag_stop_service(
        &mut self,
        street_edge: EdgeId,
        pattern: PatternId,
    ) -> Result<(), GraphError> {
        let is_street = self
            .graph
            .edges
            .get(street_edge.index())
            .is_some_and(|e| e.kind() == EdgeKind::Street);
        if !is_street {
            return Err(GraphError::InvalidValue("flag-stop service needs a street edge"));
        }
        let transit = &mut self.graph.transit;
        let Some(p) = transit.patterns.get_mut(pattern.index()) else {
            return Err(GraphError::InvalidValue("unknown pattern"));
        };
        p.flag_stop_service = true;
        let patterns = transit.flag_stop_patterns.entry(street_edge).or_default();
        if !patterns.contains(&pattern) {
            patterns.push(pattern);
        }
        Ok(())
    }

    /// Add an edge of any other type.
    pub fn edge(&mut self, edge: Box<dyn Edge>) -> Result<EdgeId, GraphError> {
        self.graph.push_edge(edge)
    }

    /// Finish building.
    pub fn build(self) -> Graph {
        debug!(
            vertices = self.graph.vertex_count(),
            edges = self.graph.edge_count(),
            patterns = self.graph.transit.patterns.len(),
            "graph built"
        );
        self.graph
    }

    fn straight_line(&self, from: VertexId, to: VertexId) -> Result<f64, GraphError> {
        let a = self
            .graph
            .get_vertex(from)
            .ok_or(GraphError::UnknownVertex(from))?;
        let b = self
            .graph
            .get_vertex(to)
            .ok_or(GraphError::UnknownVertex(to))?;
        Ok(a.distance_to(b))
    }

    fn expect_stop(&self, vertex: VertexId) -> Result<(), GraphError> {
        match self.graph.get_vertex(vertex) {
            None => Err(GraphError::UnknownVertex(vertex)),
            Some(v) if v.is_transit_stop() => Ok(()),
            Some(_) => Err(GraphError::WrongVertexKind {
                vertex,
                expected: "transit stop",
            }),
        }
    }

    /// Departure or arrival side of a stop.
    fn side(&self, stop: VertexId, depart: bool) -> Result<VertexId, GraphError> {
        let transit = &self.graph.transit;
        let side = if depart {
            transit.depart_vertex(stop)
        } else {
            transit.arrive_vertex(stop)
        };
        side.ok_or(GraphError::WrongVertexKind {
            vertex: stop,
            expected: "transit stop",
        })
    }

    /// Push an edge between vertices known to exist.
    fn push_known(&mut self, edge: Box<dyn Edge>) -> EdgeId {
        let id = EdgeId(self.graph.edges.len() as u32);
        let (from, to) = (edge.from_vertex(), edge.to_vertex());
        self.graph.edges.push(edge);
        self.graph.outgoing[from.index()].push(id);
        self.graph.incoming[to.index()].push(id);
        id
    }
}

/// Straight-line speed in m/s; instantaneous movement is infinitely fast.
fn speed(distance_m: f64, seconds: i64) -> f64 {
    if seconds > 0 {
        distance_m / seconds as f64
    } else if distance_m > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}
