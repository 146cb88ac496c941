//! The traversal graph: vertices, edges and transit timetables.
//!
//! A [`Graph`] is immutable once built and shared read-only by every search
//! running against it. Build one with a [`GraphBuilder`].

mod builder;
mod edge;
mod error;
mod street;
mod time;
mod transit;
mod vertex;

pub use builder::GraphBuilder;
pub use edge::{Edge, EdgeKind, TraverseContext};
pub use error::GraphError;
pub use street::{StreetEdge, StreetPermission};
pub use time::{ServiceDay, ServiceTime, TimeError, epoch_seconds};
pub use transit::{
    BoardAlightEdge, PatternHopEdge, PreAlightEdge, PreBoardEdge, TransferEdge, TransitIndex,
    TripPattern, TripRef, TripTimes,
};
pub use vertex::{EdgeId, PatternId, Vertex, VertexId, VertexKind};

use std::fmt;

/// Adjacency-list graph with edges stored behind trait objects.
pub struct Graph {
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) edges: Vec<Box<dyn Edge>>,
    pub(crate) outgoing: Vec<Vec<EdgeId>>,
    pub(crate) incoming: Vec<Vec<EdgeId>>,
    pub(crate) transit: TransitIndex,
}

impl Graph {
    pub(crate) fn empty(service_day: ServiceDay) -> Self {
        Self {
            vertices: Vec::new(),
            edges: Vec::new(),
            outgoing: Vec::new(),
            incoming: Vec::new(),
            transit: TransitIndex {
                service_day,
                ..TransitIndex::default()
            },
        }
    }

    /// Look up a vertex.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this graph.
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.index()]
    }

    pub fn get_vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id.index())
    }

    pub fn contains_vertex(&self, id: VertexId) -> bool {
        id.index() < self.vertices.len()
    }

    /// Look up an edge.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this graph.
    pub fn edge(&self, id: EdgeId) -> &dyn Edge {
        self.edges[id.index()].as_ref()
    }

    pub fn outgoing(&self, vertex: VertexId) -> &[EdgeId] {
        self.outgoing
            .get(vertex.index())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn incoming(&self, vertex: VertexId) -> &[EdgeId] {
        self.incoming
            .get(vertex.index())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Edges to expand from `vertex` in a search running in the given direction.
    pub fn edges_from(&self, vertex: VertexId, arrive_by: bool) -> &[EdgeId] {
        if arrive_by {
            self.incoming(vertex)
        } else {
            self.outgoing(vertex)
        }
    }

    /// The vertex an edge leads to when traversed in the given direction.
    pub fn far_end(&self, edge: EdgeId, arrive_by: bool) -> VertexId {
        let edge = self.edge(edge);
        if arrive_by {
            edge.from_vertex()
        } else {
            edge.to_vertex()
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.vertices.len()).map(|i| VertexId(i as u32))
    }

    /// Find a vertex by label.
    pub fn find_vertex(&self, label: &str) -> Option<VertexId> {
        self.vertices
            .iter()
            .position(|v| v.label == label)
            .map(|i| VertexId(i as u32))
    }

    pub fn is_transit_stop(&self, vertex: VertexId) -> bool {
        self.get_vertex(vertex).is_some_and(Vertex::is_transit_stop)
    }

    pub fn transit(&self) -> &TransitIndex {
        &self.transit
    }

    pub(crate) fn push_vertex(&mut self, vertex: Vertex) -> VertexId {
        let id = VertexId(self.vertices.len() as u32);
        self.vertices.push(vertex);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        id
    }

    pub(crate) fn push_edge(&mut self, edge: Box<dyn Edge>) -> Result<EdgeId, GraphError> {
        let from = edge.from_vertex();
        let to = edge.to_vertex();
        for v in [from, to] {
            if !self.contains_vertex(v) {
                return Err(GraphError::UnknownVertex(v));
            }
        }
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(edge);
        self.outgoing[from.index()].push(id);
        self.incoming[to.index()].push(id);
        Ok(id)
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("vertices", &self.vertices.len())
            .field("edges", &self.edges.len())
            .field("patterns", &self.transit.patterns.len())
            .finish()
    }
}
