//! Vertex, edge and pattern identifiers, and the vertex type itself.

use std::fmt;

/// Index of a vertex in a [`Graph`](super::Graph).
///
/// Identifiers are handed out by the graph that owns the vertex and are
/// only meaningful for that graph.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub u32);

impl VertexId {
    /// Returns the identifier as a vector index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.0)
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.0)
    }
}

/// Index of an edge in a [`Graph`](super::Graph).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u32);

impl EdgeId {
    /// Returns the identifier as a vector index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// Index of a trip pattern in the [`TransitIndex`](super::TransitIndex).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct PatternId(pub u32);

impl PatternId {
    /// Returns the identifier as a vector index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// What a vertex represents in the traversal graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexKind {
    /// Street intersection or split point.
    Street,

    /// A transit stop. The only kind RAPTOR records arrivals at.
    TransitStop,

    /// Departure side of a stop, between the pre-board edge and the board edges.
    StopDepart { stop: VertexId },

    /// Arrival side of a stop, between the alight edges and the pre-alight edge.
    StopArrive { stop: VertexId },

    /// A position on board a vehicle of `pattern` at its `stop_index`-th stop.
    PatternStop {
        pattern: PatternId,
        stop_index: usize,
    },
}

/// A node in the traversal graph.
///
/// Coordinates are planar metres. They only feed the straight-line
/// heuristic and default edge lengths, never correctness.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub label: String,
    pub kind: VertexKind,
    pub x: f64,
    pub y: f64,
}

impl Vertex {
    /// Create a new vertex.
    pub fn new(label: impl Into<String>, kind: VertexKind, x: f64, y: f64) -> Self {
        Self {
            label: label.into(),
            kind,
            x,
            y,
        }
    }

    /// True if this vertex is a transit stop.
    pub fn is_transit_stop(&self) -> bool {
        matches!(self.kind, VertexKind::TransitStop)
    }

    /// Straight-line distance to another vertex in metres.
    pub fn distance_to(&self, other: &Vertex) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_display_with_prefix() {
        assert_eq!(VertexId(3).to_string(), "V3");
        assert_eq!(format!("{:?}", EdgeId(7)), "E7");
        assert_eq!(PatternId(1).to_string(), "P1");
    }

    #[test]
    fn distance_is_euclidean() {
        let a = Vertex::new("a", VertexKind::Street, 0.0, 0.0);
        let b = Vertex::new("b", VertexKind::Street, 3.0, 4.0);
        assert_eq!(a.distance_to(&b), 5.0);
        assert_eq!(b.distance_to(&a), 5.0);
    }

    #[test]
    fn only_transit_stops_are_stops() {
        let stop = Vertex::new("s", VertexKind::TransitStop, 0.0, 0.0);
        let depart = Vertex::new("d", VertexKind::StopDepart { stop: VertexId(0) }, 0.0, 0.0);
        assert!(stop.is_transit_stop());
        assert!(!depart.is_transit_stop());
    }
}
