//! Search errors.
//!
//! Running out of time and finding no path are not errors; see
//! [`SearchResult`](super::SearchResult).

use crate::graph::{EdgeId, VertexId};

/// Error from a search.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SearchError {
    /// An edge produced a state lighter than its parent. The graph data is broken.
    #[error("edge {edge} from vertex {vertex} lowered the weight by {delta}")]
    NegativeWeight {
        edge: EdgeId,
        vertex: VertexId,
        delta: f64,
    },

    /// Request names a vertex the graph doesn't have
    #[error("unknown vertex {0}")]
    UnknownVertex(VertexId),

    /// Multi-origin search with no origins
    #[error("no origin states given")]
    NoOrigin,

    /// A shared heuristic's lock was poisoned by a panicking search
    #[error("shared heuristic for target {0} is poisoned")]
    HeuristicPoisoned(VertexId),

    /// A batch worker panicked or was cancelled
    #[error("search worker failed: {0}")]
    WorkerFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SearchError::NegativeWeight {
            edge: EdgeId(3),
            vertex: VertexId(1),
            delta: -2.5,
        };
        assert_eq!(
            err.to_string(),
            "edge E3 from vertex V1 lowered the weight by -2.5"
        );
        assert_eq!(
            SearchError::UnknownVertex(VertexId(9)).to_string(),
            "unknown vertex V9"
        );
    }
}
