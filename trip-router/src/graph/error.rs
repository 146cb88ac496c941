//! Graph construction errors.
//!
//! These represent invalid input handed to the [`GraphBuilder`](super::GraphBuilder).
//! A graph that has been built successfully never produces them.

use super::{PatternId, VertexId};

/// Errors raised while assembling a traversal graph.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// Referenced vertex was never added
    #[error("unknown vertex {0}")]
    UnknownVertex(VertexId),

    /// A vertex of the wrong kind was supplied
    #[error("vertex {vertex} is not a {expected}")]
    WrongVertexKind {
        vertex: VertexId,
        expected: &'static str,
    },

    /// An explicit edge length is shorter than the straight line between its ends
    #[error("edge {from} -> {to} is {length_m} m long, shorter than the straight line ({straight_m} m)")]
    ShorterThanStraightLine {
        from: VertexId,
        to: VertexId,
        length_m: f64,
        straight_m: f64,
    },

    /// A pattern must visit at least two stops
    #[error("pattern must serve at least two stops")]
    PatternTooShort,

    /// Trip times don't line up with the pattern's stops
    #[error("trip {trip} has {got} stop times, pattern {pattern} has {expected} stops")]
    TripLengthMismatch {
        pattern: PatternId,
        trip: String,
        expected: usize,
        got: usize,
    },

    /// Trip times go backwards
    #[error("trip {trip} runs backwards in time at stop index {stop_index}")]
    NonMonotonicTrip { trip: String, stop_index: usize },

    /// Negative or non-finite lengths and durations
    #[error("invalid value: {0}")]
    InvalidValue(&'static str),
}
