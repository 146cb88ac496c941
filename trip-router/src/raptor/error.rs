//! RAPTOR errors.

use crate::graph::VertexId;

/// Error from a RAPTOR run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RaptorError {
    /// Stores only hold arrivals at transit stops; anything else is a wiring mistake
    #[error("vertex {0} is not a transit stop")]
    NotATransitStop(VertexId),

    /// Paths were asked for from a store that doesn't keep them
    #[error("paths are not kept by the path-discarding store")]
    PathsDiscarded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            RaptorError::NotATransitStop(VertexId(7)).to_string(),
            "vertex V7 is not a transit stop"
        );
        assert_eq!(
            RaptorError::PathsDiscarded.to_string(),
            "paths are not kept by the path-discarding store"
        );
    }
}
