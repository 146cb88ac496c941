//! Logging setup and search counters.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Counters shared by every search given a clone of this handle.
#[derive(Debug, Clone, Default)]
pub struct SearchMetrics {
    inner: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    searches: AtomicU64,
    vertices_visited: AtomicU64,
    timeouts: AtomicU64,
    max_states: AtomicUsize,
}

/// Point-in-time copy of [`SearchMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub searches: u64,
    pub vertices_visited: u64,
    /// Searches that ran out of time, before or during the main loop.
    pub timeouts: u64,
    /// Largest state arena any search ended with.
    pub max_states: usize,
}

impl MetricsSnapshot {
    /// Approximate peak arena memory in bytes.
    #[cfg(feature = "memory-stats")]
    pub fn max_arena_bytes(&self) -> usize {
        self.max_states * std::mem::size_of::<crate::state::State>()
    }
}

impl SearchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_search(&self, vertices_visited: usize, states: usize, timed_out: bool) {
        let c = &self.inner;
        c.searches.fetch_add(1, Ordering::Relaxed);
        c.vertices_visited
            .fetch_add(vertices_visited as u64, Ordering::Relaxed);
        if timed_out {
            c.timeouts.fetch_add(1, Ordering::Relaxed);
        }
        c.max_states.fetch_max(states, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let c = &self.inner;
        MetricsSnapshot {
            searches: c.searches.load(Ordering::Relaxed),
            vertices_visited: c.vertices_visited.load(Ordering::Relaxed),
            timeouts: c.timeouts.load(Ordering::Relaxed),
            max_states: c.max_states.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_counters() {
        let metrics = SearchMetrics::new();
        let other = metrics.clone();
        metrics.record_search(10, 40, false);
        other.record_search(5, 25, true);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.searches, 2);
        assert_eq!(snapshot.vertices_visited, 15);
        assert_eq!(snapshot.timeouts, 1);
        assert_eq!(snapshot.max_states, 40);
        assert_eq!(other.snapshot(), snapshot);
    }

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
    }

    #[cfg(feature = "memory-stats")]
    #[test]
    fn arena_bytes_scale_with_states() {
        let metrics = SearchMetrics::new();
        metrics.record_search(1, 3, false);
        assert_eq!(
            metrics.snapshot().max_arena_bytes(),
            3 * std::mem::size_of::<crate::state::State>()
        );
    }
}
