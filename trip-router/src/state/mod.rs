//! Search states and the arena that links them into paths.
//!
//! A [`State`] is one step of a partial path: where we are, what it cost,
//! what time it is, and a handle to the state it was derived from. States are
//! created by edge traversal through a [`StateEditor`], stored in a
//! [`StateArena`], and turned into a [`GraphPath`] by following back handles.

mod arena;
mod editor;
mod path;

pub use arena::{StateArena, StateId};
pub use editor::StateEditor;
pub use path::GraphPath;

use crate::graph::{EdgeId, TripRef, VertexId};
use crate::search::SearchOptions;

/// One step of a partial path through the graph.
///
/// `time` is absolute (epoch seconds). In an arrive-by search time runs
/// backwards from the requested arrival, so `elapsed_time` is always the
/// unsigned distance from `start_time`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct State {
    pub(crate) vertex: VertexId,
    pub(crate) weight: f64,
    pub(crate) time: i64,
    pub(crate) start_time: i64,
    pub(crate) arrive_by: bool,
    pub(crate) back_state: Option<StateId>,
    pub(crate) back_edge: Option<EdgeId>,
    pub(crate) trip: Option<TripRef>,
    pub(crate) num_boardings: u32,
    pub(crate) walk_distance: f64,
}

impl State {
    /// Create an origin state at `vertex` at the options' start time.
    pub fn new(vertex: VertexId, options: &SearchOptions) -> Self {
        Self {
            vertex,
            weight: 0.0,
            time: options.start_time,
            start_time: options.start_time,
            arrive_by: options.arrive_by,
            back_state: None,
            back_edge: None,
            trip: None,
            num_boardings: 0,
            walk_distance: 0.0,
        }
    }

    /// Origin state reached at a different time than the search start,
    /// e.g. the end of a walking access leg into the transit network.
    ///
    /// The weight defaults to the elapsed time.
    pub fn at_time(vertex: VertexId, time: i64, options: &SearchOptions) -> Self {
        let mut state = Self::new(vertex, options);
        state.time = time;
        state.weight = state.elapsed_time() as f64;
        state
    }

    /// Replace the accumulated weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Replace the accumulated walking distance.
    pub fn with_walk_distance(mut self, metres: f64) -> Self {
        self.walk_distance = metres;
        self
    }

    pub fn vertex(&self) -> VertexId {
        self.vertex
    }

    /// Accumulated routing cost.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Absolute time in epoch seconds.
    pub fn time(&self) -> i64 {
        self.time
    }

    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    /// Seconds between the search start and this state, regardless of direction.
    pub fn elapsed_time(&self) -> i64 {
        (self.time - self.start_time).abs()
    }

    pub fn arrive_by(&self) -> bool {
        self.arrive_by
    }

    /// Handle of the state this one was derived from.
    pub fn back_state(&self) -> Option<StateId> {
        self.back_state
    }

    /// Edge traversed to reach this state.
    pub fn back_edge(&self) -> Option<EdgeId> {
        self.back_edge
    }

    /// Trip currently ridden, if on board.
    pub fn trip(&self) -> Option<TripRef> {
        self.trip
    }

    pub fn is_on_board(&self) -> bool {
        self.trip.is_some()
    }

    pub fn num_boardings(&self) -> u32 {
        self.num_boardings
    }

    pub fn is_ever_boarded(&self) -> bool {
        self.num_boardings > 0
    }

    /// Metres walked so far.
    pub fn walk_distance(&self) -> f64 {
        self.walk_distance
    }

    /// A path may only end off board.
    pub fn is_final(&self) -> bool {
        !self.is_on_board()
    }
}
