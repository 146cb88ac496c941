//! Multimodal trip-routing search core.
//!
//! Answers: "starting here at this time, what is the cheapest way to get
//! there, walking, driving or riding transit?" Two engines share one graph
//! and one state model:
//!
//! - [`search::AStar`], a best-first search with pluggable heuristics,
//!   termination and skip strategies, deadlines and partial results.
//! - [`raptor::RaptorRouter`], a round-based sweep of the transit network
//!   bounded by the number of transfers.
//!
//! Graphs are built with [`graph::GraphBuilder`] and are read-only once
//! built, so one graph can serve many searches at once (see [`batch`]).

pub mod batch;
pub mod cache;
pub mod config;
pub mod graph;
pub mod raptor;
pub mod search;
pub mod state;
pub mod telemetry;
