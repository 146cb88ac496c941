//! Round-based transit routing (RAPTOR).
//!
//! A [`RaptorRouter`] sweeps the transit network in rounds, one vehicle ride
//! and one transfer per round, recording the best arrival per stop in a
//! [`RaptorStateStore`]. It uses the same edges and states as the best-first
//! search, so its results can be chained with street searches.

mod discarding;
mod engine;
mod error;
mod preserving;
mod store;

pub use discarding::PathDiscardingStore;
pub use engine::{RaptorRouter, RoundSummary};
pub use error::RaptorError;
pub use preserving::PathPreservingStore;
pub use store::{RaptorStateStore, StopArrival, StoreKind};
