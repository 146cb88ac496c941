//! Append-only storage for search states.

use std::fmt;
use std::ops::Index;

use super::{GraphPath, State};

/// Handle of a state inside a [`StateArena`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(u32);

impl StateId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// Owns every state a search has accepted at some point.
///
/// States are never removed: a state dominated at its own vertex may still
/// be the ancestor of a live state, and paths are rebuilt by chasing handles.
#[derive(Debug, Clone, Default)]
pub struct StateArena {
    states: Vec<State>,
}

impl StateArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            states: Vec::with_capacity(capacity),
        }
    }

    /// Store a state and return its handle.
    pub fn push(&mut self, state: State) -> StateId {
        let id = StateId(self.states.len() as u32);
        self.states.push(state);
        id
    }

    pub fn get(&self, id: StateId) -> Option<&State> {
        self.states.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Handles from `tip` back to the root of its chain, tip first.
    pub fn chain(&self, tip: StateId) -> Vec<StateId> {
        let mut chain = vec![tip];
        let mut cursor = self[tip].back_state();
        while let Some(id) = cursor {
            chain.push(id);
            cursor = self[id].back_state();
        }
        chain
    }

    /// Rebuild the path ending at `tip`.
    pub fn path(&self, tip: StateId) -> GraphPath {
        GraphPath::from_tip(self, tip)
    }
}

impl Index<StateId> for StateArena {
    type Output = State;

    fn index(&self, id: StateId) -> &State {
        &self.states[id.index()]
    }
}
