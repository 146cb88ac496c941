//! Street edges and travel permissions.

use std::fmt;
use std::ops::BitOr;

use super::{Edge, EdgeKind, Graph, TraverseContext, VertexId};
use crate::search::SearchOptions;
use crate::state::State;

/// Which travellers may use a street edge.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StreetPermission(u8);

impl StreetPermission {
    pub const NONE: Self = Self(0);
    pub const PEDESTRIAN: Self = Self(1);
    pub const BICYCLE: Self = Self(2);
    pub const CAR: Self = Self(4);
    pub const PEDESTRIAN_AND_BICYCLE: Self = Self(1 | 2);
    pub const ALL: Self = Self(1 | 2 | 4);

    /// True if every traveller in `other` is allowed here.
    pub fn allows(self, other: StreetPermission) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }
}

impl BitOr for StreetPermission {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for StreetPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.allows(Self::PEDESTRIAN) {
            names.push("PEDESTRIAN");
        }
        if self.allows(Self::BICYCLE) {
            names.push("BICYCLE");
        }
        if self.allows(Self::CAR) {
            names.push("CAR");
        }
        if names.is_empty() {
            names.push("NONE");
        }
        write!(f, "StreetPermission({})", names.join("|"))
    }
}

/// Cost of crossing a street edge under some options.
#[derive(Debug, Clone, Copy, PartialEq)]
struct StreetCost {
    seconds: f64,
    weight: f64,
    walking: bool,
}

/// A street segment.
#[derive(Debug, Clone)]
pub struct StreetEdge {
    from: VertexId,
    to: VertexId,
    length_m: f64,
    permission: StreetPermission,
    name: String,
}

impl StreetEdge {
    pub fn new(
        from: VertexId,
        to: VertexId,
        length_m: f64,
        permission: StreetPermission,
        name: impl Into<String>,
    ) -> Self {
        Self {
            from,
            to,
            length_m,
            permission,
            name: name.into(),
        }
    }

    /// Drive if the request allows cars and the street does, otherwise walk.
    fn cost(&self, options: &SearchOptions) -> Option<StreetCost> {
        if options.modes.car && self.permission.allows(StreetPermission::CAR) {
            let seconds = self.length_m / options.car_speed;
            return Some(StreetCost {
                seconds,
                weight: seconds,
                walking: false,
            });
        }
        if options.modes.walk && self.permission.allows(StreetPermission::PEDESTRIAN) {
            let seconds = self.length_m / options.walk_speed;
            return Some(StreetCost {
                seconds,
                weight: seconds * options.walk_reluctance,
                walking: true,
            });
        }
        None
    }
}

impl Edge for StreetEdge {
    fn from_vertex(&self) -> VertexId {
        self.from
    }

    fn to_vertex(&self) -> VertexId {
        self.to
    }

    fn kind(&self) -> EdgeKind {
        EdgeKind::Street
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn traverse(&self, s0: &State, cx: &TraverseContext<'_>) -> Vec<State> {
        if s0.is_on_board() {
            return Vec::new();
        }
        let Some(cost) = self.cost(cx.options) else {
            return Vec::new();
        };

        let mut editor = cx.edit(s0, self);
        editor.increment_time(cost.seconds.ceil() as i64);
        editor.increment_weight(cost.weight);
        if cost.walking {
            editor.increment_walk_distance(self.length_m);
            if editor.walk_distance() > cx.options.max_walk_distance {
                editor.reject();
            }
        }
        editor.make_state().into_iter().collect()
    }

    fn weight_lower_bound(&self, _graph: &Graph, options: &SearchOptions) -> f64 {
        self.cost(options).map_or(f64::INFINITY, |c| c.weight)
    }

    fn permission(&self) -> Option<StreetPermission> {
        Some(self.permission)
    }

    fn distance_m(&self) -> f64 {
        self.length_m
    }
}
