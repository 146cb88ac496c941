//! Per-request search options, overrides and deadlines.

use std::time::{Duration, Instant};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::DominanceFunction;
use crate::graph::epoch_seconds;

/// Which ways of travelling a request allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct TraverseModeSet {
    pub walk: bool,
    pub car: bool,
    pub transit: bool,
}

impl TraverseModeSet {
    pub const WALK: Self = Self {
        walk: true,
        car: false,
        transit: false,
    };
    pub const CAR: Self = Self {
        walk: false,
        car: true,
        transit: false,
    };
    pub const WALK_AND_TRANSIT: Self = Self {
        walk: true,
        car: false,
        transit: true,
    };
}

impl Default for TraverseModeSet {
    fn default() -> Self {
        Self::WALK
    }
}

/// Options for one search.
///
/// Plain data: copy it and change fields, or apply a [`SearchOverrides`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    /// Search backwards from the target's required arrival time.
    pub arrive_by: bool,

    /// Departure time (or arrival time, when `arrive_by`) in epoch seconds.
    pub start_time: i64,

    /// States heavier than this are never enqueued.
    pub max_weight: f64,

    /// States later than this (earlier, when `arrive_by`) are never enqueued.
    pub worst_time: Option<i64>,

    /// Explore everything reachable instead of heading for a target.
    pub batch: bool,

    /// Number of accepted paths to collect before stopping.
    pub num_itineraries: usize,

    /// Only accept paths that ride at least one vehicle.
    pub only_transit_trips: bool,

    /// Stop at the first accepted path.
    pub long_distance: bool,

    pub modes: TraverseModeSet,

    /// Walking speed in m/s.
    pub walk_speed: f64,

    /// Driving speed in m/s.
    pub car_speed: f64,

    /// Weight per second spent walking.
    pub walk_reluctance: f64,

    /// Weight per second spent waiting for a vehicle.
    pub wait_reluctance: f64,

    /// Weight added per boarding.
    pub board_cost: f64,

    /// Maximum metres of walking per path.
    pub max_walk_distance: f64,

    /// Multiplier on heuristic estimates. Above 1 the result may not be optimal.
    pub heuristic_weight: f64,

    /// How many consecutive trips a boarding may branch into.
    pub max_trip_candidates: usize,

    /// RAPTOR rounds after the first.
    pub max_transfers: usize,

    pub dominance: DominanceFunction,

    /// Wall-clock budget for the search, including heuristic set-up.
    pub timeout: Option<Duration>,
}

impl SearchOptions {
    /// Walk-only options.
    pub fn walking() -> Self {
        Self::default()
    }

    /// Drive-only options.
    pub fn driving() -> Self {
        Self {
            modes: TraverseModeSet::CAR,
            ..Self::default()
        }
    }

    /// Walk and ride transit.
    pub fn transit() -> Self {
        Self {
            modes: TraverseModeSet::WALK_AND_TRANSIT,
            ..Self::default()
        }
    }

    /// Depart at `datetime` (UTC).
    pub fn depart_at(mut self, datetime: NaiveDateTime) -> Self {
        self.start_time = epoch_seconds(datetime);
        self.arrive_by = false;
        self
    }

    /// Arrive by `datetime` (UTC).
    pub fn arrive_by_at(mut self, datetime: NaiveDateTime) -> Self {
        self.start_time = epoch_seconds(datetime);
        self.arrive_by = true;
        self
    }

    /// True if `time` is beyond the worst acceptable time for this search direction.
    pub fn is_worst_time_exceeded(&self, time: i64) -> bool {
        match self.worst_time {
            Some(worst) if self.arrive_by => time < worst,
            Some(worst) => time > worst,
            None => false,
        }
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            arrive_by: false,
            start_time: 0,
            max_weight: f64::INFINITY,
            worst_time: None,
            batch: false,
            num_itineraries: 1,
            only_transit_trips: false,
            long_distance: false,
            modes: TraverseModeSet::WALK,
            walk_speed: 1.33,
            car_speed: 15.0,
            walk_reluctance: 2.0,
            wait_reluctance: 1.0,
            board_cost: 600.0,
            max_walk_distance: f64::INFINITY,
            heuristic_weight: 1.0,
            max_trip_candidates: 1,
            max_transfers: 4,
            dominance: DominanceFunction::MinimumWeight,
            timeout: None,
        }
    }
}

/// Changes applied on top of a base [`SearchOptions`].
///
/// Sub-searches describe only what they change; the base is never mutated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOverrides {
    pub arrive_by: Option<bool>,
    pub modes: Option<TraverseModeSet>,
    pub max_walk_distance: Option<f64>,
    pub max_weight: Option<f64>,
    pub batch: Option<bool>,
    pub dominance: Option<DominanceFunction>,
    pub num_itineraries: Option<usize>,
}

impl SearchOverrides {
    /// Walking-only, in the given direction.
    pub fn walking(arrive_by: bool) -> Self {
        Self {
            arrive_by: Some(arrive_by),
            modes: Some(TraverseModeSet::WALK),
            ..Self::default()
        }
    }

    pub fn with_max_walk_distance(mut self, metres: f64) -> Self {
        self.max_walk_distance = Some(metres);
        self
    }

    pub fn with_batch(mut self, batch: bool) -> Self {
        self.batch = Some(batch);
        self
    }

    /// Options with these overrides applied.
    pub fn apply(&self, base: &SearchOptions) -> SearchOptions {
        SearchOptions {
            arrive_by: self.arrive_by.unwrap_or(base.arrive_by),
            modes: self.modes.unwrap_or(base.modes),
            max_walk_distance: self.max_walk_distance.unwrap_or(base.max_walk_distance),
            max_weight: self.max_weight.unwrap_or(base.max_weight),
            batch: self.batch.unwrap_or(base.batch),
            dominance: self.dominance.unwrap_or(base.dominance),
            num_itineraries: self.num_itineraries.unwrap_or(base.num_itineraries),
            ..base.clone()
        }
    }
}

/// Absolute wall-clock point after which a search gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Deadline {
    #[default]
    Never,
    At(Instant),
}

impl Deadline {
    pub fn after(timeout: Duration) -> Self {
        Instant::now()
            .checked_add(timeout)
            .map_or(Self::Never, Self::At)
    }

    /// Deadline `seconds` from now. Negative means no deadline.
    pub fn from_relative_seconds(seconds: f64) -> Self {
        if seconds < 0.0 || !seconds.is_finite() {
            Self::Never
        } else {
            Self::after(Duration::from_secs_f64(seconds))
        }
    }

    pub fn from_timeout(timeout: Option<Duration>) -> Self {
        timeout.map_or(Self::Never, Self::after)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self {
            Self::Never => false,
            Self::At(deadline) => now > *deadline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let options = SearchOptions::default();
        assert!(!options.arrive_by);
        assert_eq!(options.max_weight, f64::INFINITY);
        assert_eq!(options.num_itineraries, 1);
        assert_eq!(options.modes, TraverseModeSet::WALK);
        assert_eq!(options.heuristic_weight, 1.0);
        assert_eq!(options.dominance, DominanceFunction::MinimumWeight);
        assert!(options.timeout.is_none());
    }

    #[test]
    fn worst_time_depends_on_direction() {
        let forward = SearchOptions {
            worst_time: Some(1_000),
            ..SearchOptions::default()
        };
        assert!(forward.is_worst_time_exceeded(1_001));
        assert!(!forward.is_worst_time_exceeded(1_000));

        let backward = SearchOptions {
            arrive_by: true,
            ..forward.clone()
        };
        assert!(backward.is_worst_time_exceeded(999));
        assert!(!backward.is_worst_time_exceeded(1_001));

        assert!(!SearchOptions::default().is_worst_time_exceeded(i64::MAX));
    }

    #[test]
    fn overrides_leave_base_untouched() {
        let base = SearchOptions {
            walk_speed: 1.0,
            ..SearchOptions::transit()
        };
        let sub = SearchOverrides::walking(true)
            .with_max_walk_distance(500.0)
            .apply(&base);

        assert!(sub.arrive_by);
        assert_eq!(sub.modes, TraverseModeSet::WALK);
        assert_eq!(sub.max_walk_distance, 500.0);
        assert_eq!(sub.walk_speed, 1.0);

        assert!(!base.arrive_by);
        assert_eq!(base.modes, TraverseModeSet::WALK_AND_TRANSIT);
        assert_eq!(SearchOverrides::default().apply(&base), base);
    }

    #[test]
    fn start_time_from_datetime() {
        let dt = chrono::NaiveDate::from_ymd_opt(1970, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 10)
            .unwrap();
        let options = SearchOptions::walking().arrive_by_at(dt);
        assert_eq!(options.start_time, 86_410);
        assert!(options.arrive_by);
    }

    #[test]
    fn deadlines() {
        assert_eq!(Deadline::from_relative_seconds(-1.0), Deadline::Never);
        assert!(!Deadline::Never.is_expired());
        assert_eq!(Deadline::from_timeout(None), Deadline::Never);

        let now = Instant::now();
        let past = Deadline::At(now);
        assert!(past.is_expired_at(now + Duration::from_millis(1)));
        assert!(!past.is_expired_at(now));

        assert!(!Deadline::after(Duration::from_secs(3600)).is_expired());
    }

    #[test]
    fn modes_deserialize_with_defaults() {
        let modes: TraverseModeSet = serde_json::from_str(r#"{"transit": true}"#).unwrap();
        assert_eq!(modes, TraverseModeSet::WALK_AND_TRANSIT);
    }
}
