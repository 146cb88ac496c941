//! Engine configuration, loaded from JSON.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```
//! use trip_router::config::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "raptor": { "max_transfers": 2 } }"#).unwrap();
//! assert_eq!(config.raptor.max_transfers, 2);
//! assert_eq!(config.search.walk_speed, 1.33);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::raptor::StoreKind;
use crate::search::{DominanceFunction, SearchOptions, TraverseModeSet};

/// Error loading a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Defaults for best-first searches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchDefaults {
    pub modes: TraverseModeSet,

    /// Walking speed in m/s.
    pub walk_speed: f64,

    /// Driving speed in m/s.
    pub car_speed: f64,

    pub walk_reluctance: f64,

    pub wait_reluctance: f64,

    /// Weight added per boarding.
    pub board_cost: f64,

    /// Maximum metres walked per path. Absent means unlimited.
    pub max_walk_distance_m: Option<f64>,

    pub heuristic_weight: f64,

    /// Trips tried per boarding.
    pub max_trip_candidates: usize,

    pub num_itineraries: usize,

    pub dominance: DominanceFunction,

    /// Wall-clock budget per search (seconds). Absent means unlimited.
    pub timeout_secs: Option<f64>,
}

impl SearchDefaults {
    /// Base options at `start_time`; tweak further with
    /// [`SearchOverrides`](crate::search::SearchOverrides).
    pub fn options(&self, start_time: i64) -> SearchOptions {
        SearchOptions {
            start_time,
            modes: self.modes,
            walk_speed: self.walk_speed,
            car_speed: self.car_speed,
            walk_reluctance: self.walk_reluctance,
            wait_reluctance: self.wait_reluctance,
            board_cost: self.board_cost,
            max_walk_distance: self.max_walk_distance_m.unwrap_or(f64::INFINITY),
            heuristic_weight: self.heuristic_weight,
            max_trip_candidates: self.max_trip_candidates,
            num_itineraries: self.num_itineraries,
            dominance: self.dominance,
            timeout: self.timeout(),
            ..SearchOptions::default()
        }
    }

    /// Returns the timeout as a Duration.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|s| s.is_finite() && *s >= 0.0)
            .map(Duration::from_secs_f64)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.walk_speed > 0.0 && self.walk_speed.is_finite()) {
            return Err(ConfigError::Invalid("walk_speed must be positive"));
        }
        if !(self.car_speed > 0.0 && self.car_speed.is_finite()) {
            return Err(ConfigError::Invalid("car_speed must be positive"));
        }
        if self.walk_reluctance < 0.0 || self.wait_reluctance < 0.0 || self.board_cost < 0.0 {
            return Err(ConfigError::Invalid("costs must not be negative"));
        }
        if self.heuristic_weight < 0.0 {
            return Err(ConfigError::Invalid("heuristic_weight must not be negative"));
        }
        if self.num_itineraries == 0 {
            return Err(ConfigError::Invalid("num_itineraries must be at least 1"));
        }
        Ok(())
    }
}

impl Default for SearchDefaults {
    fn default() -> Self {
        let options = SearchOptions::default();
        Self {
            modes: options.modes,
            walk_speed: options.walk_speed,
            car_speed: options.car_speed,
            walk_reluctance: options.walk_reluctance,
            wait_reluctance: options.wait_reluctance,
            board_cost: options.board_cost,
            max_walk_distance_m: None,
            heuristic_weight: options.heuristic_weight,
            max_trip_candidates: options.max_trip_candidates,
            num_itineraries: options.num_itineraries,
            dominance: options.dominance,
            timeout_secs: None,
        }
    }
}

/// Defaults for RAPTOR runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaptorDefaults {
    /// Rounds run are at most this plus one.
    pub max_transfers: usize,

    pub store: StoreKind,
}

impl Default for RaptorDefaults {
    fn default() -> Self {
        Self {
            max_transfers: SearchOptions::default().max_transfers,
            store: StoreKind::default(),
        }
    }
}

/// Settings for [`run_batch`](crate::batch::run_batch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Searches in flight at once.
    pub batch_size: usize,

    /// Reuse graph-distance heuristics between requests with the same target.
    pub share_heuristics: bool,

    /// Heuristics kept when sharing.
    pub heuristic_cache_capacity: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 8,
            share_heuristics: false,
            heuristic_cache_capacity: 64,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub search: SearchDefaults,
    pub raptor: RaptorDefaults,
    pub batch: BatchConfig,
}

impl EngineConfig {
    pub fn new(search: SearchDefaults, raptor: RaptorDefaults, batch: BatchConfig) -> Self {
        Self {
            search,
            raptor,
            batch,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Base options for a RAPTOR run at `start_time`.
    pub fn raptor_options(&self, start_time: i64) -> SearchOptions {
        SearchOptions {
            modes: TraverseModeSet::WALK_AND_TRANSIT,
            max_transfers: self.raptor.max_transfers,
            ..self.search.options(start_time)
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.search.validate()?;
        if self.batch.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be at least 1"));
        }
        Ok(())
    }
}
