//! Simulation configuration.
//!
//! Every field has a reference default, so a JSON file only needs to list
//! the values it changes:
//!
//! ```json
//! { "seed": 7, "vessel_count": 40, "profile": "enhanced" }
//! ```

use crate::error::SimError;
use seawatch_core::{BehaviorWeights, ClassifierProfile, ClassifierThresholds, ConfigError, KinematicsConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Which detections become events.
///
/// Both policies key on (vessel, anomaly type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// A key produces at most one event between resets
    #[default]
    OncePerRun,
    /// A key produces a new event each time its condition starts again
    /// after at least one tick without it
    PerEpisode,
}

/// Full configuration of one simulation controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Master seed for every random stream
    pub seed: u64,
    pub vessel_count: usize,
    /// Simulated run length in seconds
    pub duration_secs: f64,
    /// Interval between ticks in milliseconds (also the tick's dt)
    pub tick_interval_ms: u64,
    pub profile: ClassifierProfile,
    pub dedup: DedupPolicy,
    pub behavior_weights: BehaviorWeights,
    pub thresholds: ClassifierThresholds,
    pub kinematics: KinematicsConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            vessel_count: 15,
            duration_secs: 30.0,
            tick_interval_ms: 2000,
            profile: ClassifierProfile::Standard,
            dedup: DedupPolicy::OncePerRun,
            behavior_weights: BehaviorWeights::default(),
            thresholds: ClassifierThresholds::default(),
            kinematics: KinematicsConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Reads a (possibly partial) configuration from a JSON file and validates it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vessel_count == 0 {
            return Err(ConfigError::NoVessels);
        }
        if !(self.duration_secs.is_finite() && self.duration_secs > 0.0) {
            return Err(ConfigError::InvalidTiming(format!(
                "duration must be positive, got {}s",
                self.duration_secs
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidTiming("tick interval must be non-zero".to_string()));
        }
        if self.tick_interval_ms > self.duration_ms() {
            return Err(ConfigError::InvalidTiming(format!(
                "tick interval {}ms exceeds duration {}s",
                self.tick_interval_ms, self.duration_secs
            )));
        }
        self.behavior_weights.validate()?;
        self.thresholds.validate()?;
        self.kinematics.validate()
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Tick length in seconds, as handed to the tick engine.
    pub fn dt_secs(&self) -> f64 {
        self.tick_interval_ms as f64 / 1000.0
    }

    /// Duration rounded to whole milliseconds.
    pub fn duration_ms(&self) -> u64 {
        (self.duration_secs * 1000.0).round() as u64
    }

    /// Number of timer ticks until completion, the completing tick included.
    pub fn expected_ticks(&self) -> u64 {
        self.duration_ms().div_ceil(self.tick_interval_ms.max(1))
    }
}
