//! Configuration errors for the SeaWatch engine.

use thiserror::Error;

/// Errors raised while validating engine configuration.
///
/// The simulation itself never fails at runtime: degenerate inputs (no
/// cables, short histories) yield safe defaults. Only configuration that
/// would make sampling or thresholds meaningless is rejected, once, up front.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Behavior weights are negative, non-finite or all zero
    #[error("Invalid behavior weights: {0}")]
    InvalidWeights(String),

    /// A distance or duration threshold is out of range
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    /// A probability lies outside [0, 1]
    #[error("Invalid probability for {name}: {value}")]
    InvalidProbability { name: &'static str, value: f64 },

    /// Duration / interval combination cannot produce a single tick
    #[error("Invalid timing: {0}")]
    InvalidTiming(String),

    /// A scenario needs at least one vessel
    #[error("Vessel count must be at least 1")]
    NoVessels,
}

impl ConfigError {
    /// Creates a threshold error.
    pub fn threshold(msg: impl Into<String>) -> Self {
        Self::InvalidThreshold(msg.into())
    }

    /// Checks that `value` is a usable probability.
    pub fn check_probability(name: &'static str, value: f64) -> Result<(), Self> {
        if (0.0..=1.0).contains(&value) {
            Ok(())
        } else {
            Err(Self::InvalidProbability { name, value })
        }
    }
}
