//! Error types for the simulation harness.

use seawatch_core::ConfigError;
use thiserror::Error;

/// Errors raised outside the simulation itself: loading configuration,
/// writing exports, or sharing the controller across tasks.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A task panicked while holding the controller lock
    #[error("Simulation controller lock poisoned")]
    LockPoisoned,
}
