//! Core environment context trait for the SeaWatch simulation.

use async_trait::async_trait;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

/// The central interface for environment interaction.
///
/// This trait abstracts the "real world" so that the simulation controller
/// can be driven either by wall-clock intervals or by a virtual clock.
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `tokio::time`, OS entropy
/// - **Simulation**: `SimContext` - virtual clock, `ChaCha8Rng(seed)`
///
/// # Determinism
///
/// For replayable runs, all methods that would normally introduce
/// non-determinism (time, randomness) are controlled by the implementation.
#[async_trait]
pub trait SeaWatchContext: Send + Sync + 'static {
    /// Returns the current monotonic time since context creation.
    ///
    /// In simulation, this is the virtual clock time.
    fn now(&self) -> Duration;

    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances the virtual clock
    async fn sleep(&self, duration: Duration);

    /// Returns an independent random stream.
    ///
    /// The simulation implementation combines the global seed with `stream`
    /// so that scenario generation, kinematics and event ids each get
    /// their own reproducible sequence.
    ///
    /// # Arguments
    /// * `stream` - A value to combine with the global seed
    fn derive_rng(&self, stream: u64) -> ChaCha8Rng;

    /// Returns the context's seed (for logging/debugging).
    ///
    /// In production, returns 0 (not seeded).
    fn seed(&self) -> u64;
}
