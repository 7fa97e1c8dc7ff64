//! Simulation context implementing SeaWatchContext on a virtual clock.

use async_trait::async_trait;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use seawatch_env::SeaWatchContext;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Simulation context backed by deterministic time and RNG.
///
/// This implements `SeaWatchContext` using:
/// - A virtual clock that only moves when advanced (or slept on)
/// - Seeded ChaCha8 streams derived from one master seed
#[derive(Debug, Clone)]
pub struct SimContext {
    /// Master seed for this simulation
    seed: u64,

    /// Current virtual time (nanoseconds since simulation start), shared by clones
    virtual_time_ns: Arc<AtomicU64>,
}

impl SimContext {
    /// Creates a new SimContext with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            virtual_time_ns: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Creates an Arc-wrapped context for sharing.
    pub fn shared(seed: u64) -> Arc<Self> {
        Arc::new(Self::new(seed))
    }

    /// Advances virtual time by the given duration.
    pub fn advance_time(&self, duration: Duration) {
        self.virtual_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Sets the virtual time to a specific value.
    pub fn set_time(&self, time_ns: u64) {
        self.virtual_time_ns.store(time_ns, Ordering::SeqCst);
    }

    /// Returns the current virtual time in nanoseconds.
    pub fn time_ns(&self) -> u64 {
        self.virtual_time_ns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SeaWatchContext for SimContext {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.time_ns())
    }

    async fn sleep(&self, duration: Duration) {
        // Sleeping on a virtual clock is instantaneous
        self.advance_time(duration);
    }

    fn derive_rng(&self, stream: u64) -> ChaCha8Rng {
        // Combine master seed with the stream id
        let combined_seed = self.seed.wrapping_mul(0x517cc1b727220a95) ^ stream;
        ChaCha8Rng::seed_from_u64(combined_seed)
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}
