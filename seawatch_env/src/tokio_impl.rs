//! Production implementation of SeaWatchContext using Tokio.

use crate::SeaWatchContext;
use async_trait::async_trait;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Production context backed by Tokio and OS entropy.
///
/// Time comes from the system clock, randomness from the OS.
pub struct TokioContext {
    /// Start time for monotonic duration calculations
    start: Instant,
}

impl TokioContext {
    /// Creates a new TokioContext.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Creates an Arc-wrapped context for sharing across tasks.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Default for TokioContext {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SeaWatchContext for TokioContext {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn derive_rng(&self, _stream: u64) -> ChaCha8Rng {
        // Production streams are not reproducible
        ChaCha8Rng::from_entropy()
    }

    fn seed(&self) -> u64 {
        0
    }
}
