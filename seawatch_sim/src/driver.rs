//! Interval driver - fires controller ticks on a context's clock.
//!
//! The driver is the only task that ticks. Commands from other tasks
//! (pause, reset, select) go through the same mutex, so every mutation of
//! the world is serialized. A pause takes effect at the next interval
//! boundary; a tick already in progress always finishes.

use crate::controller::{SimulationController, SimulationPhase};
use crate::error::SimError;
use seawatch_core::Vessel;
use seawatch_env::SeaWatchContext;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// How a driver loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverOutcome {
    /// Ticks this loop fired
    pub ticks: u64,
    /// Controller phase when the loop stopped (PAUSED or COMPLETE normally)
    pub phase: SimulationPhase,
}

pub struct SimulationDriver<C: SeaWatchContext> {
    controller: Arc<Mutex<SimulationController>>,
    ctx: Arc<C>,
}

impl<C: SeaWatchContext> SimulationDriver<C> {
    pub fn new(controller: Arc<Mutex<SimulationController>>, ctx: Arc<C>) -> Self {
        Self { controller, ctx }
    }

    /// Handle for issuing commands while the loop runs.
    pub fn controller(&self) -> Arc<Mutex<SimulationController>> {
        Arc::clone(&self.controller)
    }

    /// Ticks the controller once per interval until it leaves RUNNING.
    ///
    /// Returns immediately if the controller is not running.
    pub async fn run(&self) -> Result<DriverOutcome, SimError> {
        self.run_observed(|_, _| {}).await
    }

    /// Like [`run`](Self::run), calling `on_tick` after every fired tick with
    /// the vessels as they were before it and the controller after it.
    ///
    /// The callback runs under the controller lock.
    pub async fn run_observed<F>(&self, mut on_tick: F) -> Result<DriverOutcome, SimError>
    where
        F: FnMut(&[Vessel], &SimulationController),
    {
        let interval = self.lock()?.config().tick_interval();
        let mut ticks = 0;

        info!(interval_ms = interval.as_millis() as u64, "Driver loop started");

        loop {
            if !self.lock()?.is_running() {
                break;
            }

            self.ctx.sleep(interval).await;

            let mut controller = self.lock()?;
            // Paused (or reset) while we slept: this interval does not fire
            if !controller.is_running() {
                break;
            }
            let before = controller.vessels().to_vec();
            let outcome = controller.tick();
            ticks += 1;
            debug!(tick = ticks, ?outcome, now = ?self.ctx.now(), "interval fired");
            on_tick(&before, &controller);
        }

        let phase = self.lock()?.phase();
        info!(ticks, ?phase, "Driver loop stopped");
        Ok(DriverOutcome { ticks, phase })
    }

    fn lock(&self) -> Result<MutexGuard<'_, SimulationController>, SimError> {
        self.controller.lock().map_err(|_| SimError::LockPoisoned)
    }
}
