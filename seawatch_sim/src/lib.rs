//! SeaWatch Simulation Harness
//!
//! This crate owns the stateful half of the system: the controller that holds
//! the authoritative world, the timer that drives it, and the tooling that
//! runs scenarios headlessly.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    SimulationDriver<C>                       │
//! │   ctx.sleep(interval) ──▶ lock ──▶ controller.tick()          │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │ Arc<Mutex<_>>
//! ┌──────────────────────────────▼───────────────────────────────┐
//! │                   SimulationController                        │
//! │  IDLE → READY → RUNNING ⇄ PAUSED → COMPLETE                   │
//! │                                                               │
//! │  TickEngine ──▶ AnomalyClassifier ──▶ dedup ──▶ event log     │
//! │  (kinematics)   (full re-classification)  (new keys only)     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every random stream derives from one seed through the context, so any
//! run can be replayed from its seed number.
//!
//! # Usage
//!
//! ```ignore
//! use seawatch_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let result = ScenarioRunner::new(42, 15)
//!     .with_duration(30.0)
//!     .run(ScenarioId::Baseline);
//! assert!(result.passed);
//! ```

mod config;
mod context;
mod controller;
mod driver;
mod error;
mod exporter;
mod runner;
mod state;
pub mod scenarios;

pub use config::{DedupPolicy, SimulationConfig};
pub use context::SimContext;
pub use controller::{SimulationController, SimulationPhase, TickOutcome};
pub use driver::{DriverOutcome, SimulationDriver};
pub use error::SimError;
pub use exporter::{SimExport, SimFrame, VesselFrame};
pub use runner::{check_step, ScenarioResult, ScenarioRunner};
pub use state::{SimulationEvent, SimulationState};
