//! The aggregate world state owned by the controller.

use seawatch_core::{Anomaly, Infrastructure, Vessel, VesselId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Log entry for a newly detected anomaly.
///
/// Append-only; only a reset or a new scenario clears the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationEvent {
    pub id: Uuid,
    /// Simulation clock when the event was logged (seconds)
    pub time_secs: f64,
    pub anomaly: Anomaly,
}

/// Vessels, infrastructure, event log and elapsed time of one scenario.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub vessels: Vec<Vessel>,
    pub infrastructure: Infrastructure,
    pub events: Vec<SimulationEvent>,
    pub elapsed_secs: f64,
}

impl SimulationState {
    pub fn vessel(&self, id: &VesselId) -> Option<&Vessel> {
        self.vessels.iter().find(|v| &v.id == id)
    }
}
