//! JSON exporter for offline replay.
//!
//! Exports one frame per tick plus the full event log and the final report.

use crate::state::SimulationEvent;
use seawatch_core::{AisStatus, Infrastructure, SimulationReport, Vessel};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use uuid::Uuid;

/// A single frame of simulation data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimFrame {
    /// Simulation time in seconds
    pub time_secs: f64,

    pub vessels: Vec<VesselFrame>,

    /// Events first logged on this tick
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub new_event_ids: Vec<Uuid>,
}

/// Observable state of one vessel in a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselFrame {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub heading: f64,
    pub speed: f64,
    pub ais_status: AisStatus,
}

impl From<&Vessel> for VesselFrame {
    fn from(v: &Vessel) -> Self {
        Self {
            id: v.id.to_string(),
            lat: v.position.lat,
            lng: v.position.lng,
            heading: v.heading,
            speed: v.speed,
            ais_status: v.ais_status,
        }
    }
}

impl SimFrame {
    pub fn capture(time_secs: f64, vessels: &[Vessel], new_events: &[SimulationEvent]) -> Self {
        Self {
            time_secs,
            vessels: vessels.iter().map(VesselFrame::from).collect(),
            new_event_ids: new_events.iter().map(|e| e.id).collect(),
        }
    }
}

/// Complete simulation export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Simulated time covered by the frames
    pub duration_secs: f64,

    pub infrastructure: Infrastructure,

    /// All frames
    pub frames: Vec<SimFrame>,

    pub events: Vec<SimulationEvent>,

    /// Final report, set by `finalize`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<SimulationReport>,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64, infrastructure: Infrastructure) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            duration_secs: 0.0,
            infrastructure,
            frames: Vec::new(),
            events: Vec::new(),
            report: None,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: SimFrame) {
        self.duration_secs = frame.time_secs;
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, events: &[SimulationEvent], report: SimulationReport) {
        self.events = events.to_vec();
        self.report = Some(report);
    }

    /// Writes the export as pretty-printed JSON.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()
    }
}
