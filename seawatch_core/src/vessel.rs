//! Vessel model: identity, kinematics, hidden behavior and accumulators.

use crate::geometry::LatLng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

// ============================================================================
// SPEED ENVELOPE
// ============================================================================

/// Lowest speed a vessel can report (knots).
pub const MIN_SPEED_KNOTS: f64 = 0.0;

/// Highest speed a vessel can report (knots).
pub const MAX_SPEED_KNOTS: f64 = 10.0;

/// Range the generator samples initial speeds from (knots).
///
/// Capped at `MAX_SPEED_KNOTS` so a freshly generated vessel never jumps
/// down on its first tick.
pub const INITIAL_SPEED_RANGE: (f64, f64) = (5.0, MAX_SPEED_KNOTS);

/// Maximum number of samples kept in each history buffer.
pub const HISTORY_CAPACITY: usize = 20;

/// Clamps a speed into the envelope.
pub fn clamp_speed(speed: f64) -> f64 {
    speed.clamp(MIN_SPEED_KNOTS, MAX_SPEED_KNOTS)
}

/// Normalizes a heading into [0, 360).
pub fn normalize_heading(heading: f64) -> f64 {
    let h = heading.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if h >= 360.0 {
        0.0
    } else {
        h
    }
}

// ============================================================================
// ENUMS
// ============================================================================

/// Declared vessel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VesselType {
    Cargo,
    Tanker,
    Passenger,
    Fishing,
    Research,
    Military,
    Pleasure,
    Tug,
}

impl VesselType {
    pub const ALL: [VesselType; 8] = [
        VesselType::Cargo,
        VesselType::Tanker,
        VesselType::Passenger,
        VesselType::Fishing,
        VesselType::Research,
        VesselType::Military,
        VesselType::Pleasure,
        VesselType::Tug,
    ];
}

/// AIS transponder status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AisStatus {
    Active,
    Inactive,
}

/// Hidden ground-truth behavior, assigned once at generation time.
///
/// Drives which perturbation rule the tick engine applies. The classifier
/// must infer anomalies from observable state; only the speed and zigzag
/// rules consult this label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Behavior {
    Normal,
    RouteDeviation,
    SpeedAnomaly,
    AisLoss,
    SuspiciousAnchoring,
}

impl Behavior {
    pub const ALL: [Behavior; 5] = [
        Behavior::Normal,
        Behavior::RouteDeviation,
        Behavior::SpeedAnomaly,
        Behavior::AisLoss,
        Behavior::SuspiciousAnchoring,
    ];
}

// ============================================================================
// IDENTITY
// ============================================================================

/// Unique identifier of a vessel within a scenario (e.g. `vessel-3`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VesselId(pub String);

impl VesselId {
    /// Creates the id for the `index`-th generated vessel.
    pub fn from_index(index: usize) -> Self {
        Self(format!("vessel-{}", index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VesselId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for VesselId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// VESSEL
// ============================================================================

/// Kinematic state captured at creation, restored on reset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VesselSnapshot {
    pub position: LatLng,
    pub heading: f64,
    pub speed: f64,
}

/// A tracked vessel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vessel {
    // === Identity ===
    pub id: VesselId,
    pub name: String,
    pub mmsi: String,
    pub imo: String,
    /// Flag state country code
    pub flag: String,
    pub vessel_type: VesselType,
    /// Free-text destination label
    pub destination: String,

    // === Kinematics ===
    pub position: LatLng,
    /// Degrees in [0, 360)
    pub heading: f64,
    /// Knots in [0, 10]
    pub speed: f64,
    pub initial: VesselSnapshot,

    // === Status ===
    pub ais_status: AisStatus,
    pub behavior: Behavior,

    // === Accumulators ===
    /// Seconds spent within anchoring range of a cable
    pub time_near_cable: f64,
    pub speed_history: VecDeque<f64>,
    pub position_history: VecDeque<LatLng>,
}

impl Vessel {
    /// Creates a vessel at the given kinematic state.
    ///
    /// Registry fields (MMSI, IMO, flag, destination) get placeholder values;
    /// the world generator fills them in. Speed and heading are normalized.
    pub fn new(
        id: impl Into<VesselId>,
        name: &str,
        vessel_type: VesselType,
        behavior: Behavior,
        position: LatLng,
        heading: f64,
        speed: f64,
    ) -> Self {
        let initial = VesselSnapshot {
            position,
            heading: normalize_heading(heading),
            speed: clamp_speed(speed),
        };

        Self {
            id: id.into(),
            name: name.to_string(),
            mmsi: String::new(),
            imo: String::new(),
            flag: String::new(),
            vessel_type,
            destination: String::new(),
            position,
            heading: initial.heading,
            speed: initial.speed,
            initial,
            ais_status: AisStatus::Active,
            behavior,
            time_near_cable: 0.0,
            speed_history: VecDeque::from([initial.speed]),
            position_history: VecDeque::from([position]),
        }
    }

    /// Appends the current speed and position to the history buffers,
    /// evicting the oldest entries past `HISTORY_CAPACITY`.
    pub fn record_sample(&mut self) {
        push_bounded(&mut self.speed_history, self.speed);
        push_bounded(&mut self.position_history, self.position);
    }

    /// The last `n` recorded speeds (fewer if the history is shorter).
    pub fn recent_speeds(&self, n: usize) -> Vec<f64> {
        let skip = self.speed_history.len().saturating_sub(n);
        self.speed_history.iter().skip(skip).copied().collect()
    }

    /// The last `n` recorded positions (fewer if the history is shorter).
    pub fn recent_positions(&self, n: usize) -> Vec<LatLng> {
        let skip = self.position_history.len().saturating_sub(n);
        self.position_history.iter().skip(skip).copied().collect()
    }

    /// Current kinematic state as a snapshot.
    pub fn snapshot(&self) -> VesselSnapshot {
        VesselSnapshot {
            position: self.position,
            heading: self.heading,
            speed: self.speed,
        }
    }

    /// Restores the initial snapshot and clears every accumulator.
    ///
    /// Identity and behavior are kept.
    pub fn reset_to_initial(&mut self) {
        self.position = self.initial.position;
        self.heading = self.initial.heading;
        self.speed = self.initial.speed;
        self.ais_status = AisStatus::Active;
        self.time_near_cable = 0.0;
        self.speed_history = VecDeque::from([self.initial.speed]);
        self.position_history = VecDeque::from([self.initial.position]);
    }

    pub fn is_ais_active(&self) -> bool {
        self.ais_status == AisStatus::Active
    }
}

fn push_bounded<T>(buf: &mut VecDeque<T>, value: T) {
    buf.push_back(value);
    while buf.len() > HISTORY_CAPACITY {
        buf.pop_front();
    }
}
