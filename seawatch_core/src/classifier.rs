//! The "CLASSIFIER" - anomaly records from observable vessel state
//!
//! Classification is recomputed from scratch every tick: every condition that
//! still holds re-emits a record. Deciding which records are *new* is the
//! caller's job (see the controller's dedup stage), so this module stays a
//! pure function of (vessels, infrastructure, clock, rng).
//!
//! Rules are independent; one vessel may trigger several per tick:
//!
//! | Rule | Fires when |
//! |---|---|
//! | AIS_LOSS | transponder inactive |
//! | SUSPICIOUS_ANCHORING | speed < 0.5, time near cable > 0, directly over a cable |
//! | ROUTE_DEVIATION (loitering) | 0.5 <= speed < 2.0, time near cable > 0, near a cable |
//! | ROUTE_DEVIATION (zigzag) | behavior ROUTE_DEVIATION and zigzag over the last 10 fixes |
//! | SPEED_ANOMALY | speed range over the last 5 samples > 5 kn, behavior SPEED_ANOMALY |
//! | TYPE_MISMATCH | enhanced only: RESEARCH vessel near a cable |
//! | RF_EMISSIONS | enhanced only: non-normal behavior near a cable, random draw |

use crate::anomaly::{Anomaly, AnomalyType, Severity};
use crate::error::ConfigError;
use crate::geometry::{detect_zigzag, find_nearest_cable, NearestCable};
use crate::infrastructure::Infrastructure;
use crate::vessel::{AisStatus, Behavior, Vessel, VesselType, HISTORY_CAPACITY};
use rand::Rng;
use serde::{Deserialize, Serialize};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Which rule set to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierProfile {
    /// AIS loss, anchoring, route deviation, speed anomaly
    #[default]
    Standard,
    /// Standard rules plus TYPE_MISMATCH and RF_EMISSIONS, graded AIS severity
    Enhanced,
}

/// Distance, speed and duration thresholds.
///
/// Distances are in the same planar degree units as positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierThresholds {
    pub directly_over: f64,
    pub very_close: f64,
    pub near: f64,
    /// Below this speed a vessel near a cable counts as anchored (knots)
    pub anchoring_speed: f64,
    /// Below this speed (and at or above `anchoring_speed`) it counts as loitering
    pub loiter_speed: f64,
    /// Anchoring severity turns HIGH past this many seconds
    pub anchoring_high_secs: f64,
    /// Speed spread that marks a speed anomaly (knots)
    pub speed_range: f64,
    pub speed_window: usize,
    pub zigzag_window: usize,
    /// Per-tick chance of an RF detection for a qualifying vessel
    pub rf_probability: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            directly_over: 0.01,
            very_close: 0.02,
            near: 0.05,
            anchoring_speed: 0.5,
            loiter_speed: 2.0,
            anchoring_high_secs: 5.0,
            speed_range: 5.0,
            speed_window: 5,
            zigzag_window: 10,
            rf_probability: 0.05,
        }
    }
}

impl ClassifierThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ascending = 0.0 < self.directly_over
            && self.directly_over <= self.very_close
            && self.very_close <= self.near;
        if !ascending {
            return Err(ConfigError::threshold(format!(
                "proximity thresholds must satisfy 0 < directly_over <= very_close <= near, got {} / {} / {}",
                self.directly_over, self.very_close, self.near
            )));
        }
        if !(0.0 <= self.anchoring_speed && self.anchoring_speed <= self.loiter_speed) {
            return Err(ConfigError::threshold("anchoring_speed must not exceed loiter_speed"));
        }
        if self.speed_window < 2 {
            return Err(ConfigError::threshold("speed_window needs at least 2 samples"));
        }
        if self.zigzag_window < crate::geometry::ZIGZAG_MIN_POINTS {
            return Err(ConfigError::threshold("zigzag_window shorter than the zigzag detector needs"));
        }
        // Windows read from the bounded histories, so a longer one never fills
        for (name, window) in [("speed_window", self.speed_window), ("zigzag_window", self.zigzag_window)] {
            if window > HISTORY_CAPACITY {
                return Err(ConfigError::threshold(format!(
                    "{} {} exceeds history capacity {}",
                    name, window, HISTORY_CAPACITY
                )));
            }
        }
        ConfigError::check_probability("rf_probability", self.rf_probability)
    }
}

/// When a classification pass happens.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DetectionClock {
    /// Tick counter, folded into anomaly ids
    pub tick: u64,
    /// Simulation time in seconds
    pub time_secs: f64,
}

impl DetectionClock {
    pub fn new(tick: u64, time_secs: f64) -> Self {
        Self { tick, time_secs }
    }
}

// ============================================================================
// CLASSIFIER
// ============================================================================

/// Stateless rule evaluator.
#[derive(Debug, Clone, Default)]
pub struct AnomalyClassifier {
    profile: ClassifierProfile,
    thresholds: ClassifierThresholds,
}

/// Proximity of one vessel to the cable network, computed once per vessel.
struct Proximity<'a> {
    nearest: Option<NearestCable<'a>>,
}

impl<'a> Proximity<'a> {
    fn within(&self, radius: f64) -> Option<&NearestCable<'a>> {
        self.nearest.as_ref().filter(|n| n.within(radius))
    }
}

impl AnomalyClassifier {
    pub fn new(profile: ClassifierProfile, thresholds: ClassifierThresholds) -> Self {
        Self { profile, thresholds }
    }

    pub fn profile(&self) -> ClassifierProfile {
        self.profile
    }

    pub fn thresholds(&self) -> &ClassifierThresholds {
        &self.thresholds
    }

    /// Classifies every vessel and returns all anomalies that currently hold.
    ///
    /// # Arguments
    /// * `vessels` - Post-tick vessel states
    /// * `infrastructure` - Cables used for proximity gating
    /// * `clock` - Tick and simulation time stamped onto each record
    /// * `rng` - Source for the RF detection draw (enhanced profile only)
    pub fn classify<R: Rng + ?Sized>(
        &self,
        vessels: &[Vessel],
        infrastructure: &Infrastructure,
        clock: DetectionClock,
        rng: &mut R,
    ) -> Vec<Anomaly> {
        let mut anomalies = Vec::new();
        for vessel in vessels {
            self.classify_vessel(vessel, infrastructure, clock, rng, &mut anomalies);
        }
        anomalies
    }

    fn classify_vessel<R: Rng + ?Sized>(
        &self,
        vessel: &Vessel,
        infrastructure: &Infrastructure,
        clock: DetectionClock,
        rng: &mut R,
        out: &mut Vec<Anomaly>,
    ) {
        let t = &self.thresholds;
        let enhanced = self.profile == ClassifierProfile::Enhanced;
        let proximity = Proximity {
            nearest: find_nearest_cable(vessel.position, &infrastructure.cables),
        };
        let near = proximity.within(t.near);
        let over = proximity.within(t.directly_over).is_some();

        // 1. AIS signal loss
        if vessel.ais_status == AisStatus::Inactive {
            let (severity, description) = self.ais_loss_finding(vessel, &proximity);
            out.push(self.record(AnomalyType::AisLoss, vessel, clock, severity, description, near, None));
        }

        // 2. Suspicious anchoring directly over a cable
        if vessel.speed < t.anchoring_speed && vessel.time_near_cable > 0.0 {
            if let Some(cable) = proximity.within(t.directly_over) {
                let severity = if vessel.time_near_cable > t.anchoring_high_secs {
                    Severity::High
                } else {
                    Severity::Medium
                };
                let description = format!(
                    "Vessel {} (IMO: {}) anchored {:.1} seconds above {} cable with no declared activity",
                    vessel.name, vessel.imo, vessel.time_near_cable, cable.cable.name
                );
                out.push(self.record(
                    AnomalyType::SuspiciousAnchoring,
                    vessel,
                    clock,
                    severity,
                    description,
                    Some(cable),
                    Some(vessel.time_near_cable),
                ));
            }
        }

        // 3a. Loitering at low speed in a cable zone
        if (t.anchoring_speed..t.loiter_speed).contains(&vessel.speed) && vessel.time_near_cable > 0.0 {
            if let Some(cable) = near {
                let description = format!(
                    "Vessel {} (IMO: {}) loitered near {} cable for {:.1} seconds at {:.1} knots",
                    vessel.name, vessel.imo, cable.cable.name, vessel.time_near_cable, vessel.speed
                );
                out.push(self.record(
                    AnomalyType::RouteDeviation,
                    vessel,
                    clock,
                    proximity_severity(over),
                    description,
                    Some(cable),
                    Some(vessel.time_near_cable),
                ));
            }
        }

        // 3b. Zigzag track
        if vessel.behavior == Behavior::RouteDeviation
            && vessel.position_history.len() >= t.zigzag_window
            && detect_zigzag(&vessel.recent_positions(t.zigzag_window))
        {
            let description = format!(
                "Vessel {} (IMO: {}) is following an unusual zigzag pattern{}",
                vessel.name,
                vessel.imo,
                near_suffix(near)
            );
            out.push(self.record(
                AnomalyType::RouteDeviation,
                vessel,
                clock,
                proximity_severity(near.is_some()),
                description,
                near,
                None,
            ));
        }

        // 4. Erratic speed
        if vessel.behavior == Behavior::SpeedAnomaly && vessel.speed_history.len() >= t.speed_window {
            let recent = vessel.recent_speeds(t.speed_window);
            let max = recent.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let min = recent.iter().copied().fold(f64::INFINITY, f64::min);

            if max - min > t.speed_range {
                let description = format!(
                    "Vessel {} (IMO: {}) has shown unusual speed changes ({:.1} to {:.1} knots){}",
                    vessel.name,
                    vessel.imo,
                    min,
                    max,
                    near_suffix(near)
                );
                out.push(self.record(
                    AnomalyType::SpeedAnomaly,
                    vessel,
                    clock,
                    proximity_severity(near.is_some()),
                    description,
                    near,
                    None,
                ));
            }
        }

        if !enhanced {
            return;
        }

        // 5. Research vessel without a declared permit
        if vessel.vessel_type == VesselType::Research {
            if let Some(cable) = near {
                let description = format!(
                    "Research vessel {} (IMO: {}) has no research permit and is operating in the restricted zone near {} cable",
                    vessel.name, vessel.imo, cable.cable.name
                );
                out.push(self.record(
                    AnomalyType::TypeMismatch,
                    vessel,
                    clock,
                    proximity_severity(over),
                    description,
                    Some(cable),
                    None,
                ));
            }
        }

        // 6. RF emissions (simulated sensor hit)
        if vessel.behavior != Behavior::Normal {
            if let Some(cable) = near {
                if rng.gen_bool(t.rf_probability) {
                    let description = format!(
                        "High-frequency RF signals detected from {} near {} cable",
                        vessel.name, cable.cable.name
                    );
                    out.push(self.record(
                        AnomalyType::RfEmissions,
                        vessel,
                        clock,
                        proximity_severity(over),
                        description,
                        Some(cable),
                        None,
                    ));
                }
            }
        }
    }

    fn ais_loss_finding(&self, vessel: &Vessel, proximity: &Proximity<'_>) -> (Severity, String) {
        let t = &self.thresholds;
        let base = format!("Vessel {} (IMO: {}) has lost AIS signal", vessel.name, vessel.imo);

        match self.profile {
            ClassifierProfile::Standard => match proximity.within(t.very_close) {
                Some(n) => (Severity::High, format!("{} near {} cable", base, n.cable.name)),
                None => (Severity::Medium, base),
            },
            ClassifierProfile::Enhanced => {
                if let Some(n) = proximity.within(t.directly_over) {
                    (Severity::High, format!("{} directly above {} cable", base, n.cable.name))
                } else if let Some(n) = proximity.within(t.very_close) {
                    (Severity::High, format!("{} very close to {} cable", base, n.cable.name))
                } else if let Some(n) = proximity.within(t.near) {
                    (Severity::Medium, format!("{} near {} cable", base, n.cable.name))
                } else {
                    (Severity::Low, base)
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn record(
        &self,
        anomaly_type: AnomalyType,
        vessel: &Vessel,
        clock: DetectionClock,
        severity: Severity,
        description: String,
        infrastructure: Option<&NearestCable<'_>>,
        duration_secs: Option<f64>,
    ) -> Anomaly {
        Anomaly {
            id: Anomaly::make_id(anomaly_type, &vessel.id, clock.tick),
            anomaly_type,
            vessel_id: vessel.id.clone(),
            vessel_name: vessel.name.clone(),
            description,
            severity,
            timestamp_secs: clock.time_secs,
            position: vessel.position,
            nearest_infrastructure: infrastructure.map(|n| n.cable.name.clone()),
            distance_to_infrastructure: infrastructure.map(|n| n.distance),
            duration_secs,
        }
    }
}

fn proximity_severity(close: bool) -> Severity {
    if close {
        Severity::High
    } else {
        Severity::Medium
    }
}

fn near_suffix(near: Option<&NearestCable<'_>>) -> String {
    near.map(|n| format!(" near {} cable", n.cable.name))
        .unwrap_or_default()
}
