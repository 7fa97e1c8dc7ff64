//! The "KINEMATICS" Engine - one time-step of every vessel
//!
//! Each step:
//! 1. Advances the position from the current heading/speed (planar, not geodesic)
//! 2. Applies the perturbation rule of the vessel's hidden behavior
//! 3. Clamps speed into [0, 10] knots and wraps heading into [0, 360)
//! 4. Appends the new speed/position to the bounded history buffers
//!
//! The engine is pure apart from the injected random source: the same input
//! vessels, infrastructure, `dt` and RNG state always give the same output.

use crate::error::ConfigError;
use crate::geometry::{find_nearest_cable, LatLng};
use crate::infrastructure::Infrastructure;
use crate::vessel::{clamp_speed, normalize_heading, AisStatus, Behavior, Vessel};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Tuning of the per-behavior perturbation rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KinematicsConfig {
    /// Degrees moved per knot per tick (`lat += cos(h) * k * speed`)
    pub movement_scale: f64,

    /// Full width of the NORMAL heading jitter (degrees)
    pub heading_jitter_deg: f64,

    /// Full width of the NORMAL speed jitter (knots)
    pub speed_jitter_knots: f64,

    /// ROUTE_DEVIATION: chance of a course change per tick
    pub course_change_probability: f64,

    /// ROUTE_DEVIATION: full width of a course change (degrees)
    pub course_change_deg: f64,

    /// SPEED_ANOMALY: chance of a speed jump per tick
    pub speed_change_probability: f64,

    /// SPEED_ANOMALY: multiplier for a surge
    pub speed_surge_factor: f64,

    /// SPEED_ANOMALY: multiplier for a drop
    pub speed_drop_factor: f64,

    /// AIS_LOSS: chance ACTIVE -> INACTIVE per tick
    pub ais_drop_probability: f64,

    /// AIS_LOSS: chance INACTIVE -> ACTIVE per tick
    pub ais_restore_probability: f64,

    /// SUSPICIOUS_ANCHORING: cable distance that counts as "near"
    pub anchoring_radius: f64,

    /// SUSPICIOUS_ANCHORING: knots shed per tick while near a cable
    pub anchoring_deceleration: f64,

    /// SUSPICIOUS_ANCHORING: seconds near a cable after which the vessel holds position
    pub anchored_hold_secs: f64,
}

impl Default for KinematicsConfig {
    fn default() -> Self {
        Self {
            movement_scale: 0.005,
            heading_jitter_deg: 10.0,
            speed_jitter_knots: 0.5,
            course_change_probability: 0.3,
            course_change_deg: 60.0,
            speed_change_probability: 0.3,
            speed_surge_factor: 3.0,
            speed_drop_factor: 0.2,
            ais_drop_probability: 0.2,
            ais_restore_probability: 0.1,
            anchoring_radius: 0.01,
            anchoring_deceleration: 0.5,
            anchored_hold_secs: 5.0,
        }
    }
}

impl KinematicsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_probability("course_change_probability", self.course_change_probability)?;
        ConfigError::check_probability("speed_change_probability", self.speed_change_probability)?;
        ConfigError::check_probability("ais_drop_probability", self.ais_drop_probability)?;
        ConfigError::check_probability("ais_restore_probability", self.ais_restore_probability)?;

        if !(self.movement_scale.is_finite() && self.movement_scale >= 0.0) {
            return Err(ConfigError::threshold("movement_scale must be non-negative"));
        }
        if !(self.anchoring_radius > 0.0) {
            return Err(ConfigError::threshold("anchoring_radius must be positive"));
        }
        if self.anchoring_deceleration < 0.0 || self.anchored_hold_secs < 0.0 {
            return Err(ConfigError::threshold("anchoring parameters must be non-negative"));
        }
        Ok(())
    }
}

/// Advances vessels one step at a time.
#[derive(Debug, Clone, Default)]
pub struct TickEngine {
    config: KinematicsConfig,
}

impl TickEngine {
    pub fn new(config: KinematicsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KinematicsConfig {
        &self.config
    }

    /// Returns the vessel list after one step of `dt` seconds.
    ///
    /// Vessels are processed in order, so the RNG draws (and thus the result)
    /// depend only on the input order and the RNG state.
    pub fn advance<R: Rng + ?Sized>(
        &self,
        vessels: &[Vessel],
        infrastructure: &Infrastructure,
        dt: f64,
        rng: &mut R,
    ) -> Vec<Vessel> {
        vessels
            .iter()
            .map(|v| {
                let mut next = v.clone();
                self.step_vessel(&mut next, infrastructure, dt, rng);
                next
            })
            .collect()
    }

    /// Advances a single vessel in place.
    pub fn step_vessel<R: Rng + ?Sized>(
        &self,
        vessel: &mut Vessel,
        infrastructure: &Infrastructure,
        dt: f64,
        rng: &mut R,
    ) {
        let cfg = &self.config;

        // An anchored vessel holds position but keeps accruing time over the cable
        if vessel.behavior == Behavior::SuspiciousAnchoring
            && vessel.time_near_cable > cfg.anchored_hold_secs
        {
            vessel.speed = 0.0;
            if self.is_near_cable(vessel.position, infrastructure) {
                vessel.time_near_cable += dt;
            }
            vessel.record_sample();
            return;
        }

        let heading_rad = vessel.heading.to_radians();
        let travel = cfg.movement_scale * vessel.speed;
        let moved = LatLng::new(
            vessel.position.lat + heading_rad.cos() * travel,
            vessel.position.lng + heading_rad.sin() * travel,
        );

        let mut heading = vessel.heading;
        let mut speed = vessel.speed;

        match vessel.behavior {
            Behavior::Normal => {
                (heading, speed) = self.jitter(heading, speed, rng);
            }
            Behavior::RouteDeviation => {
                if rng.gen_bool(cfg.course_change_probability) {
                    heading += (rng.gen::<f64>() - 0.5) * cfg.course_change_deg;
                }
            }
            Behavior::SpeedAnomaly => {
                if rng.gen_bool(cfg.speed_change_probability) {
                    let factor = if rng.gen_bool(0.5) {
                        cfg.speed_surge_factor
                    } else {
                        cfg.speed_drop_factor
                    };
                    speed *= factor;
                }
            }
            Behavior::AisLoss => {
                vessel.ais_status = match vessel.ais_status {
                    AisStatus::Active if rng.gen_bool(cfg.ais_drop_probability) => AisStatus::Inactive,
                    AisStatus::Inactive if rng.gen_bool(cfg.ais_restore_probability) => AisStatus::Active,
                    status => status,
                };
            }
            Behavior::SuspiciousAnchoring => {
                // Proximity is judged where the vessel stood at the start of the step
                if self.is_near_cable(vessel.position, infrastructure) {
                    speed -= cfg.anchoring_deceleration;
                    vessel.time_near_cable += dt;
                } else {
                    (heading, speed) = self.jitter(heading, speed, rng);
                }
            }
        }

        vessel.position = moved;
        vessel.heading = normalize_heading(heading);
        vessel.speed = clamp_speed(speed);
        vessel.record_sample();
    }

    fn jitter<R: Rng + ?Sized>(&self, heading: f64, speed: f64, rng: &mut R) -> (f64, f64) {
        let dh = (rng.gen::<f64>() - 0.5) * self.config.heading_jitter_deg;
        let ds = (rng.gen::<f64>() - 0.5) * self.config.speed_jitter_knots;
        (heading + dh, speed + ds)
    }

    fn is_near_cable(&self, position: LatLng, infrastructure: &Infrastructure) -> bool {
        find_nearest_cable(position, &infrastructure.cables)
            .is_some_and(|n| n.within(self.config.anchoring_radius))
    }
}
