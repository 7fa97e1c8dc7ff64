//! SeaWatch Core - Maritime Surveillance Simulation Engine
//!
//! This library owns the pure, I/O-free logic of a cable-protection scenario:
//! 1. **Geometry**: planar point-to-segment distance, nearest cable lookup, zigzag detection
//! 2. **World**: vessel population and the fixed undersea infrastructure
//! 3. **Kinematics**: one deterministic-but-random step of every vessel
//! 4. **Classification**: anomaly records derived from the post-step world
//! 5. **Report**: risk scoring over the accumulated anomalies
//!
//! Randomness is always injected as `&mut impl Rng`; nothing in this crate
//! reaches for a global random source or the wall clock.

pub mod anomaly;
pub mod classifier;
pub mod error;
pub mod generator;
pub mod geometry;
pub mod infrastructure;
pub mod kinematics;
pub mod report;
pub mod vessel;

// Re-export key types for convenience
pub use anomaly::{Anomaly, AnomalyKey, AnomalyType, Severity};
pub use classifier::{AnomalyClassifier, ClassifierProfile, ClassifierThresholds, DetectionClock};
pub use error::ConfigError;
pub use generator::{BehaviorWeights, WorldGenerator};
pub use geometry::{detect_zigzag, distance_to_segment, find_nearest_cable, LatLng, NearestCable};
pub use infrastructure::{Cable, CableStatus, Infrastructure, Platform};
pub use kinematics::{KinematicsConfig, TickEngine};
pub use report::{CableRisk, RiskLevel, SeverityCounts, SimulationReport, VesselRisk};
pub use vessel::{AisStatus, Behavior, Vessel, VesselId, VesselSnapshot, VesselType};
