//! World generator - the initial vessel population.
//!
//! Vessels get randomized registry data, a uniform position inside the
//! scenario bounding box, and a hidden behavior drawn from weighted sampling.

use crate::error::ConfigError;
use crate::geometry::LatLng;
use crate::infrastructure::Infrastructure;
use crate::vessel::{Behavior, Vessel, VesselId, VesselType, INITIAL_SPEED_RANGE};
use rand::distributions::WeightedIndex;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

/// Latitude range of the scenario bounding box.
pub const LAT_RANGE: (f64, f64) = (25.5, 27.0);

/// Longitude range of the scenario bounding box.
pub const LNG_RANGE: (f64, f64) = (-88.0, -85.0);

const VESSEL_NAMES: &[&str] = &[
    "Atlantic Voyager",
    "Pacific Explorer",
    "Northern Star",
    "Southern Cross",
    "Ocean Pioneer",
    "Sea Dragon",
    "Coastal Runner",
    "Global Trader",
    "Horizon Seeker",
    "Maritime Venture",
    "Wave Rider",
    "Deep Blue",
    "Eastern Wind",
    "Western Sun",
    "Crystal Waters",
    "Golden Horizon",
    "Silver Mist",
    "Royal Odyssey",
    "Emerald Seas",
    "Diamond Crest",
];

const FLAGS: &[&str] = &[
    "US", "UK", "JP", "CN", "DE", "FR", "IT", "ES", "NL", "GR", "PA", "LR", "MH", "SG", "HK", "MT",
];

const DESTINATIONS: &[&str] = &[
    "New York",
    "Rotterdam",
    "Shanghai",
    "Singapore",
    "Los Angeles",
    "Hamburg",
    "Dubai",
    "Hong Kong",
    "Tokyo",
    "Busan",
    "Antwerp",
    "Valencia",
    "Felixstowe",
    "Santos",
    "Jebel Ali",
    "Kaohsiung",
];

/// Relative weights of each hidden behavior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorWeights {
    pub normal: f64,
    pub route_deviation: f64,
    pub speed_anomaly: f64,
    pub ais_loss: f64,
    pub suspicious_anchoring: f64,
}

impl Default for BehaviorWeights {
    fn default() -> Self {
        Self {
            normal: 0.40,
            route_deviation: 0.15,
            speed_anomaly: 0.15,
            ais_loss: 0.15,
            suspicious_anchoring: 0.15,
        }
    }
}

impl BehaviorWeights {
    /// Weights in `Behavior::ALL` order.
    pub fn as_array(&self) -> [f64; 5] {
        [
            self.normal,
            self.route_deviation,
            self.speed_anomaly,
            self.ais_loss,
            self.suspicious_anchoring,
        ]
    }

    /// Only normal traffic.
    pub fn all_normal() -> Self {
        Self {
            normal: 1.0,
            route_deviation: 0.0,
            speed_anomaly: 0.0,
            ais_loss: 0.0,
            suspicious_anchoring: 0.0,
        }
    }

    /// Every anomalous behavior equally likely, no normal traffic.
    pub fn all_anomalous() -> Self {
        Self {
            normal: 0.0,
            route_deviation: 0.25,
            speed_anomaly: 0.25,
            ais_loss: 0.25,
            suspicious_anchoring: 0.25,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = self.as_array();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ConfigError::InvalidWeights(format!(
                "weights must be finite and non-negative: {:?}",
                weights
            )));
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(ConfigError::InvalidWeights("all weights are zero".to_string()));
        }
        Ok(())
    }
}

/// Produces vessel populations and the fixed infrastructure.
#[derive(Debug, Clone)]
pub struct WorldGenerator {
    weights: BehaviorWeights,
    behavior_index: WeightedIndex<f64>,
}

impl WorldGenerator {
    /// Creates a generator; fails if the weights cannot be sampled.
    pub fn new(weights: BehaviorWeights) -> Result<Self, ConfigError> {
        weights.validate()?;
        let behavior_index = WeightedIndex::new(weights.as_array())
            .map_err(|e| ConfigError::InvalidWeights(e.to_string()))?;

        Ok(Self {
            weights,
            behavior_index,
        })
    }

    pub fn weights(&self) -> &BehaviorWeights {
        &self.weights
    }

    /// Generates `count` vessels with ids `vessel-0 .. vessel-{count-1}`.
    pub fn generate_vessels<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<Vessel> {
        (0..count).map(|i| self.generate_vessel(i, rng)).collect()
    }

    /// The fixed infrastructure; identical on every call.
    pub fn generate_infrastructure(&self) -> Infrastructure {
        Infrastructure::reference()
    }

    fn generate_vessel<R: Rng + ?Sized>(&self, index: usize, rng: &mut R) -> Vessel {
        let lat = Uniform::new(LAT_RANGE.0, LAT_RANGE.1).sample(rng);
        let lng = Uniform::new(LNG_RANGE.0, LNG_RANGE.1).sample(rng);
        let heading = Uniform::new(0.0, 360.0).sample(rng);
        let speed = Uniform::new_inclusive(INITIAL_SPEED_RANGE.0, INITIAL_SPEED_RANGE.1).sample(rng);
        let behavior = Behavior::ALL[self.behavior_index.sample(rng)];

        let name = pick(VESSEL_NAMES, rng);
        let vessel_type = *VesselType::ALL.choose(rng).unwrap_or(&VesselType::Cargo);

        let mut vessel = Vessel::new(
            VesselId::from_index(index),
            name,
            vessel_type,
            behavior,
            LatLng::new(lat, lng),
            heading,
            speed,
        );

        // Synthetic registry numbers, no checksum scheme
        vessel.imo = format!("9{}", rng.gen_range(100_000..1_000_000));
        vessel.mmsi = rng.gen_range(100_000_000u32..1_000_000_000).to_string();
        vessel.flag = pick(FLAGS, rng).to_string();
        vessel.destination = pick(DESTINATIONS, rng).to_string();

        vessel
    }
}

fn pick<'a, R: Rng + ?Sized>(items: &[&'a str], rng: &mut R) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn reference_generator() -> WorldGenerator {
        WorldGenerator::new(BehaviorWeights::default()).unwrap()
    }

    #[test]
    fn test_generates_requested_count_with_unique_ids() {
        let gen = reference_generator();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let vessels = gen.generate_vessels(15, &mut rng);

        assert_eq!(vessels.len(), 15);
        let ids: HashSet<_> = vessels.iter().map(|v| v.id.clone()).collect();
        assert_eq!(ids.len(), 15);
        assert_eq!(vessels[0].id.as_str(), "vessel-0");
    }

    #[test]
    fn test_generated_attributes_in_range() {
        let gen = reference_generator();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for v in gen.generate_vessels(200, &mut rng) {
            assert!((LAT_RANGE.0..LAT_RANGE.1).contains(&v.position.lat));
            assert!((LNG_RANGE.0..LNG_RANGE.1).contains(&v.position.lng));
            assert!((0.0..360.0).contains(&v.heading));
            assert!((INITIAL_SPEED_RANGE.0..=INITIAL_SPEED_RANGE.1).contains(&v.speed));
            assert_eq!(v.initial, v.snapshot());
            assert_eq!(v.imo.len(), 7);
            assert!(v.imo.starts_with('9'));
            assert_eq!(v.mmsi.len(), 9);
            assert!(!v.flag.is_empty());
            assert!(!v.destination.is_empty());
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let gen = reference_generator();
        let a = gen.generate_vessels(10, &mut ChaCha8Rng::seed_from_u64(99));
        let b = gen.generate_vessels(10, &mut ChaCha8Rng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn test_weights_drive_behavior() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let quiet = WorldGenerator::new(BehaviorWeights::all_normal()).unwrap();
        assert!(quiet
            .generate_vessels(50, &mut rng)
            .iter()
            .all(|v| v.behavior == Behavior::Normal));

        let hostile = WorldGenerator::new(BehaviorWeights::all_anomalous()).unwrap();
        assert!(hostile
            .generate_vessels(50, &mut rng)
            .iter()
            .all(|v| v.behavior != Behavior::Normal));
    }

    #[test]
    fn test_default_weights_roughly_match() {
        let gen = reference_generator();
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let vessels = gen.generate_vessels(4000, &mut rng);
        let normal = vessels.iter().filter(|v| v.behavior == Behavior::Normal).count();
        let ratio = normal as f64 / vessels.len() as f64;
        assert!((0.35..0.45).contains(&ratio), "normal ratio {}", ratio);
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let zero = BehaviorWeights {
            normal: 0.0,
            route_deviation: 0.0,
            speed_anomaly: 0.0,
            ais_loss: 0.0,
            suspicious_anchoring: 0.0,
        };
        assert!(matches!(WorldGenerator::new(zero), Err(ConfigError::InvalidWeights(_))));

        let negative = BehaviorWeights {
            normal: -1.0,
            ..BehaviorWeights::default()
        };
        assert!(WorldGenerator::new(negative).is_err());
    }

    #[test]
    fn test_infrastructure_is_fixed() {
        let gen = reference_generator();
        assert_eq!(gen.generate_infrastructure(), Infrastructure::reference());
    }
}
