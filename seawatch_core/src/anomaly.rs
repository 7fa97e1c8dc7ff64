//! Anomaly records emitted by the classifier.

use crate::geometry::LatLng;
use crate::vessel::VesselId;
use serde::{Deserialize, Serialize};

/// Category of a detected anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyType {
    AisLoss,
    RouteDeviation,
    SuspiciousAnchoring,
    SpeedAnomaly,
    /// Enhanced profile only
    RfEmissions,
    /// Enhanced profile only
    TypeMismatch,
}

impl AnomalyType {
    pub const ALL: [AnomalyType; 6] = [
        AnomalyType::AisLoss,
        AnomalyType::RouteDeviation,
        AnomalyType::SuspiciousAnchoring,
        AnomalyType::SpeedAnomaly,
        AnomalyType::RfEmissions,
        AnomalyType::TypeMismatch,
    ];

    /// Short slug used in anomaly ids.
    pub fn slug(&self) -> &'static str {
        match self {
            AnomalyType::AisLoss => "ais",
            AnomalyType::RouteDeviation => "route",
            AnomalyType::SuspiciousAnchoring => "anchoring",
            AnomalyType::SpeedAnomaly => "speed",
            AnomalyType::RfEmissions => "rf",
            AnomalyType::TypeMismatch => "type",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            AnomalyType::AisLoss => "AIS Loss",
            AnomalyType::RouteDeviation => "Route Deviation",
            AnomalyType::SuspiciousAnchoring => "Suspicious Anchoring",
            AnomalyType::SpeedAnomaly => "Speed Anomaly",
            AnomalyType::RfEmissions => "RF Emissions",
            AnomalyType::TypeMismatch => "Type Mismatch",
        }
    }
}

impl std::fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Severity grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Weight of one anomaly of this severity in a risk score.
    pub fn risk_weight(&self) -> u32 {
        match self {
            Severity::Low => 2,
            Severity::Medium => 5,
            Severity::High => 10,
        }
    }
}

/// Identity of "the same ongoing condition" for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnomalyKey {
    pub vessel_id: VesselId,
    pub anomaly_type: AnomalyType,
}

impl std::fmt::Display for AnomalyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.vessel_id, self.anomaly_type.slug())
    }
}

/// A single classifier finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    /// `anomaly-<slug>-<vessel>-<tick>`, unique per detection
    pub id: String,
    pub anomaly_type: AnomalyType,
    pub vessel_id: VesselId,
    pub vessel_name: String,
    pub description: String,
    pub severity: Severity,
    /// Simulation clock at detection (seconds)
    pub timestamp_secs: f64,
    pub position: LatLng,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nearest_infrastructure: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_to_infrastructure: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

impl Anomaly {
    /// Builds the per-detection id.
    pub fn make_id(anomaly_type: AnomalyType, vessel_id: &VesselId, tick: u64) -> String {
        format!("anomaly-{}-{}-{}", anomaly_type.slug(), vessel_id, tick)
    }

    /// The dedup key of this anomaly.
    pub fn key(&self) -> AnomalyKey {
        AnomalyKey {
            vessel_id: self.vessel_id.clone(),
            anomaly_type: self.anomaly_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anomaly_id_format() {
        let id = Anomaly::make_id(AnomalyType::AisLoss, &VesselId::from_index(3), 7);
        assert_eq!(id, "anomaly-ais-vessel-3-7");
    }

    #[test]
    fn test_severity_ordering_and_weights() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert_eq!(Severity::High.risk_weight(), 10);
        assert_eq!(Severity::Low.risk_weight(), 2);
    }

    #[test]
    fn test_key_display() {
        let key = AnomalyKey {
            vessel_id: "vessel-1".into(),
            anomaly_type: AnomalyType::SuspiciousAnchoring,
        };
        assert_eq!(key.to_string(), "vessel-1/anchoring");
    }
}
