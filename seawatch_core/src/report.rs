//! Risk report over the anomalies accumulated in a run.
//!
//! Scores are weighted severity counts (HIGH 10, MEDIUM 5, LOW 2). Vessel and
//! cable rankings are sorted by score, highest first.

use crate::anomaly::{Anomaly, AnomalyType, Severity};
use crate::infrastructure::Infrastructure;
use crate::vessel::{Vessel, VesselId, VesselType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Coarse risk grade derived from a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 10 => RiskLevel::High,
            s if s >= 5 => RiskLevel::Medium,
            0 => RiskLevel::None,
            _ => RiskLevel::Low,
        }
    }
}

/// Number of anomalies per severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityCounts {
    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }

    pub fn score(&self) -> u32 {
        let weighted = self.high * Severity::High.risk_weight() as usize
            + self.medium * Severity::Medium.risk_weight() as usize
            + self.low * Severity::Low.risk_weight() as usize;
        u32::try_from(weighted).unwrap_or(u32::MAX)
    }

    fn from_anomalies<'a>(anomalies: impl IntoIterator<Item = &'a Anomaly>) -> Self {
        let mut counts = Self::default();
        for a in anomalies {
            counts.add(a.severity);
        }
        counts
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselRisk {
    pub vessel_id: VesselId,
    pub name: String,
    pub imo: String,
    pub vessel_type: VesselType,
    pub severity: SeverityCounts,
    pub score: u32,
    pub level: RiskLevel,
}

impl VesselRisk {
    /// Case-insensitive substring match on name or IMO.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query) || self.imo.to_lowercase().contains(&query)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CableRisk {
    pub cable_id: String,
    pub name: String,
    /// Ids of anomalies whose vessel currently lies near one of the cable's waypoints
    pub nearby_anomalies: Vec<String>,
    pub severity: SeverityCounts,
    pub score: u32,
    pub level: RiskLevel,
}

/// Summary of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub total_vessels: usize,
    pub total_anomalies: usize,
    /// Anomalies per vessel, as a percentage
    pub anomaly_rate: f64,
    pub severity: SeverityCounts,
    pub by_type: BTreeMap<AnomalyType, usize>,
    pub vessels: Vec<VesselRisk>,
    pub cables: Vec<CableRisk>,
}

impl SimulationReport {
    /// Builds the report.
    ///
    /// # Arguments
    /// * `vessels` - Current vessel states (positions drive cable attribution)
    /// * `infrastructure` - Cables to score
    /// * `anomalies` - Every anomaly detected so far
    /// * `near_radius` - Waypoint radius for attributing an anomaly to a cable
    pub fn build(
        vessels: &[Vessel],
        infrastructure: &Infrastructure,
        anomalies: &[Anomaly],
        near_radius: f64,
    ) -> Self {
        let mut by_vessel: HashMap<&VesselId, Vec<&Anomaly>> = HashMap::new();
        for a in anomalies {
            by_vessel.entry(&a.vessel_id).or_default().push(a);
        }

        let mut vessel_risks: Vec<VesselRisk> = vessels
            .iter()
            .map(|v| {
                let severity = SeverityCounts::from_anomalies(
                    by_vessel.get(&v.id).into_iter().flatten().copied(),
                );
                let score = severity.score();
                VesselRisk {
                    vessel_id: v.id.clone(),
                    name: v.name.clone(),
                    imo: v.imo.clone(),
                    vessel_type: v.vessel_type,
                    severity,
                    score,
                    level: RiskLevel::from_score(score),
                }
            })
            .collect();
        // Stable sort keeps generation order among equal scores
        vessel_risks.sort_by(|a, b| b.score.cmp(&a.score));

        let positions: HashMap<&VesselId, _> = vessels.iter().map(|v| (&v.id, v.position)).collect();
        let mut cable_risks: Vec<CableRisk> = infrastructure
            .cables
            .iter()
            .map(|cable| {
                let nearby: Vec<&Anomaly> = anomalies
                    .iter()
                    .filter(|a| {
                        positions
                            .get(&a.vessel_id)
                            .is_some_and(|p| cable.has_waypoint_within(*p, near_radius))
                    })
                    .collect();
                let severity = SeverityCounts::from_anomalies(nearby.iter().copied());
                let score = severity.score();
                CableRisk {
                    cable_id: cable.id.clone(),
                    name: cable.name.clone(),
                    nearby_anomalies: nearby.iter().map(|a| a.id.clone()).collect(),
                    severity,
                    score,
                    level: RiskLevel::from_score(score),
                }
            })
            .collect();
        cable_risks.sort_by(|a, b| b.score.cmp(&a.score));

        let mut by_type = BTreeMap::new();
        for a in anomalies {
            *by_type.entry(a.anomaly_type).or_insert(0) += 1;
        }

        let anomaly_rate = if vessels.is_empty() {
            0.0
        } else {
            anomalies.len() as f64 / vessels.len() as f64 * 100.0
        };

        Self {
            total_vessels: vessels.len(),
            total_anomalies: anomalies.len(),
            anomaly_rate,
            severity: SeverityCounts::from_anomalies(anomalies),
            by_type,
            vessels: vessel_risks,
            cables: cable_risks,
        }
    }

    /// Vessels matching an optional risk level and a name/IMO query.
    ///
    /// An empty query matches everything.
    pub fn filter_vessels(&self, level: Option<RiskLevel>, query: &str) -> Vec<&VesselRisk> {
        self.vessels
            .iter()
            .filter(|v| level.map_or(true, |l| v.level == l))
            .filter(|v| query.is_empty() || v.matches(query))
            .collect()
    }

    pub fn high_risk_vessels(&self) -> Vec<&VesselRisk> {
        self.filter_vessels(Some(RiskLevel::High), "")
    }

    pub fn count_of(&self, anomaly_type: AnomalyType) -> usize {
        self.by_type.get(&anomaly_type).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::LatLng;
    use crate::vessel::Behavior;

    fn vessel(index: usize, name: &str, imo: &str, position: LatLng) -> Vessel {
        let mut v = Vessel::new(
            VesselId::from_index(index),
            name,
            VesselType::Cargo,
            Behavior::Normal,
            position,
            0.0,
            5.0,
        );
        v.imo = imo.to_string();
        v
    }

    fn anomaly(vessel: &Vessel, anomaly_type: AnomalyType, severity: Severity, tick: u64) -> Anomaly {
        Anomaly {
            id: Anomaly::make_id(anomaly_type, &vessel.id, tick),
            anomaly_type,
            vessel_id: vessel.id.clone(),
            vessel_name: vessel.name.clone(),
            description: String::new(),
            severity,
            timestamp_secs: tick as f64 * 2.0,
            position: vessel.position,
            nearest_infrastructure: None,
            distance_to_infrastructure: None,
            duration_secs: None,
        }
    }

    #[test]
    fn test_risk_level_thresholds() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::None);
        assert_eq!(RiskLevel::from_score(2), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(4), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(5), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(9), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(10), RiskLevel::High);
    }

    #[test]
    fn test_vessel_scores_sorted_descending() {
        let infra = Infrastructure::reference();
        let quiet = vessel(0, "Wave Rider", "9000001", LatLng::new(26.9, -85.1));
        let busy = vessel(1, "Deep Blue", "9000002", LatLng::new(26.9, -85.2));
        let mild = vessel(2, "Silver Mist", "9000003", LatLng::new(26.9, -85.3));

        let anomalies = vec![
            anomaly(&busy, AnomalyType::AisLoss, Severity::High, 1),
            anomaly(&busy, AnomalyType::SpeedAnomaly, Severity::Medium, 2),
            anomaly(&mild, AnomalyType::AisLoss, Severity::Low, 3),
        ];

        let report = SimulationReport::build(&[quiet, busy, mild], &infra, &anomalies, 0.05);

        assert_eq!(report.total_vessels, 3);
        assert_eq!(report.total_anomalies, 3);
        assert_eq!(report.anomaly_rate, 100.0);
        assert_eq!(report.severity, SeverityCounts { high: 1, medium: 1, low: 1 });
        assert_eq!(report.count_of(AnomalyType::AisLoss), 2);
        assert_eq!(report.count_of(AnomalyType::TypeMismatch), 0);

        let order: Vec<_> = report.vessels.iter().map(|v| (v.name.as_str(), v.score, v.level)).collect();
        assert_eq!(
            order,
            vec![
                ("Deep Blue", 15, RiskLevel::High),
                ("Silver Mist", 2, RiskLevel::Low),
                ("Wave Rider", 0, RiskLevel::None),
            ]
        );
        assert_eq!(report.high_risk_vessels().len(), 1);
    }

    #[test]
    fn test_cable_attribution_uses_waypoints() {
        let infra = Infrastructure::reference();
        let cable = &infra.cables[0];
        let waypoint = cable.path[1];

        let close = vessel(0, "Sea Dragon", "9111111", LatLng::new(waypoint.lat + 0.01, waypoint.lng));
        let far = vessel(1, "Northern Star", "9222222", LatLng::new(waypoint.lat + 1.0, waypoint.lng));

        let anomalies = vec![
            anomaly(&close, AnomalyType::SuspiciousAnchoring, Severity::High, 1),
            anomaly(&far, AnomalyType::AisLoss, Severity::Medium, 1),
        ];
        let report = SimulationReport::build(&[close, far], &infra, &anomalies, 0.05);

        let risk = report.cables.iter().find(|c| c.cable_id == cable.id).unwrap();
        assert_eq!(risk.nearby_anomalies, vec![anomalies[0].id.clone()]);
        assert_eq!(risk.score, 10);
        assert_eq!(risk.level, RiskLevel::High);
        // Highest-risk cable first
        assert_eq!(report.cables[0].cable_id, cable.id);
    }

    #[test]
    fn test_filter_by_level_and_query() {
        let infra = Infrastructure::default();
        let a = vessel(0, "Atlantic Voyager", "9123456", LatLng::default());
        let b = vessel(1, "Pacific Explorer", "9654321", LatLng::default());
        let anomalies = vec![anomaly(&a, AnomalyType::AisLoss, Severity::High, 1)];
        let report = SimulationReport::build(&[a, b], &infra, &anomalies, 0.05);

        assert_eq!(report.filter_vessels(None, "").len(), 2);
        assert_eq!(report.filter_vessels(Some(RiskLevel::None), "").len(), 1);
        assert_eq!(report.filter_vessels(None, "atlantic")[0].name, "Atlantic Voyager");
        assert_eq!(report.filter_vessels(None, "654")[0].name, "Pacific Explorer");
        assert!(report.filter_vessels(Some(RiskLevel::High), "pacific").is_empty());
    }

    #[test]
    fn test_empty_world() {
        let report = SimulationReport::build(&[], &Infrastructure::default(), &[], 0.05);
        assert_eq!(report.anomaly_rate, 0.0);
        assert!(report.vessels.is_empty());
        assert!(report.cables.is_empty());
    }
}
