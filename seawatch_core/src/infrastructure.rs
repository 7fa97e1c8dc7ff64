//! Undersea cables and offshore platforms.
//!
//! Infrastructure is immutable for the lifetime of a scenario and is the same
//! hand-authored set on every "new scenario", so only the vessels vary.

use crate::geometry::LatLng;
use serde::{Deserialize, Serialize};

/// Operational status of a cable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CableStatus {
    Normal,
    AtRisk,
    Damaged,
}

/// An undersea cable, modeled as a polyline of waypoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cable {
    pub id: String,
    pub name: String,
    pub path: Vec<LatLng>,
    pub status: CableStatus,
}

impl Cable {
    /// True if any waypoint of the cable lies within `radius` of `position`.
    pub fn has_waypoint_within(&self, position: LatLng, radius: f64) -> bool {
        self.path.iter().any(|p| p.distance_to(position) < radius)
    }
}

/// An offshore platform at a single position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub id: String,
    pub name: String,
    pub position: LatLng,
    /// Free-form type label (e.g. "OIL", "RESEARCH")
    pub kind: String,
}

/// The fixed infrastructure of a scenario.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Infrastructure {
    pub cables: Vec<Cable>,
    pub platforms: Vec<Platform>,
}

impl Infrastructure {
    /// The reference Gulf of Mexico layout: three cables, three platforms.
    pub fn reference() -> Self {
        let cable = |id: &str, name: &str, path: &[(f64, f64)]| Cable {
            id: id.to_string(),
            name: name.to_string(),
            path: path.iter().map(|&(lat, lng)| LatLng::new(lat, lng)).collect(),
            status: CableStatus::Normal,
        };
        let platform = |id: &str, name: &str, lat: f64, lng: f64, kind: &str| Platform {
            id: id.to_string(),
            name: name.to_string(),
            position: LatLng::new(lat, lng),
            kind: kind.to_string(),
        };

        Self {
            cables: vec![
                cable(
                    "cable-1",
                    "Gulf Connector",
                    &[(25.7, -89.5), (26.0, -88.8), (26.2, -87.9), (26.3, -87.0), (26.4, -86.0)],
                ),
                cable(
                    "cable-2",
                    "Southern Cross",
                    &[(25.2, -89.0), (25.5, -88.5), (25.8, -88.0), (26.1, -87.5), (26.4, -87.0)],
                ),
                cable(
                    "cable-3",
                    "Atlantic Link",
                    &[(26.0, -89.2), (26.2, -88.7), (26.4, -88.2), (26.6, -87.7), (26.8, -87.2)],
                ),
            ],
            platforms: vec![
                platform("platform-1", "Gulf Platform Alpha", 26.1, -88.5, "OIL"),
                platform("platform-2", "Research Station Beta", 25.8, -87.8, "RESEARCH"),
                platform("platform-3", "Monitoring Station Gamma", 26.5, -88.0, "MONITORING"),
            ],
        }
    }

    /// Looks up a cable by id.
    pub fn cable(&self, id: &str) -> Option<&Cable> {
        self.cables.iter().find(|c| c.id == id)
    }

    /// Total number of cable segments (the per-vessel cost of a proximity query).
    pub fn segment_count(&self) -> usize {
        self.cables.iter().map(|c| c.path.len().saturating_sub(1)).sum()
    }
}
