//! The "GEOMETRY" helpers - planar distance and track-shape tests
//!
//! All distances here are Euclidean in raw (lat, lng) degree space. This is
//! deliberately not geodesic: the proximity thresholds used by the tick engine
//! and the classifier (0.01 / 0.02 / 0.05) are expressed in these same units.

use crate::infrastructure::Cable;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_6, PI};

/// Minimum number of positions the zigzag detector needs.
pub const ZIGZAG_MIN_POINTS: usize = 6;

/// Number of sharp turns that make a track a zigzag.
pub const ZIGZAG_MIN_TURNS: usize = 3;

/// A geographic position in floating degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Planar vector view, lat on x and lng on y.
    pub fn to_vector(self) -> Vector2<f64> {
        Vector2::new(self.lat, self.lng)
    }

    /// Planar distance to another position.
    pub fn distance_to(self, other: LatLng) -> f64 {
        (self.to_vector() - other.to_vector()).norm()
    }

    /// Bearing of the move from `self` to `to`, in radians (atan2 of Δlng over Δlat).
    pub fn bearing_to(self, to: LatLng) -> f64 {
        (to.lng - self.lng).atan2(to.lat - self.lat)
    }
}

impl From<Vector2<f64>> for LatLng {
    fn from(v: Vector2<f64>) -> Self {
        Self::new(v.x, v.y)
    }
}

/// Distance from `point` to the segment `start`-`end`.
///
/// The point is projected onto the infinite line through the segment and the
/// projection parameter is clamped to [0, 1]. A zero-length segment
/// degenerates to the distance to `start`.
pub fn distance_to_segment(point: LatLng, start: LatLng, end: LatLng) -> f64 {
    let p = point.to_vector();
    let a = start.to_vector();
    let ab = end.to_vector() - a;

    let len_sq = ab.norm_squared();
    let t = if len_sq == 0.0 {
        0.0
    } else {
        ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0)
    };

    (p - (a + ab * t)).norm()
}

/// Result of a nearest-cable lookup.
#[derive(Debug, Clone, Copy)]
pub struct NearestCable<'a> {
    /// The cable owning the closest segment
    pub cable: &'a Cable,

    /// Distance to that segment
    pub distance: f64,
}

impl NearestCable<'_> {
    /// True when the cable lies strictly within `radius`.
    pub fn within(&self, radius: f64) -> bool {
        self.distance < radius
    }
}

/// Finds the cable segment closest to `position`.
///
/// Every segment of every cable is inspected. Returns `None` when there are
/// no cables (or none with a waypoint), so proximity-gated rules simply do
/// not fire.
pub fn find_nearest_cable(position: LatLng, cables: &[Cable]) -> Option<NearestCable<'_>> {
    let mut nearest: Option<NearestCable<'_>> = None;

    for cable in cables {
        let Some(distance) = cable_distance(position, cable) else {
            continue;
        };

        if nearest.map_or(true, |n| distance < n.distance) {
            nearest = Some(NearestCable { cable, distance });
        }
    }

    nearest
}

/// Minimum distance from `position` to any segment of `cable`.
fn cable_distance(position: LatLng, cable: &Cable) -> Option<f64> {
    match cable.path.as_slice() {
        [] => None,
        [only] => Some(position.distance_to(*only)),
        path => path
            .windows(2)
            .map(|seg| distance_to_segment(position, seg[0], seg[1]))
            .min_by(f64::total_cmp),
    }
}

/// Detects a zigzag track.
///
/// For each consecutive triple the two leg bearings are compared; an absolute
/// change (normalized into [0, π]) above π/6 counts as a turn. Three or more
/// turns make a zigzag. Fewer than six positions is never a zigzag.
pub fn detect_zigzag(positions: &[LatLng]) -> bool {
    if positions.len() < ZIGZAG_MIN_POINTS {
        return false;
    }

    let turns = positions
        .windows(3)
        .filter(|w| {
            let dir1 = w[0].bearing_to(w[1]);
            let dir2 = w[1].bearing_to(w[2]);

            let mut delta = (dir2 - dir1).abs();
            if delta > PI {
                delta = 2.0 * PI - delta;
            }
            delta > FRAC_PI_6
        })
        .count();

    turns >= ZIGZAG_MIN_TURNS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::CableStatus;
    use approx::assert_relative_eq;

    fn cable(id: &str, path: Vec<LatLng>) -> Cable {
        Cable {
            id: id.to_string(),
            name: format!("{} Link", id),
            path,
            status: CableStatus::Normal,
        }
    }

    #[test]
    fn test_distance_projects_inside_segment() {
        let d = distance_to_segment(
            LatLng::new(1.0, 1.0),
            LatLng::new(0.0, 0.0),
            LatLng::new(2.0, 0.0),
        );
        assert_relative_eq!(d, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_distance_clamps_to_endpoints() {
        let start = LatLng::new(0.0, 0.0);
        let end = LatLng::new(1.0, 0.0);

        // Beyond the end: distance to end, not to the infinite line
        let d = distance_to_segment(LatLng::new(4.0, 4.0), start, end);
        assert_relative_eq!(d, 5.0, epsilon = 1e-12);

        // Behind the start
        let d = distance_to_segment(LatLng::new(-3.0, 4.0), start, end);
        assert_relative_eq!(d, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_distance_zero_length_segment() {
        let p = LatLng::new(0.0, 0.0);
        let d = distance_to_segment(LatLng::new(3.0, 4.0), p, p);
        assert_relative_eq!(d, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_nearest_cable_exact_waypoint() {
        let cables = vec![cable(
            "cable-1",
            vec![LatLng::new(25.85, -80.25), LatLng::new(26.0, -80.0)],
        )];

        let nearest = find_nearest_cable(LatLng::new(25.85, -80.25), &cables).unwrap();
        assert_eq!(nearest.cable.id, "cable-1");
        assert_relative_eq!(nearest.distance, 0.0);
    }

    #[test]
    fn test_nearest_cable_picks_minimum_over_all_cables() {
        let cables = vec![
            cable("far", vec![LatLng::new(10.0, 10.0), LatLng::new(11.0, 10.0)]),
            cable("near", vec![LatLng::new(0.0, 0.0), LatLng::new(0.0, 1.0), LatLng::new(1.0, 1.0)]),
        ];

        let nearest = find_nearest_cable(LatLng::new(0.5, 0.9), &cables).unwrap();
        assert_eq!(nearest.cable.id, "near");
        assert_relative_eq!(nearest.distance, 0.1, epsilon = 1e-9);
        assert!(nearest.within(0.2));
        assert!(!nearest.within(0.05));
    }

    #[test]
    fn test_nearest_cable_no_cables() {
        assert!(find_nearest_cable(LatLng::new(0.0, 0.0), &[]).is_none());
        assert!(find_nearest_cable(LatLng::new(0.0, 0.0), &[cable("empty", vec![])]).is_none());
    }

    #[test]
    fn test_single_waypoint_cable_is_a_point() {
        let cables = vec![cable("stub", vec![LatLng::new(1.0, 1.0)])];
        let nearest = find_nearest_cable(LatLng::new(1.0, 2.0), &cables).unwrap();
        assert_relative_eq!(nearest.distance, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zigzag_straight_line() {
        let track: Vec<_> = (0..6).map(|i| LatLng::new(i as f64, 0.0)).collect();
        assert!(!detect_zigzag(&track));
    }

    #[test]
    fn test_zigzag_alternating_turns() {
        let track: Vec<_> = (0..6)
            .map(|i| LatLng::new(i as f64, if i % 2 == 0 { 0.0 } else { 1.0 }))
            .collect();
        assert!(detect_zigzag(&track));
    }

    #[test]
    fn test_zigzag_needs_six_points() {
        let track: Vec<_> = (0..5)
            .map(|i| LatLng::new(i as f64, if i % 2 == 0 { 0.0 } else { 1.0 }))
            .collect();
        assert!(!detect_zigzag(&track));
    }

    #[test]
    fn test_zigzag_gentle_curve_is_not_a_zigzag() {
        // 10° course changes stay under the 30° turn threshold
        let mut track = vec![LatLng::new(0.0, 0.0)];
        let mut heading: f64 = 0.0;
        for _ in 0..8 {
            let last = *track.last().unwrap();
            track.push(LatLng::new(last.lat + heading.cos(), last.lng + heading.sin()));
            heading += 10f64.to_radians();
        }
        assert!(!detect_zigzag(&track));
    }

    #[test]
    fn test_bearing_wraps_across_pi() {
        // Heading from just under +π to just over -π is a tiny turn, not ~2π
        let track = vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(-1.0, 0.01),
            LatLng::new(-2.0, 0.0),
            LatLng::new(-3.0, 0.01),
            LatLng::new(-4.0, 0.0),
            LatLng::new(-5.0, 0.01),
        ];
        assert!(!detect_zigzag(&track));
    }
}
