//! Great-circle distance helpers.
//!
//! Distances are computed with the haversine formula on a spherical Earth.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Displacement below which a position change is treated as GPS jitter (10 meters).
pub const MOVEMENT_THRESHOLD_KM: f64 = 0.01;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Builds coordinates only when both components are present.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Some(Self::new(lat, lon)),
            _ => None,
        }
    }

    /// Distance to `other` in kilometers.
    pub fn distance_km_to(&self, other: &Coordinates) -> f64 {
        distance_km(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

/// Haversine great-circle distance between two points, in kilometers.
///
/// NaN inputs yield NaN; callers must check for missing coordinates first.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Returns true when the position changed by more than [`MOVEMENT_THRESHOLD_KM`].
///
/// A missing position on either side always counts as movement so that the
/// caller refreshes rather than keeping stale distances.
pub fn has_moved_significantly(
    current: Option<Coordinates>,
    previous: Option<Coordinates>,
) -> bool {
    match (current, previous) {
        (Some(current), Some(previous)) => {
            current.distance_km_to(&previous) > MOVEMENT_THRESHOLD_KM
        }
        _ => true,
    }
}

/// Rounds a distance to two decimal places.
pub fn round_km(km: f64) -> f64 {
    (km * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn origin() -> Coordinates {
        Coordinates::new(31.0, 34.0)
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        let points = [
            (31.0, 34.0),
            (0.0, 0.0),
            (-33.8688, 151.2093),
            (89.9, -179.9),
        ];
        for (lat, lon) in points {
            assert!(distance_km(lat, lon, lat, lon).abs() < EPSILON);
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = (32.0853, 34.7818);
        let b = (31.7683, 35.2137);
        let ab = distance_km(a.0, a.1, b.0, b.1);
        let ba = distance_km(b.0, b.1, a.0, a.1);
        assert!((ab - ba).abs() < EPSILON);
    }

    #[test]
    fn test_one_degree_of_longitude_on_equator() {
        let d = distance_km(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111.19).abs() < 0.01, "got {}", d);
    }

    #[test]
    fn test_antipodal_distance_is_half_circumference() {
        let d = distance_km(0.0, 0.0, 0.0, 180.0);
        assert!((d - EARTH_RADIUS_KM * std::f64::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn test_missing_position_counts_as_moved() {
        assert!(has_moved_significantly(Some(origin()), None));
        assert!(has_moved_significantly(None, Some(origin())));
        assert!(has_moved_significantly(None, None));
    }

    #[test]
    fn test_jitter_below_threshold_is_ignored() {
        // 0.00008 degrees of latitude is roughly 8.9 meters
        let nearby = Coordinates::new(31.00008, 34.0);
        assert!(!has_moved_significantly(Some(nearby), Some(origin())));
    }

    #[test]
    fn test_movement_above_threshold_is_detected() {
        // 0.0001 degrees of latitude is roughly 11.1 meters
        let moved = Coordinates::new(31.0001, 34.0);
        assert!(has_moved_significantly(Some(moved), Some(origin())));
    }

    #[test]
    fn test_same_position_has_not_moved() {
        assert!(!has_moved_significantly(Some(origin()), Some(origin())));
    }

    #[test]
    fn test_round_km() {
        assert_eq!(round_km(1.23456), 1.23);
        assert_eq!(round_km(1.235001), 1.24);
        assert_eq!(round_km(0.0), 0.0);
    }

    #[test]
    fn test_from_parts_requires_both_components() {
        assert_eq!(
            Coordinates::from_parts(Some(1.0), Some(2.0)),
            Some(Coordinates::new(1.0, 2.0))
        );
        assert!(Coordinates::from_parts(Some(1.0), None).is_none());
        assert!(Coordinates::from_parts(None, Some(2.0)).is_none());
    }

    #[test]
    fn test_coordinates_serialization() {
        let json = serde_json::to_string(&origin()).unwrap();
        assert_eq!(json, r#"{"latitude":31.0,"longitude":34.0}"#);
    }
}
