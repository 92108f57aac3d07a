//! Estimated distances for when the mapping service is unavailable.
//!
//! Uses great-circle distance stretched by a road factor when both places
//! have coordinates, and a constant leg length otherwise. Travel time is a
//! constant number of minutes per kilometer. Less accurate than the mapping
//! service but deterministic and always available.

use std::collections::HashMap;

use crate::config::PlannerConfig;
use crate::distance::{DistanceMatrix, DistanceMatrixEntry};
use crate::error::DistanceError;
use crate::model::Place;
use crate::traits::DistanceProvider;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone)]
pub struct EstimatedDistanceProvider {
    coordinates: HashMap<String, (f64, f64)>,
    minutes_per_km: f64,
    road_factor: f64,
    unknown_leg_km: f64,
}

impl EstimatedDistanceProvider {
    pub fn from_places(places: &[Place], config: &PlannerConfig) -> Self {
        let coordinates = places
            .iter()
            .filter_map(|place| place.coordinates.map(|coords| (place.name.clone(), coords)))
            .collect();

        Self {
            coordinates,
            minutes_per_km: config.fallback_minutes_per_km.max(0.0),
            road_factor: config.fallback_road_factor.max(1.0),
            unknown_leg_km: config.fallback_leg_km.max(0.0),
        }
    }

    /// Estimated entry between two named locations.
    pub fn estimate(&self, from: &str, to: &str) -> DistanceMatrixEntry {
        if from == to {
            return DistanceMatrixEntry::ZERO;
        }

        let km = match (self.coordinates.get(from), self.coordinates.get(to)) {
            (Some(a), Some(b)) => haversine_km(*a, *b) * self.road_factor,
            _ => self.unknown_leg_km,
        };

        DistanceMatrixEntry::route(
            (km * 1000.0).round() as u64,
            (km * self.minutes_per_km * 60.0).round() as u64,
        )
    }

    /// Full matrix between `locations`.
    pub fn estimate_matrix(&self, locations: &[String]) -> DistanceMatrix {
        locations
            .iter()
            .map(|from| locations.iter().map(|to| self.estimate(from, to)).collect())
            .collect()
    }
}

impl DistanceProvider for EstimatedDistanceProvider {
    fn distance_matrix(
        &self,
        origins: &[String],
        destinations: &[String],
    ) -> Result<DistanceMatrix, DistanceError> {
        Ok(origins
            .iter()
            .map(|from| destinations.iter().map(|to| self.estimate(from, to)).collect())
            .collect())
    }
}

/// Great-circle distance between two (lat, lng) points in kilometers.
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = from;
    let (lat2, lng2) = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> EstimatedDistanceProvider {
        let places = vec![
            Place::new("Madurai", 240).with_coordinates(9.9252, 78.1198),
            Place::new("Kanyakumari", 240).with_coordinates(8.0883, 77.5385),
        ];
        EstimatedDistanceProvider::from_places(&places, &PlannerConfig::default())
    }

    #[test]
    fn test_haversine_same_point() {
        let dist = haversine_km((9.9, 78.1), (9.9, 78.1));
        assert!(dist < 0.001, "Same point should have ~0 distance");
    }

    #[test]
    fn test_haversine_known_distance() {
        // Madurai to Kanyakumari is roughly 210 km in a straight line.
        let dist = haversine_km((9.9252, 78.1198), (8.0883, 77.5385));
        assert!(dist > 200.0 && dist < 225.0, "got {}", dist);
    }

    #[test]
    fn known_coordinates_use_road_factor() {
        let entry = provider().estimate("Madurai", "Kanyakumari");
        let km = entry.distance_km().unwrap();
        let straight = haversine_km((9.9252, 78.1198), (8.0883, 77.5385));
        assert!((km - straight * 1.3).abs() < 0.01, "got {km}");
    }

    #[test]
    fn unknown_location_uses_constant_leg() {
        // 100 km at 1.5 min/km = 150 minutes
        let entry = provider().estimate("Dharmapuri", "Madurai");
        assert_eq!(entry, DistanceMatrixEntry::route(100_000, 9000));
        assert_eq!(entry.duration_minutes(), Some(150));
    }

    #[test]
    fn matrix_diagonal_is_zero_and_symmetric() {
        let locations = vec![
            "Dharmapuri".to_string(),
            "Madurai".to_string(),
            "Kanyakumari".to_string(),
        ];
        let matrix = provider().estimate_matrix(&locations);

        for (i, row) in matrix.iter().enumerate() {
            assert_eq!(row[i], DistanceMatrixEntry::ZERO, "Diagonal should be zero");
        }
        assert_eq!(matrix[1][2], matrix[2][1], "Estimates should be symmetric");
    }
}
