//! Tamil Nadu places for realistic planning fixtures.
//!
//! Coordinates are approximate town centers. Default visit durations follow
//! what a coach operator would budget for a group.

use tour_planner::Place;

/// Coach depot most trips start from. Not a catalog place.
pub const START: &str = "Dharmapuri";

/// A catalog entry with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub category: &'static str,
    pub lat: f64,
    pub lng: f64,
    pub visit_minutes: u32,
}

impl Location {
    pub const fn new(
        name: &'static str,
        category: &'static str,
        lat: f64,
        lng: f64,
        visit_minutes: u32,
    ) -> Self {
        Self {
            name,
            category,
            lat,
            lng,
            visit_minutes,
        }
    }

    pub fn to_place(&self) -> Place {
        Place::new(self.name, self.visit_minutes)
            .with_category(self.category)
            .with_state("Tamil Nadu")
            .with_coordinates(self.lat, self.lng)
    }
}

// ============================================================================
// Temple towns and heritage sites
// ============================================================================

pub const HERITAGE: &[Location] = &[
    Location::new("Madurai", "Temple", 9.9252, 78.1198, 300),
    Location::new("Thanjavur", "Heritage", 10.7870, 79.1378, 240),
    Location::new("Rameswaram", "Temple", 9.2876, 79.3129, 300),
];

// ============================================================================
// Hill stations and nature
// ============================================================================

pub const HILLS: &[Location] = &[
    Location::new("Kodaikanal", "Hill Station", 10.2381, 77.4892, 360),
    Location::new("Ooty", "Hill Station", 11.4102, 76.6950, 360),
    Location::new("Yercaud", "Hill Station", 11.7753, 78.2093, 240),
    Location::new("Hogenakkal", "Waterfall", 12.1185, 77.7740, 180),
];

// ============================================================================
// Coast
// ============================================================================

pub const COAST: &[Location] = &[
    Location::new("Kanyakumari", "Beach", 8.0883, 77.5385, 240),
    Location::new("Pondicherry", "Beach", 11.9416, 79.8083, 300),
    Location::new("Chennai", "City", 13.0827, 80.2707, 300),
];

/// Every fixture location as catalog places.
pub fn catalog() -> Vec<Place> {
    HERITAGE
        .iter()
        .chain(HILLS)
        .chain(COAST)
        .map(Location::to_place)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_count() {
        assert_eq!(catalog().len(), 10);
    }

    #[test]
    fn test_coordinates_in_tamil_nadu() {
        for place in catalog() {
            let (lat, lng) = place.coordinates.expect("fixture places have coordinates");
            assert!((8.0..13.5).contains(&lat), "{} lat {lat}", place.name);
            assert!((76.0..80.5).contains(&lng), "{} lng {lng}", place.name);
        }
    }
}
