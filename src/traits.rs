//! Seams to the planner's external collaborators.
//!
//! The planner never reaches for ambient services. Callers hand it a
//! catalog and a distance provider, and the concrete app decides what backs
//! them (a database table, a mapping web service, a test stub).

use crate::distance::{DistanceMatrix, DistanceMatrixEntry};
use crate::error::DistanceError;
use crate::model::Place;

/// Resolves travel distance and duration between named locations.
///
/// `distance_matrix` is indexed `[origin][destination]` in input order. A
/// pair with no road between it is an [`DistanceMatrixEntry::Unreachable`]
/// entry, not an error; an `Err` means the provider itself is unavailable.
pub trait DistanceProvider: Sync {
    fn distance_matrix(
        &self,
        origins: &[String],
        destinations: &[String],
    ) -> Result<DistanceMatrix, DistanceError>;

    fn distance(&self, origin: &str, destination: &str) -> Result<DistanceMatrixEntry, DistanceError> {
        let matrix = self.distance_matrix(&[origin.to_string()], &[destination.to_string()])?;
        matrix
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .ok_or_else(|| DistanceError::Malformed {
                message: "provider returned an empty matrix for a single pair".to_string(),
            })
    }

    /// Largest `origins.len() * destinations.len()` accepted in one call.
    ///
    /// Callers split bigger batches themselves.
    fn max_pairs_per_request(&self) -> usize {
        usize::MAX
    }

    /// Largest `origins.len()` accepted in one call.
    fn max_origins_per_request(&self) -> usize {
        usize::MAX
    }

    /// Largest `destinations.len()` accepted in one call.
    fn max_destinations_per_request(&self) -> usize {
        usize::MAX
    }
}

impl<T: DistanceProvider + ?Sized> DistanceProvider for &T {
    fn distance_matrix(
        &self,
        origins: &[String],
        destinations: &[String],
    ) -> Result<DistanceMatrix, DistanceError> {
        (**self).distance_matrix(origins, destinations)
    }

    fn max_pairs_per_request(&self) -> usize {
        (**self).max_pairs_per_request()
    }

    fn max_origins_per_request(&self) -> usize {
        (**self).max_origins_per_request()
    }

    fn max_destinations_per_request(&self) -> usize {
        (**self).max_destinations_per_request()
    }
}

/// Read-only source of known places.
pub trait PlaceCatalog {
    fn list_places(&self) -> Vec<Place>;
}

impl PlaceCatalog for [Place] {
    fn list_places(&self) -> Vec<Place> {
        self.to_vec()
    }
}

impl PlaceCatalog for Vec<Place> {
    fn list_places(&self) -> Vec<Place> {
        self.clone()
    }
}
