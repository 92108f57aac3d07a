//! In-memory distance provider with scripted legs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use tour_planner::{DistanceError, DistanceMatrix, DistanceMatrixEntry, DistanceProvider};

/// Symmetric road table keyed by place name.
///
/// Pairs without a scripted leg get `default_leg`, or are unreachable when
/// that is `None`.
#[derive(Debug, Default)]
pub struct StubProvider {
    legs: HashMap<(String, String), DistanceMatrixEntry>,
    default_leg: Option<DistanceMatrixEntry>,
    failure: Option<DistanceError>,
    max_pairs: Option<usize>,
    calls: AtomicUsize,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripted leg in both directions.
    pub fn leg(mut self, a: &str, b: &str, km: f64, minutes: u64) -> Self {
        let entry = DistanceMatrixEntry::route((km * 1000.0).round() as u64, minutes * 60);
        self.legs.insert((a.to_string(), b.to_string()), entry);
        self.legs.insert((b.to_string(), a.to_string()), entry);
        self
    }

    pub fn unreachable(mut self, a: &str, b: &str) -> Self {
        self.legs
            .insert((a.to_string(), b.to_string()), DistanceMatrixEntry::Unreachable);
        self.legs
            .insert((b.to_string(), a.to_string()), DistanceMatrixEntry::Unreachable);
        self
    }

    pub fn default_leg(mut self, km: f64, minutes: u64) -> Self {
        self.default_leg = Some(DistanceMatrixEntry::route(
            (km * 1000.0).round() as u64,
            minutes * 60,
        ));
        self
    }

    /// Every call fails with a quota error.
    pub fn failing(mut self) -> Self {
        self.failure = Some(DistanceError::Service {
            code: "OVER_QUERY_LIMIT".to_string(),
            message: "daily quota exhausted".to_string(),
        });
        self
    }

    pub fn max_pairs(mut self, limit: usize) -> Self {
        self.max_pairs = Some(limit);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lookup(&self, from: &str, to: &str) -> DistanceMatrixEntry {
        if from == to {
            return DistanceMatrixEntry::ZERO;
        }
        self.legs
            .get(&(from.to_string(), to.to_string()))
            .copied()
            .or(self.default_leg)
            .unwrap_or(DistanceMatrixEntry::Unreachable)
    }
}

impl DistanceProvider for StubProvider {
    fn distance_matrix(
        &self,
        origins: &[String],
        destinations: &[String],
    ) -> Result<DistanceMatrix, DistanceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(origins
            .iter()
            .map(|from| destinations.iter().map(|to| self.lookup(from, to)).collect())
            .collect())
    }

    fn max_pairs_per_request(&self) -> usize {
        self.max_pairs.unwrap_or(usize::MAX)
    }
}

/// Road table for the southern loop: Dharmapuri, Madurai, Kanyakumari.
pub fn southern_loop() -> StubProvider {
    StubProvider::new()
        .leg("Dharmapuri", "Madurai", 302.0, 300)
        .leg("Madurai", "Kanyakumari", 245.0, 240)
        .leg("Kanyakumari", "Dharmapuri", 545.0, 510)
        .default_leg(250.0, 240)
}

/// Road table where Hogenakkal and Yercaud are an easy day out of Dharmapuri
/// and everything else is at least an hour from anywhere.
pub fn short_day_trip() -> StubProvider {
    StubProvider::new()
        .leg("Dharmapuri", "Hogenakkal", 46.0, 60)
        .leg("Hogenakkal", "Yercaud", 120.0, 150)
        .leg("Yercaud", "Dharmapuri", 98.0, 120)
        .default_leg(250.0, 240)
}
