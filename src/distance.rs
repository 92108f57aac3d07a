//! Distance facts and the request-scoped distance table.
//!
//! A planning request fetches every pairwise distance it may need once, up
//! front, into a [`DistanceTable`]. Sequencing and day slicing then read
//! from the table without further provider calls, so retries after an
//! exclusion cost nothing extra.

use std::collections::HashMap;
use std::ops::Range;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::cancel::Cancellation;
use crate::error::{DistanceError, PlanError};
use crate::haversine::EstimatedDistanceProvider;
use crate::traits::DistanceProvider;

/// Matrix of entries indexed `[origin][destination]`.
pub type DistanceMatrix = Vec<Vec<DistanceMatrixEntry>>;

/// Directed distance fact between two locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMatrixEntry {
    Route {
        distance_meters: u64,
        duration_seconds: u64,
    },
    /// The provider knows both locations but has no route between them.
    Unreachable,
}

impl DistanceMatrixEntry {
    pub const ZERO: Self = Self::Route {
        distance_meters: 0,
        duration_seconds: 0,
    };

    pub const fn route(distance_meters: u64, duration_seconds: u64) -> Self {
        Self::Route {
            distance_meters,
            duration_seconds,
        }
    }

    pub const fn is_reachable(&self) -> bool {
        matches!(self, Self::Route { .. })
    }

    /// Duration used to rank candidates; unreachable sorts last.
    pub const fn sequencing_cost(&self) -> u64 {
        match self {
            Self::Route {
                duration_seconds, ..
            } => *duration_seconds,
            Self::Unreachable => u64::MAX,
        }
    }

    pub fn duration_minutes(&self) -> Option<u32> {
        match self {
            Self::Route {
                duration_seconds, ..
            } => Some(seconds_to_minutes(*duration_seconds)),
            Self::Unreachable => None,
        }
    }

    pub fn distance_km(&self) -> Option<f64> {
        match self {
            Self::Route {
                distance_meters, ..
            } => Some(*distance_meters as f64 / 1000.0),
            Self::Unreachable => None,
        }
    }
}

/// Seconds to whole minutes, rounded to nearest.
pub fn seconds_to_minutes(seconds: u64) -> u32 {
    u32::try_from(seconds.saturating_add(30) / 60).unwrap_or(u32::MAX)
}

/// Pairwise distances for one planning request.
#[derive(Debug, Clone, Default)]
pub struct DistanceTable {
    entries: HashMap<String, HashMap<String, DistanceMatrixEntry>>,
    degraded_reason: Option<String>,
}

impl DistanceTable {
    /// Fetch the full matrix between `locations` from `provider`.
    ///
    /// The batch is split into blocks that fit the provider's pair limit and
    /// the blocks are requested concurrently. If any block fails the whole
    /// table is rebuilt from `fallback`, and [`is_degraded`](Self::is_degraded)
    /// reports it. Only cancellation is returned as an error.
    pub fn fetch<P>(
        provider: &P,
        fallback: &EstimatedDistanceProvider,
        locations: &[String],
        cancel: &Cancellation,
    ) -> Result<Self, PlanError>
    where
        P: DistanceProvider + ?Sized,
    {
        cancel.check()?;

        let locations = dedupe(locations);
        if locations.len() < 2 {
            return Ok(Self::default());
        }

        let blocks = plan_blocks(
            locations.len(),
            locations.len(),
            BlockLimits {
                pairs: provider.max_pairs_per_request(),
                rows: provider.max_origins_per_request(),
                cols: provider.max_destinations_per_request(),
            },
        );
        debug!(
            locations = locations.len(),
            blocks = blocks.len(),
            "fetching distance matrix"
        );

        let fetched: Vec<Result<DistanceMatrix, DistanceError>> = blocks
            .par_iter()
            .map(|block| {
                if cancel.is_cancelled() {
                    return Ok(Vec::new());
                }
                fetch_block(provider, &locations, block)
            })
            .collect();

        cancel.check()?;

        let mut table = Self::default();
        for (block, result) in blocks.iter().zip(fetched) {
            match result {
                Ok(matrix) => table.insert_block(&locations, block, matrix),
                Err(err) => {
                    warn!(error = %err, "distance provider unavailable, switching to estimates");
                    let mut estimated =
                        Self::from_matrix(&locations, fallback.estimate_matrix(&locations));
                    estimated.degraded_reason = Some(err.to_string());
                    return Ok(estimated);
                }
            }
        }

        Ok(table)
    }

    /// Build a table from a square matrix over `locations`.
    pub fn from_matrix(locations: &[String], matrix: DistanceMatrix) -> Self {
        let mut table = Self::default();
        let block = Block {
            rows: 0..locations.len(),
            cols: 0..locations.len(),
        };
        table.insert_block(locations, &block, matrix);
        table
    }

    /// Entry from `from` to `to`. A location to itself is always a zero
    /// route; a pair the table never saw is unreachable.
    pub fn entry(&self, from: &str, to: &str) -> DistanceMatrixEntry {
        if from == to {
            return DistanceMatrixEntry::ZERO;
        }
        self.entries
            .get(from)
            .and_then(|row| row.get(to))
            .copied()
            .unwrap_or(DistanceMatrixEntry::Unreachable)
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded_reason.is_some()
    }

    /// Why the table fell back to estimates, if it did.
    pub fn degraded_reason(&self) -> Option<&str> {
        self.degraded_reason.as_deref()
    }

    fn insert_block(&mut self, locations: &[String], block: &Block, matrix: DistanceMatrix) {
        for (origin, row) in locations[block.rows.clone()].iter().zip(matrix) {
            let targets = self.entries.entry(origin.clone()).or_default();
            for (destination, entry) in locations[block.cols.clone()].iter().zip(row) {
                targets.insert(destination.clone(), entry);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Block {
    rows: Range<usize>,
    cols: Range<usize>,
}

/// Per-call provider limits a block must fit.
#[derive(Debug, Clone, Copy)]
struct BlockLimits {
    pairs: usize,
    rows: usize,
    cols: usize,
}

/// Split an `n_rows x n_cols` request into blocks within `limits`.
fn plan_blocks(n_rows: usize, n_cols: usize, limits: BlockLimits) -> Vec<Block> {
    let max_pairs = limits.pairs.max(1);
    let cols_per_block = n_cols.min(max_pairs).min(limits.cols).max(1);
    let rows_per_block = (max_pairs / cols_per_block).min(limits.rows).max(1);

    let mut blocks = Vec::new();
    for row_start in (0..n_rows).step_by(rows_per_block) {
        let rows = row_start..(row_start + rows_per_block).min(n_rows);
        for col_start in (0..n_cols).step_by(cols_per_block) {
            let cols = col_start..(col_start + cols_per_block).min(n_cols);
            blocks.push(Block {
                rows: rows.clone(),
                cols,
            });
        }
    }
    blocks
}

fn fetch_block<P>(
    provider: &P,
    locations: &[String],
    block: &Block,
) -> Result<DistanceMatrix, DistanceError>
where
    P: DistanceProvider + ?Sized,
{
    let origins = &locations[block.rows.clone()];
    let destinations = &locations[block.cols.clone()];
    let matrix = provider.distance_matrix(origins, destinations)?;

    let well_formed = matrix.len() == origins.len()
        && matrix.iter().all(|row| row.len() == destinations.len());
    if !well_formed {
        return Err(DistanceError::Malformed {
            message: format!(
                "expected {}x{} matrix, got {} rows",
                origins.len(),
                destinations.len(),
                matrix.len()
            ),
        });
    }
    Ok(matrix)
}

fn dedupe(locations: &[String]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(locations.len());
    for location in locations {
        if !unique.contains(location) {
            unique.push(location.clone());
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::config::PlannerConfig;

    struct CountingProvider {
        calls: AtomicUsize,
        limit: usize,
        max_side: usize,
        fail: bool,
    }

    impl CountingProvider {
        fn new(limit: usize) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                limit,
                max_side: usize::MAX,
                fail: false,
            }
        }
    }

    fn pairs(limit: usize) -> BlockLimits {
        BlockLimits {
            pairs: limit,
            rows: usize::MAX,
            cols: usize::MAX,
        }
    }

    impl DistanceProvider for CountingProvider {
        fn distance_matrix(
            &self,
            origins: &[String],
            destinations: &[String],
        ) -> Result<DistanceMatrix, DistanceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DistanceError::Service {
                    code: "OVER_QUERY_LIMIT".to_string(),
                    message: "quota exhausted".to_string(),
                });
            }
            if origins.len() > self.max_side || destinations.len() > self.max_side {
                return Err(DistanceError::DimensionLimitExceeded {
                    origins: origins.len(),
                    destinations: destinations.len(),
                    max_origins: self.max_side,
                    max_destinations: self.max_side,
                });
            }
            if origins.len() * destinations.len() > self.limit {
                return Err(DistanceError::PairLimitExceeded {
                    requested: origins.len() * destinations.len(),
                    limit: self.limit,
                });
            }
            Ok(origins
                .iter()
                .map(|o| {
                    destinations
                        .iter()
                        .map(|d| {
                            let seconds = (o.len() * 60 + d.len() * 10) as u64;
                            DistanceMatrixEntry::route(seconds * 20, seconds)
                        })
                        .collect()
                })
                .collect())
        }

        fn max_pairs_per_request(&self) -> usize {
            self.limit
        }

        fn max_origins_per_request(&self) -> usize {
            self.max_side
        }

        fn max_destinations_per_request(&self) -> usize {
            self.max_side
        }
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn fallback() -> EstimatedDistanceProvider {
        EstimatedDistanceProvider::from_places(&[], &PlannerConfig::default())
    }

    #[test]
    fn blocks_respect_pair_limit_and_cover_matrix() {
        let blocks = plan_blocks(5, 5, pairs(10));
        let mut covered = 0;
        for block in &blocks {
            let pairs = block.rows.len() * block.cols.len();
            assert!(pairs <= 10, "block {block:?} has {pairs} pairs");
            covered += pairs;
        }
        assert_eq!(covered, 25);
    }

    #[test]
    fn blocks_split_columns_when_one_row_is_too_wide() {
        let blocks = plan_blocks(2, 7, pairs(3));
        assert!(blocks.iter().all(|b| b.rows.len() == 1 && b.cols.len() <= 3));
        let covered: usize = blocks.iter().map(|b| b.rows.len() * b.cols.len()).sum();
        assert_eq!(covered, 14);
    }

    #[test]
    fn blocks_respect_origin_and_destination_limits() {
        let limits = BlockLimits {
            pairs: 100,
            rows: 25,
            cols: 25,
        };
        let blocks = plan_blocks(26, 26, limits);

        for block in &blocks {
            assert!(block.rows.len() <= 25, "block {block:?} has too many origins");
            assert!(block.cols.len() <= 25, "block {block:?} has too many destinations");
            assert!(block.rows.len() * block.cols.len() <= 100);
        }
        let covered: usize = blocks.iter().map(|b| b.rows.len() * b.cols.len()).sum();
        assert_eq!(covered, 26 * 26);
    }

    #[test]
    fn fetch_keeps_live_distances_under_a_side_limit() {
        let mut provider = CountingProvider::new(100);
        provider.max_side = 3;
        let locations = names(&["Salem", "Erode", "Ooty", "Madurai", "Trichy"]);

        let table =
            DistanceTable::fetch(&provider, &fallback(), &locations, &Cancellation::new()).unwrap();

        assert!(!table.is_degraded());
        assert_eq!(
            table.entry("Madurai", "Trichy"),
            DistanceMatrixEntry::route((7 * 60 + 6 * 10) * 20, 7 * 60 + 6 * 10)
        );
    }

    #[test]
    fn fetch_chunks_requests_within_limit() {
        let provider = CountingProvider::new(4);
        let locations = names(&["Salem", "Erode", "Ooty", "Madurai"]);

        let table =
            DistanceTable::fetch(&provider, &fallback(), &locations, &Cancellation::new()).unwrap();

        assert!(!table.is_degraded());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 4);
        assert_eq!(
            table.entry("Salem", "Ooty"),
            DistanceMatrixEntry::route((5 * 60 + 4 * 10) * 20, 5 * 60 + 4 * 10)
        );
    }

    #[test]
    fn fetch_falls_back_to_estimates_on_failure() {
        let mut provider = CountingProvider::new(100);
        provider.fail = true;
        let locations = names(&["Salem", "Erode"]);

        let table =
            DistanceTable::fetch(&provider, &fallback(), &locations, &Cancellation::new()).unwrap();

        assert!(table.is_degraded());
        assert!(table.degraded_reason().unwrap().contains("OVER_QUERY_LIMIT"));
        assert!(table.entry("Salem", "Erode").is_reachable());
    }

    #[test]
    fn fetch_honours_cancellation_before_calling_provider() {
        let provider = CountingProvider::new(100);
        let cancel = Cancellation::new();
        cancel.cancel();

        let result = DistanceTable::fetch(&provider, &fallback(), &names(&["A", "B"]), &cancel);

        assert_eq!(result.unwrap_err(), PlanError::Cancelled);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn single_location_needs_no_provider_call() {
        let provider = CountingProvider::new(100);
        let table =
            DistanceTable::fetch(&provider, &fallback(), &names(&["Salem", "Salem"]), &Cancellation::new())
                .unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert_eq!(table.entry("Salem", "Salem"), DistanceMatrixEntry::ZERO);
    }

    #[test]
    fn unknown_pairs_are_unreachable() {
        let table = DistanceTable::default();
        assert_eq!(table.entry("Salem", "Erode"), DistanceMatrixEntry::Unreachable);
        assert_eq!(DistanceMatrixEntry::Unreachable.sequencing_cost(), u64::MAX);
    }

    #[test]
    fn minutes_round_to_nearest() {
        assert_eq!(seconds_to_minutes(29), 0);
        assert_eq!(seconds_to_minutes(30), 1);
        assert_eq!(seconds_to_minutes(5 * 3600), 300);
        assert_eq!(seconds_to_minutes(u64::MAX), u32::MAX);
    }
}
