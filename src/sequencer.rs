//! Greedy nearest-neighbor ordering of stops.
//!
//! This is a heuristic, not an exact TSP solver. Inputs are small (a few
//! dozen places at most) and the O(n^2) walk over the distance table is
//! what keeps planning interactive.

use tracing::debug;

use crate::distance::DistanceTable;
use crate::error::PlanError;

/// Order `stops` into a route from `start`.
///
/// From the current location, repeatedly pick the unvisited stop with the
/// shortest travel duration; ties go to the earlier stop in `stops`. The
/// result begins with `start`; if `end` differs from `start` it is appended
/// last regardless of distance. Unreachable stops are never picked while a
/// reachable one remains, and when only unreachable stops remain the walk
/// fails with [`PlanError::NoRouteFound`].
pub fn sequence<'a>(
    start: &'a str,
    stops: &[&'a str],
    end: &'a str,
    table: &DistanceTable,
) -> Result<Vec<&'a str>, PlanError> {
    let mut route = Vec::with_capacity(stops.len() + 2);
    route.push(start);

    let mut remaining: Vec<&'a str> = stops.to_vec();
    let mut current = start;

    while !remaining.is_empty() {
        let mut best: Option<(usize, u64)> = None;
        for (index, candidate) in remaining.iter().enumerate() {
            let entry = table.entry(current, candidate);
            if !entry.is_reachable() {
                continue;
            }
            let cost = entry.sequencing_cost();
            if best.is_none_or(|(_, best_cost)| cost < best_cost) {
                best = Some((index, cost));
            }
        }

        let Some((index, _)) = best else {
            debug!(from = current, remaining = remaining.len(), "no reachable stop left");
            return Err(PlanError::NoRouteFound {
                from: current.to_string(),
            });
        };

        current = remaining.remove(index);
        route.push(current);
    }

    if end != start {
        route.push(end);
    }

    Ok(route)
}

/// Sum of leg durations in minutes along `route`, each leg rounded to
/// whole minutes. `None` if any leg is unreachable.
pub fn route_travel_minutes(route: &[&str], table: &DistanceTable) -> Option<u32> {
    route.windows(2).try_fold(0u32, |total, leg| {
        let minutes = table.entry(leg[0], leg[1]).duration_minutes()?;
        Some(total.saturating_add(minutes))
    })
}
