//! Time-budget pre-check that does not build an itinerary.

use tracing::debug;

use crate::config::PlannerConfig;
use crate::distance::DistanceTable;
use crate::model::{FeasibilityReport, ResolvedStop, Verdict};
use crate::sequencer::{route_travel_minutes, sequence};

/// Daily driving cap in whole minutes. Non-finite or negative hours give 0.
pub fn daily_cap_minutes(max_driving_hours_per_day: f64) -> u32 {
    if max_driving_hours_per_day.is_finite() && max_driving_hours_per_day > 0.0 {
        (max_driving_hours_per_day * 60.0).round() as u32
    } else {
        0
    }
}

/// Stops stable-sorted by priority, highest first.
pub fn priority_order(stops: &[ResolvedStop]) -> Vec<&ResolvedStop> {
    let mut ordered: Vec<&ResolvedStop> = stops.iter().collect();
    ordered.sort_by_key(|stop| stop.priority);
    ordered
}

/// Travel minutes for the round trip `start -> stops -> start`, sequenced
/// the same way the itinerary builder sequences them. `None` when no
/// drivable route exists.
pub fn round_trip_travel_minutes(
    start: &str,
    stops: &[ResolvedStop],
    table: &DistanceTable,
) -> Option<u32> {
    let ordered = priority_order(stops);
    let names: Vec<&str> = ordered.iter().map(|stop| stop.name.as_str()).collect();
    let mut route = sequence(start, &names, start, table).ok()?;
    route.push(start);
    route_travel_minutes(&route, table)
}

pub struct FeasibilityAnalyzer<'a> {
    table: &'a DistanceTable,
    config: &'a PlannerConfig,
}

impl<'a> FeasibilityAnalyzer<'a> {
    pub fn new(table: &'a DistanceTable, config: &'a PlannerConfig) -> Self {
        Self { table, config }
    }

    /// Estimate whether `stops` fit the trip.
    ///
    /// `invalid_places` counts selections that were dropped before this call
    /// because the catalog does not know them; they only show up in the
    /// report counts and recommendation.
    pub fn check(
        &self,
        start: &str,
        stops: &[ResolvedStop],
        invalid_places: usize,
        number_of_days: u32,
        max_driving_hours_per_day: f64,
    ) -> FeasibilityReport {
        let available_time = number_of_days.saturating_mul(daily_cap_minutes(max_driving_hours_per_day));
        let estimated_visit_time = stops
            .iter()
            .fold(0u32, |total, stop| total.saturating_add(stop.visit_minutes));
        let travel = round_trip_travel_minutes(start, stops, self.table);
        let estimated_travel_time = travel.unwrap_or(0);
        let total_time_needed = estimated_visit_time.saturating_add(estimated_travel_time);

        let utilization = if available_time > 0 {
            100.0 * f64::from(total_time_needed) / f64::from(available_time)
        } else if total_time_needed == 0 {
            0.0
        } else {
            f64::INFINITY
        };

        let is_feasible = travel.is_some_and(|minutes| minutes <= available_time);
        let verdict = self.verdict(is_feasible, utilization);
        let utilization_percentage = utilization.min(self.config.utilization_display_cap);

        let mut recommendation = format!(
            "{verdict} ({:.0}% of {available_time} available minutes)",
            utilization_percentage
        );
        if travel.is_none() {
            recommendation.push_str("; no drivable route between the selected places");
        }
        if invalid_places > 0 {
            recommendation.push_str(&format!(
                "; {invalid_places} selected place(s) not found in the catalog were ignored"
            ));
        }

        debug!(
            start,
            places = stops.len(),
            invalid_places,
            estimated_travel_time,
            estimated_visit_time,
            available_time,
            is_feasible,
            "feasibility checked"
        );

        FeasibilityReport {
            is_feasible,
            utilization_percentage,
            total_time_needed,
            available_time,
            estimated_visit_time,
            estimated_travel_time,
            valid_places: stops.len(),
            invalid_places,
            verdict,
            recommendation,
            estimates_approximate: self.table.is_degraded(),
        }
    }

    fn verdict(&self, is_feasible: bool, utilization: f64) -> Verdict {
        if !is_feasible || utilization > self.config.infeasible_threshold_percent {
            Verdict::Infeasible
        } else if utilization >= self.config.tight_threshold_percent {
            Verdict::Tight
        } else {
            Verdict::Proceed
        }
    }
}
