//! Planner tuning knobs.

use chrono::NaiveTime;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Time the coach leaves each morning.
    pub day_start_time: NaiveTime,
    /// Time on the day after the last trip day by which the coach must be
    /// back, unless the request supplies its own deadline.
    pub return_deadline_time: NaiveTime,
    /// Fuel cost per kilometer, in the operator's currency.
    pub cost_per_km: f64,
    /// Utilization (percent) at which a schedule counts as tight.
    pub tight_threshold_percent: f64,
    /// Utilization (percent) above which a schedule counts as infeasible.
    pub infeasible_threshold_percent: f64,
    /// Upper bound on the reported utilization percentage.
    pub utilization_display_cap: f64,
    /// Minutes of driving per estimated kilometer (1.5 = 40 km/h).
    pub fallback_minutes_per_km: f64,
    /// Multiplier from great-circle to road distance.
    pub fallback_road_factor: f64,
    /// Leg length assumed when either end has no known coordinates.
    pub fallback_leg_km: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            day_start_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap_or_default(),
            return_deadline_time: NaiveTime::from_hms_opt(1, 0, 0).unwrap_or_default(),
            cost_per_km: 0.0,
            tight_threshold_percent: 80.0,
            infeasible_threshold_percent: 100.0,
            utilization_display_cap: 999.0,
            fallback_minutes_per_km: 1.5,
            fallback_road_factor: 1.3,
            fallback_leg_km: 100.0,
        }
    }
}

impl PlannerConfig {
    pub fn with_cost_per_km(mut self, cost_per_km: f64) -> Self {
        self.cost_per_km = cost_per_km;
        self
    }
}
