//! Test fixtures for tour-planner.
//!
//! Provides realistic test data including:
//! - Tamil Nadu places with coordinates for the catalog
//! - A scripted distance provider with call counting and forced failures
//! - Builders for planning requests

#![allow(dead_code)]

pub mod stub_provider;
pub mod tamil_nadu_places;

use chrono::NaiveDate;
use tour_planner::{FeasibilityRequest, PlaceSelection, PlanRequest, Priority};

pub use stub_provider::*;
pub use tamil_nadu_places::*;

pub fn trip_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 10).expect("valid date")
}

/// Selection with an explicit visit duration.
pub fn select(name: &str, minutes: u32, priority: Priority) -> PlaceSelection {
    PlaceSelection::new(name, priority).with_visit_minutes(minutes)
}

pub fn plan_request(selections: Vec<PlaceSelection>, days: u32, hours: f64) -> PlanRequest {
    PlanRequest::new(START, selections, days, hours, trip_date())
}

pub fn feasibility_request(
    selections: Vec<PlaceSelection>,
    days: u32,
    hours: f64,
) -> FeasibilityRequest {
    FeasibilityRequest {
        start: START.to_string(),
        selections,
        number_of_days: days,
        max_driving_hours_per_day: hours,
    }
}
