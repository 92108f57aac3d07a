//! Planning data model: catalog places, per-request selections, and the
//! finished plan and feasibility report handed back to callers.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A named destination from the place catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub state: String,
    pub default_visit_duration_minutes: u32,
    #[serde(default)]
    pub description: String,
    /// Location (lat, lng), used only when distances have to be estimated.
    #[serde(default)]
    pub coordinates: Option<(f64, f64)>,
}

impl Place {
    pub fn new(name: impl Into<String>, default_visit_duration_minutes: u32) -> Self {
        Self {
            name: name.into(),
            category: String::new(),
            state: String::new(),
            default_visit_duration_minutes,
            description: String::new(),
            coordinates: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_coordinates(mut self, lat: f64, lng: f64) -> Self {
        self.coordinates = Some((lat, lng));
        self
    }

    /// Text attached to a visit stop for this place.
    pub fn visit_notes(&self) -> String {
        if !self.description.is_empty() {
            return self.description.clone();
        }
        match (self.category.is_empty(), self.state.is_empty()) {
            (false, false) => format!("{} in {}", self.category, self.state),
            (false, true) => self.category.clone(),
            (true, false) => self.state.clone(),
            (true, true) => String::new(),
        }
    }
}

/// Visit priority. Lower ordinal means more important.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    High = 1,
    #[default]
    Medium = 2,
    Low = 3,
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::High),
            2 => Ok(Self::Medium),
            3 => Ok(Self::Low),
            other => Err(format!("priority must be 1, 2 or 3, got {other}")),
        }
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority as u8
    }
}

/// A place chosen for one planning request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceSelection {
    pub place_name: String,
    #[serde(default)]
    pub custom_visit_duration_minutes: Option<u32>,
    #[serde(default)]
    pub priority: Priority,
}

impl PlaceSelection {
    pub fn new(place_name: impl Into<String>, priority: Priority) -> Self {
        Self {
            place_name: place_name.into(),
            custom_visit_duration_minutes: None,
            priority,
        }
    }

    pub fn with_visit_minutes(mut self, minutes: u32) -> Self {
        self.custom_visit_duration_minutes = Some(minutes);
        self
    }

    /// The override when present and positive, otherwise the place default.
    pub fn visit_minutes_for(&self, place: &Place) -> u32 {
        self.custom_visit_duration_minutes
            .filter(|minutes| *minutes > 0)
            .unwrap_or(place.default_visit_duration_minutes)
    }
}

/// A selection matched against the catalog, ready for planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStop {
    pub name: String,
    pub visit_minutes: u32,
    pub priority: Priority,
    pub notes: String,
}

impl ResolvedStop {
    pub fn new(place: &Place, selection: &PlaceSelection) -> Self {
        Self {
            name: place.name.clone(),
            visit_minutes: selection.visit_minutes_for(place),
            priority: selection.priority,
            notes: place.visit_notes(),
        }
    }
}

/// One scheduled unit of a day: a travel leg or a visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    #[serde(flatten)]
    pub kind: StopKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum StopKind {
    Travel {
        from_location: String,
        to_location: String,
        duration_minutes: u32,
        distance_km: f64,
    },
    Visit {
        place_name: String,
        duration_minutes: u32,
        notes: String,
    },
}

impl Stop {
    pub fn duration_minutes(&self) -> u32 {
        match &self.kind {
            StopKind::Travel {
                duration_minutes, ..
            }
            | StopKind::Visit {
                duration_minutes, ..
            } => *duration_minutes,
        }
    }

    pub fn is_travel(&self) -> bool {
        matches!(self.kind, StopKind::Travel { .. })
    }

    /// Place name for visit stops.
    pub fn visited_place(&self) -> Option<&str> {
        match &self.kind {
            StopKind::Visit { place_name, .. } => Some(place_name),
            StopKind::Travel { .. } => None,
        }
    }

    /// Travel distance rounded to whole kilometers; zero for visits.
    pub fn display_km(&self) -> u64 {
        match &self.kind {
            StopKind::Travel { distance_km, .. } => round_km(*distance_km),
            StopKind::Visit { .. } => 0,
        }
    }
}

/// One calendar day of a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayItinerary {
    pub day_number: u32,
    pub date: NaiveDate,
    pub stops: Vec<Stop>,
    pub driving_minutes: u32,
    pub distance_km: f64,
    pub summary: String,
}

impl DayItinerary {
    pub fn visited_places(&self) -> impl Iterator<Item = &str> + '_ {
        self.stops.iter().filter_map(Stop::visited_place)
    }
}

/// The finished itinerary for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourPlan {
    pub trip_name: String,
    pub total_days: u32,
    pub days: Vec<DayItinerary>,
    pub total_distance_km: f64,
    pub total_driving_hours: f64,
    pub estimated_fuel_cost: f64,
    pub is_feasible: bool,
    pub warnings: Vec<String>,
    pub excluded_places: Vec<String>,
    /// Selection names that did not match the catalog.
    pub invalid_places: Vec<String>,
    pub departure: NaiveDateTime,
    pub return_deadline: NaiveDateTime,
    /// End of the final stop (the departure time for an empty plan).
    pub returns_at: NaiveDateTime,
}

impl TourPlan {
    /// Places visited, in itinerary order.
    pub fn visited_places(&self) -> Vec<&str> {
        self.days
            .iter()
            .flat_map(DayItinerary::visited_places)
            .collect()
    }
}

/// Three-tier outcome of a feasibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Verdict {
    Proceed,
    Tight,
    Infeasible,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Proceed => "feasible, proceed",
            Self::Tight => "tight, consider fewer places or more days",
            Self::Infeasible => "infeasible, reduce place count or extend trip",
        };
        f.write_str(text)
    }
}

/// Time-budget estimate produced without building an itinerary.
///
/// All times are in minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeasibilityReport {
    pub is_feasible: bool,
    pub utilization_percentage: f64,
    pub total_time_needed: u32,
    pub available_time: u32,
    pub estimated_visit_time: u32,
    pub estimated_travel_time: u32,
    pub valid_places: usize,
    pub invalid_places: usize,
    pub verdict: Verdict,
    pub recommendation: String,
    /// True when distances came from the estimator instead of the provider.
    pub estimates_approximate: bool,
}

pub(crate) fn round_km(km: f64) -> u64 {
    if km.is_finite() && km > 0.0 {
        km.round() as u64
    } else {
        0
    }
}
