//! Request/response surface for collaborators such as the booking UI.
//!
//! Both operations are stateless: every call reads the catalog once, builds
//! its own distance table, and keeps nothing afterwards.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cancel::Cancellation;
use crate::config::PlannerConfig;
use crate::distance::DistanceTable;
use crate::error::PlanError;
use crate::feasibility::FeasibilityAnalyzer;
use crate::haversine::EstimatedDistanceProvider;
use crate::itinerary::{ItineraryBuilder, PlanInputs, validate};
use crate::model::{FeasibilityReport, Place, PlaceSelection, ResolvedStop, TourPlan};
use crate::traits::{DistanceProvider, PlaceCatalog};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeasibilityRequest {
    pub start: String,
    pub selections: Vec<PlaceSelection>,
    pub number_of_days: u32,
    pub max_driving_hours_per_day: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub start: String,
    pub selections: Vec<PlaceSelection>,
    pub number_of_days: u32,
    pub max_driving_hours_per_day: f64,
    /// First day of the trip; anchors every stop's absolute time.
    pub start_date: NaiveDate,
    #[serde(default)]
    pub return_deadline: Option<NaiveDateTime>,
    #[serde(default)]
    pub trip_name: Option<String>,
}

impl PlanRequest {
    pub fn new(
        start: impl Into<String>,
        selections: Vec<PlaceSelection>,
        number_of_days: u32,
        max_driving_hours_per_day: f64,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            start: start.into(),
            selections,
            number_of_days,
            max_driving_hours_per_day,
            start_date,
            return_deadline: None,
            trip_name: None,
        }
    }

    pub fn with_return_deadline(mut self, deadline: NaiveDateTime) -> Self {
        self.return_deadline = Some(deadline);
        self
    }

    pub fn with_trip_name(mut self, trip_name: impl Into<String>) -> Self {
        self.trip_name = Some(trip_name.into());
        self
    }

    /// The same places and limits as a feasibility request.
    pub fn feasibility_request(&self) -> FeasibilityRequest {
        FeasibilityRequest {
            start: self.start.clone(),
            selections: self.selections.clone(),
            number_of_days: self.number_of_days,
            max_driving_hours_per_day: self.max_driving_hours_per_day,
        }
    }
}

/// Plans tours against an injected catalog and distance provider.
pub struct TourPlanner<C, P> {
    catalog: C,
    provider: P,
    config: PlannerConfig,
}

impl<C, P> TourPlanner<C, P>
where
    C: PlaceCatalog,
    P: DistanceProvider,
{
    pub fn new(catalog: C, provider: P, config: PlannerConfig) -> Self {
        Self {
            catalog,
            provider,
            config,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Estimate whether the selections fit. Always returns a report.
    pub fn feasibility_check(&self, request: &FeasibilityRequest) -> FeasibilityReport {
        let session = self.open_session(&request.start, &request.selections);
        let table = DistanceTable::fetch(
            &self.provider,
            &session.estimator,
            &session.locations(&request.start),
            &Cancellation::new(),
        )
        .unwrap_or_default();
        self.report(request, &session, &table)
    }

    /// [`feasibility_check`](Self::feasibility_check) that stops at the
    /// next provider call once `cancel` fires.
    pub fn feasibility_check_with_cancellation(
        &self,
        request: &FeasibilityRequest,
        cancel: &Cancellation,
    ) -> Result<FeasibilityReport, PlanError> {
        let session = self.open_session(&request.start, &request.selections);
        let table = DistanceTable::fetch(
            &self.provider,
            &session.estimator,
            &session.locations(&request.start),
            cancel,
        )?;
        Ok(self.report(request, &session, &table))
    }

    /// Build a day-by-day plan, excluding low-priority places if needed.
    pub fn create_plan(&self, request: &PlanRequest) -> Result<TourPlan, PlanError> {
        self.create_plan_with_cancellation(request, &Cancellation::new())
    }

    pub fn create_plan_with_cancellation(
        &self,
        request: &PlanRequest,
        cancel: &Cancellation,
    ) -> Result<TourPlan, PlanError> {
        let session = self.open_session(&request.start, &request.selections);
        let trip_name = request.trip_name.clone().unwrap_or_else(|| {
            format!("{} tour ({} days)", request.start, request.number_of_days)
        });
        let inputs = PlanInputs {
            trip_name,
            start: &request.start,
            stops: &session.stops,
            number_of_days: request.number_of_days,
            max_driving_hours_per_day: request.max_driving_hours_per_day,
            start_date: request.start_date,
            return_deadline: request.return_deadline,
            invalid_places: session.invalid.clone(),
            notices: session.notices(),
        };
        validate(&inputs)?;

        let table = DistanceTable::fetch(
            &self.provider,
            &session.estimator,
            &session.locations(&request.start),
            cancel,
        )?;

        ItineraryBuilder::new(&table, &self.config).build(&inputs)
    }

    fn report(
        &self,
        request: &FeasibilityRequest,
        session: &Session,
        table: &DistanceTable,
    ) -> FeasibilityReport {
        FeasibilityAnalyzer::new(table, &self.config).check(
            &request.start,
            &session.stops,
            session.invalid.len(),
            request.number_of_days,
            request.max_driving_hours_per_day,
        )
    }

    fn open_session(&self, start: &str, selections: &[PlaceSelection]) -> Session {
        let places = self.catalog.list_places();
        let session = Session::resolve(&places, selections, &self.config);
        debug!(
            start,
            catalog = places.len(),
            valid = session.stops.len(),
            invalid = session.invalid.len(),
            duplicates = session.duplicates.len(),
            "selections resolved"
        );
        session
    }
}

/// Per-request view of the catalog and selections.
struct Session {
    stops: Vec<ResolvedStop>,
    invalid: Vec<String>,
    duplicates: Vec<String>,
    estimator: EstimatedDistanceProvider,
}

impl Session {
    fn resolve(places: &[Place], selections: &[PlaceSelection], config: &PlannerConfig) -> Self {
        let by_name: HashMap<&str, &Place> =
            places.iter().map(|place| (place.name.as_str(), place)).collect();

        let mut seen: HashSet<&str> = HashSet::new();
        let mut stops = Vec::new();
        let mut invalid = Vec::new();
        let mut duplicates = Vec::new();

        for selection in selections {
            let name = selection.place_name.as_str();
            match by_name.get(name) {
                None => invalid.push(selection.place_name.clone()),
                Some(_) if !seen.insert(name) => duplicates.push(selection.place_name.clone()),
                Some(place) => stops.push(ResolvedStop::new(place, selection)),
            }
        }

        Self {
            stops,
            invalid,
            duplicates,
            estimator: EstimatedDistanceProvider::from_places(places, config),
        }
    }

    fn locations(&self, start: &str) -> Vec<String> {
        std::iter::once(start.to_string())
            .chain(self.stops.iter().map(|stop| stop.name.clone()))
            .collect()
    }

    fn notices(&self) -> Vec<String> {
        let unknown = self
            .invalid
            .iter()
            .map(|name| format!("{name} is not a known place and was ignored"));
        let repeated = self
            .duplicates
            .iter()
            .map(|name| format!("{name} was selected more than once; later selections were ignored"));
        unknown.chain(repeated).collect()
    }
}
