//! tour-planner: multi-day coach tour itineraries.
//!
//! Given a start location, a set of prioritized places, a number of days and
//! a daily driving cap, the planner orders the places with a greedy
//! nearest-neighbor walk, cuts the route into calendar days, and drops
//! low-priority places when the trip cannot fit. Distances come from an
//! injected [`DistanceProvider`] and fall back to estimates when the
//! provider is unavailable.

pub mod cancel;
pub mod config;
pub mod distance;
pub mod error;
pub mod feasibility;
pub mod haversine;
pub mod itinerary;
pub mod mapping;
pub mod model;
pub mod planner;
pub mod sequencer;
pub mod traits;

pub use cancel::Cancellation;
pub use config::PlannerConfig;
pub use distance::{DistanceMatrix, DistanceMatrixEntry, DistanceTable};
pub use error::{DistanceError, PlanError};
pub use feasibility::FeasibilityAnalyzer;
pub use haversine::EstimatedDistanceProvider;
pub use itinerary::{ItineraryBuilder, PlanInputs};
pub use mapping::{HttpDistanceProvider, MappingConfig};
pub use model::{
    DayItinerary, FeasibilityReport, Place, PlaceSelection, Priority, ResolvedStop, Stop,
    StopKind, TourPlan, Verdict,
};
pub use planner::{FeasibilityRequest, PlanRequest, TourPlanner};
pub use traits::{DistanceProvider, PlaceCatalog};
