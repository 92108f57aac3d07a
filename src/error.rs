//! Error types for distance lookups and plan construction.

use thiserror::Error;

/// Failure talking to an external distance provider.
///
/// Every variant means the provider is unavailable for this request. Callers
/// recover by switching to the estimated distance mode; a pair that simply
/// has no road between it is not an error and is reported as
/// [`DistanceMatrixEntry::Unreachable`](crate::distance::DistanceMatrixEntry::Unreachable).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DistanceError {
    /// The request did not complete within the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },
    /// The service answered with a non-success HTTP status.
    #[error("request to {url} failed with HTTP {status}: {message}")]
    Http {
        url: String,
        status: u16,
        message: String,
    },
    /// The request could not be sent or the connection dropped.
    #[error("network error calling {url}: {message}")]
    Network { url: String, message: String },
    /// The service answered but reported a non-OK status.
    #[error("distance service returned {code}: {message}")]
    Service { code: String, message: String },
    /// The response body could not be understood.
    #[error("malformed distance response: {message}")]
    Malformed { message: String },
    /// The batch is larger than the provider accepts in one call.
    #[error("{requested} origin/destination pairs exceed the provider limit of {limit}")]
    PairLimitExceeded { requested: usize, limit: usize },
    /// The batch has more origins or destinations than one call accepts.
    #[error(
        "{origins} origins x {destinations} destinations exceed the provider limit of {max_origins} x {max_destinations}"
    )]
    DimensionLimitExceeded {
        origins: usize,
        destinations: usize,
        max_origins: usize,
        max_destinations: usize,
    },
}

/// Failure building a tour plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("invalid plan request: {reason}")]
    InvalidRequest { reason: String },
    /// Every remaining candidate is unreachable from `from`.
    #[error("no drivable route from {from} to any remaining place")]
    NoRouteFound { from: String },
    /// Even with every place excluded the trip does not fit.
    #[error("no plan fits the requested days and return deadline (excluded: {})", .excluded_places.join(", "))]
    PlanUnachievable { excluded_places: Vec<String> },
    #[error("planning request was cancelled")]
    Cancelled,
}
