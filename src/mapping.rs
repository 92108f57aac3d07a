//! HTTP adapter for a distance-matrix mapping service.
//!
//! Speaks the Google Distance Matrix wire format: one request carries up to
//! `max_elements` origin/destination pairs, and at most `max_origins` and
//! `max_destinations` on either side. The answer has a row per origin and an
//! element per destination, with a status on both levels.

use std::env;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::distance::{DistanceMatrix, DistanceMatrixEntry};
use crate::error::DistanceError;
use crate::traits::DistanceProvider;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com";
const MATRIX_PATH: &str = "/maps/api/distancematrix/json";

#[derive(Debug, Clone)]
pub struct MappingConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
    /// Origin/destination pairs the service accepts per request.
    pub max_elements: usize,
    pub max_origins: usize,
    pub max_destinations: usize,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            timeout_secs: 10,
            max_elements: 100,
            max_origins: 25,
            max_destinations: 25,
        }
    }
}

impl MappingConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Read `TOUR_PLANNER_MAPS_API_KEY`, `TOUR_PLANNER_MAPS_BASE_URL` and
    /// `TOUR_PLANNER_MAPS_TIMEOUT_SECS`, keeping defaults for anything unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(key) = env::var("TOUR_PLANNER_MAPS_API_KEY") {
            config.api_key = key;
        }
        if let Ok(url) = env::var("TOUR_PLANNER_MAPS_BASE_URL") {
            config.base_url = url;
        }
        if let Some(secs) = env::var("TOUR_PLANNER_MAPS_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse().ok())
        {
            config.timeout_secs = secs;
        }
        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_limits(
        mut self,
        max_elements: usize,
        max_origins: usize,
        max_destinations: usize,
    ) -> Self {
        self.max_elements = max_elements;
        self.max_origins = max_origins;
        self.max_destinations = max_destinations;
        self
    }
}

#[derive(Debug, Clone)]
pub struct HttpDistanceProvider {
    config: MappingConfig,
    client: reqwest::blocking::Client,
}

impl HttpDistanceProvider {
    pub fn new(config: MappingConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn matrix_url(&self) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), MATRIX_PATH)
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> DistanceError {
        if error.is_timeout() {
            return DistanceError::Timeout {
                url: url.to_string(),
                timeout_secs: self.config.timeout_secs,
            };
        }

        if let Some(status) = error.status() {
            return DistanceError::Http {
                url: url.to_string(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        DistanceError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

impl DistanceProvider for HttpDistanceProvider {
    fn distance_matrix(
        &self,
        origins: &[String],
        destinations: &[String],
    ) -> Result<DistanceMatrix, DistanceError> {
        if origins.is_empty() || destinations.is_empty() {
            return Ok(vec![Vec::new(); origins.len()]);
        }

        if origins.len() > self.config.max_origins
            || destinations.len() > self.config.max_destinations
        {
            return Err(DistanceError::DimensionLimitExceeded {
                origins: origins.len(),
                destinations: destinations.len(),
                max_origins: self.config.max_origins,
                max_destinations: self.config.max_destinations,
            });
        }

        let requested = origins.len() * destinations.len();
        if requested > self.config.max_elements {
            return Err(DistanceError::PairLimitExceeded {
                requested,
                limit: self.config.max_elements,
            });
        }

        let url = self.matrix_url();
        let origins_param = origins.join("|");
        let destinations_param = destinations.join("|");
        debug!(
            origins = origins.len(),
            destinations = destinations.len(),
            "requesting distance matrix"
        );

        // Body reads share the request timeout, so they fail like the send.
        let bytes = self
            .client
            .get(&url)
            .query(&[
                ("origins", origins_param.as_str()),
                ("destinations", destinations_param.as_str()),
                ("mode", "driving"),
                ("units", "metric"),
                ("key", self.config.api_key.as_str()),
            ])
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.bytes())
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;
        let body: MatrixResponse =
            serde_json::from_slice(&bytes).map_err(|err| DistanceError::Malformed {
                message: err.to_string(),
            })?;

        convert_response(body, origins.len(), destinations.len())
    }

    fn max_pairs_per_request(&self) -> usize {
        self.config.max_elements
    }

    fn max_origins_per_request(&self) -> usize {
        self.config.max_origins
    }

    fn max_destinations_per_request(&self) -> usize {
        self.config.max_destinations
    }
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    distance: Option<Measure>,
    duration: Option<Measure>,
}

#[derive(Debug, Deserialize)]
struct Measure {
    value: u64,
}

fn convert_response(
    response: MatrixResponse,
    n_origins: usize,
    n_destinations: usize,
) -> Result<DistanceMatrix, DistanceError> {
    if response.status != "OK" {
        return Err(DistanceError::Service {
            code: response.status,
            message: response.error_message.unwrap_or_default(),
        });
    }

    if response.rows.len() != n_origins
        || response
            .rows
            .iter()
            .any(|row| row.elements.len() != n_destinations)
    {
        return Err(DistanceError::Malformed {
            message: format!(
                "expected {n_origins}x{n_destinations} elements, got {} rows",
                response.rows.len()
            ),
        });
    }

    // Element-level failures (NOT_FOUND, ZERO_RESULTS, ...) mean no route
    // for that pair only.
    Ok(response
        .rows
        .into_iter()
        .map(|row| {
            row.elements
                .into_iter()
                .map(|element| match (element.status.as_str(), element.distance, element.duration) {
                    ("OK", Some(distance), Some(duration)) => {
                        DistanceMatrixEntry::route(distance.value, duration.value)
                    }
                    _ => DistanceMatrixEntry::Unreachable,
                })
                .collect()
        })
        .collect())
}
