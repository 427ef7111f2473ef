//! Google Distance Matrix HTTP adapter with traffic-aware durations.
//!
//! Any failure (network, timeout, non-OK status, malformed body) degrades to
//! the haversine estimator for that single call.

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::parse_or;
use crate::error::ConfigError;
use crate::haversine::{DEFAULT_SPEED_KMH, HaversineMatrix};
use crate::model::{Coordinate, DistanceMatrix, DistanceMatrixEntry, MatrixSource, PointDistance};
use crate::traits::DistanceMatrixProvider;

pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/distancematrix/json";

#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Status { status: String, message: String },

    #[error("element {index} failed with status {status}")]
    Element { index: usize, status: String },

    #[error("expected {expected} elements, got {actual}")]
    IncompleteResponse { expected: usize, actual: usize },
}

#[derive(Debug, Clone)]
pub struct GoogleMapsConfig {
    pub api_key: String,
    pub base_url: String,
    pub mode: String,
    pub traffic_model: String,
    pub timeout_secs: u64,
    /// Speed assumed by the haversine fallback.
    pub fallback_speed_kmh: f64,
}

impl GoogleMapsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            mode: "driving".to_string(),
            traffic_model: "best_guess".to_string(),
            timeout_secs: 10,
            fallback_speed_kmh: DEFAULT_SPEED_KMH,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GOOGLE_MAPS_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::Missing("GOOGLE_MAPS_API_KEY"))?;
        let defaults = Self::new(api_key);

        Ok(Self {
            base_url: lookup("GOOGLE_MAPS_BASE_URL").unwrap_or(defaults.base_url.clone()),
            timeout_secs: parse_or(&lookup, "GOOGLE_MAPS_TIMEOUT_SECS", defaults.timeout_secs)?,
            ..defaults
        })
    }
}

/// Live distance-matrix client.
///
/// Implements [`DistanceMatrixProvider`] and never fails: errors are logged
/// and answered by the embedded [`HaversineMatrix`].
#[derive(Debug, Clone)]
pub struct GoogleMapsClient {
    config: GoogleMapsConfig,
    client: reqwest::blocking::Client,
    fallback: HaversineMatrix,
}

impl GoogleMapsClient {
    pub fn new(config: GoogleMapsConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        let fallback = HaversineMatrix::new(config.fallback_speed_kmh);

        Ok(Self {
            config,
            client,
            fallback,
        })
    }

    /// Fetch one row of the matrix. `traffic` adds `departure_time=now`.
    pub fn fetch(
        &self,
        origin: Coordinate,
        destinations: &[Coordinate],
        traffic: bool,
    ) -> Result<Vec<DistanceMatrixEntry>, MatrixError> {
        let destinations_param = destinations
            .iter()
            .map(Coordinate::to_query_value)
            .collect::<Vec<_>>()
            .join("|");

        let mut params = vec![
            ("origins", origin.to_query_value()),
            ("destinations", destinations_param),
            ("mode", self.config.mode.clone()),
            ("key", self.config.api_key.clone()),
        ];
        if traffic {
            params.push(("departure_time", "now".to_string()));
            params.push(("traffic_model", self.config.traffic_model.clone()));
        }

        let body = self
            .client
            .get(&self.config.base_url)
            .query(&params)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<DistanceMatrixResponse>())?;

        entries_from_response(body, destinations.len())
    }
}

impl DistanceMatrixProvider for GoogleMapsClient {
    fn matrix(&self, origin: Coordinate, destinations: &[Coordinate]) -> DistanceMatrix {
        if destinations.is_empty() {
            return DistanceMatrix::live(Vec::new());
        }

        match self.fetch(origin, destinations, true) {
            Ok(entries) => {
                debug!(destinations = destinations.len(), "distance matrix fetched");
                DistanceMatrix::live(entries)
            }
            Err(err) => {
                warn!(error = %err, destinations = destinations.len(), "distance matrix unavailable, using haversine estimate");
                self.fallback.matrix(origin, destinations)
            }
        }
    }

    fn point_distance(&self, from: Coordinate, to: Coordinate) -> PointDistance {
        match self.fetch(from, &[to], false) {
            Ok(entries) => PointDistance {
                meters: entries[0].distance_meters,
                source: MatrixSource::Live,
            },
            Err(err) => {
                warn!(error = %err, "point distance unavailable, using haversine estimate");
                self.fallback.point_distance(from, to)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct DistanceMatrixResponse {
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
    distance: Option<MatrixValue>,
    duration: Option<MatrixValue>,
    duration_in_traffic: Option<MatrixValue>,
}

#[derive(Debug, Deserialize)]
struct MatrixValue {
    value: f64,
}

fn entries_from_response(
    body: DistanceMatrixResponse,
    expected: usize,
) -> Result<Vec<DistanceMatrixEntry>, MatrixError> {
    if body.status != "OK" {
        return Err(MatrixError::Status {
            status: body.status,
            message: body.error_message.unwrap_or_default(),
        });
    }

    let elements = body
        .rows
        .into_iter()
        .next()
        .map(|row| row.elements)
        .unwrap_or_default();
    if elements.len() != expected {
        return Err(MatrixError::IncompleteResponse {
            expected,
            actual: elements.len(),
        });
    }

    elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| {
            let MatrixElement {
                status,
                distance,
                duration,
                duration_in_traffic,
            } = element;

            match (distance, duration) {
                (Some(distance), Some(duration)) if status == "OK" => Ok(DistanceMatrixEntry {
                    destination_index: index,
                    distance_meters: distance.value,
                    duration_seconds: duration.value,
                    duration_in_traffic_seconds: duration_in_traffic.map(|value| value.value),
                }),
                _ => Err(MatrixError::Element { index, status }),
            }
        })
        .collect()
}
