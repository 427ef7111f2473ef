//! Haversine distance estimator (fallback when the live matrix is unavailable).
//!
//! Uses great-circle distance and an assumed speed to estimate travel time.
//! Ignores roads and traffic, but never fails.

use crate::model::{Coordinate, DistanceMatrix, DistanceMatrixEntry, MatrixSource, PointDistance};
use crate::traits::DistanceMatrixProvider;

/// Average urban driving speed assumption for time estimation.
pub const DEFAULT_SPEED_KMH: f64 = 30.0;

/// Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two points in meters.
pub fn haversine_meters(from: Coordinate, to: Coordinate) -> f64 {
    let lat1_rad = from.latitude.to_radians();
    let lat2_rad = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lng = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Haversine-based distance matrix provider.
///
/// Every measurement it produces is marked [`MatrixSource::Estimated`].
#[derive(Debug, Clone)]
pub struct HaversineMatrix {
    /// Assumed average driving speed in km/h.
    pub speed_kmh: f64,
}

impl Default for HaversineMatrix {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl HaversineMatrix {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }

    /// Convert a distance in meters to travel time in seconds.
    fn meters_to_seconds(&self, meters: f64) -> f64 {
        let hours = meters / 1000.0 / self.speed_kmh;
        (hours * 3600.0).round()
    }
}

impl DistanceMatrixProvider for HaversineMatrix {
    fn matrix(&self, origin: Coordinate, destinations: &[Coordinate]) -> DistanceMatrix {
        let entries = destinations
            .iter()
            .enumerate()
            .map(|(index, destination)| {
                let meters = haversine_meters(origin, *destination);
                DistanceMatrixEntry {
                    destination_index: index,
                    distance_meters: meters.round(),
                    duration_seconds: self.meters_to_seconds(meters),
                    duration_in_traffic_seconds: None,
                }
            })
            .collect();

        DistanceMatrix::estimated(entries)
    }

    fn point_distance(&self, from: Coordinate, to: Coordinate) -> PointDistance {
        PointDistance {
            meters: haversine_meters(from, to),
            source: MatrixSource::Estimated,
        }
    }
}
