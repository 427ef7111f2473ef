//! Savings accounting for optimized routes.
//!
//! The fixed-discount estimate is an approximation: it applies a flat share
//! to the courier-to-stops matrix totals and does not look at the computed
//! order. [`SavingsEstimator::compare`] measures both orders instead.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::config::SavingsConfig;
use crate::model::{Coordinate, DistanceMatrix, Stop};
use crate::traits::DistanceMatrixProvider;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Savings {
    pub time_minutes: i64,
    pub distance_km: f64,
}

impl Savings {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn from_meters_seconds(meters: f64, seconds: f64) -> Self {
        Self {
            time_minutes: (seconds / 60.0).round() as i64,
            distance_km: round_km(meters / 1000.0),
        }
    }

    /// Re-round the distance after summing.
    pub fn rounded(self) -> Self {
        Self {
            time_minutes: self.time_minutes,
            distance_km: round_km(self.distance_km),
        }
    }
}

impl AddAssign for Savings {
    fn add_assign(&mut self, other: Self) {
        self.time_minutes += other.time_minutes;
        self.distance_km += other.distance_km;
    }
}

/// One decimal place.
pub fn round_km(km: f64) -> f64 {
    (km * 10.0).round() / 10.0
}

/// Length of a route measured through a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RouteLength {
    pub meters: f64,
    pub seconds: f64,
    pub estimated: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SavingsEstimator {
    config: SavingsConfig,
}

impl SavingsEstimator {
    pub fn new(config: SavingsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SavingsConfig {
        &self.config
    }

    /// Flat share of the matrix totals: distance by `distance_discount`,
    /// traffic-aware time by `time_discount`.
    pub fn estimate(&self, matrix: &DistanceMatrix) -> Savings {
        let distance_saving = matrix.total_distance_meters() * self.config.distance_discount;
        let time_saving = matrix.total_duration_seconds() * self.config.time_discount;

        Savings::from_meters_seconds(distance_saving, time_saving)
    }

    /// Measured length of `original` minus measured length of `optimized`,
    /// both starting at `origin`. Negative when the new order is longer.
    pub fn compare<M>(
        &self,
        provider: &M,
        origin: Coordinate,
        original: &[Stop],
        optimized: &[Stop],
    ) -> (Savings, bool)
    where
        M: DistanceMatrixProvider + ?Sized,
    {
        let before = route_length(provider, origin, original);
        let after = route_length(provider, origin, optimized);

        let savings = Savings::from_meters_seconds(before.meters - after.meters, before.seconds - after.seconds);
        (savings, before.estimated || after.estimated)
    }
}

/// Sum of leg lengths visiting `stops` in order from `origin`.
///
/// Stops without a usable destination are skipped.
pub fn route_length<M>(provider: &M, origin: Coordinate, stops: &[Stop]) -> RouteLength
where
    M: DistanceMatrixProvider + ?Sized,
{
    let mut length = RouteLength::default();
    let mut cursor = origin;

    for destination in stops.iter().filter_map(Stop::measurable_destination) {
        let leg = provider.matrix(cursor, &[destination]);
        length.meters += leg.total_distance_meters();
        length.seconds += leg.total_duration_seconds();
        length.estimated |= leg.is_estimated();
        cursor = destination;
    }

    length
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::haversine::HaversineMatrix;
    use crate::model::DistanceMatrixEntry;

    fn matrix(values: &[(f64, f64, Option<f64>)]) -> DistanceMatrix {
        DistanceMatrix::live(
            values
                .iter()
                .enumerate()
                .map(|(i, &(distance, duration, traffic))| DistanceMatrixEntry {
                    destination_index: i,
                    distance_meters: distance,
                    duration_seconds: duration,
                    duration_in_traffic_seconds: traffic,
                })
                .collect(),
        )
    }

    #[test]
    fn test_fixed_discount() {
        let estimator = SavingsEstimator::default();
        // 10 km total -> 1.5 km; 3000 s with traffic -> 600 s = 10 min
        let savings = estimator.estimate(&matrix(&[(4000.0, 900.0, Some(1200.0)), (6000.0, 1800.0, None)]));
        assert_eq!(savings.distance_km, 1.5);
        assert_eq!(savings.time_minutes, 10);
    }

    #[test]
    fn test_rounding() {
        let estimator = SavingsEstimator::default();
        // 1234 m * 0.15 = 185.1 m -> 0.2 km; 100 s * 0.2 = 20 s -> 0 min
        let savings = estimator.estimate(&matrix(&[(1234.0, 100.0, None)]));
        assert_eq!(savings.distance_km, 0.2);
        assert_eq!(savings.time_minutes, 0);
        assert_eq!(estimator.estimate(&matrix(&[])), Savings::zero());
    }

    #[test]
    fn test_totals_accumulate() {
        let mut total = Savings::zero();
        total += Savings {
            time_minutes: 3,
            distance_km: 0.1,
        };
        total += Savings {
            time_minutes: 4,
            distance_km: 0.2,
        };
        let total = total.rounded();
        assert_eq!(total.time_minutes, 7);
        assert_eq!(total.distance_km, 0.3);
    }

    #[test]
    fn test_compare_measures_both_orders() {
        let provider = HaversineMatrix::default();
        let origin = Coordinate::new(45.4642, 9.19);
        let near = Stop::new("near", "c1", Coordinate::new(45.4650, 9.19));
        let far = Stop::new("far", "c1", Coordinate::new(45.4900, 9.19));

        let estimator = SavingsEstimator::default();
        let (savings, estimated) = estimator.compare(
            &provider,
            origin,
            &[far.clone(), near.clone()],
            &[near.clone(), far.clone()],
        );
        assert!(estimated);
        assert!(savings.distance_km > 2.0, "got {:?}", savings);
        assert!(savings.time_minutes > 0);

        let (same, _) = estimator.compare(&provider, origin, &[near.clone(), far.clone()], &[near, far]);
        assert_eq!(same, Savings::zero());
    }
}
