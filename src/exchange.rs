//! Cross-courier stop exchanges.
//!
//! For every pair of nearby active couriers, every combination of one stop
//! from each is checked: if handing each stop to the other courier shortens
//! the combined courier-to-stop distance, the swap is suggested.

use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ExchangeConfig;
use crate::model::{Coordinate, Courier, MatrixSource, PointDistance, Stop};
use crate::savings::round_km;
use crate::traits::{DistanceMatrixProvider, StopSwap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourierRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopRef {
    pub id: String,
    pub client_name: String,
    pub address: String,
}

/// Hand `delivery1` from `courier1` to `courier2` and `delivery2` the
/// other way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeSuggestion {
    pub courier1: CourierRef,
    pub courier2: CourierRef,
    pub delivery1: StopRef,
    pub delivery2: StopRef,
    pub distance_saving_km: f64,
    pub time_saving_minutes: i64,
    pub used_fallback: bool,
}

impl ExchangeSuggestion {
    pub fn as_swap(&self) -> StopSwap {
        StopSwap {
            first_stop: self.delivery1.id.clone(),
            first_courier: self.courier1.id.clone(),
            second_stop: self.delivery2.id.clone(),
            second_courier: self.courier2.id.clone(),
        }
    }
}

pub struct ExchangeFinder<'a, M: ?Sized> {
    provider: &'a M,
    config: ExchangeConfig,
}

impl<'a, M> ExchangeFinder<'a, M>
where
    M: DistanceMatrixProvider + Sync + ?Sized,
{
    pub fn new(provider: &'a M, config: ExchangeConfig) -> Self {
        Self { provider, config }
    }

    /// Suggestions across all courier pairs, highest time saving first.
    ///
    /// A stop may show up in several suggestions; callers accepting more
    /// than one must arbitrate between them.
    pub fn find_exchanges(&self, couriers: &[Courier], stops: &[Stop]) -> Vec<ExchangeSuggestion> {
        let mut by_courier: HashMap<&str, Vec<&Stop>> = HashMap::new();
        for stop in stops.iter().filter(|stop| stop.status.is_open()) {
            by_courier.entry(stop.courier_id.as_str()).or_default().push(stop);
        }

        let candidates: Vec<(&Courier, Coordinate, &[&Stop])> = couriers
            .iter()
            .filter(|courier| courier.is_active())
            .filter_map(|courier| {
                let location = courier.location.filter(Coordinate::is_valid)?;
                let stops = by_courier.get(courier.id.as_str())?;
                Some((courier, location, stops.as_slice()))
            })
            .collect();

        let pairs: Vec<(usize, usize)> = (0..candidates.len())
            .flat_map(|i| (i + 1..candidates.len()).map(move |j| (i, j)))
            .collect();

        let mut suggestions: Vec<ExchangeSuggestion> = pairs
            .par_iter()
            .flat_map_iter(|&(i, j)| self.pair_exchanges(candidates[i], candidates[j]))
            .collect();

        suggestions.sort_by(|a, b| b.time_saving_minutes.cmp(&a.time_saving_minutes));
        suggestions
    }

    fn pair_exchanges(
        &self,
        (courier1, location1, stops1): (&Courier, Coordinate, &[&Stop]),
        (courier2, location2, stops2): (&Courier, Coordinate, &[&Stop]),
    ) -> Vec<ExchangeSuggestion> {
        let gap = self.provider.point_distance(location1, location2);
        if gap.meters > self.config.max_courier_distance_m {
            debug!(
                courier1 = %courier1.id,
                courier2 = %courier2.id,
                meters = gap.meters,
                "couriers too far apart to exchange"
            );
            return Vec::new();
        }

        let from1 = self.distances_from(location1, stops1, stops2);
        let from2 = self.distances_from(location2, stops1, stops2);

        let mut suggestions = Vec::new();
        for (a, stop1) in stops1.iter().enumerate() {
            for (b, stop2) in stops2.iter().enumerate() {
                let (Some(keep1), Some(keep2), Some(take2), Some(take1)) =
                    (from1.first[a], from2.second[b], from1.second[b], from2.first[a])
                else {
                    continue;
                };

                let current = keep1.meters + keep2.meters;
                let swapped = take2.meters + take1.meters;
                if swapped >= current {
                    continue;
                }

                let saving_km = (current - swapped) / 1000.0;
                let used_fallback = [gap, keep1, keep2, take1, take2]
                    .iter()
                    .any(|distance| distance.source == MatrixSource::Estimated);

                suggestions.push(ExchangeSuggestion {
                    courier1: courier_ref(courier1),
                    courier2: courier_ref(courier2),
                    delivery1: stop_ref(stop1),
                    delivery2: stop_ref(stop2),
                    distance_saving_km: round_km(saving_km),
                    time_saving_minutes: (saving_km * 60.0 / self.config.urban_speed_kmh).round() as i64,
                    used_fallback,
                });
            }
        }

        suggestions
    }

    /// Distances from `origin` to each stop of both couriers.
    fn distances_from(&self, origin: Coordinate, first: &[&Stop], second: &[&Stop]) -> PairDistances {
        PairDistances {
            first: self.measure(origin, first),
            second: self.measure(origin, second),
        }
    }

    /// Stops without a usable destination get `None`.
    fn measure(&self, origin: Coordinate, stops: &[&Stop]) -> Vec<Option<PointDistance>> {
        stops
            .iter()
            .map(|stop| {
                stop.measurable_destination()
                    .map(|destination| self.provider.point_distance(origin, destination))
            })
            .collect()
    }
}

/// Distances from one courier to the stops of both couriers in a pair.
struct PairDistances {
    first: Vec<Option<PointDistance>>,
    second: Vec<Option<PointDistance>>,
}

fn courier_ref(courier: &Courier) -> CourierRef {
    CourierRef {
        id: courier.id.clone(),
        name: courier.full_name(),
    }
}

fn stop_ref(stop: &Stop) -> StopRef {
    StopRef {
        id: stop.id.clone(),
        client_name: stop.client_name.clone(),
        address: stop.address.clone(),
    }
}
