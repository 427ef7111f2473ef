//! Per-courier stop sequencing.
//!
//! Priority-aware nearest neighbour: stops already in progress keep their
//! relative order at the head of the route, then pending stops are appended
//! one at a time, always choosing the one with the shortest traffic-aware
//! duration from the last placed stop.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::RecurrentRouteCache;
use crate::model::{Coordinate, DistanceMatrix, Stop, StopStatus};
use crate::traits::DistanceMatrixProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationMethod {
    RecurrentRoute,
    DistanceMatrix,
    None,
}

#[derive(Debug, Clone)]
pub struct SequencedRoute {
    pub stops: Vec<Stop>,
    pub method: OptimizationMethod,
    /// Courier-to-stops matrix; only present when the order was computed.
    pub origin_matrix: Option<DistanceMatrix>,
    pub used_fallback: bool,
}

impl SequencedRoute {
    pub fn is_optimized(&self) -> bool {
        self.method != OptimizationMethod::None
    }
}

pub struct RouteSequencer<'a, M: ?Sized> {
    provider: &'a M,
    cache: &'a RecurrentRouteCache,
}

impl<'a, M> RouteSequencer<'a, M>
where
    M: DistanceMatrixProvider + ?Sized,
{
    pub fn new(provider: &'a M, cache: &'a RecurrentRouteCache) -> Self {
        Self { provider, cache }
    }

    /// Order `stops` for the courier at `origin`.
    ///
    /// Returns a new sequence; the input is left untouched.
    pub fn sequence(&self, courier_id: &str, origin: Coordinate, stops: &[Stop]) -> SequencedRoute {
        if stops.len() <= 1 {
            return SequencedRoute {
                stops: stops.to_vec(),
                method: OptimizationMethod::None,
                origin_matrix: None,
                used_fallback: false,
            };
        }

        let ids = stop_ids(stops);
        if let Some(order) = self.cache.lookup(courier_id, &ids) {
            let recurrent = reorder_by_ids(stops, &order);
            if leads_with_in_progress(stops, &recurrent) {
                return SequencedRoute {
                    stops: recurrent,
                    method: OptimizationMethod::RecurrentRoute,
                    origin_matrix: None,
                    used_fallback: false,
                };
            }
            debug!(courier_id, "recurrent order defers a stop in progress, recomputing");
        }

        let route = self.nearest_neighbour(origin, stops);
        self.cache.record(courier_id, &stop_ids(&route.stops));
        route
    }

    fn nearest_neighbour(&self, origin: Coordinate, stops: &[Stop]) -> SequencedRoute {
        let mut order: Vec<usize> = Vec::with_capacity(stops.len());
        let mut remaining: Vec<usize> = Vec::new();
        let mut unmeasurable: Vec<usize> = Vec::new();

        for (index, stop) in stops.iter().enumerate() {
            if stop.status == StopStatus::InProgress {
                order.push(index);
            } else if stop.measurable_destination().is_some() {
                remaining.push(index);
            } else {
                warn!(stop_id = %stop.id, "stop has no usable destination, placing it last");
                unmeasurable.push(index);
            }
        }

        let measured: Vec<usize> = (0..stops.len())
            .filter(|&index| stops[index].measurable_destination().is_some())
            .collect();
        let destinations = destinations_of(stops, &measured);
        let origin_matrix = self.provider.matrix(origin, &destinations);
        let mut used_fallback = origin_matrix.is_estimated();

        // Continue from the last in-progress stop we can locate, otherwise
        // seed from the courier position.
        let mut cursor = order
            .iter()
            .rev()
            .find_map(|&index| stops[index].measurable_destination());

        if cursor.is_none() && !remaining.is_empty() {
            let seed = origin_matrix
                .entries
                .iter()
                .filter_map(|entry| {
                    let index = *measured.get(entry.destination_index)?;
                    remaining.contains(&index).then_some((index, entry.effective_duration()))
                })
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(index, _)| index)
                .unwrap_or(remaining[0]);

            debug!(stop_id = %stops[seed].id, "seeded route from courier position");
            remaining.retain(|&index| index != seed);
            order.push(seed);
            cursor = stops[seed].measurable_destination();
        }

        while !remaining.is_empty() {
            let pick = if remaining.len() == 1 {
                0
            } else {
                let from = cursor.unwrap_or(origin);
                let matrix = self.provider.matrix(from, &destinations_of(stops, &remaining));
                used_fallback |= matrix.is_estimated();
                matrix
                    .closest()
                    .filter(|&position| position < remaining.len())
                    .unwrap_or(0)
            };

            let next = remaining.remove(pick);
            debug!(stop_id = %stops[next].id, left = remaining.len(), "appended nearest stop");
            order.push(next);
            cursor = stops[next].measurable_destination();
        }

        order.extend(unmeasurable);

        SequencedRoute {
            stops: order.into_iter().map(|index| stops[index].clone()).collect(),
            method: OptimizationMethod::DistanceMatrix,
            origin_matrix: Some(origin_matrix),
            used_fallback,
        }
    }
}

fn destinations_of(stops: &[Stop], indices: &[usize]) -> Vec<Coordinate> {
    indices
        .iter()
        .filter_map(|&index| stops[index].measurable_destination())
        .collect()
}

/// `route` opens with exactly the in-progress stops of `stops`, in input order.
fn leads_with_in_progress(stops: &[Stop], route: &[Stop]) -> bool {
    let active: Vec<&str> = stops
        .iter()
        .filter(|stop| stop.status == StopStatus::InProgress)
        .map(|stop| stop.id.as_str())
        .collect();

    route.len() == stops.len()
        && route
            .iter()
            .take(active.len())
            .map(|stop| stop.id.as_str())
            .eq(active.iter().copied())
}

pub fn stop_ids(stops: &[Stop]) -> Vec<String> {
    stops.iter().map(|stop| stop.id.clone()).collect()
}

/// `stops` rearranged to follow `order`; ids no longer present are dropped.
pub fn reorder_by_ids(stops: &[Stop], order: &[String]) -> Vec<Stop> {
    order
        .iter()
        .filter_map(|id| stops.iter().find(|stop| &stop.id == id))
        .cloned()
        .collect()
}
