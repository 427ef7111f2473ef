//! Optimization entry points for calling layers.
//!
//! Computation (`optimize_*`) never writes to the store; the `apply_*`
//! operations persist a result the caller has accepted.

use std::sync::Arc;

use jiff::Timestamp;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache::RecurrentRouteCache;
use crate::config::{OptimizerConfig, SavingsMode};
use crate::error::OptimizerError;
use crate::exchange::{ExchangeFinder, ExchangeSuggestion};
use crate::model::{Coordinate, Courier, Stop};
use crate::savings::{Savings, SavingsEstimator};
use crate::sequencer::{OptimizationMethod, RouteSequencer, stop_ids};
use crate::traits::{DistanceMatrixProvider, RouteStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    pub optimized: bool,
    pub method: OptimizationMethod,
    pub original_route: Vec<Stop>,
    pub optimized_route: Vec<Stop>,
    pub savings: Savings,
    /// Some measurement behind this result came from the estimator.
    pub used_fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourierOptimization {
    pub courier_id: String,
    pub courier_name: String,
    #[serde(flatten)]
    pub result: OptimizationResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetOptimization {
    pub courier_optimizations: Vec<CourierOptimization>,
    pub exchange_suggestions: Vec<ExchangeSuggestion>,
    pub total_savings: Savings,
}

pub struct RouteOptimizer<S, M> {
    store: S,
    provider: M,
    cache: Arc<RecurrentRouteCache>,
    savings: SavingsEstimator,
    config: OptimizerConfig,
}

impl<S, M> RouteOptimizer<S, M>
where
    S: RouteStore + Sync,
    M: DistanceMatrixProvider + Sync,
{
    pub fn new(store: S, provider: M, config: OptimizerConfig) -> Self {
        Self {
            store,
            provider,
            cache: Arc::new(RecurrentRouteCache::new(config.cache_capacity)),
            savings: SavingsEstimator::new(config.savings.clone()),
            config,
        }
    }

    /// Share a recurrence cache between optimizer instances.
    pub fn with_cache(mut self, cache: Arc<RecurrentRouteCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &Arc<RecurrentRouteCache> {
        &self.cache
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn optimize_courier_route(&self, courier_id: &str) -> Result<OptimizationResult, OptimizerError> {
        let courier = self
            .store
            .courier(courier_id)?
            .ok_or_else(|| OptimizerError::CourierNotFound(courier_id.to_string()))?;
        let stops = self.store.open_stops_for(courier_id)?;

        Ok(self.optimize_stops(&courier, stops))
    }

    /// Optimize every active courier, then look for exchanges between them.
    pub fn optimize_all_routes(&self) -> Result<FleetOptimization, OptimizerError> {
        let couriers = self.store.active_couriers()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.max_parallel_couriers)
            .build()?;

        let courier_optimizations = pool.install(|| {
            couriers
                .par_iter()
                .map(|courier| {
                    let stops = self.store.open_stops_for(&courier.id)?;
                    Ok(CourierOptimization {
                        courier_id: courier.id.clone(),
                        courier_name: courier.full_name(),
                        result: self.optimize_stops(courier, stops),
                    })
                })
                .collect::<Result<Vec<_>, OptimizerError>>()
        })?;

        let stops = self.store.open_stops()?;
        let finder = ExchangeFinder::new(&self.provider, self.config.exchange.clone());
        let exchange_suggestions = pool.install(|| finder.find_exchanges(&couriers, &stops));

        let mut total_savings = Savings::zero();
        for optimization in courier_optimizations.iter().filter(|o| o.result.optimized) {
            total_savings += optimization.result.savings;
        }
        let total_savings = total_savings.rounded();

        info!(
            couriers = couriers.len(),
            exchanges = exchange_suggestions.len(),
            time_minutes = total_savings.time_minutes,
            distance_km = total_savings.distance_km,
            "fleet optimization finished"
        );

        Ok(FleetOptimization {
            courier_optimizations,
            exchange_suggestions,
            total_savings,
        })
    }

    /// Persist `route` as the courier's delivery order.
    pub fn apply_route_optimization(&self, courier_id: &str, route: &[Stop]) -> Result<(), OptimizerError> {
        if self.store.courier(courier_id)?.is_none() {
            return Err(OptimizerError::CourierNotFound(courier_id.to_string()));
        }

        self.store
            .save_route_order(courier_id, &stop_ids(route), Timestamp::now())?;
        info!(courier_id, stops = route.len(), "route order applied");
        Ok(())
    }

    /// Reassign both stops of a suggestion.
    ///
    /// Refuses suggestions whose stops have changed hands since they were
    /// computed.
    pub fn apply_exchange(&self, suggestion: &ExchangeSuggestion) -> Result<(), OptimizerError> {
        for (delivery, courier) in [
            (&suggestion.delivery1, &suggestion.courier1),
            (&suggestion.delivery2, &suggestion.courier2),
        ] {
            let stop = self
                .store
                .stop(&delivery.id)?
                .ok_or_else(|| OptimizerError::StopNotFound(delivery.id.clone()))?;
            if stop.courier_id != courier.id {
                return Err(OptimizerError::StaleExchange {
                    stop_id: delivery.id.clone(),
                    expected_courier: courier.id.clone(),
                });
            }
        }

        self.store.swap_stops(&suggestion.as_swap(), Timestamp::now())?;
        info!(
            courier1 = %suggestion.courier1.id,
            courier2 = %suggestion.courier2.id,
            delivery1 = %suggestion.delivery1.id,
            delivery2 = %suggestion.delivery2.id,
            "exchange applied"
        );
        Ok(())
    }

    fn optimize_stops(&self, courier: &Courier, stops: Vec<Stop>) -> OptimizationResult {
        let origin = courier
            .location
            .filter(Coordinate::is_valid)
            .unwrap_or(self.config.default_origin);

        let sequencer = RouteSequencer::new(&self.provider, &self.cache);
        let route = sequencer.sequence(&courier.id, origin, &stops);

        let (savings, used_fallback) = match (route.method, self.config.savings.mode) {
            (OptimizationMethod::DistanceMatrix, SavingsMode::FixedDiscount) => (
                route
                    .origin_matrix
                    .as_ref()
                    .map(|matrix| self.savings.estimate(matrix))
                    .unwrap_or_default(),
                route.used_fallback,
            ),
            (OptimizationMethod::DistanceMatrix, SavingsMode::RouteComparison) => {
                let (savings, estimated) = self.savings.compare(&self.provider, origin, &stops, &route.stops);
                (savings, route.used_fallback || estimated)
            }
            _ => (Savings::zero(), route.used_fallback),
        };

        info!(
            courier_id = %courier.id,
            method = ?route.method,
            stops = stops.len(),
            time_minutes = savings.time_minutes,
            used_fallback,
            "courier route optimized"
        );

        OptimizationResult {
            optimized: route.is_optimized(),
            method: route.method,
            original_route: stops,
            optimized_route: route.stops,
            savings,
            used_fallback,
        }
    }
}
