//! Tunables of the optimizer.
//!
//! Defaults reproduce the behaviour of the dispatch system the optimizer
//! was built for; `from_env` lets deployments override them.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::Coordinate;

/// Milan city centre, used when a courier has no known position.
pub const DEFAULT_ORIGIN: Coordinate = Coordinate::new(45.4642, 9.1900);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeConfig {
    /// Couriers further apart than this never exchange stops.
    pub max_courier_distance_m: f64,
    /// Speed used to turn a distance saving into a time saving.
    pub urban_speed_kmh: f64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            max_courier_distance_m: 5000.0,
            urban_speed_kmh: 30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavingsMode {
    /// Fixed share of the courier-to-stops matrix totals.
    FixedDiscount,
    /// Measured length of the original order minus the optimized order.
    RouteComparison,
}

impl FromStr for SavingsMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fixed_discount" => Ok(SavingsMode::FixedDiscount),
            "route_comparison" => Ok(SavingsMode::RouteComparison),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsConfig {
    pub mode: SavingsMode,
    pub distance_discount: f64,
    pub time_discount: f64,
}

impl Default for SavingsConfig {
    fn default() -> Self {
        Self {
            mode: SavingsMode::FixedDiscount,
            distance_discount: 0.15,
            time_discount: 0.20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizerConfig {
    /// Recurrent routes remembered per courier.
    pub cache_capacity: usize,
    pub default_origin: Coordinate,
    /// Worker threads for fleet-wide runs; bounds concurrent provider calls.
    pub max_parallel_couriers: usize,
    pub exchange: ExchangeConfig,
    pub savings: SavingsConfig,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 10,
            default_origin: DEFAULT_ORIGIN,
            max_parallel_couriers: 4,
            exchange: ExchangeConfig::default(),
            savings: SavingsConfig::default(),
        }
    }
}

impl OptimizerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let max_parallel_couriers = parse_or(
            &lookup,
            "ROUTE_OPTIMIZER_MAX_PARALLEL_COURIERS",
            defaults.max_parallel_couriers,
        )?;
        if max_parallel_couriers == 0 {
            return Err(ConfigError::Invalid {
                key: "ROUTE_OPTIMIZER_MAX_PARALLEL_COURIERS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            cache_capacity: parse_or(&lookup, "ROUTE_OPTIMIZER_CACHE_CAPACITY", defaults.cache_capacity)?,
            default_origin: defaults.default_origin,
            max_parallel_couriers,
            exchange: ExchangeConfig {
                max_courier_distance_m: parse_or(
                    &lookup,
                    "ROUTE_OPTIMIZER_EXCHANGE_RADIUS_M",
                    defaults.exchange.max_courier_distance_m,
                )?,
                urban_speed_kmh: parse_or(
                    &lookup,
                    "ROUTE_OPTIMIZER_URBAN_SPEED_KMH",
                    defaults.exchange.urban_speed_kmh,
                )?,
            },
            savings: SavingsConfig {
                mode: parse_or(&lookup, "ROUTE_OPTIMIZER_SAVINGS_MODE", defaults.savings.mode)?,
                ..defaults.savings
            },
        })
    }
}

/// Parse `key` when present, otherwise fall back to `default`.
pub(crate) fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
