//! route-optimizer core
//!
//! Sequences each courier's stops with a priority-aware nearest-neighbour
//! heuristic over live traffic durations and suggests cross-courier stop
//! exchanges that shorten total fleet travel.

pub mod model;
pub mod error;
pub mod config;
pub mod traits;
pub mod haversine;
pub mod google;
pub mod cache;
pub mod sequencer;
pub mod savings;
pub mod exchange;
pub mod store;
pub mod optimizer;

pub use optimizer::{CourierOptimization, FleetOptimization, OptimizationResult, RouteOptimizer};
