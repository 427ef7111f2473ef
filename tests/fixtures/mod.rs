//! Test fixtures for route-optimizer.
//!
//! Provides realistic test data including:
//! - Real Milan locations
//! - Builders for couriers and stops
//! - Providers and stores with controllable behaviour

#![allow(dead_code)]

pub mod milan_locations;

use std::sync::atomic::{AtomicUsize, Ordering};

use jiff::Timestamp;
use route_optimizer::error::StoreError;
use route_optimizer::haversine::HaversineMatrix;
use route_optimizer::model::{
    Coordinate, Courier, DistanceMatrix, MatrixSource, PointDistance, Stop, StopStatus,
};
use route_optimizer::store::InMemoryStore;
use route_optimizer::traits::{DistanceMatrixProvider, RouteStore};

pub use milan_locations::*;

pub fn courier_at(id: &str, location: &Location) -> Courier {
    Courier::new(id, format!("Courier{}", id), "Rider", Some(location.coords()))
}

pub fn pending(id: &str, courier_id: &str, location: &Location) -> Stop {
    Stop::new(id, courier_id, location.coords()).with_client(format!("Client {}", id), location.name)
}

pub fn in_progress(id: &str, courier_id: &str, location: &Location) -> Stop {
    pending(id, courier_id, location).with_status(StopStatus::InProgress)
}

pub fn ids(stops: &[Stop]) -> Vec<&str> {
    stops.iter().map(|stop| stop.id.as_str()).collect()
}

/// Haversine distances reported as live measurements; counts calls.
#[derive(Default)]
pub struct LiveHaversine {
    inner: HaversineMatrix,
    pub matrix_calls: AtomicUsize,
}

impl LiveHaversine {
    pub fn calls(&self) -> usize {
        self.matrix_calls.load(Ordering::SeqCst)
    }
}

impl DistanceMatrixProvider for LiveHaversine {
    fn matrix(&self, origin: Coordinate, destinations: &[Coordinate]) -> DistanceMatrix {
        self.matrix_calls.fetch_add(1, Ordering::SeqCst);
        DistanceMatrix::live(self.inner.matrix(origin, destinations).entries)
    }

    fn point_distance(&self, from: Coordinate, to: Coordinate) -> PointDistance {
        PointDistance {
            meters: self.inner.point_distance(from, to).meters,
            source: MatrixSource::Live,
        }
    }
}

/// Store whose single-stop reassignment fails for one stop id.
///
/// Does not override `swap_stops`, so exchanges go through the two-write
/// default.
pub struct FlakyStore {
    pub inner: InMemoryStore,
    pub failing_stop: String,
}

impl RouteStore for FlakyStore {
    fn courier(&self, id: &str) -> Result<Option<Courier>, StoreError> {
        self.inner.courier(id)
    }

    fn active_couriers(&self) -> Result<Vec<Courier>, StoreError> {
        self.inner.active_couriers()
    }

    fn stop(&self, id: &str) -> Result<Option<Stop>, StoreError> {
        self.inner.stop(id)
    }

    fn open_stops_for(&self, courier_id: &str) -> Result<Vec<Stop>, StoreError> {
        self.inner.open_stops_for(courier_id)
    }

    fn open_stops(&self) -> Result<Vec<Stop>, StoreError> {
        self.inner.open_stops()
    }

    fn save_route_order(&self, courier_id: &str, stop_ids: &[String], at: Timestamp) -> Result<(), StoreError> {
        self.inner.save_route_order(courier_id, stop_ids, at)
    }

    fn reassign_stop(&self, stop_id: &str, courier_id: &str, at: Timestamp) -> Result<(), StoreError> {
        if stop_id == self.failing_stop {
            return Err(StoreError::Backend("write timed out".to_string()));
        }
        self.inner.reassign_stop(stop_id, courier_id, at)
    }
}
