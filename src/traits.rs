//! Seams between the optimizer core and its collaborators.
//!
//! The core reads couriers and stops from a document store and measures
//! distances through a matrix provider. Both are traits so deployments can
//! plug in their own backends.

use jiff::Timestamp;

use crate::error::{StoreError, SwapError};
use crate::model::{Coordinate, Courier, DistanceMatrix, PointDistance, Stop};

/// Provides distance/duration measurements from one origin.
///
/// Implementations must never fail: a provider that cannot reach its backend
/// answers with an estimate and marks it as such.
pub trait DistanceMatrixProvider {
    /// One entry per destination, in destination order.
    fn matrix(&self, origin: Coordinate, destinations: &[Coordinate]) -> DistanceMatrix;

    /// Distance in meters between two points.
    fn point_distance(&self, from: Coordinate, to: Coordinate) -> PointDistance;
}

impl<T: DistanceMatrixProvider + ?Sized> DistanceMatrixProvider for &T {
    fn matrix(&self, origin: Coordinate, destinations: &[Coordinate]) -> DistanceMatrix {
        (**self).matrix(origin, destinations)
    }

    fn point_distance(&self, from: Coordinate, to: Coordinate) -> PointDistance {
        (**self).point_distance(from, to)
    }
}

/// Two stops changing hands between couriers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopSwap {
    /// Stop currently held by `first_courier`, moving to `second_courier`.
    pub first_stop: String,
    pub first_courier: String,
    /// Stop currently held by `second_courier`, moving to `first_courier`.
    pub second_stop: String,
    pub second_courier: String,
}

/// Courier and stop records owned by an external document store.
pub trait RouteStore {
    fn courier(&self, id: &str) -> Result<Option<Courier>, StoreError>;

    fn active_couriers(&self) -> Result<Vec<Courier>, StoreError>;

    fn stop(&self, id: &str) -> Result<Option<Stop>, StoreError>;

    /// Pending and in-progress stops of one courier, in the courier's
    /// persisted delivery order when one exists.
    fn open_stops_for(&self, courier_id: &str) -> Result<Vec<Stop>, StoreError>;

    /// Pending and in-progress stops of the whole fleet.
    fn open_stops(&self) -> Result<Vec<Stop>, StoreError>;

    fn save_route_order(
        &self,
        courier_id: &str,
        stop_ids: &[String],
        at: Timestamp,
    ) -> Result<(), StoreError>;

    fn reassign_stop(&self, stop_id: &str, courier_id: &str, at: Timestamp) -> Result<(), StoreError>;

    /// Reassign both stops of an exchange.
    ///
    /// The default issues two independent writes and reports exactly which
    /// one landed when the second fails. Transactional stores should
    /// override it with an atomic write.
    fn swap_stops(&self, swap: &StopSwap, at: Timestamp) -> Result<(), SwapError> {
        self.reassign_stop(&swap.first_stop, &swap.second_courier, at)
            .map_err(SwapError::Aborted)?;

        self.reassign_stop(&swap.second_stop, &swap.first_courier, at)
            .map_err(|source| SwapError::Partial {
                applied: swap.first_stop.clone(),
                failed: swap.second_stop.clone(),
                source,
            })
    }
}
