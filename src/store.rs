//! In-process [`RouteStore`] backed by a lock-guarded document map.
//!
//! Serves tests and embedders that load a snapshot of the document store.
//! Exchanges are applied under a single write lock, so both reassignments
//! land together or not at all.

use jiff::Timestamp;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{StoreError, SwapError};
use crate::model::{Courier, Stop, StopStatus};
use crate::traits::{RouteStore, StopSwap};

/// Document-store export: `{ "couriers": [...], "deliveries": [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub couriers: Vec<Courier>,
    #[serde(default)]
    pub deliveries: Vec<Stop>,
}

#[derive(Debug, Default)]
struct Documents {
    couriers: Vec<Courier>,
    stops: Vec<Stop>,
}

impl Documents {
    fn courier_mut(&mut self, id: &str) -> Result<&mut Courier, StoreError> {
        self.couriers
            .iter_mut()
            .find(|courier| courier.id == id)
            .ok_or_else(|| not_found("courier", id))
    }

    fn stop_index(&self, id: &str) -> Result<usize, StoreError> {
        self.stops
            .iter()
            .position(|stop| stop.id == id)
            .ok_or_else(|| not_found("stop", id))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    documents: RwLock<Documents>,
}

impl InMemoryStore {
    pub fn new(couriers: Vec<Courier>, stops: Vec<Stop>) -> Self {
        Self {
            documents: RwLock::new(Documents { couriers, stops }),
        }
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self::new(snapshot.couriers, snapshot.deliveries)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(Self::from_snapshot)
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let documents = self.documents.read();
        StoreSnapshot {
            couriers: documents.couriers.clone(),
            deliveries: documents.stops.clone(),
        }
    }

    pub fn upsert_courier(&self, courier: Courier) {
        let mut documents = self.documents.write();
        match documents.couriers.iter().position(|c| c.id == courier.id) {
            Some(index) => documents.couriers[index] = courier,
            None => documents.couriers.push(courier),
        }
    }

    pub fn upsert_stop(&self, stop: Stop) {
        let mut documents = self.documents.write();
        match documents.stops.iter().position(|s| s.id == stop.id) {
            Some(index) => documents.stops[index] = stop,
            None => documents.stops.push(stop),
        }
    }

    /// Advance a stop's status; moving backwards is rejected.
    pub fn set_stop_status(&self, stop_id: &str, status: StopStatus) -> Result<(), StoreError> {
        let mut documents = self.documents.write();
        let index = documents.stop_index(stop_id)?;
        let stop = &mut documents.stops[index];
        if !stop.status.can_advance_to(status) {
            return Err(StoreError::InvalidTransition {
                id: stop_id.to_string(),
                from: stop.status,
                to: status,
            });
        }
        stop.status = status;
        stop.updated_at = Some(Timestamp::now());
        Ok(())
    }
}

impl RouteStore for InMemoryStore {
    fn courier(&self, id: &str) -> Result<Option<Courier>, StoreError> {
        Ok(self
            .documents
            .read()
            .couriers
            .iter()
            .find(|courier| courier.id == id)
            .cloned())
    }

    fn active_couriers(&self) -> Result<Vec<Courier>, StoreError> {
        Ok(self
            .documents
            .read()
            .couriers
            .iter()
            .filter(|courier| courier.is_active())
            .cloned()
            .collect())
    }

    fn stop(&self, id: &str) -> Result<Option<Stop>, StoreError> {
        Ok(self.documents.read().stops.iter().find(|stop| stop.id == id).cloned())
    }

    fn open_stops_for(&self, courier_id: &str) -> Result<Vec<Stop>, StoreError> {
        let documents = self.documents.read();
        let mut stops: Vec<Stop> = documents
            .stops
            .iter()
            .filter(|stop| stop.courier_id == courier_id && stop.status.is_open())
            .cloned()
            .collect();

        if let Some(courier) = documents.couriers.iter().find(|courier| courier.id == courier_id) {
            let position = |id: &str| {
                courier
                    .delivery_order
                    .iter()
                    .position(|ordered| ordered == id)
                    .unwrap_or(usize::MAX)
            };
            stops.sort_by_key(|stop| position(stop.id.as_str()));
        }

        Ok(stops)
    }

    fn open_stops(&self) -> Result<Vec<Stop>, StoreError> {
        Ok(self
            .documents
            .read()
            .stops
            .iter()
            .filter(|stop| stop.status.is_open())
            .cloned()
            .collect())
    }

    fn save_route_order(&self, courier_id: &str, stop_ids: &[String], at: Timestamp) -> Result<(), StoreError> {
        let mut documents = self.documents.write();
        let courier = documents.courier_mut(courier_id)?;
        courier.delivery_order = stop_ids.to_vec();
        courier.last_optimization = Some(at);
        Ok(())
    }

    fn reassign_stop(&self, stop_id: &str, courier_id: &str, at: Timestamp) -> Result<(), StoreError> {
        let mut documents = self.documents.write();
        let index = documents.stop_index(stop_id)?;
        let stop = &mut documents.stops[index];
        stop.courier_id = courier_id.to_string();
        stop.updated_at = Some(at);
        Ok(())
    }

    fn swap_stops(&self, swap: &StopSwap, at: Timestamp) -> Result<(), SwapError> {
        let mut documents = self.documents.write();
        let first = documents.stop_index(&swap.first_stop).map_err(SwapError::Aborted)?;
        let second = documents.stop_index(&swap.second_stop).map_err(SwapError::Aborted)?;

        for (index, courier_id) in [(first, &swap.second_courier), (second, &swap.first_courier)] {
            let stop = &mut documents.stops[index];
            stop.courier_id = courier_id.clone();
            stop.updated_at = Some(at);
        }

        info!(
            first_stop = %swap.first_stop,
            second_stop = %swap.second_stop,
            "stops swapped atomically"
        );
        Ok(())
    }
}

fn not_found(kind: &'static str, id: &str) -> StoreError {
    StoreError::NotFound {
        kind,
        id: id.to_string(),
    }
}
