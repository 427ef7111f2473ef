//! Per-courier history of optimized stop sets.
//!
//! When a courier is asked to serve exactly the same set of stops again, the
//! previously computed order is reused instead of querying the provider.

use std::collections::{HashMap, VecDeque};

use jiff::Timestamp;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_CAPACITY: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRecord {
    pub recorded_at: Timestamp,
    /// Sorted ids; the lookup key.
    pub stop_ids: Vec<String>,
    pub optimized_order: Vec<String>,
}

/// Bounded FIFO history keyed by courier id.
///
/// All access goes through one mutex so eviction is atomic with the append
/// that triggered it.
#[derive(Debug)]
pub struct RecurrentRouteCache {
    capacity: usize,
    history: Mutex<HashMap<String, VecDeque<RouteRecord>>>,
}

impl Default for RecurrentRouteCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl RecurrentRouteCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            history: Mutex::new(HashMap::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cached order for a stop set equal to `stop_ids`, ignoring order.
    pub fn lookup(&self, courier_id: &str, stop_ids: &[String]) -> Option<Vec<String>> {
        let key = sorted_ids(stop_ids);
        let history = self.history.lock();
        let hit = history
            .get(courier_id)?
            .iter()
            .rev()
            .find(|record| record.stop_ids == key)
            .map(|record| record.optimized_order.clone());

        if hit.is_some() {
            debug!(courier_id, stops = stop_ids.len(), "recurrent route hit");
        }
        hit
    }

    /// Remember `ordered_ids` for this courier, evicting the oldest entry
    /// once the history is over capacity.
    pub fn record(&self, courier_id: &str, ordered_ids: &[String]) {
        if self.capacity == 0 {
            return;
        }

        let record = RouteRecord {
            recorded_at: Timestamp::now(),
            stop_ids: sorted_ids(ordered_ids),
            optimized_order: ordered_ids.to_vec(),
        };

        let mut history = self.history.lock();
        let routes = history.entry(courier_id.to_string()).or_default();
        routes.push_back(record);
        while routes.len() > self.capacity {
            routes.pop_front();
        }
    }

    /// Oldest first.
    pub fn history(&self, courier_id: &str) -> Vec<RouteRecord> {
        self.history
            .lock()
            .get(courier_id)
            .map(|routes| routes.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn clear(&self, courier_id: &str) {
        self.history.lock().remove(courier_id);
    }
}

fn sorted_ids(ids: &[String]) -> Vec<String> {
    let mut sorted = ids.to_vec();
    sorted.sort();
    sorted
}
