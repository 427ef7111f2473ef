//! Courier, stop and measurement types shared by every optimizer component.
//!
//! Field names follow the document-store shape (camelCase) so records can be
//! deserialized straight from stored documents.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True when both components are finite and inside [-90,90] / [-180,180].
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// "lat,lng" as expected by distance-matrix query strings.
    pub fn to_query_value(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopStatus {
    Pending,
    InProgress,
    Completed,
}

impl StopStatus {
    /// Status only moves forward: pending -> in_progress -> completed.
    pub fn can_advance_to(self, next: StopStatus) -> bool {
        next >= self
    }

    /// Open stops are the ones the optimizer still routes.
    pub fn is_open(self) -> bool {
        !matches!(self, StopStatus::Completed)
    }
}

/// A single delivery destination assigned to a courier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub id: String,
    pub courier_id: String,
    pub destination: Option<Coordinate>,
    pub status: StopStatus,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl Stop {
    pub fn new(id: impl Into<String>, courier_id: impl Into<String>, destination: Coordinate) -> Self {
        Self {
            id: id.into(),
            courier_id: courier_id.into(),
            destination: Some(destination),
            status: StopStatus::Pending,
            client_name: String::new(),
            address: String::new(),
            updated_at: None,
        }
    }

    pub fn with_status(mut self, status: StopStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_client(mut self, client_name: impl Into<String>, address: impl Into<String>) -> Self {
        self.client_name = client_name.into();
        self.address = address.into();
        self
    }

    /// Destination usable for distance computation, if any.
    pub fn measurable_destination(&self) -> Option<Coordinate> {
        self.destination.filter(Coordinate::is_valid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourierStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Courier {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub status: CourierStatus,
    /// Last known position from the tracking feed.
    pub location: Option<Coordinate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<String>,
    /// Persisted stop order from the last applied optimization.
    #[serde(default)]
    pub delivery_order: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_optimization: Option<Timestamp>,
}

impl Courier {
    pub fn new(
        id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        location: Option<Coordinate>,
    ) -> Self {
        Self {
            id: id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            status: CourierStatus::Active,
            location,
            vehicle: None,
            delivery_order: Vec::new(),
            last_optimization: None,
        }
    }

    pub fn with_status(mut self, status: CourierStatus) -> Self {
        self.status = status;
        self
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_active(&self) -> bool {
        self.status == CourierStatus::Active
    }
}

/// One origin-to-destination measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistanceMatrixEntry {
    pub destination_index: usize,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub duration_in_traffic_seconds: Option<f64>,
}

impl DistanceMatrixEntry {
    /// Traffic-aware duration when the provider reported one.
    pub fn effective_duration(&self) -> f64 {
        self.duration_in_traffic_seconds
            .unwrap_or(self.duration_seconds)
    }
}

/// Where a measurement came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixSource {
    Live,
    Estimated,
}

/// Distances from one origin to a list of destinations, in destination order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistanceMatrix {
    pub entries: Vec<DistanceMatrixEntry>,
    pub source: MatrixSource,
}

impl DistanceMatrix {
    pub fn live(entries: Vec<DistanceMatrixEntry>) -> Self {
        Self {
            entries,
            source: MatrixSource::Live,
        }
    }

    pub fn estimated(entries: Vec<DistanceMatrixEntry>) -> Self {
        Self {
            entries,
            source: MatrixSource::Estimated,
        }
    }

    pub fn is_estimated(&self) -> bool {
        self.source == MatrixSource::Estimated
    }

    /// Index of the entry with the lowest effective duration.
    ///
    /// Equal durations keep the earliest entry.
    pub fn closest(&self) -> Option<usize> {
        self.entries
            .iter()
            .min_by(|a, b| a.effective_duration().total_cmp(&b.effective_duration()))
            .map(|entry| entry.destination_index)
    }

    pub fn total_distance_meters(&self) -> f64 {
        self.entries.iter().map(|entry| entry.distance_meters).sum()
    }

    pub fn total_duration_seconds(&self) -> f64 {
        self.entries.iter().map(DistanceMatrixEntry::effective_duration).sum()
    }
}

/// Single-pair distance in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointDistance {
    pub meters: f64,
    pub source: MatrixSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(index: usize, duration: f64, traffic: Option<f64>) -> DistanceMatrixEntry {
        DistanceMatrixEntry {
            destination_index: index,
            distance_meters: 100.0,
            duration_seconds: duration,
            duration_in_traffic_seconds: traffic,
        }
    }

    #[test]
    fn test_coordinate_range() {
        assert!(Coordinate::new(45.4642, 9.19).is_valid());
        assert!(Coordinate::new(-90.0, 180.0).is_valid());
        assert!(!Coordinate::new(91.0, 9.19).is_valid());
        assert!(!Coordinate::new(45.0, -180.5).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_status_is_monotonic() {
        assert!(StopStatus::Pending.can_advance_to(StopStatus::InProgress));
        assert!(StopStatus::InProgress.can_advance_to(StopStatus::Completed));
        assert!(StopStatus::InProgress.can_advance_to(StopStatus::InProgress));
        assert!(!StopStatus::Completed.can_advance_to(StopStatus::Pending));
        assert!(!StopStatus::InProgress.can_advance_to(StopStatus::Pending));
    }

    #[test]
    fn test_effective_duration_prefers_traffic() {
        assert_eq!(entry(0, 60.0, Some(90.0)).effective_duration(), 90.0);
        assert_eq!(entry(0, 60.0, None).effective_duration(), 60.0);
    }

    #[test]
    fn test_closest_keeps_first_on_ties() {
        let matrix = DistanceMatrix::live(vec![
            entry(0, 120.0, None),
            entry(1, 60.0, None),
            entry(2, 60.0, None),
        ]);
        assert_eq!(matrix.closest(), Some(1));
        assert_eq!(DistanceMatrix::live(Vec::new()).closest(), None);
    }

    #[test]
    fn test_stop_deserializes_from_document() {
        let json = r#"{
            "id": "d1",
            "courierId": "c1",
            "destination": {"latitude": 45.47, "longitude": 9.19},
            "status": "in_progress",
            "clientName": "Rossi",
            "address": "Via Dante 1"
        }"#;
        let stop: Stop = serde_json::from_str(json).expect("valid stop document");
        assert_eq!(stop.status, StopStatus::InProgress);
        assert_eq!(stop.courier_id, "c1");
        assert_eq!(stop.measurable_destination(), Some(Coordinate::new(45.47, 9.19)));
    }

    #[test]
    fn test_invalid_destination_is_not_measurable() {
        let mut stop = Stop::new("d1", "c1", Coordinate::new(120.0, 9.0));
        assert_eq!(stop.measurable_destination(), None);
        stop.destination = None;
        assert_eq!(stop.measurable_destination(), None);
    }
}
