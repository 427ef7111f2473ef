//! Real Milan locations for realistic test fixtures.
//!
//! Coordinates sourced from OpenStreetMap.

use route_optimizer::model::Coordinate;

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coords(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

// ============================================================================
// Courier positions
// ============================================================================

pub const DUOMO: Location = Location::new("Piazza del Duomo", 45.4642, 9.1900);
pub const CENTRALE: Location = Location::new("Milano Centrale", 45.4862, 9.2043);
pub const PORTA_GENOVA: Location = Location::new("Porta Genova", 45.4536, 9.1699);
/// About 6 km due south of the Duomo.
pub const GRATOSOGLIO: Location = Location::new("Gratosoglio", 45.4102, 9.1900);

// ============================================================================
// Delivery destinations
// ============================================================================

pub const DESTINATIONS: &[Location] = &[
    Location::new("Brera", 45.4720, 9.1878),
    Location::new("Castello Sforzesco", 45.4705, 9.1793),
    Location::new("Navigli", 45.4520, 9.1760),
    Location::new("Porta Romana", 45.4516, 9.2033),
    Location::new("Isola", 45.4870, 9.1890),
    Location::new("Citta Studi", 45.4780, 9.2270),
    Location::new("Sant'Ambrogio", 45.4625, 9.1757),
    Location::new("Porta Venezia", 45.4746, 9.2050),
];

pub fn destination(name: &str) -> Location {
    DESTINATIONS
        .iter()
        .find(|location| location.name == name)
        .cloned()
        .unwrap_or_else(|| panic!("unknown destination {}", name))
}
