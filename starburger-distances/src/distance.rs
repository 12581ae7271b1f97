//! Geodesic distance on the WGS-84 ellipsoid (Karney's algorithm).

use geo::{Distance, Geodesic, Point};

use crate::models::Coordinates;

/// Geodesic distance in kilometers, rounded to 2 decimal places.
pub fn distance_km(from: &Coordinates, to: &Coordinates) -> f64 {
    let (lat1, lon1) = from.as_degrees();
    let (lat2, lon2) = to.as_degrees();
    round_km(geodesic_meters(lat1, lon1, lat2, lon2) / 1000.0)
}

pub fn round_km(km: f64) -> f64 {
    (km * 100.0).round() / 100.0
}

pub fn geodesic_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    Geodesic::distance(Point::new(lon1, lat1), Point::new(lon2, lat2))
}
