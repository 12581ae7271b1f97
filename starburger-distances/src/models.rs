use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::places;

/// Number of decimal places kept for cached latitudes and longitudes.
pub const COORDINATE_SCALE: i64 = 6;

/// A cached geocoding result. Null coordinates record a lookup that found
/// nothing.
#[derive(Queryable, Selectable, Identifiable, Insertable, Clone, Debug, PartialEq)]
#[diesel(table_name = places, primary_key(address))]
pub struct Place {
    pub address: String,
    pub latitude: Option<BigDecimal>,
    pub longitude: Option<BigDecimal>,
    pub updated_at: DateTime<Utc>,
}

impl Place {
    pub fn new(address: &str, coordinates: Option<Coordinates>) -> Self {
        let (latitude, longitude) = match coordinates {
            Some(c) => (Some(c.latitude), Some(c.longitude)),
            None => (None, None),
        };
        Self {
            address: address.to_string(),
            latitude,
            longitude,
            updated_at: Utc::now(),
        }
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        match (&self.latitude, &self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude: latitude.clone(),
                longitude: longitude.clone(),
            }),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: BigDecimal,
    pub longitude: BigDecimal,
}

impl Coordinates {
    /// Rounds both components to [`COORDINATE_SCALE`] places. Returns `None`
    /// when either lies outside the valid degree range.
    pub fn new(latitude: BigDecimal, longitude: BigDecimal) -> Option<Self> {
        let latitude = latitude.round(COORDINATE_SCALE);
        let longitude = longitude.round(COORDINATE_SCALE);
        if latitude.abs() > BigDecimal::from(90) || longitude.abs() > BigDecimal::from(180) {
            return None;
        }
        Some(Self {
            latitude,
            longitude,
        })
    }

    /// `(latitude, longitude)` in degrees.
    pub fn as_degrees(&self) -> (f64, f64) {
        (
            self.latitude.to_f64().unwrap_or_default(),
            self.longitude.to_f64().unwrap_or_default(),
        )
    }
}
