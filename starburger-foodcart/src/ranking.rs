use starburger_distances::{
    distance::distance_km,
    geocoder::Geocoder,
    store::{PlaceStore, PlaceStoreError},
    CoordinateResolver, ResolveError,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::Restaurant;

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub restaurant_id: Uuid,
    pub restaurant_name: String,
    pub distance_km: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidates {
    /// `false` when the delivery address could not be resolved. Nothing is
    /// ranked in that case.
    pub address_valid: bool,
    /// Nearest first.
    pub candidates: Vec<Candidate>,
}

impl RankedCandidates {
    fn invalid_address() -> Self {
        Self {
            address_valid: false,
            candidates: Vec::new(),
        }
    }
}

/// Orders `restaurants` by distance to `order_address`.
///
/// Geocoding problems degrade the result instead of failing it: an
/// unresolvable order address yields `address_valid = false`, and a
/// restaurant whose address cannot be resolved is left unranked. Only
/// coordinate store failures are returned as errors.
pub async fn rank<S: PlaceStore, G: Geocoder>(
    resolver: &mut CoordinateResolver<S, G>,
    order_address: &str,
    restaurants: &[&Restaurant],
) -> Result<RankedCandidates, PlaceStoreError> {
    let destination = match resolver.resolve(order_address).await {
        Ok(Some(coordinates)) => coordinates,
        Ok(None) => {
            debug!(order_address, "order address not found by geocoder");
            return Ok(RankedCandidates::invalid_address());
        }
        Err(ResolveError::Geocoding(err)) => {
            warn!(order_address, error = %err, "could not geocode order address");
            return Ok(RankedCandidates::invalid_address());
        }
        Err(ResolveError::Store(err)) => return Err(err),
    };

    let mut candidates = Vec::with_capacity(restaurants.len());
    for restaurant in restaurants {
        let origin = match resolver.resolve(&restaurant.address).await {
            Ok(Some(coordinates)) => coordinates,
            Ok(None) => {
                debug!(restaurant = %restaurant.name, "restaurant address not found by geocoder");
                continue;
            }
            Err(ResolveError::Geocoding(err)) => {
                warn!(restaurant = %restaurant.name, error = %err, "could not geocode restaurant address");
                continue;
            }
            Err(ResolveError::Store(err)) => return Err(err),
        };
        candidates.push(Candidate {
            restaurant_id: restaurant.id,
            restaurant_name: restaurant.name.clone(),
            distance_km: distance_km(&origin, &destination),
        });
    }

    candidates.sort_by(|a, b| {
        a.distance_km
            .total_cmp(&b.distance_km)
            .then_with(|| a.restaurant_name.cmp(&b.restaurant_name))
            .then_with(|| a.restaurant_id.cmp(&b.restaurant_id))
    });

    Ok(RankedCandidates {
        address_valid: true,
        candidates,
    })
}
