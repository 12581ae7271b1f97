use std::collections::{BTreeSet, HashMap};

use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::{
    geocoder::{Geocoder, GeocodingError},
    models::{Coordinates, Place},
    store::{PlaceStore, PlaceStoreError},
};

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error(transparent)]
    Geocoding(#[from] GeocodingError),
    #[error(transparent)]
    Store(#[from] PlaceStoreError),
}

/// Resolves addresses through the coordinate cache, geocoding and caching
/// the ones seen for the first time.
///
/// Answers are also kept in memory for the lifetime of the resolver, so one
/// dashboard render touches each address at most once.
pub struct CoordinateResolver<S, G> {
    store: S,
    geocoder: G,
    resolved: HashMap<String, Option<Coordinates>>,
}

impl<S: PlaceStore, G: Geocoder> CoordinateResolver<S, G> {
    pub fn new(store: S, geocoder: G) -> Self {
        Self {
            store,
            geocoder,
            resolved: HashMap::new(),
        }
    }

    /// Loads every cached place among `addresses` with a single store query.
    /// Returns how many of them were cached.
    pub async fn preload<I, A>(&mut self, addresses: I) -> Result<usize, PlaceStoreError>
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        let wanted = addresses
            .into_iter()
            .map(Into::into)
            .filter(|address| !self.resolved.contains_key(address))
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect::<Vec<_>>();

        let places = self.store.get_places(&wanted).await?;
        let found = places.len();
        for place in places {
            let coordinates = place.coordinates();
            self.resolved.insert(place.address, coordinates);
        }
        debug!(requested = wanted.len(), found, "preloaded coordinate cache");
        Ok(found)
    }

    /// `Ok(None)` means the geocoder knows no such address, now or on an
    /// earlier lookup. Geocoder failures are not cached.
    #[instrument(skip(self))]
    pub async fn resolve(&mut self, address: &str) -> Result<Option<Coordinates>, ResolveError> {
        if let Some(known) = self.resolved.get(address) {
            return Ok(known.clone());
        }

        let coordinates = match self.store.get_place(address).await? {
            Some(place) => {
                debug!("coordinate cache hit");
                place.coordinates()
            }
            None => {
                let fetched = self.geocoder.fetch_coordinates(address).await?;
                if fetched.is_none() {
                    info!("geocoder found no such address");
                }
                let stored = self
                    .store
                    .insert_or_fetch(Place::new(address, fetched))
                    .await?;
                stored.coordinates()
            }
        };

        self.resolved
            .insert(address.to_string(), coordinates.clone());
        Ok(coordinates)
    }
}
