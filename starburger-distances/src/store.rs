use std::collections::HashMap;

use diesel::{insert_into, prelude::*};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use thiserror::Error;

use crate::{models::Place, schema::places};

/// Persistent address → coordinates cache.
pub trait PlaceStore {
    fn get_place(
        &mut self,
        address: &str,
    ) -> impl std::future::Future<Output = Result<Option<Place>, PlaceStoreError>> + Send;

    fn get_places(
        &mut self,
        addresses: &[String],
    ) -> impl std::future::Future<Output = Result<Vec<Place>, PlaceStoreError>> + Send;

    /// Stores `place` unless a row for the same address already exists, and
    /// returns whichever row ends up stored.
    fn insert_or_fetch(
        &mut self,
        place: Place,
    ) -> impl std::future::Future<Output = Result<Place, PlaceStoreError>> + Send;
}

#[derive(Error, Debug)]
pub enum PlaceStoreError {
    #[error("error while executing database query")]
    Database(#[from] diesel::result::Error),
}

pub struct PgPlaceStore<'a> {
    conn: &'a mut AsyncPgConnection,
}

impl<'a> PgPlaceStore<'a> {
    pub fn new(conn: &'a mut AsyncPgConnection) -> Self {
        Self { conn }
    }
}

impl PlaceStore for PgPlaceStore<'_> {
    async fn get_place(&mut self, address: &str) -> Result<Option<Place>, PlaceStoreError> {
        let place = places::table
            .find(address)
            .select(Place::as_select())
            .first(self.conn)
            .await
            .optional()?;
        Ok(place)
    }

    async fn get_places(&mut self, addresses: &[String]) -> Result<Vec<Place>, PlaceStoreError> {
        if addresses.is_empty() {
            return Ok(Vec::new());
        }
        let found = places::table
            .filter(places::address.eq_any(addresses))
            .select(Place::as_select())
            .load(self.conn)
            .await?;
        Ok(found)
    }

    async fn insert_or_fetch(&mut self, place: Place) -> Result<Place, PlaceStoreError> {
        // A concurrent writer may win the unique address; its row is returned.
        insert_into(places::table)
            .values(&place)
            .on_conflict(places::address)
            .do_nothing()
            .execute(self.conn)
            .await?;

        let stored = places::table
            .find(place.address.as_str())
            .select(Place::as_select())
            .first(self.conn)
            .await?;
        Ok(stored)
    }
}

/// In-process store, for tests and for callers without a database.
#[derive(Default, Debug)]
pub struct MemoryPlaceStore {
    places: HashMap<String, Place>,
}

impl MemoryPlaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_places(places: impl IntoIterator<Item = Place>) -> Self {
        Self {
            places: places
                .into_iter()
                .map(|place| (place.address.clone(), place))
                .collect(),
        }
    }

    pub fn get(&self, address: &str) -> Option<&Place> {
        self.places.get(address)
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

impl PlaceStore for MemoryPlaceStore {
    async fn get_place(&mut self, address: &str) -> Result<Option<Place>, PlaceStoreError> {
        Ok(self.places.get(address).cloned())
    }

    async fn get_places(&mut self, addresses: &[String]) -> Result<Vec<Place>, PlaceStoreError> {
        Ok(addresses
            .iter()
            .filter_map(|address| self.places.get(address).cloned())
            .collect())
    }

    async fn insert_or_fetch(&mut self, place: Place) -> Result<Place, PlaceStoreError> {
        Ok(self
            .places
            .entry(place.address.clone())
            .or_insert(place)
            .clone())
    }
}

impl<S: PlaceStore + Send> PlaceStore for &mut S {
    async fn get_place(&mut self, address: &str) -> Result<Option<Place>, PlaceStoreError> {
        (**self).get_place(address).await
    }

    async fn get_places(&mut self, addresses: &[String]) -> Result<Vec<Place>, PlaceStoreError> {
        (**self).get_places(addresses).await
    }

    async fn insert_or_fetch(&mut self, place: Place) -> Result<Place, PlaceStoreError> {
        (**self).insert_or_fetch(place).await
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use diesel_async::AsyncConnection;

    use super::*;
    use crate::models::Coordinates;

    fn coordinates(lat: &str, lon: &str) -> Coordinates {
        Coordinates::new(
            BigDecimal::from_str(lat).unwrap(),
            BigDecimal::from_str(lon).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_memory_insert_or_fetch_keeps_first_row() {
        let mut store = MemoryPlaceStore::new();
        let first = Place::new("Tverskaya 1", Some(coordinates("55.757", "37.613")));
        let second = Place::new("Tverskaya 1", None);

        let stored = store.insert_or_fetch(first.clone()).await.unwrap();
        assert_eq!(stored, first);

        let stored = store.insert_or_fetch(second).await.unwrap();
        assert_eq!(stored, first);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_memory_get_places_skips_unknown() {
        let mut store = MemoryPlaceStore::with_places([
            Place::new("A", Some(coordinates("1", "2"))),
            Place::new("B", None),
        ]);

        let found = store
            .get_places(&["A".to_string(), "C".to_string(), "B".to_string()])
            .await
            .unwrap();
        let addresses = found.iter().map(|p| p.address.as_str()).collect::<Vec<_>>();
        assert_eq!(addresses, vec!["A", "B"]);
        assert!(store.get_place("C").await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL pointing at a migrated database"]
    async fn test_pg_insert_or_fetch_returns_existing_row() {
        let database_url = std::env::var("DATABASE_URL").unwrap();
        let mut conn = AsyncPgConnection::establish(&database_url).await.unwrap();
        conn.begin_test_transaction().await.unwrap();

        let mut store = PgPlaceStore::new(&mut conn);
        let winner = Place::new("Test address 1", Some(coordinates("55.1", "37.2")));
        let loser = Place::new("Test address 1", None);

        let stored = store.insert_or_fetch(winner).await.unwrap();
        let again = store.insert_or_fetch(loser).await.unwrap();
        assert_eq!(again.coordinates(), stored.coordinates());
        assert_eq!(again.coordinates(), Some(coordinates("55.1", "37.2")));

        let found = store
            .get_places(&["Test address 1".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }
}
