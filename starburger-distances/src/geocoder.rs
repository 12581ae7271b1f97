use std::{
    collections::{HashMap, HashSet},
    str::FromStr,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use bigdecimal::BigDecimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::models::Coordinates;

pub const YANDEX_GEOCODER_URL: &str = "https://geocode-maps.yandex.ru";

pub trait Geocoder {
    /// Looks up `address` and returns the coordinates of the most relevant
    /// candidate, or `None` when the service knows no such place.
    fn fetch_coordinates(
        &self,
        address: &str,
    ) -> impl std::future::Future<Output = Result<Option<Coordinates>, GeocodingError>> + Send;
}

impl<G: Geocoder + Sync> Geocoder for &G {
    async fn fetch_coordinates(
        &self,
        address: &str,
    ) -> Result<Option<Coordinates>, GeocodingError> {
        (**self).fetch_coordinates(address).await
    }
}

#[derive(Error, Debug)]
pub enum GeocodingError {
    #[error("geocoder is unavailable: {0}")]
    Unavailable(String),
    #[error("malformed geocoder response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for GeocodingError {
    fn from(err: reqwest::Error) -> Self {
        GeocodingError::Unavailable(err.to_string())
    }
}

/// Client for the Yandex HTTP geocoder.
#[derive(Clone, Debug)]
pub struct YandexGeocoder {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl YandexGeocoder {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, GeocodingError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/1.x", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        })
    }
}

impl Geocoder for YandexGeocoder {
    #[instrument(skip(self))]
    async fn fetch_coordinates(
        &self,
        address: &str,
    ) -> Result<Option<Coordinates>, GeocodingError> {
        let body = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("geocode", address),
                ("apikey", self.api_key.as_str()),
                ("format", "json"),
            ])
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let coordinates = parse_response(&body)?;
        debug!(found = coordinates.is_some(), "geocoder answered");
        Ok(coordinates)
    }
}

/// Answers from a fixed table. Addresses marked unavailable fail as if the
/// service could not be reached.
#[derive(Default, Debug)]
pub struct StaticGeocoder {
    answers: HashMap<String, Coordinates>,
    unavailable: HashSet<String>,
    calls: AtomicUsize,
}

impl StaticGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(mut self, address: &str, coordinates: Coordinates) -> Self {
        self.answers.insert(address.to_string(), coordinates);
        self
    }

    pub fn with_unavailable(mut self, address: &str) -> Self {
        self.unavailable.insert(address.to_string());
        self
    }

    /// Number of lookups made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Geocoder for StaticGeocoder {
    async fn fetch_coordinates(
        &self,
        address: &str,
    ) -> Result<Option<Coordinates>, GeocodingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.contains(address) {
            return Err(GeocodingError::Unavailable(format!(
                "no route to geocoder for {address:?}"
            )));
        }
        Ok(self.answers.get(address).cloned())
    }
}

#[derive(Deserialize)]
struct GeocodeResponse {
    response: GeocodeBody,
}

#[derive(Deserialize)]
struct GeocodeBody {
    #[serde(rename = "GeoObjectCollection")]
    collection: GeoObjectCollection,
}

#[derive(Deserialize)]
struct GeoObjectCollection {
    #[serde(rename = "featureMember")]
    feature_members: Vec<FeatureMember>,
}

#[derive(Deserialize)]
struct FeatureMember {
    #[serde(rename = "GeoObject")]
    geo_object: GeoObject,
}

#[derive(Deserialize)]
struct GeoObject {
    #[serde(rename = "Point")]
    point: Point,
}

#[derive(Deserialize)]
struct Point {
    pos: String,
}

/// Extracts the first candidate from a geocoder JSON body.
pub fn parse_response(body: &[u8]) -> Result<Option<Coordinates>, GeocodingError> {
    let response: GeocodeResponse = serde_json::from_slice(body)
        .map_err(|e| GeocodingError::MalformedResponse(e.to_string()))?;

    match response.response.collection.feature_members.first() {
        Some(member) => parse_position(&member.geo_object.point.pos).map(Some),
        None => Ok(None),
    }
}

/// Parses a `"lon lat"` position string.
pub fn parse_position(pos: &str) -> Result<Coordinates, GeocodingError> {
    let malformed = || GeocodingError::MalformedResponse(format!("invalid position {pos:?}"));

    let mut parts = pos.split_whitespace();
    let (Some(lon), Some(lat), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(malformed());
    };
    let lon = BigDecimal::from_str(lon).map_err(|_| malformed())?;
    let lat = BigDecimal::from_str(lat).map_err(|_| malformed())?;

    Coordinates::new(lat, lon).ok_or_else(malformed)
}
