//! Free-text and reverse geocoding.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt::Debug;

use crate::{
    error::{NoaaError, Result},
    model::Location,
};

pub const GOOGLE_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeQuery {
    Address(String),
    Coordinates { lat: f64, lon: f64 },
}

impl std::fmt::Display for GeocodeQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeocodeQuery::Address(address) => f.write_str(address),
            GeocodeQuery::Coordinates { lat, lon } => write!(f, "{lat},{lon}"),
        }
    }
}

/// Resolves a query to coordinates plus a formatted address.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn geocode(&self, query: &GeocodeQuery) -> Result<Location>;
}

/// Google Geocoding API. High-volume use needs an API key.
#[derive(Debug, Clone)]
pub struct GoogleGeocoder {
    http: Client,
    url: String,
    api_key: Option<String>,
}

impl GoogleGeocoder {
    pub fn new(http: Client, api_key: Option<String>) -> Self {
        Self::with_url(http, GOOGLE_GEOCODE_URL, api_key)
    }

    pub fn with_url(http: Client, url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            url: url.into(),
            api_key,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: String,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, query: &GeocodeQuery) -> Result<Location> {
        let mut params = match query {
            GeocodeQuery::Address(address) => vec![("address", address.clone())],
            GeocodeQuery::Coordinates { lat, lon } => vec![("latlng", format!("{lat},{lon}"))],
        };
        if let Some(key) = &self.api_key {
            params.push(("key", key.clone()));
        }

        tracing::debug!(%query, "geocoding");
        let res = self.http.get(&self.url).query(&params).send().await?;

        let status = res.status();
        if !status.is_success() {
            return Err(NoaaError::Geocode {
                query: query.to_string(),
                reason: format!("geocoder responded with status {status}"),
            });
        }

        let body: GeocodeResponse = res.json().await?;
        into_location(query, body)
    }
}

fn into_location(query: &GeocodeQuery, body: GeocodeResponse) -> Result<Location> {
    let failed = |reason: String| NoaaError::Geocode {
        query: query.to_string(),
        reason,
    };

    if body.status != "OK" {
        let reason = match body.error_message {
            Some(msg) => format!("{}: {msg}", body.status),
            None => body.status,
        };
        return Err(failed(reason));
    }

    let best = body
        .results
        .into_iter()
        .next()
        .ok_or_else(|| failed("no results".to_string()))?;

    Ok(Location::new(
        best.geometry.location.lat,
        best.geometry.location.lng,
        best.formatted_address,
    ))
}
