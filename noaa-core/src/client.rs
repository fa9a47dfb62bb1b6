use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use reqwest::Client;

use crate::{
    config::Config,
    error::{NoaaError, Result},
    forecast::{self, Forecast, ForecastOptions, LocationSelector},
    geocode::{GeocodeQuery, Geocoder, GoogleGeocoder},
    model::{Location, Station, StationObservation},
    observation::parse_station_observation,
    reconcile::ObservationSource,
    stations::{get_stations_from_file, parse_stations},
    xml::decode_document,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("noaa-rs/", env!("CARGO_PKG_VERSION"));

/// Where each NOAA feed lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub stations: String,
    /// Per-station documents are `{observation_base}/{station_id}.xml`.
    pub observation_base: String,
    pub forecast: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            stations: "https://www.weather.gov/xml/current_obs/index.xml".to_string(),
            observation_base: "https://www.weather.gov/xml/current_obs".to_string(),
            forecast: "https://graphical.weather.gov/xml/sample_products/browser_interface/ndfdBrowserClientByDay.php".to_string(),
        }
    }
}

impl Endpoints {
    pub fn observation_url(&self, station_id: &str) -> String {
        format!(
            "{}/{}.xml",
            self.observation_base.trim_end_matches('/'),
            station_id
        )
    }
}

#[derive(Debug, Clone)]
pub struct NoaaClient {
    http: Client,
    endpoints: Endpoints,
    geocoder: Arc<dyn Geocoder>,
}

impl NoaaClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        let geocoder = Arc::new(GoogleGeocoder::new(http.clone(), None));
        Ok(Self {
            http,
            endpoints: Endpoints::default(),
            geocoder,
        })
    }

    /// Client with the timeout and geocoder key from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Self::new(config.request_timeout())?;
        let geocoder = GoogleGeocoder::new(
            client.http.clone(),
            config.geocoder_api_key().map(str::to_string),
        );
        Ok(client.with_geocoder(Arc::new(geocoder)))
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.geocoder = geocoder;
        self
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<reqwest::Response> {
        tracing::debug!(url, "fetching");
        let res = self.http.get(url).query(query).send().await?;

        let status = res.status();
        if !status.is_success() {
            return Err(NoaaError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(res)
    }

    /// Fetch an XML feed and decode it per its declared encoding.
    async fn get_document(&self, url: &str, query: &[(&str, String)]) -> Result<String> {
        let bytes = self.get(url, query).await?.bytes().await?;
        Ok(decode_document(&bytes).into_owned())
    }

    /// Raw bytes of the station directory feed.
    pub async fn fetch_station_data(&self) -> Result<Vec<u8>> {
        let res = self.get(&self.endpoints.stations, &[]).await?;
        Ok(res.bytes().await?.to_vec())
    }

    pub async fn get_stations_from_web(&self) -> Result<Vec<Station>> {
        let bytes = self.fetch_station_data().await?;
        parse_stations(&decode_document(&bytes))
    }

    /// Read-through cache of the station directory.
    ///
    /// The network is only touched when `path` does not exist; an existing
    /// file is never refreshed. The copy is written to a sibling temp file and
    /// renamed into place so readers never see a partial directory.
    pub async fn load_stations_from_cache(&self, path: &Path) -> Result<Vec<Station>> {
        let cache_err = |source| NoaaError::Cache {
            path: path.to_path_buf(),
            source,
        };

        if !tokio::fs::try_exists(path).await.map_err(cache_err)? {
            let bytes = self.fetch_station_data().await?;

            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await.map_err(cache_err)?;
            }
            persist_atomically(path, &bytes).await.map_err(cache_err)?;

            tracing::info!(path = %path.display(), bytes = bytes.len(), "cached station directory");
        }

        get_stations_from_file(path).await
    }

    pub async fn geocode(&self, query: &GeocodeQuery) -> Result<Location> {
        self.geocoder.geocode(query).await
    }

    /// Daily forecast for `selector`, days with incomplete data omitted.
    pub async fn daily_forecast(
        &self,
        selector: &LocationSelector,
        opts: &ForecastOptions,
    ) -> Result<Forecast> {
        let (location_params, location) = match selector {
            LocationSelector::ZipCode(zip) => (forecast::zip_code_params(zip), zip.clone()),
            LocationSelector::LatLon(lat, lon) => {
                (forecast::lat_lon_params(*lat, *lon), format!("{lat}, {lon}"))
            }
            LocationSelector::Address(address) => {
                let loc = self
                    .geocode(&GeocodeQuery::Address(address.clone()))
                    .await?;
                (
                    forecast::lat_lon_params(loc.latitude, loc.longitude),
                    loc.description,
                )
            }
        };

        let params = forecast::query_params(&location_params, opts);
        let body = self.get_document(&self.endpoints.forecast, &params).await?;
        let days = forecast::parse_forecast(&body, opts.metric)?;

        Ok(Forecast { location, days })
    }
}

#[async_trait]
impl ObservationSource for NoaaClient {
    async fn observation_by_station_id(&self, station_id: &str) -> Result<StationObservation> {
        let url = self.endpoints.observation_url(station_id);
        let body = self.get_document(&url, &[]).await?;
        parse_station_observation(&body)
    }
}

/// Write `bytes` to a temp sibling of `path`, then rename it into place.
/// On failure the temp file is removed and `path` is left untouched.
async fn persist_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = temp_sibling(path);
    let result = write_then_rename(&tmp, path, bytes).await;
    if result.is_err() {
        // Best effort.
        let _ = tokio::fs::remove_file(&tmp).await;
    }
    result
}

async fn write_then_rename(tmp: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(tmp, bytes).await?;
    tokio::fs::rename(tmp, path).await
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "stations".to_string());
    path.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}
