//! Core library for the `noaa` CLI.
//!
//! This crate defines:
//! - Typed models for NOAA stations, observations and daily forecasts
//! - The station directory (with a read-through file cache) and nearest-station search
//! - Multi-station observation reconciliation
//! - NDFD forecast retrieval and geocoding
//! - Configuration handling
//!
//! It is used by `noaa-cli`, but can also be reused by other binaries or services.

pub mod client;
pub mod config;
pub mod error;
pub mod forecast;
pub mod geocode;
pub mod geodesy;
pub mod model;
pub mod observation;
pub mod reconcile;
pub mod stations;
pub mod xml;

pub use client::{Endpoints, NoaaClient};
pub use config::Config;
pub use error::{NoaaError, Result};
pub use forecast::{Forecast, ForecastOptions, LocationSelector};
pub use geocode::{GeocodeQuery, Geocoder, GoogleGeocoder};
pub use geodesy::{AngleUnits, DistanceUnits, earth_distance, great_circle_distance};
pub use model::{
    Location, Observation, ObservationField, Pressure, PressureUnit, Speed, SpeedUnit, Station,
    StationObservation, Temperature, TemperatureUnit, Vector, WeatherDataPoint, Wind,
};
pub use reconcile::{ObservationSource, compiled_observation_near, observations_near};
pub use stations::{nearest_station, nearest_stations_within_radius, parse_stations};
