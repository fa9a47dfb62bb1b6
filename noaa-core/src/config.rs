use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{forecast::DEFAULT_NUM_DAYS, geodesy::DistanceUnits, stations::DEFAULT_RADIUS};

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Geocoder credentials.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct GeocoderConfig {
    pub api_key: Option<String>,
}

/// How far to look for stations when compiling an observation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub radius: f64,
    pub units: DistanceUnits,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            units: DistanceUnits::Miles,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// metric = true
/// forecast_days = 5
///
/// [search]
/// radius = 25.0
/// units = "km"
///
/// [geocoder]
/// api_key = "..."
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Celsius instead of Fahrenheit.
    pub metric: bool,
    pub forecast_days: u32,
    pub request_timeout_secs: u64,
    /// Overrides the platform cache location of the station directory.
    pub station_cache: Option<PathBuf>,
    pub search: SearchConfig,
    pub geocoder: GeocoderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metric: false,
            forecast_days: DEFAULT_NUM_DAYS,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            station_cache: None,
            search: SearchConfig::default(),
            geocoder: GeocoderConfig::default(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        if !(cfg.search.radius.is_finite() && cfg.search.radius > 0.0) {
            return Err(anyhow!(
                "search.radius must be a positive number, got {}",
                cfg.search.radius
            ));
        }
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("gov", "noaa", "noaa")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Where the station directory is cached.
    pub fn station_cache_path(&self) -> Result<PathBuf> {
        match &self.station_cache {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::project_dirs()?.cache_dir().join("stations.xml")),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn geocoder_api_key(&self) -> Option<&str> {
        self.geocoder
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
    }

    /// Set or clear the geocoder API key. Blank input clears it.
    pub fn set_geocoder_api_key(&mut self, api_key: &str) {
        let key = api_key.trim();
        self.geocoder.api_key = (!key.is_empty()).then(|| key.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = Config::from_toml("").expect("empty config must parse");

        assert_eq!(cfg, Config::default());
        assert!(!cfg.metric);
        assert_eq!(cfg.forecast_days, 6);
        assert_eq!(cfg.search.radius, 10.0);
        assert_eq!(cfg.search.units, DistanceUnits::Miles);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.geocoder_api_key(), None);
    }

    #[test]
    fn partial_sections_fill_in_defaults() {
        let cfg = Config::from_toml(
            r#"
            metric = true

            [search]
            units = "km"

            [geocoder]
            api_key = "KEY"
            "#,
        )
        .expect("config must parse");

        assert!(cfg.metric);
        assert_eq!(cfg.search.units, DistanceUnits::Km);
        assert_eq!(cfg.search.radius, 10.0);
        assert_eq!(cfg.geocoder_api_key(), Some("KEY"));
    }

    #[test]
    fn unknown_units_are_rejected() {
        let err = Config::from_toml("[search]\nunits = \"leagues\"\n").unwrap_err();
        assert!(err.to_string().contains("leagues") || format!("{err:?}").contains("leagues"));
    }

    #[test]
    fn non_positive_radius_is_rejected() {
        let err = Config::from_toml("[search]\nradius = 0.0\n").unwrap_err();
        assert!(err.to_string().contains("search.radius"));
    }

    #[test]
    fn toml_roundtrip_preserves_settings() {
        let mut cfg = Config {
            metric: true,
            station_cache: Some(PathBuf::from("/tmp/stations.xml")),
            ..Config::default()
        };
        cfg.set_geocoder_api_key("  SECRET ");

        let text = toml::to_string_pretty(&cfg).expect("serialize");
        let back = Config::from_toml(&text).expect("parse");

        assert_eq!(back, cfg);
        assert_eq!(back.geocoder_api_key(), Some("SECRET"));
    }

    #[test]
    fn blank_api_key_clears_it() {
        let mut cfg = Config::default();
        cfg.set_geocoder_api_key("KEY");
        cfg.set_geocoder_api_key("   ");
        assert_eq!(cfg.geocoder.api_key, None);
    }

    #[test]
    fn explicit_station_cache_wins() {
        let cfg = Config {
            station_cache: Some(PathBuf::from("/srv/noaa/stations.xml")),
            ..Config::default()
        };
        assert_eq!(
            cfg.station_cache_path().unwrap(),
            PathBuf::from("/srv/noaa/stations.xml")
        );
    }
}
