use std::io;

use anyhow::{Context, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use crossterm::tty::IsTty;
use inquire::{Confirm, CustomType, Password, PasswordDisplayMode, Select};

use noaa_core::{
    Config, DistanceUnits, ForecastOptions, GeocodeQuery, LocationSelector, NoaaClient, Station,
    compiled_observation_near, nearest_stations_within_radius,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "noaa", version, about = "NOAA forecasts and station observations")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the daily forecast for a location.
    Forecast {
        /// A zip code, a latitude/longitude pair, or a free-text address.
        #[arg(required = true, allow_negative_numbers = true)]
        location: Vec<String>,

        /// Use Celsius for temperatures.
        #[arg(short, long)]
        metric: bool,

        /// Number of days to forecast.
        #[arg(long)]
        days: Option<u32>,

        /// First forecast day (YYYY-MM-DD); defaults to today.
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Compile the current observation from stations near a location.
    Observe {
        /// A zip code, a latitude/longitude pair, or a free-text address.
        #[arg(required = true, allow_negative_numbers = true)]
        location: Vec<String>,

        /// Search radius; defaults to the configured radius.
        #[arg(long)]
        radius: Option<f64>,

        /// "miles" or "km"; defaults to the configured units.
        #[arg(long)]
        units: Option<DistanceUnits>,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// List stations near a coordinate, nearest first.
    Stations {
        #[arg(allow_negative_numbers = true)]
        lat: f64,

        #[arg(allow_negative_numbers = true)]
        lon: f64,

        #[arg(long)]
        radius: Option<f64>,

        #[arg(long)]
        units: Option<DistanceUnits>,
    },

    /// Interactively write the configuration file.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Forecast {
                location,
                metric,
                days,
                start,
                json,
            } => {
                let client = NoaaClient::from_config(&config)?;
                let selector = parse_location(&location)?;
                let opts = ForecastOptions {
                    start_date: start.unwrap_or(ForecastOptions::starting_today().start_date),
                    num_days: days.unwrap_or(config.forecast_days),
                    metric: metric || config.metric,
                };

                let forecast = client.daily_forecast(&selector, &opts).await?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&forecast)?);
                } else {
                    print!("{}", render::forecast(&forecast, io::stdout().is_tty()));
                }
            }
            Command::Observe {
                location,
                radius,
                units,
                json,
            } => {
                let client = NoaaClient::from_config(&config)?;
                let (lat, lon) = coordinates(&client, &parse_location(&location)?).await?;
                let radius = radius.unwrap_or(config.search.radius);
                let units = units.unwrap_or(config.search.units);

                let stations = load_stations(&client, &config).await?;
                let observation =
                    compiled_observation_near(&client, lat, lon, &stations, radius, units).await?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&observation)?);
                } else {
                    print!("{}", render::observation(lat, lon, &observation, config.metric));
                }
            }
            Command::Stations {
                lat,
                lon,
                radius,
                units,
            } => {
                let client = NoaaClient::from_config(&config)?;
                let radius = radius.unwrap_or(config.search.radius);
                let units = units.unwrap_or(config.search.units);

                let stations = load_stations(&client, &config).await?;
                let nearby = nearest_stations_within_radius(lat, lon, &stations, radius, units);

                if nearby.is_empty() {
                    println!("No stations within {radius} {units} of {lat}, {lon}");
                } else {
                    print!("{}", render::stations(&nearby, units));
                }
            }
            Command::Configure => configure(config)?,
        }

        Ok(())
    }
}

/// Interpret positional location words.
///
/// One number is a zip code, two numbers are latitude and longitude, and
/// anything that isn't all numbers is a free-text address.
pub fn parse_location(words: &[String]) -> anyhow::Result<LocationSelector> {
    let all_numbers = words.iter().all(|w| w.parse::<f64>().is_ok());

    if !all_numbers {
        return Ok(LocationSelector::Address(words.join(" ")));
    }

    match words {
        [zip] => Ok(LocationSelector::ZipCode(zip.clone())),
        [lat, lon] => Ok(LocationSelector::LatLon(lat.parse()?, lon.parse()?)),
        _ => bail!("Expected a zip code, a latitude and longitude, or an address"),
    }
}

async fn coordinates(
    client: &NoaaClient,
    selector: &LocationSelector,
) -> anyhow::Result<(f64, f64)> {
    let query = match selector {
        LocationSelector::LatLon(lat, lon) => return Ok((*lat, *lon)),
        LocationSelector::ZipCode(text) | LocationSelector::Address(text) => {
            GeocodeQuery::Address(text.clone())
        }
    };

    let location = client.geocode(&query).await?;
    tracing::info!(address = %location.description, "resolved location");
    Ok((location.latitude, location.longitude))
}

async fn load_stations(client: &NoaaClient, config: &Config) -> anyhow::Result<Vec<Station>> {
    let path = config.station_cache_path()?;
    client
        .load_stations_from_cache(&path)
        .await
        .with_context(|| format!("Failed to load station directory ({})", path.display()))
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let key = Password::new("Google Geocoding API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Leave blank to keep the current key")
        .prompt()?;
    if !key.trim().is_empty() {
        config.set_geocoder_api_key(&key);
    }

    config.metric = Confirm::new("Use Celsius for temperatures?")
        .with_default(config.metric)
        .prompt()?;

    let current = match config.search.units {
        DistanceUnits::Miles => 0,
        DistanceUnits::Km => 1,
    };
    let units = Select::new("Distance units:", vec!["miles", "km"])
        .with_starting_cursor(current)
        .prompt()?;
    config.search.units = units.parse()?;

    config.search.radius = CustomType::<f64>::new("Station search radius:")
        .with_default(config.search.radius)
        .with_error_message("Please type a number")
        .prompt()?;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn single_number_is_zip_code() {
        assert_eq!(
            parse_location(&words("78701")).unwrap(),
            LocationSelector::ZipCode("78701".into())
        );
    }

    #[test]
    fn two_numbers_are_lat_lon() {
        assert_eq!(
            parse_location(&words("30.25 -97.75")).unwrap(),
            LocationSelector::LatLon(30.25, -97.75)
        );
    }

    #[test]
    fn words_are_an_address() {
        assert_eq!(
            parse_location(&words("Austin TX")).unwrap(),
            LocationSelector::Address("Austin TX".into())
        );
    }

    #[test]
    fn three_numbers_are_rejected() {
        assert!(parse_location(&words("1 2 3")).is_err());
    }

    #[test]
    fn cli_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from(["noaa", "forecast", "-m", "30.25", "-97.75"]).unwrap();
        match cli.command {
            Command::Forecast {
                location, metric, ..
            } => {
                assert!(metric);
                assert_eq!(location, ["30.25", "-97.75"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_parses_units() {
        let cli =
            Cli::try_parse_from(["noaa", "stations", "30.0", "-97.0", "--units", "km"]).unwrap();
        match cli.command {
            Command::Stations { units, .. } => assert_eq!(units, Some(DistanceUnits::Km)),
            other => panic!("unexpected command: {other:?}"),
        }

        let bad = Cli::try_parse_from(["noaa", "stations", "30.0", "-97.0", "--units", "parsecs"]);
        assert!(bad.is_err());
    }
}
