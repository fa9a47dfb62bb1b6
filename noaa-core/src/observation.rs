//! Parsing of a single station's `current_observation` document.

use chrono::{DateTime, FixedOffset};

use crate::{
    error::{NoaaError, Result},
    model::{
        Location, Observation, Pressure, PressureUnit, Speed, SpeedUnit, Station,
        StationObservation, Temperature, TemperatureUnit, Vector, Wind,
    },
    stations::parse_coordinate,
    xml::Element,
};

const UPDATED_AT: &str = "observation_time_rfc822";

pub fn parse_station_observation(document: &str) -> Result<StationObservation> {
    let root = Element::parse(document)?;
    let station = parse_station(&root)?;
    let observation = parse_observation(&root, &station.station_id)?;
    Ok(StationObservation {
        station,
        observation,
    })
}

fn parse_station(root: &Element) -> Result<Station> {
    let required = |field: &'static str| {
        root.child_text(field)
            .ok_or(NoaaError::MissingField { field })
    };

    let lat = parse_coordinate("latitude", required("latitude")?)?;
    let lon = parse_coordinate("longitude", required("longitude")?)?;
    let description = required("location")?;
    let station_id = required("station_id")?;

    Ok(Station::new(station_id, Location::new(lat, lon, description)))
}

fn parse_observation(root: &Element, station_id: &str) -> Result<Observation> {
    let raw = root
        .child_text(UPDATED_AT)
        .ok_or_else(|| NoaaError::StationObservationMissingInfo {
            station_id: station_id.to_string(),
            field: UPDATED_AT,
        })?;
    let updated_at = parse_rfc822(raw)?;

    let temp = number(root, "temp_f")?.map(|v| Temperature::new(v, TemperatureUnit::Fahrenheit));
    let relative_humidity = number(root, "relative_humidity")?;
    let pressure = number(root, "pressure_in")?.map(|v| Pressure::new(v, PressureUnit::Inches));
    let dewpoint =
        number(root, "dewpoint_f")?.map(|v| Temperature::new(v, TemperatureUnit::Fahrenheit));
    let weather = root.child_text("weather").map(str::to_string);

    let wind_speed = number(root, "wind_mph")?;
    let wind_direction = number(root, "wind_degrees")?;
    let wind_intensity = root.child_text("wind_string");

    // Partial wind is worse than none.
    let wind = match (wind_speed, wind_direction, wind_intensity) {
        (Some(speed), Some(direction), Some(intensity)) => Some(Wind {
            vector: Vector {
                speed: Speed::new(speed, SpeedUnit::Mph),
                direction,
            },
            intensity: intensity.to_string(),
        }),
        _ => None,
    };

    Ok(Observation {
        updated_at,
        temp,
        relative_humidity,
        pressure,
        dewpoint,
        weather,
        wind,
    })
}

/// Absent → `None`; present but not a number → error.
fn number(root: &Element, field: &str) -> Result<Option<f64>> {
    root.child_text(field)
        .map(|text| {
            text.parse::<f64>()
                .map_err(|_| NoaaError::numeric(field, text))
        })
        .transpose()
}

/// NOAA stamps observations like `Fri, 16 Oct 2026 10:53:00 -0500`.
fn parse_rfc822(raw: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc2822(raw).map_err(|_| NoaaError::InvalidTimestamp {
        field: UPDATED_AT,
        value: raw.to_string(),
    })
}
