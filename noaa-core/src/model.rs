use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::geodesy::{AngleUnits, DistanceUnits, earth_distance};

const MILLIBARS_PER_INCH: f64 = 33.8639;
const KM_PER_MILE: f64 = 1.609344;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub description: String,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, description: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            description: description.into(),
        }
    }

    pub fn distance_to(&self, other: &Location, units: DistanceUnits) -> f64 {
        earth_distance(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
            AngleUnits::Degrees,
            units,
        )
    }
}

/// A value tagged with the unit it was reported in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement<U> {
    pub value: f64,
    pub unit: U,
}

impl<U> Measurement<U> {
    pub const fn new(value: f64, unit: U) -> Self {
        Self { value, unit }
    }
}

impl<U: fmt::Display> fmt::Display for Measurement<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[serde(rename = "F")]
    Fahrenheit,
    #[serde(rename = "C")]
    Celsius,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PressureUnit {
    #[serde(rename = "in")]
    Inches,
    Millibars,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedUnit {
    Mph,
    Kph,
}

impl TemperatureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureUnit::Fahrenheit => "F",
            TemperatureUnit::Celsius => "C",
        }
    }
}

impl PressureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            PressureUnit::Inches => "in",
            PressureUnit::Millibars => "millibars",
        }
    }
}

impl SpeedUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeedUnit::Mph => "mph",
            SpeedUnit::Kph => "kph",
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PressureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for SpeedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Temperature = Measurement<TemperatureUnit>;
pub type Pressure = Measurement<PressureUnit>;
pub type Speed = Measurement<SpeedUnit>;

impl Temperature {
    pub fn fahrenheit(&self) -> f64 {
        match self.unit {
            TemperatureUnit::Fahrenheit => self.value,
            TemperatureUnit::Celsius => (9.0 / 5.0) * self.value + 32.0,
        }
    }

    pub fn celsius(&self) -> f64 {
        match self.unit {
            TemperatureUnit::Celsius => self.value,
            TemperatureUnit::Fahrenheit => (5.0 / 9.0) * (self.value - 32.0),
        }
    }
}

impl Pressure {
    pub fn inches(&self) -> f64 {
        match self.unit {
            PressureUnit::Inches => self.value,
            PressureUnit::Millibars => self.value / MILLIBARS_PER_INCH,
        }
    }

    pub fn millibars(&self) -> f64 {
        match self.unit {
            PressureUnit::Millibars => self.value,
            PressureUnit::Inches => self.value * MILLIBARS_PER_INCH,
        }
    }
}

impl Speed {
    pub fn mph(&self) -> f64 {
        match self.unit {
            SpeedUnit::Mph => self.value,
            SpeedUnit::Kph => self.value / KM_PER_MILE,
        }
    }

    pub fn kph(&self) -> f64 {
        match self.unit {
            SpeedUnit::Kph => self.value,
            SpeedUnit::Mph => self.value * KM_PER_MILE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    pub speed: Speed,
    /// Compass degrees, as reported by the station.
    pub direction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub vector: Vector,
    /// Free-form description, e.g. "From the South at 9 MPH".
    pub intensity: String,
}

/// A fixed reporting point from the station directory. Identity is `station_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub station_id: String,
    pub location: Location,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Station {
    pub fn new(station_id: impl Into<String>, location: Location) -> Self {
        Self {
            station_id: station_id.into(),
            location,
            name: None,
        }
    }
}

/// The attributes reconciliation fills in across stations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObservationField {
    Temp,
    RelativeHumidity,
    Pressure,
    Dewpoint,
    Weather,
    Wind,
}

impl ObservationField {
    pub const ALL: [ObservationField; 6] = [
        ObservationField::Temp,
        ObservationField::RelativeHumidity,
        ObservationField::Pressure,
        ObservationField::Dewpoint,
        ObservationField::Weather,
        ObservationField::Wind,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObservationField::Temp => "temp",
            ObservationField::RelativeHumidity => "relative_humidity",
            ObservationField::Pressure => "pressure",
            ObservationField::Dewpoint => "dewpoint",
            ObservationField::Weather => "weather",
            ObservationField::Wind => "wind",
        }
    }
}

/// What one station reported at one point in time.
///
/// Stations report heterogeneous parameter sets: identification is consistent,
/// but nothing weather-related can be assumed present. Absent values are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub updated_at: DateTime<FixedOffset>,
    pub temp: Option<Temperature>,
    pub relative_humidity: Option<f64>,
    pub pressure: Option<Pressure>,
    pub dewpoint: Option<Temperature>,
    pub weather: Option<String>,
    pub wind: Option<Wind>,
}

impl Observation {
    /// An observation with nothing but its timestamp.
    pub fn empty(updated_at: DateTime<FixedOffset>) -> Self {
        Self {
            updated_at,
            temp: None,
            relative_humidity: None,
            pressure: None,
            dewpoint: None,
            weather: None,
            wind: None,
        }
    }

    pub fn has(&self, field: ObservationField) -> bool {
        match field {
            ObservationField::Temp => self.temp.is_some(),
            ObservationField::RelativeHumidity => self.relative_humidity.is_some(),
            ObservationField::Pressure => self.pressure.is_some(),
            ObservationField::Dewpoint => self.dewpoint.is_some(),
            ObservationField::Weather => self.weather.is_some(),
            ObservationField::Wind => self.wind.is_some(),
        }
    }

    pub fn missing_fields(&self) -> Vec<ObservationField> {
        ObservationField::ALL
            .into_iter()
            .filter(|f| !self.has(*f))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        ObservationField::ALL.iter().all(|f| self.has(*f))
    }

    /// Copy every attribute that is `None` here and present in `other`.
    /// Filled attributes are never overwritten. Returns the number filled.
    pub fn fill_missing_from(&mut self, other: &Observation) -> usize {
        fn fill<T: Clone>(slot: &mut Option<T>, from: &Option<T>) -> usize {
            match (slot.is_none(), from) {
                (true, Some(v)) => {
                    *slot = Some(v.clone());
                    1
                }
                _ => 0,
            }
        }

        fill(&mut self.temp, &other.temp)
            + fill(&mut self.relative_humidity, &other.relative_humidity)
            + fill(&mut self.pressure, &other.pressure)
            + fill(&mut self.dewpoint, &other.dewpoint)
            + fill(&mut self.weather, &other.weather)
            + fill(&mut self.wind, &other.wind)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationObservation {
    pub station: Station,
    pub observation: Observation,
}

/// One forecast day. Only produced when every value is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherDataPoint {
    pub date: NaiveDate,
    pub min_temp: Temperature,
    pub max_temp: Temperature,
    pub conditions: String,
}
