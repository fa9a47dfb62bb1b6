use std::path::PathBuf;

use thiserror::Error;

use crate::geodesy::DistanceUnits;

pub type Result<T> = std::result::Result<T, NoaaError>;

/// Every failure the library can report.
#[derive(Debug, Error)]
pub enum NoaaError {
    #[error("Unable to geocode '{query}': {reason}")]
    Geocode { query: String, reason: String },

    #[error("Station directory entry #{index} is missing required field '{field}'")]
    DirectoryParse { index: usize, field: &'static str },

    #[error("Observation document is missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("Station {station_id} did not report '{field}'")]
    StationObservationMissingInfo {
        station_id: String,
        field: &'static str,
    },

    #[error("No valid station observation found within {radius} {units} of ({lat}, {lon})")]
    ValidStationObservationNotFound {
        lat: f64,
        lon: f64,
        radius: f64,
        units: DistanceUnits,
    },

    #[error("Field '{field}' is not numeric: '{value}'")]
    NumericParse { field: String, value: String },

    #[error("Field '{field}' is not a valid timestamp: '{value}'")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("Unable to retrieve forecast: {0}")]
    ForecastUnavailable(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Malformed XML document: {0}")]
    MalformedDocument(String),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request to {url} failed with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Station cache error at {}: {source}", path.display())]
    Cache {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl NoaaError {
    /// True when the error only disqualifies the station that produced it.
    ///
    /// Transport failures and bad per-station documents count, including a
    /// garbled numeric value. Argument and cache errors do not.
    pub fn is_station_local(&self) -> bool {
        matches!(
            self,
            NoaaError::StationObservationMissingInfo { .. }
                | NoaaError::MissingField { .. }
                | NoaaError::NumericParse { .. }
                | NoaaError::InvalidTimestamp { .. }
                | NoaaError::MalformedDocument(_)
                | NoaaError::Xml(_)
                | NoaaError::Http(_)
                | NoaaError::Status { .. }
        )
    }

    pub(crate) fn numeric(field: impl Into<String>, value: impl Into<String>) -> Self {
        NoaaError::NumericParse {
            field: field.into(),
            value: value.into(),
        }
    }
}
