//! Great-circle distances on a spherical earth.
//!
//! See <http://en.wikipedia.org/wiki/Haversine_formula>.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::NoaaError;

/// Units the input coordinates are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AngleUnits {
    #[default]
    Degrees,
    Radians,
}

impl AngleUnits {
    pub fn as_str(&self) -> &'static str {
        match self {
            AngleUnits::Degrees => "deg",
            AngleUnits::Radians => "rad",
        }
    }
}

impl FromStr for AngleUnits {
    type Err = NoaaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deg" => Ok(AngleUnits::Degrees),
            "rad" => Ok(AngleUnits::Radians),
            _ => Err(NoaaError::InvalidArgument(format!(
                "Unknown angle_units '{s}'"
            ))),
        }
    }
}

/// Units a distance is reported in. Each carries its own earth radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnits {
    #[default]
    Miles,
    Km,
}

impl DistanceUnits {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceUnits::Miles => "miles",
            DistanceUnits::Km => "km",
        }
    }

    /// Mean earth radius in these units.
    pub fn earth_radius(&self) -> f64 {
        match self {
            DistanceUnits::Miles => 3963.1676,
            DistanceUnits::Km => 6378.1,
        }
    }
}

impl fmt::Display for DistanceUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceUnits {
    type Err = NoaaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "miles" => Ok(DistanceUnits::Miles),
            "km" => Ok(DistanceUnits::Km),
            _ => Err(NoaaError::InvalidArgument(format!(
                "Unknown dist_units '{s}'"
            ))),
        }
    }
}

/// Haversine distance between two points on a sphere of the given `radius`.
///
/// The result is in whatever unit `radius` is in.
pub fn great_circle_distance(
    lat1: f64,
    lon1: f64,
    lat2: f64,
    lon2: f64,
    radius: f64,
    angle_units: AngleUnits,
) -> f64 {
    let [lat1, lon1, lat2, lon2] = match angle_units {
        AngleUnits::Degrees => [lat1, lon1, lat2, lon2].map(f64::to_radians),
        AngleUnits::Radians => [lat1, lon1, lat2, lon2],
    };

    let hsin = |theta: f64| (theta / 2.0).sin().powi(2);

    let h = hsin(lat2 - lat1) + lat1.cos() * lat2.cos() * hsin(lon2 - lon1);
    // Rounding can push h a hair past 1.0 for antipodal points.
    2.0 * radius * h.clamp(0.0, 1.0).sqrt().asin()
}

/// Distance between two points on the earth's surface.
pub fn earth_distance(
    lat1: f64,
    lon1: f64,
    lat2: f64,
    lon2: f64,
    angle_units: AngleUnits,
    dist_units: DistanceUnits,
) -> f64 {
    great_circle_distance(
        lat1,
        lon1,
        lat2,
        lon2,
        dist_units.earth_radius(),
        angle_units,
    )
}
