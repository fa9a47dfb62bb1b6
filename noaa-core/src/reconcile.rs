//! Multi-station observation search and reconciliation.
//!
//! Individual stations report inconsistent parameter sets, so a complete
//! picture for a point usually has to be stitched together from several
//! nearby stations. Closer stations always win.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::{NoaaError, Result},
    geodesy::DistanceUnits,
    model::{Observation, Station, StationObservation},
    stations::nearest_stations_within_radius,
};

/// Anything that can produce the latest observation for a station id.
#[async_trait]
pub trait ObservationSource: Send + Sync + Debug {
    async fn observation_by_station_id(&self, station_id: &str) -> Result<StationObservation>;
}

/// Fetch observations from every station within `radius`, nearest first.
///
/// Stations whose fetch fails with a station-local error are skipped.
pub async fn observations_near<S>(
    source: &S,
    lat: f64,
    lon: f64,
    stations: &[Station],
    radius: f64,
    units: DistanceUnits,
) -> Result<Vec<StationObservation>>
where
    S: ObservationSource + ?Sized,
{
    let mut found = Vec::new();
    for (dist, station) in nearest_stations_within_radius(lat, lon, stations, radius, units) {
        if let Some(so) = fetch_or_skip(source, station, dist, units).await? {
            found.push(so);
        }
    }
    Ok(found)
}

/// Build the most complete observation available within `radius`.
///
/// The first reachable station seeds the result; each farther station only
/// fills attributes that are still empty. Fails with
/// [`NoaaError::ValidStationObservationNotFound`] if no station answered or the
/// result is still incomplete once every candidate has been tried.
pub async fn compiled_observation_near<S>(
    source: &S,
    lat: f64,
    lon: f64,
    stations: &[Station],
    radius: f64,
    units: DistanceUnits,
) -> Result<Observation>
where
    S: ObservationSource + ?Sized,
{
    let mut compiled: Option<Observation> = None;

    for (dist, station) in nearest_stations_within_radius(lat, lon, stations, radius, units) {
        let Some(so) = fetch_or_skip(source, station, dist, units).await? else {
            continue;
        };

        match compiled.as_mut() {
            None => {
                tracing::debug!(station = %station.station_id, "seeding compiled observation");
                compiled = Some(so.observation);
            }
            Some(working) => {
                let filled = working.fill_missing_from(&so.observation);
                tracing::debug!(station = %station.station_id, filled, "merged observation");
            }
        }

        if compiled.as_ref().is_some_and(Observation::is_complete) {
            break;
        }
    }

    match compiled {
        Some(obs) if obs.is_complete() => Ok(obs),
        other => {
            if let Some(obs) = other {
                tracing::debug!(missing = ?obs.missing_fields(), "search exhausted");
            }
            Err(NoaaError::ValidStationObservationNotFound {
                lat,
                lon,
                radius,
                units,
            })
        }
    }
}

async fn fetch_or_skip<S>(
    source: &S,
    station: &Station,
    dist: f64,
    units: DistanceUnits,
) -> Result<Option<StationObservation>>
where
    S: ObservationSource + ?Sized,
{
    match source.observation_by_station_id(&station.station_id).await {
        Ok(so) => Ok(Some(so)),
        Err(err) if err.is_station_local() => {
            tracing::warn!(
                station = %station.station_id,
                distance = dist,
                units = %units,
                "skipping station: {err}"
            );
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
