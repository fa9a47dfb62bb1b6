//! The NOAA station directory and nearest-station queries over it.

use std::path::Path;

use crate::{
    error::{NoaaError, Result},
    geodesy::{AngleUnits, DistanceUnits, earth_distance},
    model::{Location, Station},
    xml::{Element, decode_document},
};

pub const DEFAULT_RADIUS: f64 = 10.0;

/// Parse the directory feed (`<wx_station_index>` of repeated `<station>`).
///
/// Every station must carry `station_id`, `latitude`, `longitude` and `state`;
/// a single incomplete record fails the whole directory.
pub fn parse_stations(document: &str) -> Result<Vec<Station>> {
    let root = Element::parse(document)?;

    root.children("station")
        .enumerate()
        .map(|(index, elem)| parse_station(index, elem))
        .collect()
}

fn parse_station(index: usize, elem: &Element) -> Result<Station> {
    let required = |field: &'static str| {
        elem.child_text(field)
            .ok_or(NoaaError::DirectoryParse { index, field })
    };

    let latitude = parse_coordinate("latitude", required("latitude")?)?;
    let longitude = parse_coordinate("longitude", required("longitude")?)?;
    let description = required("state")?;
    let station_id = required("station_id")?;

    Ok(Station {
        station_id: station_id.to_string(),
        location: Location::new(latitude, longitude, description),
        name: elem.child_text("station_name").map(str::to_string),
    })
}

pub(crate) fn parse_coordinate(field: &str, text: &str) -> Result<f64> {
    text.parse::<f64>()
        .map_err(|_| NoaaError::numeric(field, text))
}

/// Stations within `radius` of (`lat`, `lon`), nearest first.
///
/// Equal distances keep their input order.
pub fn nearest_stations_within_radius(
    lat: f64,
    lon: f64,
    stations: &[Station],
    radius: f64,
    units: DistanceUnits,
) -> Vec<(f64, &Station)> {
    let mut nearby: Vec<(f64, &Station)> = stations
        .iter()
        .map(|station| {
            let dist = earth_distance(
                station.location.latitude,
                station.location.longitude,
                lat,
                lon,
                AngleUnits::Degrees,
                units,
            );
            (dist, station)
        })
        .filter(|(dist, _)| *dist <= radius)
        .collect();

    // `sort_by` is stable.
    nearby.sort_by(|a, b| a.0.total_cmp(&b.0));
    nearby
}

/// The closest station within [`DEFAULT_RADIUS`] miles, if any.
pub fn nearest_station(lat: f64, lon: f64, stations: &[Station]) -> Option<&Station> {
    nearest_stations_within_radius(lat, lon, stations, DEFAULT_RADIUS, DistanceUnits::Miles)
        .into_iter()
        .next()
        .map(|(_, station)| station)
}

/// Read and parse a station directory previously written to `path`.
pub async fn get_stations_from_file(path: &Path) -> Result<Vec<Station>> {
    let bytes = tokio::fs::read(path).await.map_err(|source| NoaaError::Cache {
        path: path.to_path_buf(),
        source,
    })?;
    parse_stations(&decode_document(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(id: &str, lat: f64, lon: f64) -> Station {
        Station::new(id, Location::new(lat, lon, "TX"))
    }

    const INDEX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <wx_station_index>
          <credit>NOAA's National Weather Service</credit>
          <station>
            <station_id>KATT</station_id>
            <state>TX</state>
            <station_name>Austin City, Austin Camp Mabry</station_name>
            <latitude>30.32</latitude>
            <longitude>-97.77</longitude>
            <xml_url>https://w1.weather.gov/xml/current_obs/KATT.xml</xml_url>
          </station>
          <station>
            <station_id>KAUS</station_id>
            <state>TX</state>
            <latitude>30.18</latitude>
            <longitude>-97.68</longitude>
          </station>
        </wx_station_index>"#;

    #[test]
    fn parses_station_index_in_order() {
        let stations = parse_stations(INDEX).unwrap();

        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].station_id, "KATT");
        assert_eq!(stations[0].location.latitude, 30.32);
        assert_eq!(stations[0].location.longitude, -97.77);
        assert_eq!(stations[0].location.description, "TX");
        assert_eq!(stations[0].name.as_deref(), Some("Austin City, Austin Camp Mabry"));
        assert_eq!(stations[1].station_id, "KAUS");
        assert_eq!(stations[1].name, None);
    }

    #[test]
    fn station_missing_required_field_fails_directory() {
        let doc = r#"<wx_station_index>
              <station><station_id>KATT</station_id><state>TX</state>
                <latitude>30.32</latitude><longitude>-97.77</longitude></station>
              <station><station_id>KAUS</station_id><state>TX</state>
                <latitude>30.18</latitude></station>
            </wx_station_index>"#;

        let err = parse_stations(doc).unwrap_err();
        assert!(matches!(
            err,
            NoaaError::DirectoryParse {
                index: 1,
                field: "longitude"
            }
        ));
    }

    #[test]
    fn non_numeric_coordinate_is_numeric_error() {
        let doc = r#"<wx_station_index><station><station_id>KATT</station_id>
            <state>TX</state><latitude>north</latitude><longitude>-97.77</longitude>
            </station></wx_station_index>"#;

        let err = parse_stations(doc).unwrap_err();
        assert!(matches!(err, NoaaError::NumericParse { .. }));
    }

    #[test]
    fn radius_search_orders_by_distance() {
        let stations = vec![station("A", 30.0, -97.0), station("B", 30.1, -97.1)];

        let nearby = nearest_stations_within_radius(30.0, -97.0, &stations, 50.0, DistanceUnits::Miles);

        assert_eq!(nearby.len(), 2);
        assert_eq!(nearby[0].1.station_id, "A");
        assert!(nearby[0].0.abs() < 1e-9);
        assert_eq!(nearby[1].1.station_id, "B");
        assert!((nearby[1].0 - 9.148).abs() < 0.01, "got {}", nearby[1].0);
    }

    #[test]
    fn radius_search_is_sorted_and_bounded() {
        let stations: Vec<Station> = (0..20)
            .map(|i| {
                let offset = (i as f64 * 7.0 % 13.0) * 0.02;
                station(&format!("S{i}"), 30.0 + offset, -97.0 - offset / 2.0)
            })
            .collect();

        let radius = 12.0;
        let nearby = nearest_stations_within_radius(30.0, -97.0, &stations, radius, DistanceUnits::Miles);

        assert!(!nearby.is_empty());
        assert!(nearby.iter().all(|(d, _)| *d <= radius));
        assert!(nearby.windows(2).all(|w| w[0].0 <= w[1].0));
    }

    #[test]
    fn equal_distances_keep_input_order() {
        let stations = vec![
            station("x", 30.5, -97.0),
            station("near", 30.0, -97.0),
            station("y", 30.5, -97.0),
        ];

        let nearby = nearest_stations_within_radius(30.0, -97.0, &stations, 50.0, DistanceUnits::Miles);
        let ids: Vec<_> = nearby.iter().map(|(_, s)| s.station_id.as_str()).collect();

        assert_eq!(ids, ["near", "x", "y"]);
    }

    #[test]
    fn nothing_within_radius_is_empty_not_error() {
        let stations = vec![station("far", 45.0, -120.0)];
        let nearby = nearest_stations_within_radius(30.0, -97.0, &stations, 10.0, DistanceUnits::Km);
        assert!(nearby.is_empty());
        assert!(nearest_station(30.0, -97.0, &stations).is_none());
    }

    #[test]
    fn nearest_station_of_empty_list_is_none() {
        assert!(nearest_station(30.0, -97.0, &[]).is_none());
    }

    #[test]
    fn nearest_station_picks_closest() {
        let stations = vec![station("B", 30.05, -97.05), station("A", 30.01, -97.0)];
        let nearest = nearest_station(30.0, -97.0, &stations).unwrap();
        assert_eq!(nearest.station_id, "A");
    }
}
