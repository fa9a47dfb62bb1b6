//! NDFD "browser client by day" forecasts.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate};
use serde::Serialize;

use crate::{
    error::{NoaaError, Result},
    model::{Temperature, TemperatureUnit, WeatherDataPoint},
    xml::Element,
};

pub const DEFAULT_NUM_DAYS: u32 = 6;

/// Where to forecast for.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationSelector {
    ZipCode(String),
    LatLon(f64, f64),
    /// Free text, resolved through a geocoder first.
    Address(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastOptions {
    pub start_date: NaiveDate,
    pub num_days: u32,
    pub metric: bool,
}

impl ForecastOptions {
    pub fn starting_today() -> Self {
        Self {
            start_date: chrono::Local::now().date_naive(),
            num_days: DEFAULT_NUM_DAYS,
            metric: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    /// Human-readable place the forecast is for.
    pub location: String,
    pub days: Vec<WeatherDataPoint>,
}

/// Query parameters for the forecast service.
///
/// The service is sensitive to parameter order, so this is a list and not a map.
pub fn query_params(location: &[(&'static str, String)], opts: &ForecastOptions) -> Vec<(&'static str, String)> {
    let unit = if opts.metric { "m" } else { "e" };

    let mut params = location.to_vec();
    params.extend([
        ("format", "24 hourly".to_string()),
        ("startDate", opts.start_date.format("%Y-%m-%d").to_string()),
        ("numDays", opts.num_days.to_string()),
        ("Unit", unit.to_string()),
    ]);
    params
}

pub fn zip_code_params(zip_code: &str) -> Vec<(&'static str, String)> {
    vec![("zipCodeList", zip_code.to_string())]
}

pub fn lat_lon_params(lat: f64, lon: f64) -> Vec<(&'static str, String)> {
    vec![("lat", lat.to_string()), ("lon", lon.to_string())]
}

/// Parse a DWML forecast document into one data point per complete day.
pub fn parse_forecast(document: &str, metric: bool) -> Result<Vec<WeatherDataPoint>> {
    let root = Element::parse(document)?;

    if root.name == "error" {
        return Err(NoaaError::ForecastUnavailable(
            "service returned an error document".into(),
        ));
    }

    let layouts = parse_time_layouts(&root)?;
    let (min_key, min_temps) = parse_temperatures(&root, "minimum")?;
    let (max_key, max_temps) = parse_temperatures(&root, "maximum")?;
    let (conditions_key, conditions) = parse_conditions(&root)?;

    if min_key != max_key || min_key != conditions_key {
        return Err(NoaaError::ForecastUnavailable(format!(
            "series reference different time layouts (minimum: {min_key}, maximum: {max_key}, weather: {conditions_key})"
        )));
    }

    let dates = layouts.get(min_key).ok_or_else(|| {
        NoaaError::ForecastUnavailable(format!("time layout '{min_key}' not found"))
    })?;

    let unit = if metric {
        TemperatureUnit::Celsius
    } else {
        TemperatureUnit::Fahrenheit
    };

    let days = dates
        .iter()
        .zip(min_temps)
        .zip(max_temps)
        .zip(conditions)
        .filter_map(|(((date, min), max), cond)| match (min, max, cond) {
            (Some(min), Some(max), Some(cond)) => Some(WeatherDataPoint {
                date: *date,
                min_temp: Temperature::new(min, unit),
                max_temp: Temperature::new(max, unit),
                conditions: cond.to_string(),
            }),
            _ => {
                tracing::debug!(%date, "dropping forecast day with incomplete data");
                None
            }
        })
        .collect();

    Ok(days)
}

/// `layout-key` → start date of each period.
fn parse_time_layouts(root: &Element) -> Result<HashMap<&str, Vec<NaiveDate>>> {
    let mut layouts = HashMap::new();

    for layout in root.descendants("time-layout") {
        let key = layout.child_text("layout-key").ok_or_else(|| {
            NoaaError::ForecastUnavailable("time-layout without a layout-key".into())
        })?;

        let dates = layout
            .children("start-valid-time")
            .map(|start| {
                let raw = start.text.trim();
                DateTime::parse_from_rfc3339(raw)
                    .map(|dt| dt.date_naive())
                    .map_err(|_| NoaaError::InvalidTimestamp {
                        field: "start-valid-time",
                        value: raw.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        layouts.insert(key, dates);
    }

    Ok(layouts)
}

fn parse_temperatures<'a>(root: &'a Element, kind: &str) -> Result<(&'a str, Vec<Option<f64>>)> {
    let series = root
        .descendants("temperature")
        .into_iter()
        .find(|t| t.attr("type") == Some(kind))
        .ok_or_else(|| {
            NoaaError::ForecastUnavailable(format!("no {kind} temperature series"))
        })?;

    let key = layout_key(series, "temperature")?;

    // A nil or empty value means no forecast for that period.
    let values = series
        .descendants("value")
        .into_iter()
        .map(|value| {
            let text = value.text.trim();
            if value.is_nil() || text.is_empty() {
                return Ok(None);
            }
            text.parse::<f64>()
                .map(Some)
                .map_err(|_| NoaaError::numeric(format!("{kind} temperature"), text))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((key, values))
}

fn parse_conditions(root: &Element) -> Result<(&str, Vec<Option<&str>>)> {
    let weather = root
        .descendants("weather")
        .into_iter()
        .next()
        .ok_or_else(|| NoaaError::ForecastUnavailable("no weather series".into()))?;

    let key = layout_key(weather, "weather")?;

    let values = weather
        .descendants("weather-conditions")
        .into_iter()
        .map(|c| c.attr("weather-summary").filter(|s| !s.is_empty()))
        .collect();

    Ok((key, values))
}

fn layout_key<'a>(series: &'a Element, what: &str) -> Result<&'a str> {
    series.attr("time-layout").ok_or_else(|| {
        NoaaError::ForecastUnavailable(format!("{what} series has no time-layout"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(min_layout: &str, conditions: [&str; 3]) -> String {
        format!(
            r#"<?xml version="1.0"?>
            <dwml version="1.0" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
              <head><product concise-name="dwmlByDay"/></head>
              <data>
                <location><location-key>point1</location-key></location>
                <time-layout time-coordinate="local" summarization="24hourly">
                  <layout-key>k-p24h-n3-1</layout-key>
                  <start-valid-time>2026-10-16T06:00:00-05:00</start-valid-time>
                  <end-valid-time>2026-10-17T06:00:00-05:00</end-valid-time>
                  <start-valid-time>2026-10-17T06:00:00-05:00</start-valid-time>
                  <end-valid-time>2026-10-18T06:00:00-05:00</end-valid-time>
                  <start-valid-time>2026-10-18T06:00:00-05:00</start-valid-time>
                  <end-valid-time>2026-10-19T06:00:00-05:00</end-valid-time>
                </time-layout>
                <time-layout time-coordinate="local" summarization="12hourly">
                  <layout-key>k-p12h-n6-2</layout-key>
                  <start-valid-time>2026-10-16T06:00:00-05:00</start-valid-time>
                  <end-valid-time>2026-10-16T18:00:00-05:00</end-valid-time>
                </time-layout>
                <parameters applicable-location="point1">
                  <temperature type="maximum" units="Fahrenheit" time-layout="k-p24h-n3-1">
                    <name>Daily Maximum Temperature</name>
                    <value>84</value><value>80</value><value>77</value>
                  </temperature>
                  <temperature type="minimum" units="Fahrenheit" time-layout="{min_layout}">
                    <name>Daily Minimum Temperature</name>
                    <value>63</value><value>61</value><value>58</value>
                  </temperature>
                  <weather time-layout="k-p24h-n3-1">
                    <name>Weather Type, Coverage, and Intensity</name>
                    {}
                    {}
                    {}
                  </weather>
                </parameters>
              </data>
            </dwml>"#,
            conditions[0], conditions[1], conditions[2]
        )
    }

    const SUNNY: &str = r#"<weather-conditions weather-summary="Sunny"/>"#;
    const RAIN: &str = r#"<weather-conditions weather-summary="Chance Rain Showers"><value coverage="chance" intensity="light" weather-type="rain showers" qualifier="none"/></weather-conditions>"#;
    const NIL: &str = r#"<weather-conditions xsi:nil="true"/>"#;

    #[test]
    fn parses_aligned_series() {
        let doc = document("k-p24h-n3-1", [SUNNY, RAIN, SUNNY]);
        let days = parse_forecast(&doc, false).unwrap();

        assert_eq!(days.len(), 3);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
        assert_eq!(days[0].min_temp, Temperature::new(63.0, TemperatureUnit::Fahrenheit));
        assert_eq!(days[0].max_temp, Temperature::new(84.0, TemperatureUnit::Fahrenheit));
        assert_eq!(days[0].conditions, "Sunny");
        assert_eq!(days[1].conditions, "Chance Rain Showers");
        assert_eq!(days[2].date, NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
    }

    #[test]
    fn metric_tags_temperatures_celsius() {
        let doc = document("k-p24h-n3-1", [SUNNY, SUNNY, SUNNY]);
        let days = parse_forecast(&doc, true).unwrap();
        assert!(days.iter().all(|d| d.min_temp.unit == TemperatureUnit::Celsius));
    }

    #[test]
    fn day_with_missing_condition_is_dropped() {
        let doc = document("k-p24h-n3-1", [SUNNY, NIL, RAIN]);
        let days = parse_forecast(&doc, false).unwrap();

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
        assert_eq!(days[1].date, NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        assert_eq!(days[1].conditions, "Chance Rain Showers");
    }

    #[test]
    fn day_with_nil_temperature_is_dropped() {
        let doc = document("k-p24h-n3-1", [SUNNY, SUNNY, SUNNY])
            .replace("<value>61</value>", r#"<value xsi:nil="true"/>"#);
        let days = parse_forecast(&doc, false).unwrap();

        let dates: Vec<_> = days.iter().map(|d| d.date.to_string()).collect();
        assert_eq!(dates, ["2026-10-16", "2026-10-18"]);
    }

    #[test]
    fn mismatched_time_layouts_fail_fast() {
        let doc = document("k-p12h-n6-2", [SUNNY, SUNNY, SUNNY]);
        let err = parse_forecast(&doc, false).unwrap_err();

        assert!(matches!(err, NoaaError::ForecastUnavailable(_)));
        assert!(err.to_string().contains("k-p12h-n6-2"));
    }

    #[test]
    fn error_root_is_forecast_unavailable() {
        let err = parse_forecast("<error><h2>ERROR</h2><pre>bad zip</pre></error>", false).unwrap_err();
        assert!(matches!(err, NoaaError::ForecastUnavailable(_)));
    }

    #[test]
    fn garbled_temperature_is_numeric_error() {
        let doc = document("k-p24h-n3-1", [SUNNY, SUNNY, SUNNY]).replace("<value>80</value>", "<value>hot</value>");
        let err = parse_forecast(&doc, false).unwrap_err();
        assert!(matches!(err, NoaaError::NumericParse { .. }));
    }

    #[test]
    fn query_params_keep_service_order() {
        let opts = ForecastOptions {
            start_date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            num_days: 6,
            metric: true,
        };

        let params = query_params(&lat_lon_params(30.25, -97.75), &opts);
        let keys: Vec<_> = params.iter().map(|(k, _)| *k).collect();

        assert_eq!(keys, ["lat", "lon", "format", "startDate", "numDays", "Unit"]);
        assert_eq!(params[2].1, "24 hourly");
        assert_eq!(params[3].1, "2026-10-16");
        assert_eq!(params[5].1, "m");

        let params = query_params(&zip_code_params("78701"), &ForecastOptions { metric: false, ..opts });
        assert_eq!(params[0], ("zipCodeList", "78701".to_string()));
        assert_eq!(params.last().unwrap().1, "e");
    }
}
