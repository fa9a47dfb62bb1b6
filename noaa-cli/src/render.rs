//! Plain-text output for the terminal.

use std::fmt::Write;

use crossterm::style::{Color, Stylize};
use noaa_core::{
    DistanceUnits, Forecast, Observation, Station, Temperature, TemperatureUnit,
};

const CONDITIONS_WIDTH: usize = 30;
const TEMP_WIDTH: usize = 5;

/// One line per day: conditions, min, max, then a bar for the max.
///
/// `color` should only be set when stdout is a terminal.
pub fn forecast(forecast: &Forecast, color: bool) -> String {
    let mut out = format!("Forecast for {}\n", forecast.location);

    for day in &forecast.days {
        let conditions = format!("{:<width$}", day.conditions, width = CONDITIONS_WIDTH);
        let _ = writeln!(
            out,
            "{} {} {} {} {}",
            day.date.format("%a"),
            paint(conditions, conditions_color(&day.conditions), color),
            temp(&day.min_temp, color),
            temp(&day.max_temp, color),
            paint(temp_bar(&day.max_temp), Some(Color::White), color),
        );
    }

    out
}

fn temp(t: &Temperature, color: bool) -> String {
    let value = format!("{:>width$}", t.value, width = TEMP_WIDTH);
    format!("{} {}", paint(value, temp_color(t), color), t.unit)
}

fn paint(text: String, tint: Option<Color>, enabled: bool) -> String {
    match tint {
        Some(c) if enabled => text.with(c).bold().to_string(),
        _ => text,
    }
}

/// Color band for a temperature, judged in Fahrenheit whatever the unit.
fn temp_color(t: &Temperature) -> Option<Color> {
    let f = t.fahrenheit();
    if f >= 90.0 {
        Some(Color::Red)
    } else if f >= 68.0 {
        Some(Color::Yellow)
    } else if f >= 55.0 {
        None
    } else if f >= 32.0 {
        Some(Color::Blue)
    } else if f > 0.0 {
        Some(Color::Cyan)
    } else {
        Some(Color::Magenta)
    }
}

fn conditions_color(conditions: &str) -> Option<Color> {
    const TINTS: [(&str, Color); 5] = [
        ("Sunny", Color::Yellow),
        ("Rain", Color::Cyan),
        ("Drizzle", Color::Green),
        ("Thunderstorms", Color::Red),
        ("Cold", Color::Blue),
    ];
    TINTS
        .iter()
        .find(|(word, _)| conditions.contains(word))
        .map(|(_, tint)| *tint)
}

/// `+` per two degrees Fahrenheit or per degree Celsius; `-` below zero.
fn temp_bar(t: &Temperature) -> String {
    let scale = match t.unit {
        TemperatureUnit::Fahrenheit => 0.5,
        TemperatureUnit::Celsius => 1.0,
    };
    let mark = if t.value >= 0.0 { "+" } else { "-" };
    mark.repeat((t.value * scale).abs() as usize)
}

pub fn observation(lat: f64, lon: f64, obs: &Observation, metric: bool) -> String {
    let mut out = format!(
        "Conditions near {lat}, {lon} (as of {})\n",
        obs.updated_at.format("%a %b %e %H:%M %Z")
    );

    let preferred = |t: &Temperature| {
        if metric {
            format!("{:.1} {}", t.celsius(), TemperatureUnit::Celsius)
        } else {
            format!("{:.1} {}", t.fahrenheit(), TemperatureUnit::Fahrenheit)
        }
    };

    let mut line = |label: &str, value: Option<String>| {
        let value = value.unwrap_or_else(|| "N/A".to_string());
        let _ = writeln!(out, "  {label:<12} {value}");
    };

    line("Weather", obs.weather.clone());
    line("Temperature", obs.temp.as_ref().map(preferred));
    line("Dewpoint", obs.dewpoint.as_ref().map(preferred));
    line("Humidity", obs.relative_humidity.map(|h| format!("{h}%")));
    line(
        "Pressure",
        obs.pressure.map(|p| {
            if metric {
                format!("{:.1} millibars", p.millibars())
            } else {
                format!("{:.2} in", p.inches())
            }
        }),
    );
    line("Wind", obs.wind.as_ref().map(|w| w.intensity.clone()));

    out
}

pub fn stations(nearby: &[(f64, &Station)], units: DistanceUnits) -> String {
    let mut out = String::new();
    for (dist, station) in nearby {
        let name = station.name.as_deref().unwrap_or_default();
        let _ = writeln!(
            out,
            "{:<6} {:>7.2} {} {:<3} {}",
            station.station_id, dist, units, station.location.description, name
        );
    }
    out
}
