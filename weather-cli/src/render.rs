//! Human-readable output for weather reports and command listings.

use chrono::NaiveDateTime;
use serde_json::{Map, Value};
use weather_skill::{CommandSpec, UnitSystem, WeatherReport};

pub fn render_report(report: &WeatherReport) -> String {
    let units = UnitSystem::from_requested(&report.units);
    let loc = &report.location;

    let mut out = format!(
        "{}, {}, {} ({}, {})\n",
        text(&loc.name),
        text(&loc.region),
        text(&loc.country),
        text(&loc.lat),
        text(&loc.lon),
    );
    out.push_str(&format!("Updated: {}\n", format_timestamp(&report.last_updated)));

    if let Some(now) = &report.current_weather {
        out.push_str(&render_conditions(now, units));
    }
    if let Some(day) = &report.weather {
        out.push_str(&render_day(day, units));
    }

    out
}

fn render_conditions(fields: &Map<String, Value>, units: UnitSystem) -> String {
    let t = units.temperature_label();
    let speed = units.speed_label();

    let rows = [
        ("Condition", field(fields, "condition", "")),
        ("Temperature", field(fields, "temp", t)),
        ("Feels like", field(fields, "feelslike", t)),
        (
            "Wind",
            format!(
                "{} {}",
                field(fields, "wind", speed),
                field(fields, "wind_dir", "")
            ),
        ),
        ("Gusts", field(fields, "gust_speed", speed)),
        ("Pressure", field(fields, "pressure", units.pressure_label())),
        ("Precipitation", field(fields, "precip", units.precipitation_label())),
        ("Humidity", field(fields, "humidity", "%")),
        ("Cloud cover", field(fields, "cloud", "%")),
        ("Visibility", field(fields, "visability", units.distance_label())),
        ("UV index", field(fields, "uv", "")),
    ];

    table(&rows)
}

fn render_day(fields: &Map<String, Value>, units: UnitSystem) -> String {
    let t = units.temperature_label();

    let rows = [
        ("Condition", field(fields, "condition", "")),
        (
            "Temperature",
            format!(
                "{} / {} (avg {})",
                field(fields, "min_temp", t),
                field(fields, "max_temp", t),
                field(fields, "avg_temp", t)
            ),
        ),
        ("Max wind", field(fields, "maxwind", units.speed_label())),
        ("Precipitation", field(fields, "totalprecip", units.precipitation_label())),
        ("Chance of rain", field(fields, "daily_chance_of_rain", "%")),
        ("Chance of snow", field(fields, "daily_chance_of_snow", "%")),
        ("Humidity", field(fields, "avghumidity", "%")),
        ("Visibility", field(fields, "avgvis", units.distance_label())),
        ("UV index", field(fields, "uv", "")),
    ];

    table(&rows)
}

pub fn render_commands(commands: &[&CommandSpec]) -> String {
    let mut out = String::new();
    for cmd in commands {
        out.push_str(&format!("{}  {}\n", cmd.name, cmd.description));
        for p in cmd.params {
            let optional = if p.optional { ", optional" } else { "" };
            out.push_str(&format!("    {} ({}{optional})  {}\n", p.name, p.kind, p.description));
        }
    }
    out
}

fn table(rows: &[(&str, String)]) -> String {
    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    rows.iter()
        .map(|(label, value)| format!("  {label:<width$}  {}\n", value.trim_end()))
        .collect()
}

fn field(fields: &Map<String, Value>, key: &str, unit: &str) -> String {
    match fields.get(key) {
        Some(value) if unit.is_empty() => text(value),
        Some(value) if unit == "%" || unit.starts_with('°') => format!("{}{unit}", text(value)),
        Some(value) => format!("{} {unit}", text(value)),
        None => "-".to_string(),
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

/// WeatherAPI timestamps look like `2024-05-01 12:15`; anything else is shown as-is.
fn format_timestamp(value: &Value) -> String {
    let raw = text(value);
    match NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M") {
        Ok(ts) => ts.format("%a %d %b %Y %H:%M").to_string(),
        Err(_) => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use weather_skill::LocationInfo;

    fn report(units: &str) -> WeatherReport {
        WeatherReport {
            location: LocationInfo {
                name: json!("Oslo"),
                region: json!("Oslo"),
                country: json!("Norway"),
                lat: json!(59.91),
                lon: json!(10.75),
            },
            last_updated: json!("2024-05-01 12:15"),
            units: units.to_string(),
            current_weather: None,
            weather: None,
        }
    }

    #[test]
    fn renders_current_conditions_with_unit_labels() {
        let mut r = report("imperial");
        r.current_weather = json!({ "temp": 68, "wind": 6.9, "wind_dir": "SW", "humidity": 40 })
            .as_object()
            .cloned();

        let out = render_report(&r);
        assert!(out.starts_with("Oslo, Oslo, Norway (59.91, 10.75)\n"));
        assert!(out.contains("Updated: Wed 01 May 2024 12:15"));
        assert!(out.contains("68°F"));
        assert!(out.contains("6.9 mph SW"));
        assert!(out.contains("40%"));
        assert!(out.contains("Gusts          -"));
    }

    #[test]
    fn renders_day_summary_in_metric() {
        let mut r = report("bogus");
        r.weather = json!({ "min_temp": 11.0, "max_temp": 21.5, "avg_temp": 16.0, "totalprecip": 1.2 })
            .as_object()
            .cloned();

        let out = render_report(&r);
        assert!(out.contains("11.0°C / 21.5°C (avg 16.0°C)"));
        assert!(out.contains("1.2 mm"));
    }

    #[test]
    fn unparsable_timestamp_is_shown_raw() {
        assert_eq!(format_timestamp(&json!("yesterday")), "yesterday");
        assert_eq!(format_timestamp(&Value::Null), "-");
    }

    #[test]
    fn lists_command_parameters() {
        const CMD: CommandSpec = CommandSpec {
            name: "get_current_weather",
            description: "Gets the current weather",
            params: &[weather_skill::ParamSpec {
                name: "units",
                kind: "string",
                optional: true,
                description: "metric or imperial",
            }],
        };

        let out = render_commands(&[&CMD]);
        assert_eq!(
            out,
            "get_current_weather  Gets the current weather\n    units (string, optional)  metric or imperial\n"
        );
    }
}
