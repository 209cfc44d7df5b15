//! Declarative provider-field tables and the one routine that applies them.
//!
//! Each table row names an output key and the provider key path it is read
//! from, which may differ per [`UnitSystem`]. The suffix contract
//! (`_c`/`_mb`/`_mm`/`_km`/`_kph` vs `_f`/`_in`/`_miles`/`_mph`) lives here only.

use serde_json::{Map, Value};

use crate::{error::SkillError, units::UnitSystem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Same provider key in both unit systems.
    Same(&'static str),
    /// Unit-dependent provider key.
    Split { metric: &'static str, imperial: &'static str },
}

impl Source {
    pub fn path(&self, units: UnitSystem) -> &'static str {
        match (*self, units) {
            (Source::Same(path), _) => path,
            (Source::Split { metric, .. }, UnitSystem::Metric) => metric,
            (Source::Split { imperial, .. }, UnitSystem::Imperial) => imperial,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub output: &'static str,
    pub source: Source,
}

const fn same(output: &'static str, path: &'static str) -> Field {
    Field { output, source: Source::Same(path) }
}

const fn split(output: &'static str, metric: &'static str, imperial: &'static str) -> Field {
    Field { output, source: Source::Split { metric, imperial } }
}

/// `location` object, echoed verbatim.
pub const LOCATION: &[Field] = &[
    same("name", "name"),
    same("region", "region"),
    same("country", "country"),
    same("lat", "lat"),
    same("lon", "lon"),
];

/// Point-in-time conditions: `current` and each entry of a forecast day's `hour` list.
pub const CONDITIONS: &[Field] = &[
    split("temp", "temp_c", "temp_f"),
    same("condition", "condition.text"),
    split("wind", "wind_kph", "wind_mph"),
    same("wind_degree", "wind_degree"),
    same("wind_dir", "wind_dir"),
    split("pressure", "pressure_mb", "pressure_in"),
    split("precip", "precip_mm", "precip_in"),
    same("humidity", "humidity"),
    same("cloud", "cloud"),
    split("feelslike", "feelslike_c", "feelslike_f"),
    split("visability", "vis_km", "vis_miles"),
    same("uv", "uv"),
    split("gust_speed", "gust_kph", "gust_mph"),
];

/// Whole-day summary: `forecast.forecastday[i].day`.
pub const DAY_SUMMARY: &[Field] = &[
    split("max_temp", "maxtemp_c", "maxtemp_f"),
    split("min_temp", "mintemp_c", "mintemp_f"),
    split("avg_temp", "avgtemp_c", "avgtemp_f"),
    split("maxwind", "maxwind_kph", "maxwind_mph"),
    split("totalprecip", "totalprecip_mm", "totalprecip_in"),
    split("avgvis", "avgvis_km", "avgvis_miles"),
    same("avghumidity", "avghumidity"),
    same("daily_will_it_rain", "daily_will_it_rain"),
    same("daily_chance_of_rain", "daily_chance_of_rain"),
    same("daily_will_it_snow", "daily_will_it_snow"),
    same("daily_chance_of_snow", "daily_chance_of_snow"),
    same("uv", "uv"),
    same("condition", "condition.text"),
];

/// Apply `table` to `node`. `context` is the key path of `node` inside the
/// provider document and is only used to name missing fields.
pub fn extract(
    table: &[Field],
    node: &Value,
    units: UnitSystem,
    context: &str,
) -> Result<Map<String, Value>, SkillError> {
    table
        .iter()
        .map(|field| {
            let path = field.source.path(units);
            let value = lookup(node, path)
                .ok_or_else(|| SkillError::MissingField(format!("{context}.{path}")))?;
            Ok((field.output.to_string(), value.clone()))
        })
        .collect()
}

/// Follow a dotted key path through nested objects.
pub fn lookup<'a>(node: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(node, |cur, key| cur.as_object()?.get(key))
}

/// Child object `key` of `node`, or a [`SkillError::MissingField`] naming `context.key`.
pub fn child<'a>(node: &'a Value, key: &str, context: &str) -> Result<&'a Value, SkillError> {
    lookup(node, key).ok_or_else(|| SkillError::MissingField(join(context, key)))
}

/// Element `idx` of the array `node`.
pub fn element<'a>(node: &'a Value, idx: usize, context: &str) -> Result<&'a Value, SkillError> {
    node.as_array()
        .and_then(|items| items.get(idx))
        .ok_or_else(|| SkillError::MissingField(format!("{context}[{idx}]")))
}

fn join(context: &str, key: &str) -> String {
    if context.is_empty() { key.to_string() } else { format!("{context}.{key}") }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn current() -> Value {
        json!({
            "temp_c": 20, "temp_f": 68,
            "condition": { "text": "Sunny" },
            "wind_kph": 11.2, "wind_mph": 6.9,
            "wind_degree": 250, "wind_dir": "WSW",
            "pressure_mb": 1015.0, "pressure_in": 29.97,
            "precip_mm": 0.1, "precip_in": 0.0,
            "humidity": 40, "cloud": 0,
            "feelslike_c": 19.5, "feelslike_f": 67.1,
            "vis_km": 10.0, "vis_miles": 6.0,
            "uv": 5.0,
            "gust_kph": 14.0, "gust_mph": 8.7
        })
    }

    #[test]
    fn every_split_field_uses_matching_suffixes() {
        let metric_suffixes = ["_c", "_mb", "_mm", "_km", "_kph"];
        let imperial_suffixes = ["_f", "_in", "_miles", "_mph"];

        for field in CONDITIONS.iter().chain(DAY_SUMMARY) {
            if let Source::Split { metric, imperial } = field.source {
                assert!(metric_suffixes.iter().any(|s| metric.ends_with(s)), "{metric}");
                assert!(imperial_suffixes.iter().any(|s| imperial.ends_with(s)), "{imperial}");
            }
        }
    }

    #[test]
    fn extract_selects_fields_by_unit_system() {
        let node = current();

        let metric = extract(CONDITIONS, &node, UnitSystem::Metric, "current").unwrap();
        assert_eq!(metric["temp"], json!(20));
        assert_eq!(metric["wind"], json!(11.2));
        assert_eq!(metric["visability"], json!(10.0));
        assert_eq!(metric["condition"], json!("Sunny"));

        let imperial = extract(CONDITIONS, &node, UnitSystem::Imperial, "current").unwrap();
        assert_eq!(imperial["temp"], json!(68));
        assert_eq!(imperial["gust_speed"], json!(8.7));
        assert_eq!(imperial["wind_dir"], json!("WSW"));
        assert_eq!(imperial.len(), CONDITIONS.len());
    }

    #[test]
    fn extract_names_the_missing_path() {
        let mut node = current();
        node.as_object_mut().unwrap().remove("feelslike_f");

        let err = extract(CONDITIONS, &node, UnitSystem::Imperial, "current").unwrap_err();
        assert_eq!(err.to_string(), "Weather provider response is missing 'current.feelslike_f'");

        // metric never reads the removed key
        assert!(extract(CONDITIONS, &node, UnitSystem::Metric, "current").is_ok());
    }

    #[test]
    fn lookup_walks_nested_objects_only() {
        let doc = json!({ "a": { "b": { "c": 1 } }, "list": [1, 2] });
        assert_eq!(lookup(&doc, "a.b.c"), Some(&json!(1)));
        assert_eq!(lookup(&doc, "a.x"), None);
        assert_eq!(lookup(&doc, "list.0"), None);
        assert_eq!(lookup(&json!("text"), "a"), None);
    }

    #[test]
    fn element_and_child_report_paths() {
        let doc = json!({ "forecast": { "forecastday": [{}] } });
        let forecast = child(&doc, "forecast", "").unwrap();
        let days = child(forecast, "forecastday", "forecast").unwrap();

        let err = element(days, 2, "forecast.forecastday").unwrap_err();
        assert_eq!(err.to_string(), "Weather provider response is missing 'forecast.forecastday[2]'");

        let err = child(&doc, "current", "").unwrap_err();
        assert_eq!(err.to_string(), "Weather provider response is missing 'current'");
    }
}
