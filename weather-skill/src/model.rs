use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Provider location, echoed verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub name: Value,
    pub region: Value,
    pub country: Value,
    pub lat: Value,
    pub lon: Value,
}

/// Normalized result of a weather command.
///
/// `current_weather` holds point-in-time conditions (now, or one forecast
/// hour); `weather` holds a forecast day summary. Exactly one is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub location: LocationInfo,
    pub last_updated: Value,
    pub units: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_weather: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<Map<String, Value>>,
}

/// Arguments accepted by the forecast command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastRequest {
    pub location: String,
    pub units: String,
    pub day: i64,
    pub hour: Option<i64>,
}

impl ForecastRequest {
    pub fn new(location: impl Into<String>) -> Self {
        Self { location: location.into(), units: "metric".to_string(), day: 0, hour: None }
    }

    pub fn units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    pub fn day(mut self, day: i64) -> Self {
        self.day = day;
        self
    }

    pub fn hour(mut self, hour: Option<i64>) -> Self {
        self.hour = hour;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn report_omits_absent_sections() {
        let report = WeatherReport {
            location: LocationInfo {
                name: json!("Oslo"),
                region: json!("Oslo"),
                country: json!("Norway"),
                lat: json!(59.91),
                lon: json!(10.75),
            },
            last_updated: json!("2024-05-01 12:00"),
            units: "metric".to_string(),
            current_weather: None,
            weather: Some(Map::new()),
        };

        let value = serde_json::to_value(&report).unwrap();
        assert!(value.get("current_weather").is_none());
        assert_eq!(value["weather"], json!({}));
        assert_eq!(value["location"]["lat"], json!(59.91));
    }

    #[test]
    fn forecast_request_defaults() {
        let req = ForecastRequest::new("Oslo");
        assert_eq!(req.units, "metric");
        assert_eq!(req.day, 0);
        assert_eq!(req.hour, None);
    }
}
