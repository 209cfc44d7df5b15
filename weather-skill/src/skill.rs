use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    error::SkillError,
    host::{CommandSpec, CredentialStore, ParamSpec, Response, Skill},
    mapping::{self, CONDITIONS, DAY_SUMMARY, LOCATION},
    model::{ForecastRequest, LocationInfo, WeatherReport},
    query::{self, DEFAULT_BASE_URL, ProviderResponse, WeatherQuery},
    transport::{ReqwestTransport, Transport},
    units::UnitSystem,
};

pub const CURRENT_COMMAND: &str = "get_current_weather";
/// Registered name of the forecast command. The spelling is kept for hosts
/// that already call it by this name.
pub const FORECAST_COMMAND: &str = "get_forcasted_weather";

/// Furthest forecast day offset the provider serves on the free plan.
pub const MAX_FORECAST_DAY: i64 = 2;

const LOCATION_PARAM: ParamSpec = ParamSpec {
    name: "location",
    kind: "string",
    optional: false,
    description: "The location you want the weather at",
};

const UNITS_PARAM: ParamSpec = ParamSpec {
    name: "units",
    kind: "string",
    optional: true,
    description: "The system of measurement for the result, \"metric\" or \"imperial\". Defaults to metric",
};

const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: CURRENT_COMMAND,
        description: "Gets the current weather",
        params: &[LOCATION_PARAM, UNITS_PARAM],
    },
    CommandSpec {
        name: FORECAST_COMMAND,
        description: "Gets the forecasted weather",
        params: &[
            LOCATION_PARAM,
            UNITS_PARAM,
            ParamSpec {
                name: "day",
                kind: "integer",
                optional: true,
                description: "The day to forecast, 0-2 with 0 being today",
            },
            ParamSpec {
                name: "hour",
                kind: "integer",
                optional: true,
                description: "The hour to forecast, 0-23. Leave blank for a summary of the whole day",
            },
        ],
    },
];

/// WeatherAPI.com skill.
///
/// Holds no per-call state: the API key is read from the credential store on
/// every call, so concurrent invocations are independent.
#[derive(Debug, Clone)]
pub struct WeatherSkill {
    credentials: Arc<dyn CredentialStore>,
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl WeatherSkill {
    pub const API_KEY: &'static str = "API_KEY";

    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        Self::with_transport(credentials, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(credentials: Arc<dyn CredentialStore>, transport: Arc<dyn Transport>) -> Self {
        Self { credentials, transport, base_url: DEFAULT_BASE_URL.to_string() }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Configuration value from the host's store.
    pub fn get(&self, key: &str) -> Option<String> {
        self.credentials.get(key)
    }

    /// One provider round-trip. A body that is not JSON comes back as
    /// [`ProviderResponse::Raw`] rather than an error.
    pub async fn query_weather(&self, query: WeatherQuery) -> Result<ProviderResponse, SkillError> {
        let api_key = self.get(Self::API_KEY).ok_or(SkillError::MissingCredential(Self::API_KEY))?;

        let request = query.into_request(&self.base_url, &api_key);
        debug!(
            method = request.method.as_str(),
            url = %query::redact_key(&request.url),
            "querying weather provider"
        );

        let reply = self.transport.send(request).await?;
        Ok(ProviderResponse::decode(reply))
    }

    pub async fn get_current_weather(&self, location: &str, units: &str) -> Response {
        respond(CURRENT_COMMAND, self.current_report(location, units).await)
    }

    pub async fn get_forecasted_weather(&self, request: &ForecastRequest) -> Response {
        respond(FORECAST_COMMAND, self.forecast_report(request).await)
    }

    pub async fn current_report(&self, location: &str, units: &str) -> Result<WeatherReport, SkillError> {
        let doc = self
            .query_weather(WeatherQuery::get("current.json").param("q", location))
            .await?
            .into_document()?;

        let system = UnitSystem::from_requested(units);
        let mut report = report_header(&doc, units)?;
        let current = mapping::child(&doc, "current", "")?;
        report.current_weather = Some(mapping::extract(CONDITIONS, current, system, "current")?);

        Ok(report)
    }

    pub async fn forecast_report(&self, request: &ForecastRequest) -> Result<WeatherReport, SkillError> {
        let (day, hour) = validate_forecast(request.day, request.hour)?;

        let doc = self
            .query_weather(
                WeatherQuery::get("forecast.json")
                    .param("q", request.location.as_str())
                    .param("days", request.day + 1),
            )
            .await?
            .into_document()?;

        let system = UnitSystem::from_requested(&request.units);
        let mut report = report_header(&doc, &request.units)?;

        let days = mapping::child(&doc, "forecast.forecastday", "")?;
        let day_ctx = format!("forecast.forecastday[{day}]");
        let target = mapping::element(days, day, "forecast.forecastday")?;

        match hour {
            None => {
                let summary = mapping::child(target, "day", &day_ctx)?;
                let ctx = format!("{day_ctx}.day");
                report.weather = Some(mapping::extract(DAY_SUMMARY, summary, system, &ctx)?);
            }
            Some(hour) => {
                let hours = mapping::child(target, "hour", &day_ctx)?;
                let hours_ctx = format!("{day_ctx}.hour");
                let entry = mapping::element(hours, hour, &hours_ctx)?;
                let ctx = format!("{hours_ctx}[{hour}]");
                report.current_weather = Some(mapping::extract(CONDITIONS, entry, system, &ctx)?);
            }
        }

        Ok(report)
    }
}

/// Range checks for a forecast request, run before any network access.
/// Returns the day and hour as indexes into the provider's lists.
pub fn validate_forecast(day: i64, hour: Option<i64>) -> Result<(usize, Option<usize>), SkillError> {
    if day > MAX_FORECAST_DAY {
        return Err(SkillError::DayTooFar);
    }
    if day < 0 {
        return Err(SkillError::DayInPast);
    }

    let hour = match hour {
        Some(h) if !(0..=23).contains(&h) => return Err(SkillError::InvalidHour),
        Some(h) => Some(h as usize),
        None => None,
    };

    Ok((day as usize, hour))
}

fn report_header(doc: &Value, units: &str) -> Result<WeatherReport, SkillError> {
    let location = mapping::child(doc, "location", "")?;
    let fields = mapping::extract(LOCATION, location, UnitSystem::Metric, "location")?;
    let location: LocationInfo = serde_json::from_value(Value::Object(fields))?;

    let last_updated = mapping::child(doc, "current.last_updated", "")?.clone();

    Ok(WeatherReport {
        location,
        last_updated,
        units: units.to_string(),
        current_weather: None,
        weather: None,
    })
}

fn respond(command: &str, result: Result<WeatherReport, SkillError>) -> Response {
    let err = match result.and_then(|report| Ok(serde_json::to_value(report)?)) {
        Ok(data) => return Response::success(data),
        Err(err) => err,
    };

    if err.is_validation() {
        debug!(command, error = %err, "rejected weather request");
    } else {
        warn!(command, error = %err, "weather command failed");
    }
    err.into()
}

fn str_arg<'a>(args: &'a Value, name: &'static str) -> Result<Option<&'a str>, SkillError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(SkillError::InvalidArgument { name, expected: "a string" }),
    }
}

fn int_arg(args: &Value, name: &'static str) -> Result<Option<i64>, SkillError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or(SkillError::InvalidArgument { name, expected: "an integer" }),
    }
}

fn location_arg(args: &Value) -> Result<&str, SkillError> {
    str_arg(args, "location")?.ok_or(SkillError::MissingArgument("location"))
}

#[async_trait]
impl Skill for WeatherSkill {
    fn name(&self) -> &str {
        "weather"
    }

    fn commands(&self) -> &'static [CommandSpec] {
        COMMANDS
    }

    async fn invoke(&self, command: &str, args: &Value) -> Response {
        match command {
            CURRENT_COMMAND => {
                let parsed = location_arg(args)
                    .and_then(|location| Ok((location, str_arg(args, "units")?.unwrap_or("metric"))));
                match parsed {
                    Ok((location, units)) => self.get_current_weather(location, units).await,
                    Err(err) => err.into(),
                }
            }
            FORECAST_COMMAND => {
                let parsed = location_arg(args).and_then(|location| {
                    Ok(ForecastRequest::new(location)
                        .units(str_arg(args, "units")?.unwrap_or("metric"))
                        .day(int_arg(args, "day")?.unwrap_or(0))
                        .hour(int_arg(args, "hour")?))
                });
                match parsed {
                    Ok(request) => self.get_forecasted_weather(&request).await,
                    Err(err) => err.into(),
                }
            }
            other => SkillError::UnknownCommand(other.to_string()).into(),
        }
    }
}
