use std::sync::Arc;

use anyhow::{Context, anyhow, bail};
use clap::{ArgAction, Parser, Subcommand};
use serde_json::{Value, json};
use tracing::debug;
use weather_skill::{
    Config, Response, SkillError, SkillRegistry, WeatherSkill,
    skill::{CURRENT_COMMAND, FORECAST_COMMAND},
};

use crate::render;

const SKILL_NAME: &str = "weather";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather skill host")]
pub struct Cli {
    /// WeatherAPI.com key to use instead of the configured one.
    #[arg(long, global = true, env = "WEATHERAPI_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Provider base URL, e.g. "http://api.weatherapi.com/v1".
    #[arg(long, global = true, env = "WEATHERAPI_BASE_URL")]
    pub base_url: Option<String>,

    /// More logging (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the WeatherAPI.com API key.
    Configure,

    /// Show the current weather for a location.
    Current {
        /// City name, "lat,lon", postal code...
        location: String,

        /// "metric" or "imperial".
        #[arg(long, default_value = "metric")]
        units: String,

        /// Print the raw response envelope as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the forecast for a location.
    Forecast {
        /// City name, "lat,lon", postal code...
        location: String,

        /// "metric" or "imperial".
        #[arg(long, default_value = "metric")]
        units: String,

        /// Day offset, 0 (today) to 2.
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        day: i64,

        /// Hour of the day, 0-23; if absent, a summary of the whole day.
        #[arg(long, allow_negative_numbers = true)]
        hour: Option<i64>,

        /// Print the raw response envelope as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Invoke a registered command by name with JSON arguments.
    Invoke {
        /// Registered command name, e.g. "get_forcasted_weather".
        command: String,

        /// JSON object of arguments.
        #[arg(long, default_value = "{}")]
        args: String,
    },

    /// List registered commands.
    Commands,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;
        debug!(
            path = %Config::config_file_path()?.display(),
            configured = config.is_skill_configured(SKILL_NAME, WeatherSkill::API_KEY),
            "loaded config"
        );

        match self.command {
            Command::Configure => {
                let key = inquire::Password::new("WeatherAPI.com API key:")
                    .without_confirmation()
                    .prompt()
                    .context("Failed to read API key")?;
                let key = key.trim();
                if key.is_empty() {
                    bail!("API key must not be empty");
                }

                config.upsert_skill_value(SKILL_NAME, WeatherSkill::API_KEY, key.to_string());
                config.save()?;
                println!("Saved API key to {}", Config::config_file_path()?.display());
            }
            Command::Current { location, units, json } => {
                let registry = host(&config, self.api_key, self.base_url)?;
                debug!(command = CURRENT_COMMAND, %location, "invoking command");
                let resp = registry
                    .dispatch(CURRENT_COMMAND, &json!({ "location": location, "units": units }))
                    .await;
                print_weather(resp, json)?;
            }
            Command::Forecast { location, units, day, hour, json } => {
                let registry = host(&config, self.api_key, self.base_url)?;
                let args = json!({ "location": location, "units": units, "day": day, "hour": hour });
                debug!(command = FORECAST_COMMAND, %location, day, "invoking command");
                let resp = registry.dispatch(FORECAST_COMMAND, &args).await;
                print_weather(resp, json)?;
            }
            Command::Invoke { command, args } => {
                let args: Value = serde_json::from_str(&args).context("--args must be valid JSON")?;
                let registry = host(&config, self.api_key, self.base_url)?;
                debug!(command = %command, "invoking command");
                let resp = registry.dispatch(&command, &args).await;
                print_envelope(&resp)?;
            }
            Command::Commands => {
                let registry = host(&config, self.api_key, self.base_url)?;
                print!("{}", render::render_commands(&registry.commands()));
            }
        }

        Ok(())
    }
}

/// Build the registry with the weather skill. An explicit key overrides the
/// configured one for this run only.
fn host(config: &Config, api_key: Option<String>, base_url: Option<String>) -> anyhow::Result<SkillRegistry> {
    let mut settings = config.skill_settings(SKILL_NAME);
    if let Some(key) = api_key {
        settings.set(WeatherSkill::API_KEY, key);
    }

    let mut skill = WeatherSkill::new(Arc::new(settings));
    if let Some(url) = base_url.or_else(|| config.base_url.clone()) {
        skill = skill.base_url(url);
    }

    let mut registry = SkillRegistry::new();
    registry.register(Arc::new(skill))?;
    Ok(registry)
}

/// Print the envelope as JSON; a failure envelope is also an error.
fn print_envelope(resp: &Response) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(resp)?);
    if let Some(message) = resp.error_message() {
        bail!("{message}");
    }
    Ok(())
}

fn print_weather(resp: Response, as_json: bool) -> anyhow::Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(&resp)?);
    }

    if !resp.success {
        let message = resp.error_message().unwrap_or("weather command failed");
        if message == SkillError::MissingCredential(WeatherSkill::API_KEY).to_string() {
            return Err(anyhow!("{message}\nHint: run `weather configure` and enter your API key."));
        }
        return Err(anyhow!("{message}"));
    }

    if !as_json {
        let report = serde_json::from_value(resp.data).context("Unexpected weather report shape")?;
        print!("{}", render::render_report(&report));
    }

    Ok(())
}
