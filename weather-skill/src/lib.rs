//! WeatherAPI.com skill for assistant hosts.
//!
//! This crate defines:
//! - The host contract (credential lookup, response envelope, skill registry)
//! - The `WeatherSkill` commands for current and forecast weather
//! - Unit-system field tables that map provider fields onto normalized reports
//! - Configuration & credentials handling
//!
//! It is used by `weather-cli`, but can be registered by any host.

pub mod config;
pub mod error;
pub mod host;
pub mod mapping;
pub mod model;
pub mod query;
pub mod skill;
pub mod transport;
pub mod units;

pub use config::{Config, SkillSettings};
pub use error::SkillError;
pub use host::{CommandSpec, CredentialStore, ParamSpec, Response, Skill, SkillRegistry};
pub use model::{ForecastRequest, LocationInfo, WeatherReport};
pub use query::{ProviderResponse, QueryValue, WeatherQuery};
pub use skill::WeatherSkill;
pub use transport::{HttpMethod, HttpReply, HttpRequest, ReqwestTransport, Transport};
pub use units::UnitSystem;
