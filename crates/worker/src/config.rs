//! Worker configuration loaded from environment variables.

use std::time::Duration;

use slotwatch_availability::client::DEFAULT_TIMEOUT;
use slotwatch_availability::ApiConfig;
use slotwatch_core::rate_budget::{RateModifiers, DEFAULT_MAX_REQUESTS_PER_MINUTE};
use slotwatch_events::delivery::redis::DEFAULT_NOTIFICATION_CHANNEL;

/// Default inbound channel for alert creation messages.
pub const DEFAULT_ALERT_CHANNEL: &str = "book-alerts";

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Everything the worker binary needs to start.
///
/// | Env Var                    | Default              |
/// |----------------------------|----------------------|
/// | `DATABASE_URL`             | required             |
/// | `DATABASE_MAX_CONNECTIONS` | `10`                 |
/// | `MAX_REQUESTS_PER_MINUTE`  | `5`                  |
/// | `REQUEST_MODIFIERS`        | unset                |
/// | `AVAILABILITIES_ENDPOINT`  | required             |
/// | `GRAPHQL_ENDPOINT`         | unset                |
/// | `RESTAURANTS_QUERY`        | unset                |
/// | `API_KEY`                  | empty                |
/// | `CUSTOM_HEADERS`           | unset                |
/// | `HTTP_TIMEOUT_SECS`        | `30`                 |
/// | `REDIS_URL`                | unset                |
/// | `NOTIFICATION_CHANNEL`     | `book-notifications` |
/// | `ALERT_CHANNEL`            | `book-alerts`        |
/// | `LOG_FORMAT`               | `text`               |
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    /// Base requests per minute before hour modifiers.
    pub max_requests_per_minute: i64,
    pub request_modifiers: Option<RateModifiers>,
    pub api: ApiConfig,
    pub redis_url: Option<String>,
    pub notification_channel: String,
    pub alert_channel: String,
    pub log_format: LogFormat,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Malformed optional values (rate, modifiers, headers) are logged and
    /// replaced by their defaults; only missing required values and an
    /// unparsable pool size or timeout are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = required("DATABASE_URL")?;
        let database_max_connections = parse_or_default(
            "DATABASE_MAX_CONNECTIONS",
            optional("DATABASE_MAX_CONNECTIONS"),
            DEFAULT_MAX_CONNECTIONS,
        )?;
        let timeout_secs = parse_or_default(
            "HTTP_TIMEOUT_SECS",
            optional("HTTP_TIMEOUT_SECS"),
            DEFAULT_TIMEOUT.as_secs(),
        )?;

        let api = ApiConfig {
            availabilities_endpoint: required("AVAILABILITIES_ENDPOINT")?,
            graphql_endpoint: optional("GRAPHQL_ENDPOINT"),
            restaurants_query: optional("RESTAURANTS_QUERY"),
            api_key: optional("API_KEY").unwrap_or_default(),
            custom_headers: parse_custom_headers(optional("CUSTOM_HEADERS").as_deref()),
            timeout: Duration::from_secs(timeout_secs),
        };

        let log_format = match optional("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            database_url,
            database_max_connections,
            max_requests_per_minute: parse_base_rate(optional("MAX_REQUESTS_PER_MINUTE").as_deref()),
            request_modifiers: parse_modifiers(optional("REQUEST_MODIFIERS").as_deref()),
            api,
            redis_url: optional("REDIS_URL"),
            notification_channel: optional("NOTIFICATION_CHANNEL")
                .unwrap_or_else(|| DEFAULT_NOTIFICATION_CHANNEL.to_string()),
            alert_channel: optional("ALERT_CHANNEL")
                .unwrap_or_else(|| DEFAULT_ALERT_CHANNEL.to_string()),
            log_format,
        })
    }
}

fn parse_or_default<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
    }
}

/// Base rate; an unparsable value keeps the default.
fn parse_base_rate(raw: Option<&str>) -> i64 {
    let Some(raw) = raw else {
        return DEFAULT_MAX_REQUESTS_PER_MINUTE;
    };
    match raw.trim().parse() {
        Ok(rate) => rate,
        Err(_) => {
            tracing::warn!(value = raw, "Invalid value for MAX_REQUESTS_PER_MINUTE, using default");
            DEFAULT_MAX_REQUESTS_PER_MINUTE
        }
    }
}

/// Hour modifiers; a malformed or empty table is ignored.
fn parse_modifiers(raw: Option<&str>) -> Option<RateModifiers> {
    let raw = raw?;
    match RateModifiers::parse(raw) {
        Ok(modifiers) if modifiers.is_empty() => None,
        Ok(modifiers) => Some(modifiers),
        Err(e) => {
            tracing::warn!(value = raw, error = %e, "Invalid value for REQUEST_MODIFIERS, ignoring");
            None
        }
    }
}

/// `CUSTOM_HEADERS` is a JSON object of header name to value.
fn parse_custom_headers(raw: Option<&str>) -> Vec<(String, String)> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    match serde_json::from_str::<std::collections::BTreeMap<String, String>>(raw) {
        Ok(map) => map.into_iter().collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Invalid value for CUSTOM_HEADERS, ignoring");
            Vec::new()
        }
    }
}
