use crate::error::ConfigError;
use crate::logging::log_debug;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ENV_REST_BASE_URL: &str = "ACCESS_REST_BASE_URL";
pub const ENV_GRAPHQL_URL: &str = "ACCESS_GRAPHQL_URL";
pub const ENV_REFRESH_URL: &str = "ACCESS_REFRESH_URL";
pub const ENV_TIMEOUT_SECS: &str = "ACCESS_TIMEOUT_SECS";
pub const ENV_MAX_AUTH_RETRIES: &str = "ACCESS_MAX_AUTH_RETRIES";
pub const ENV_SINGLE_FLIGHT_REFRESH: &str = "ACCESS_SINGLE_FLIGHT_REFRESH";
pub const ENV_DEV_MODE: &str = "ACCESS_DEV_MODE";

/// REST transport configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestConfig {
    /// Prefix for relative request paths. Empty means paths are used as given.
    pub base_url: String,
    pub timeout: Duration,
    /// Refreshes allowed per call before the session is dropped
    pub max_auth_retries: u32,
    /// Serialize concurrent refreshes through one shared gate
    pub single_flight_refresh: bool,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout: Duration::from_secs(30),
            max_auth_retries: 2,
            single_flight_refresh: false,
        }
    }
}

impl RestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_url.is_empty() && !is_http_url(&self.base_url) {
            return Err(ConfigError::invalid(
                "rest.base_url",
                "must start with http:// or https://",
            ));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::invalid("rest.timeout", "must be greater than zero"));
        }
        Ok(())
    }
}

/// GraphQL transport configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlConfig {
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for GraphQlConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl GraphQlConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.is_empty() {
            return Err(ConfigError::missing("graphql.endpoint"));
        }
        if !is_http_url(&self.endpoint) {
            return Err(ConfigError::invalid(
                "graphql.endpoint",
                "must start with http:// or https://",
            ));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::invalid(
                "graphql.timeout",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Complete access-layer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessConfig {
    pub rest: RestConfig,
    pub graphql: GraphQlConfig,
    /// Token refresh endpoint. `None` disables refresh: every 401 ends the session.
    pub refresh_url: Option<String>,
    /// Include original error details in diagnostic logs
    pub dev_mode: bool,
}

impl AccessConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rest.validate()?;
        self.graphql.validate()?;
        if let Some(url) = &self.refresh_url {
            if !is_http_url(url) {
                return Err(ConfigError::invalid(
                    "refresh_url",
                    "must start with http:// or https://",
                ));
            }
        }
        Ok(())
    }

    /// Load configuration from `ACCESS_*` environment variables.
    ///
    /// `ACCESS_GRAPHQL_URL` is required; everything else falls back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        log_debug!("Loading access-layer configuration from environment");

        let mut config = Self::default();

        if let Some(base_url) = env_value(ENV_REST_BASE_URL) {
            config.rest.base_url = base_url;
        }

        config.graphql.endpoint =
            env_value(ENV_GRAPHQL_URL).ok_or_else(|| ConfigError::missing(ENV_GRAPHQL_URL))?;

        config.refresh_url = env_value(ENV_REFRESH_URL);

        if let Some(raw) = env_value(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw
                .parse()
                .map_err(|_| ConfigError::invalid(ENV_TIMEOUT_SECS, format!("not a number: {raw}")))?;
            config.rest.timeout = Duration::from_secs(secs);
            config.graphql.timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = env_value(ENV_MAX_AUTH_RETRIES) {
            config.rest.max_auth_retries = raw.parse().map_err(|_| {
                ConfigError::invalid(ENV_MAX_AUTH_RETRIES, format!("not a number: {raw}"))
            })?;
        }

        if let Some(raw) = env_value(ENV_SINGLE_FLIGHT_REFRESH) {
            config.rest.single_flight_refresh = parse_flag(ENV_SINGLE_FLIGHT_REFRESH, &raw)?;
        }

        if let Some(raw) = env_value(ENV_DEV_MODE) {
            config.dev_mode = parse_flag(ENV_DEV_MODE, &raw)?;
        }

        config.validate()?;

        log_debug!(
            rest_base_url = %config.rest.base_url,
            graphql_endpoint = %config.graphql.endpoint,
            has_refresh_url = config.refresh_url.is_some(),
            timeout_secs = config.rest.timeout.as_secs(),
            max_auth_retries = config.rest.max_auth_retries,
            single_flight_refresh = config.rest.single_flight_refresh,
            dev_mode = config.dev_mode,
            "Access-layer configuration loaded and validated"
        );

        Ok(config)
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(key, format!("not a boolean: {raw}"))),
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
