//! Downstream service configuration.
//!
//! Base URLs and HTTP budgets for the directory and incident-query services.
//! Resolved once at startup; nothing in this crate mutates it afterwards.

use url::Url;

/// Upper bound for `DOWNSTREAM_GET_RETRIES`.
pub const MAX_GET_RETRIES: u32 = 10;

/// Configuration for reaching the downstream services.
#[derive(Debug, Clone)]
pub struct DownstreamConfig {
    /// Base URL of the directory service (companies and users).
    /// Default: <http://127.0.0.1:8002/user>
    pub user_service_url: Url,
    /// Base URL of the incident-query service.
    /// Default: <http://127.0.0.1:8006/incident-query>
    pub incident_service_url: Url,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Extra attempts for idempotent requests after a transport failure.
    pub get_retries: u32,
}

impl DownstreamConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `USER_SERVICE_URL` (default: `http://127.0.0.1:8002/user`)
    /// - `QUERY_INCIDENT_SERVICE_URL` (default: `http://127.0.0.1:8006/incident-query`)
    /// - `DOWNSTREAM_TIMEOUT_SECS` (default: 10)
    /// - `DOWNSTREAM_CONNECT_TIMEOUT_SECS` (default: 3)
    /// - `DOWNSTREAM_GET_RETRIES` (default: 2, at most [`MAX_GET_RETRIES`])
    ///
    /// Both timeouts must be at least one second.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            user_service_url: env_url("USER_SERVICE_URL", "http://127.0.0.1:8002/user")?,
            incident_service_url: env_url(
                "QUERY_INCIDENT_SERVICE_URL",
                "http://127.0.0.1:8006/incident-query",
            )?,
            timeout_secs: env_number("DOWNSTREAM_TIMEOUT_SECS", 10)?,
            connect_timeout_secs: env_number("DOWNSTREAM_CONNECT_TIMEOUT_SECS", 3)?,
            get_retries: env_number("DOWNSTREAM_GET_RETRIES", 2)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject budgets that would make every call fail or stall.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::OutOfRange(
                "DOWNSTREAM_TIMEOUT_SECS",
                "must be at least 1".into(),
            ));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::OutOfRange(
                "DOWNSTREAM_CONNECT_TIMEOUT_SECS",
                "must be at least 1".into(),
            ));
        }
        if self.get_retries > MAX_GET_RETRIES {
            return Err(ConfigError::OutOfRange(
                "DOWNSTREAM_GET_RETRIES",
                format!("must be at most {MAX_GET_RETRIES}"),
            ));
        }
        Ok(())
    }

    /// Point both services at explicit base URLs, keeping default budgets.
    pub fn with_urls(user_service_url: Url, incident_service_url: Url) -> Self {
        Self {
            user_service_url,
            incident_service_url,
            timeout_secs: 10,
            connect_timeout_secs: 3,
            get_retries: 2,
        }
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

fn env_number<T: std::str::FromStr>(var: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber(var.to_string(), raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid number for {0}: {1:?}")]
    InvalidNumber(String, String),
    #[error("{0} {1}")]
    OutOfRange(&'static str, String),
}
