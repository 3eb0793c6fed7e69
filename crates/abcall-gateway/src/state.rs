//! # Application State
//!
//! [`AppConfig`] is built once at startup from the environment and never
//! mutated. [`AppState`] is the handle given to every route handler via the
//! `State` extractor.

use std::sync::Arc;

use abcall_downstream::{DownstreamConfig, DownstreamServices, TransportError};
use sqlx::PgPool;

use crate::auth::{AuthConfig, RoutePolicies};
use crate::orchestration::Aggregator;

const DEFAULT_PORT: u16 = 8001;

/// Startup configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JWT_SECRET_KEY must be set to a non-empty value")]
    MissingSecret,
    #[error("unsupported JWT algorithm: {0} (expected HS256, HS384 or HS512)")]
    UnsupportedAlgorithm(String),
    #[error("invalid PORT: {0:?}")]
    InvalidPort(String),
    #[error("invalid boolean for {0}: {1:?}")]
    InvalidFlag(String, String),
    #[error(transparent)]
    Downstream(#[from] abcall_downstream::config::ConfigError),
}

/// Application configuration.
#[derive(Clone)]
pub struct AppConfig {
    pub port: u16,
    pub auth: AuthConfig,
    pub policies: RoutePolicies,
    pub downstream: DownstreamConfig,
    pub database_url: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("auth", &self.auth)
            .field("policies", &self.policies)
            .field("downstream", &self.downstream)
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl AppConfig {
    /// Defaults around the two required inputs.
    pub fn new(auth: AuthConfig, downstream: DownstreamConfig) -> Self {
        Self {
            port: DEFAULT_PORT,
            auth,
            policies: RoutePolicies::default(),
            downstream,
            database_url: None,
        }
    }

    /// Read the full configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            Err(_) => DEFAULT_PORT,
        };

        let mut policies = RoutePolicies::default();
        if env_flag("GATEWAY_REQUIRE_AUTH")? {
            policies = policies.require_all();
        }

        Ok(Self {
            port,
            auth: AuthConfig::from_env()?,
            policies,
            downstream: DownstreamConfig::from_env()?,
            database_url: crate::db::database_url_from_env(),
        })
    }
}

fn env_flag(var: &str) -> Result<bool, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => parse_flag(&raw).ok_or_else(|| ConfigError::InvalidFlag(var.to_string(), raw)),
        Err(_) => Ok(false),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Shared application state passed to all route handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub aggregator: Aggregator,
    pub db_pool: Option<PgPool>,
}

impl AppState {
    /// Build the downstream connection pool from `config`.
    pub fn new(config: AppConfig) -> Result<Self, TransportError> {
        let services = DownstreamServices::new(config.downstream.clone())?;
        Ok(Self {
            config: Arc::new(config),
            aggregator: Aggregator::new(services),
            db_pool: None,
        })
    }

    pub fn with_db_pool(mut self, pool: Option<PgPool>) -> Self {
        self.db_pool = pool;
        self
    }
}
