//! # abcall-downstream -- Typed client for the ABCall backend services
//!
//! The gateway fronts two independently owned services:
//! - **Directory** (`USER_SERVICE_URL`): companies and users
//! - **Incident query** (`QUERY_INCIDENT_SERVICE_URL`): incidents per user and company
//!
//! ## Architecture
//!
//! [`client::DownstreamClient`] is the single request/response primitive. It
//! returns every HTTP status as data and only fails on transport problems
//! (connection, DNS, timeout, non-JSON body). The per-service gateways
//! ([`company::CompanyGateway`], [`user::UserGateway`],
//! [`incident::IncidentGateway`]) pin the exact path and payload shape of each
//! downstream operation and hand back the raw [`DownstreamResponse`].
//!
//! Interpreting statuses is the caller's job; this crate never shapes bodies.
//!
//! ## Identity propagation
//!
//! A propagated credential travels in a `token` header, not `Authorization`.
//! Both backend services read that header.

pub mod client;
pub mod company;
pub mod config;
pub mod error;
pub mod incident;
pub(crate) mod retry;
pub mod target;
pub mod types;
pub mod user;

pub use client::{DownstreamClient, DownstreamRequest, DownstreamResponse};
pub use config::DownstreamConfig;
pub use error::TransportError;
pub use target::DownstreamTarget;

/// Top-level handle holding one gateway per downstream service.
///
/// All gateways share one connection pool. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct DownstreamServices {
    companies: company::CompanyGateway,
    users: user::UserGateway,
    incidents: incident::IncidentGateway,
}

impl DownstreamServices {
    /// Build the shared HTTP client and the three gateways from configuration.
    pub fn new(config: DownstreamConfig) -> Result<Self, TransportError> {
        let client = DownstreamClient::new(&config)?;

        Ok(Self {
            companies: company::CompanyGateway::new(
                client.clone(),
                config.user_service_url.clone(),
            ),
            users: user::UserGateway::new(client.clone(), config.user_service_url),
            incidents: incident::IncidentGateway::new(client, config.incident_service_url),
        })
    }

    /// Access the company operations of the directory service.
    pub fn companies(&self) -> &company::CompanyGateway {
        &self.companies
    }

    /// Access the user operations of the directory service.
    pub fn users(&self) -> &user::UserGateway {
        &self.users
    }

    /// Access the incident-query service.
    pub fn incidents(&self) -> &incident::IncidentGateway {
        &self.incidents
    }
}
