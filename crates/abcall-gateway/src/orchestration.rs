//! # Aggregator
//!
//! Every gateway operation is a sequence of downstream calls whose results are
//! relayed or merged. Single-call operations translate one answer against the
//! status the route expects. `user_with_incidents` runs its two legs
//! concurrently and succeeds only when both do.

use abcall_downstream::types::{AggregatedUserView, CompanyRecord, DocumentInfo};
use abcall_downstream::{DownstreamResponse, DownstreamServices, TransportError};
use axum::http::StatusCode;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::error::AppError;
use crate::schemas::CompanyCreate;
use crate::translate::{relay, CallerResult, Relayed};

/// One downstream call inside a composite operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    User,
    Incidents,
}

impl Leg {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Incidents => "incidents",
        }
    }
}

impl std::fmt::Display for Leg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn token(auth: Option<&AuthContext>) -> Option<&str> {
    auth.map(AuthContext::token)
}

/// Composes downstream calls into gateway operations.
#[derive(Debug, Clone)]
pub struct Aggregator {
    services: DownstreamServices,
}

impl Aggregator {
    pub fn new(services: DownstreamServices) -> Self {
        Self { services }
    }

    pub fn services(&self) -> &DownstreamServices {
        &self.services
    }

    /// Create a company. Never carries a credential.
    pub async fn create_company(&self, company: &CompanyCreate) -> CallerResult {
        let relayed = relay(
            self.services.companies().create(company).await,
            StatusCode::CREATED,
        )?;
        match CompanyRecord::deserialize(relayed.body()) {
            Ok(record) => tracing::info!(company_id = %record.id, "company created"),
            Err(e) => tracing::warn!(error = %e, "created company record has no readable id"),
        }
        Ok(relayed)
    }

    pub async fn company(&self, company_id: &str, auth: Option<&AuthContext>) -> CallerResult {
        relay(
            self.services.companies().get_by_id(company_id, token(auth)).await,
            StatusCode::OK,
        )
    }

    pub async fn companies_by_document(
        &self,
        document: &DocumentInfo,
        auth: Option<&AuthContext>,
    ) -> CallerResult {
        relay(
            self.services
                .users()
                .get_companies_by_document(document, token(auth))
                .await,
            StatusCode::OK,
        )
    }

    pub async fn companies_by_user(
        &self,
        user_id: Uuid,
        auth: Option<&AuthContext>,
    ) -> CallerResult {
        relay(
            self.services
                .users()
                .get_companies_by_user_id(user_id, token(auth))
                .await,
            StatusCode::OK,
        )
    }

    /// Fetch a user and their incidents in one company, concurrently.
    ///
    /// Both legs must answer 200. When both fail, the user leg's failure is
    /// reported.
    pub async fn user_with_incidents(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        auth: Option<&AuthContext>,
    ) -> Result<AggregatedUserView, AppError> {
        let token = token(auth);
        let (user, incidents) = tokio::join!(
            self.services.users().get_by_id(user_id, token),
            self.services
                .incidents()
                .get_by_user_and_company(user_id, company_id, token),
        );

        let user = leg(Leg::User, user)?;
        let incidents = leg(Leg::Incidents, incidents)?;

        AggregatedUserView::compose(user.into_body(), incidents.into_body())
            .map_err(|e| AppError::UpstreamContract(e.to_string()))
    }
}

fn leg(
    leg: Leg,
    outcome: Result<DownstreamResponse, TransportError>,
) -> Result<DownstreamResponse, AppError> {
    relay(outcome, StatusCode::OK)
        .map(Relayed::into_downstream)
        .map_err(|source| AppError::Composition {
            leg,
            source: Box::new(source),
        })
}
