//! Typed facade for the incident-query service.
//!
//! Base URL: `QUERY_INCIDENT_SERVICE_URL` (includes the `/incident-query` context path)

use url::Url;
use uuid::Uuid;

use crate::client::{DownstreamClient, DownstreamRequest, DownstreamResponse};
use crate::error::TransportError;
use crate::target::DownstreamTarget;
use crate::types::UserCompanyPayload;

/// Client for the incident-query service.
#[derive(Debug, Clone)]
pub struct IncidentGateway {
    client: DownstreamClient,
    base_url: Url,
}

impl IncidentGateway {
    pub(crate) fn new(client: DownstreamClient, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// List a user's incidents within one company.
    ///
    /// Calls `POST {base_url}/user-company` with `{"user_id", "company_id"}`.
    /// The lookup is a POST, so it is never retried.
    pub async fn get_by_user_and_company(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        token: Option<&str>,
    ) -> Result<DownstreamResponse, TransportError> {
        let target = DownstreamTarget::new(&self.base_url, "/user-company");
        let req = DownstreamRequest::post(target)
            .with_payload(&UserCompanyPayload {
                user_id,
                company_id,
            })?
            .with_token(token);
        self.client.call(req).await
    }
}
