//! Typed facade for the user operations of the directory service.
//!
//! Base URL: `USER_SERVICE_URL`
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `/user/{userId}` | Get user by ID |
//! | POST   | `/user/companies` | Companies for an identity document |
//! | POST   | `/user/companies-user` | Companies for a user ID |

use url::Url;
use uuid::Uuid;

use crate::client::{DownstreamClient, DownstreamRequest, DownstreamResponse};
use crate::error::TransportError;
use crate::target::DownstreamTarget;
use crate::types::{DocumentInfo, UserIdPayload};

/// Client for user operations.
#[derive(Debug, Clone)]
pub struct UserGateway {
    client: DownstreamClient,
    base_url: Url,
}

impl UserGateway {
    pub(crate) fn new(client: DownstreamClient, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Get a user by ID.
    ///
    /// Calls `GET {base_url}/user/{id}`.
    pub async fn get_by_id(
        &self,
        user_id: Uuid,
        token: Option<&str>,
    ) -> Result<DownstreamResponse, TransportError> {
        let target = DownstreamTarget::new(&self.base_url, format!("/user/{user_id}"));
        self.client
            .call(DownstreamRequest::get(target).with_token(token))
            .await
    }

    /// List the companies a user belongs to, looked up by identity document.
    ///
    /// Calls `POST {base_url}/user/companies`.
    pub async fn get_companies_by_document(
        &self,
        document: &DocumentInfo,
        token: Option<&str>,
    ) -> Result<DownstreamResponse, TransportError> {
        let target = DownstreamTarget::new(&self.base_url, "/user/companies");
        let req = DownstreamRequest::post(target)
            .with_payload(document)?
            .with_token(token);
        self.client.call(req).await
    }

    /// List the companies a user belongs to, looked up by user ID.
    ///
    /// Calls `POST {base_url}/user/companies-user`.
    pub async fn get_companies_by_user_id(
        &self,
        user_id: Uuid,
        token: Option<&str>,
    ) -> Result<DownstreamResponse, TransportError> {
        let target = DownstreamTarget::new(&self.base_url, "/user/companies-user");
        let req = DownstreamRequest::post(target)
            .with_payload(&UserIdPayload { id: user_id })?
            .with_token(token);
        self.client.call(req).await
    }
}
