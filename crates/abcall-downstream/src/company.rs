//! Typed facade for the company operations of the directory service.
//!
//! Base URL: `USER_SERVICE_URL` (includes the `/user` context path)
//!
//! | Method | Path | Operation | Success |
//! |--------|------|-----------|---------|
//! | POST   | `/company/` | Create company | 201 |
//! | GET    | `/company/{companyId}` | Get by ID | 200 |

use serde::Serialize;
use url::Url;

use crate::client::{DownstreamClient, DownstreamRequest, DownstreamResponse};
use crate::error::TransportError;
use crate::target::DownstreamTarget;

/// Client for company operations.
#[derive(Debug, Clone)]
pub struct CompanyGateway {
    client: DownstreamClient,
    base_url: Url,
}

impl CompanyGateway {
    pub(crate) fn new(client: DownstreamClient, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Create a company.
    ///
    /// Calls `POST {base_url}/company/`. No credential is propagated; the
    /// directory service registers companies anonymously.
    pub async fn create<P>(&self, payload: &P) -> Result<DownstreamResponse, TransportError>
    where
        P: Serialize + ?Sized,
    {
        let req = DownstreamRequest::post(DownstreamTarget::new(&self.base_url, "/company/"))
            .with_payload(payload)?;
        self.client.call(req).await
    }

    /// Get a company by ID.
    ///
    /// Calls `GET {base_url}/company/{id}`. The id is sent as one encoded
    /// path segment.
    pub async fn get_by_id(
        &self,
        company_id: &str,
        token: Option<&str>,
    ) -> Result<DownstreamResponse, TransportError> {
        let target = DownstreamTarget::with_segment(&self.base_url, "/company", company_id);
        self.client
            .call(DownstreamRequest::get(target).with_token(token))
            .await
    }
}
