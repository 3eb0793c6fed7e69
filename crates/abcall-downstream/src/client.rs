//! The generic downstream request/response primitive.
//!
//! Every backend call in the gateway goes through [`DownstreamClient::call`].
//! The client attaches `Content-Type: application/json` when a body is
//! present and the propagated credential under a `token` header when one is
//! supplied. It never interprets the response status.

use std::time::{Duration, Instant};

use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::Serialize;
use url::Url;

use crate::config::DownstreamConfig;
use crate::error::TransportError;
use crate::target::DownstreamTarget;

/// Header under which the caller's credential is propagated downstream.
pub const TOKEN_HEADER: &str = "token";

// -- Request ------------------------------------------------------------------

/// A single downstream call: method, target, optional JSON body, optional
/// propagated credential.
#[derive(Clone)]
pub struct DownstreamRequest {
    pub method: Method,
    pub target: DownstreamTarget,
    pub body: Option<serde_json::Value>,
    pub token: Option<String>,
}

impl std::fmt::Debug for DownstreamRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownstreamRequest")
            .field("method", &self.method)
            .field("target", &self.target)
            .field("body", &self.body)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl DownstreamRequest {
    pub fn new(method: Method, target: DownstreamTarget) -> Self {
        Self {
            method,
            target,
            body: None,
            token: None,
        }
    }

    pub fn get(target: DownstreamTarget) -> Self {
        Self::new(Method::GET, target)
    }

    pub fn post(target: DownstreamTarget) -> Self {
        Self::new(Method::POST, target)
    }

    /// Attach a JSON body serialized from `payload`.
    pub fn with_payload<P: Serialize + ?Sized>(mut self, payload: &P) -> Result<Self, TransportError> {
        let body = serde_json::to_value(payload).map_err(|source| TransportError::Encode {
            endpoint: self.endpoint(),
            source,
        })?;
        self.body = Some(body);
        Ok(self)
    }

    /// Propagate a credential, if any.
    pub fn with_token(mut self, token: Option<&str>) -> Self {
        self.token = token.map(str::to_owned);
        self
    }

    /// `METHOD /relative/path` label used in logs and errors.
    pub fn endpoint(&self) -> String {
        format!("{} {}", self.method, self.target.label())
    }

    fn is_idempotent(&self) -> bool {
        self.method == Method::GET || self.method == Method::HEAD
    }
}

// -- Response -----------------------------------------------------------------

/// Normalized downstream answer: status plus JSON body.
///
/// The raw bytes are kept so that a successful relay is byte-for-byte.
#[derive(Debug, Clone, PartialEq)]
pub struct DownstreamResponse {
    status: u16,
    body: serde_json::Value,
    raw: Vec<u8>,
}

impl DownstreamResponse {
    /// Parse a raw body. Fails if the bytes are not JSON.
    pub fn from_bytes(status: u16, raw: Vec<u8>) -> Result<Self, serde_json::Error> {
        let body = serde_json::from_slice(&raw)?;
        Ok(Self { status, body, raw })
    }

    /// Build a response from an already-parsed body.
    pub fn from_json(status: u16, body: serde_json::Value) -> Self {
        let raw = serde_json::to_vec(&body).unwrap_or_default();
        Self { status, body, raw }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &serde_json::Value {
        &self.body
    }

    /// The body exactly as the downstream service sent it.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn into_body(self) -> serde_json::Value {
        self.body
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.raw
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// -- Client -------------------------------------------------------------------

/// Shared HTTP client for all downstream services.
#[derive(Debug, Clone)]
pub struct DownstreamClient {
    http: reqwest::Client,
    get_retries: u32,
}

impl DownstreamClient {
    /// Build the connection pool with the configured timeouts.
    pub fn new(config: &DownstreamConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(TransportError::ClientInit)?;

        Ok(Self {
            http,
            get_retries: config.get_retries,
        })
    }

    /// Perform one downstream call.
    ///
    /// Returns the status and parsed body for every HTTP status, including
    /// 4xx/5xx. Fails only when no JSON response could be obtained.
    pub async fn call(&self, req: DownstreamRequest) -> Result<DownstreamResponse, TransportError> {
        let endpoint = req.endpoint();
        let url = req.target.url()?;
        let body = req
            .body
            .as_ref()
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|source| TransportError::Encode {
                endpoint: endpoint.clone(),
                source,
            })?;
        let retries = if req.is_idempotent() { self.get_retries } else { 0 };

        let started = Instant::now();
        let resp = crate::retry::retry_send(retries, &endpoint, || {
            self.build(&req.method, &url, body.as_deref(), req.token.as_deref())
                .send()
        })
        .await
        .map_err(|source| {
            tracing::error!(endpoint = %endpoint, url = %url, "downstream unreachable: {source}");
            TransportError::Http {
                endpoint: endpoint.clone(),
                source,
            }
        })?;

        let status = resp.status().as_u16();
        let raw = resp.bytes().await.map_err(|source| TransportError::Http {
            endpoint: endpoint.clone(),
            source,
        })?;

        tracing::debug!(
            endpoint = %endpoint,
            url = %url,
            status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "downstream call completed"
        );

        DownstreamResponse::from_bytes(status, raw.to_vec()).map_err(|source| {
            tracing::error!(endpoint = %endpoint, status, "downstream returned non-JSON body");
            TransportError::InvalidBody {
                endpoint,
                status,
                source,
            }
        })
    }

    fn build(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&[u8]>,
        token: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method.clone(), url.clone());
        if let Some(token) = token {
            builder = builder.header(TOKEN_HEADER, token);
        }
        if let Some(body) = body {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_vec());
        }
        builder
    }
}
