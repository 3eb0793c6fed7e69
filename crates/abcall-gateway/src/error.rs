//! # API Error Types
//!
//! Two families of failure reach callers:
//!
//! - **Relayed** failures: a downstream service answered with a status other
//!   than the one the route expects. The caller gets that status and that body,
//!   byte-for-byte. The gateway never rewrites a backend's error vocabulary.
//! - **Gateway** failures: the gateway itself rejected the request or could
//!   not complete it. These use the structured [`ErrorBody`] shape.
//!
//! A transport failure is always reported as the fixed
//! `502 UPSTREAM_UNREACHABLE` body. Its cause is logged, never returned.

use abcall_downstream::TransportError;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::extractors::ValidationErrors;
use crate::orchestration::Leg;

/// Structured JSON error response body for gateway-originated errors.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "VALIDATION_ERROR", "UPSTREAM_UNREACHABLE").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Field-level violations, present only for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request body failed field validation (422).
    #[error("validation error: {0}")]
    Validation(ValidationErrors),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Route requires an identity and none was resolved (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Downstream answered with an unexpected status. Relayed verbatim.
    #[error("downstream returned {status}")]
    Downstream { status: u16, body: Vec<u8> },

    /// Downstream could not be reached or did not answer with JSON (502).
    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(#[from] TransportError),

    /// Downstream answered successfully with a body the gateway cannot read (502).
    #[error("upstream contract violation: {0}")]
    UpstreamContract(String),

    /// One leg of a composite operation failed; the caller sees that leg's failure.
    #[error("{leg} call failed: {source}")]
    Composition { leg: Leg, source: Box<AppError> },

    /// Optional dependency not configured (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Downstream { status, .. } => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                "DOWNSTREAM_ERROR",
            ),
            Self::UpstreamUnreachable(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_UNREACHABLE"),
            Self::UpstreamContract(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_CONTRACT_VIOLATION"),
            Self::Composition { source, .. } => source.status_and_code(),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Construct a service unavailable error (503).
    pub fn service_unavailable(msg: &str) -> Self {
        Self::ServiceUnavailable(msg.to_string())
    }

    fn structured(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::UpstreamUnreachable(_) => "upstream unreachable".to_string(),
            Self::UpstreamContract(_) => "upstream returned an unexpected response".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::UpstreamUnreachable(source) => tracing::error!(
                endpoint = source.endpoint().unwrap_or("-"),
                timeout = source.is_timeout(),
                error = %source,
                "downstream transport failure"
            ),
            Self::UpstreamContract(_) => tracing::error!(error = %self, "upstream contract violation"),
            Self::ServiceUnavailable(_) => tracing::warn!(error = %self, "service unavailable"),
            _ => {}
        }

        let details = match self {
            Self::Validation(errors) => serde_json::to_value(errors.violations()).ok(),
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Downstream { status, body } => {
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
            }
            Self::Composition { leg, source } => {
                tracing::warn!(leg = %leg, error = %source, "composite operation failed");
                (*source).into_response()
            }
            other => other.structured(),
        }
    }
}
