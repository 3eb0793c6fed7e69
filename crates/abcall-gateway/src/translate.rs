//! Mapping of a downstream answer onto the caller's answer.
//!
//! A route declares the status it expects from its backend. When the backend
//! answers with exactly that status, the body is relayed untouched under the
//! same status. Any other status is relayed as-is through
//! [`AppError::Downstream`], so the backend's own error body reaches the
//! caller. Transport failures never reach this module; they are converted by
//! `From<TransportError> for AppError`.

use abcall_downstream::{DownstreamResponse, TransportError};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::AppError;

/// A successful downstream answer ready to be returned to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Relayed {
    status: StatusCode,
    response: DownstreamResponse,
}

impl Relayed {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &serde_json::Value {
        self.response.body()
    }

    pub fn into_downstream(self) -> DownstreamResponse {
        self.response
    }
}

impl IntoResponse for Relayed {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "application/json")],
            self.response.into_raw(),
        )
            .into_response()
    }
}

/// Outcome of a single-call gateway operation.
pub type CallerResult = Result<Relayed, AppError>;

/// Translate one downstream answer against the status the route expects.
pub fn translate(response: DownstreamResponse, expected: StatusCode) -> CallerResult {
    if response.status() == expected.as_u16() {
        Ok(Relayed {
            status: expected,
            response,
        })
    } else {
        Err(AppError::Downstream {
            status: response.status(),
            body: response.into_raw(),
        })
    }
}

/// Translate the full outcome of a downstream call, transport failures included.
pub fn relay(
    outcome: Result<DownstreamResponse, TransportError>,
    expected: StatusCode,
) -> CallerResult {
    translate(outcome?, expected)
}
