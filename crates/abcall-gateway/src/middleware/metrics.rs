//! # Request Metrics
//!
//! In-process atomic counters, exposed as a JSON snapshot on
//! `GET /user-management/metrics`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use serde::{Deserialize, Serialize};

use crate::auth::Resolution;

/// Shared metrics state.
#[derive(Debug, Clone)]
pub struct ApiMetrics {
    pub request_count: Arc<AtomicU64>,
    pub error_count: Arc<AtomicU64>,
    pub credentials_absent: Arc<AtomicU64>,
    pub credentials_invalid: Arc<AtomicU64>,
    pub credentials_resolved: Arc<AtomicU64>,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub errors: u64,
    pub credentials_absent: u64,
    pub credentials_invalid: u64,
    pub credentials_resolved: u64,
}

impl ApiMetrics {
    pub fn new() -> Self {
        Self {
            request_count: Arc::new(AtomicU64::new(0)),
            error_count: Arc::new(AtomicU64::new(0)),
            credentials_absent: Arc::new(AtomicU64::new(0)),
            credentials_invalid: Arc::new(AtomicU64::new(0)),
            credentials_resolved: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn requests(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Count one credential outcome.
    pub fn record_credential(&self, resolution: &Resolution) {
        let counter = match resolution {
            Resolution::Absent => &self.credentials_absent,
            Resolution::Invalid(_) => &self.credentials_invalid,
            Resolution::Resolved(_) => &self.credentials_resolved,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests(),
            errors: self.errors(),
            credentials_absent: self.credentials_absent.load(Ordering::Relaxed),
            credentials_invalid: self.credentials_invalid.load(Ordering::Relaxed),
            credentials_resolved: self.credentials_resolved.load(Ordering::Relaxed),
        }
    }
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Middleware that increments request and error counters.
///
/// Relayed downstream failures count as errors too.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();

    let response = next.run(request).await;

    if let Some(m) = metrics {
        m.request_count.fetch_add(1, Ordering::Relaxed);
        if response.status().is_server_error() || response.status().is_client_error() {
            m.error_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    response
}
