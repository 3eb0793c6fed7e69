//! # abcall-gateway -- User Management Gateway
//!
//! Stateless HTTP front for the ABCall user-management surface. Every
//! operation resolves the caller's identity, applies the route's auth
//! policy, calls one or two backend services and relays or merges their
//! answers. The gateway owns no data.
//!
//! ## API Surface
//!
//! | Route                                      | Module               | Policy   |
//! |--------------------------------------------|----------------------|----------|
//! | `POST /user-management/company/`           | [`routes::company`]  | None     |
//! | `GET  /user-management/company/{id}`       | [`routes::company`]  | Optional |
//! | `POST /user-management/user/companies`     | [`routes::user`]     | Optional |
//! | `POST /user-management/user/companies-user`| [`routes::user`]     | Optional |
//! | `POST /user-management/user/users-view`    | [`routes::user`]     | Optional |
//!
//! `GATEWAY_REQUIRE_AUTH=true` turns every Optional policy into Required.
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → CredentialMiddleware → Handler
//! ```
//!
//! Operational routes (banner, health, db-test, metrics, `/openapi.json`)
//! skip the credential and metrics middleware.

pub mod auth;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod orchestration;
pub mod routes;
pub mod schemas;
pub mod shutdown;
pub mod state;
pub mod translate;

use axum::middleware::from_fn;
use axum::{Extension, Router};

use crate::auth::CredentialCodec;
use crate::middleware::metrics::ApiMetrics;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let codec = CredentialCodec::new(&state.config.auth);
    let metrics = ApiMetrics::new();

    let api = Router::new()
        .merge(routes::company::router())
        .merge(routes::user::router())
        .layer(from_fn(auth::credential_middleware))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(Extension(codec))
        .layer(Extension(metrics.clone()))
        .with_state(state.clone());

    let ops = Router::new()
        .merge(routes::ops::router())
        .merge(openapi::router())
        .layer(Extension(metrics))
        .with_state(state);

    Router::new()
        .merge(ops)
        .merge(api)
        .layer(middleware::tracing_layer::layer())
}
