//! Unauthenticated operational endpoints.

use axum::extract::State;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::{json, Value};

use crate::db;
use crate::error::AppError;
use crate::middleware::metrics::{ApiMetrics, MetricsSnapshot};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user-management", get(banner))
        .route("/user-management/health", get(health))
        .route("/user-management/db-test", get(db_test))
        .route("/user-management/metrics", get(metrics))
}

async fn banner() -> Json<Value> {
    Json(json!({"message": "User Management Blue Green"}))
}

async fn health() -> Json<Value> {
    Json(json!({"status": "OK"}))
}

/// Round-trip `SELECT 1` through the probe pool.
async fn db_test(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let pool = state
        .db_pool
        .as_ref()
        .ok_or_else(|| AppError::service_unavailable("database not configured"))?;

    let result = db::probe(pool)
        .await
        .map_err(|e| AppError::Internal(format!("database probe failed: {e}")))?;

    Ok(Json(json!({
        "message": "Database connection successful",
        "result": result
    })))
}

async fn metrics(Extension(metrics): Extension<ApiMetrics>) -> Json<MetricsSnapshot> {
    Json(metrics.snapshot())
}
