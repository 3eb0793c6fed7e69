//! # Company Routes
//!
//! Company creation never carries a credential. Company lookup propagates the
//! caller's verified token when present.

use abcall_downstream::DownstreamTarget;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::auth::Caller;
use crate::error::{AppError, ErrorBody};
use crate::extractors::extract_validated_json;
use crate::schemas::CompanyCreate;
use crate::state::AppState;
use crate::translate::CallerResult;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user-management/company/", post(create_company))
        .route("/user-management/company", post(create_company))
        .route("/user-management/company/:company_id", get(get_company))
}

/// POST /user-management/company/: Create a company and its administrator.
#[utoipa::path(
    post,
    path = "/user-management/company/",
    request_body = CompanyCreate,
    responses(
        (status = 201, description = "Company created; directory record relayed as-is"),
        (status = 400, description = "Malformed JSON body", body = ErrorBody),
        (status = 422, description = "Field validation failed", body = ErrorBody),
        (status = 502, description = "Directory service unreachable", body = ErrorBody),
    ),
    tag = "company"
)]
pub async fn create_company(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<CompanyCreate>, JsonRejection>,
) -> CallerResult {
    state.config.policies.create_company.enforce(caller)?;
    let company = extract_validated_json(body)?;
    state.aggregator.create_company(&company).await
}

/// GET /user-management/company/{company_id}: Fetch one company.
#[utoipa::path(
    get,
    path = "/user-management/company/{company_id}",
    params(("company_id" = String, Path, description = "Company identifier, passed through")),
    responses(
        (status = 200, description = "Company record relayed as-is"),
        (status = 400, description = "Empty or dot-segment company id", body = ErrorBody),
        (status = 401, description = "Authentication required by configuration", body = ErrorBody),
        (status = 502, description = "Directory service unreachable", body = ErrorBody),
    ),
    tag = "company"
)]
pub async fn get_company(
    State(state): State<AppState>,
    caller: Caller,
    Path(company_id): Path<String>,
) -> CallerResult {
    let auth = state.config.policies.get_company.enforce(caller)?;
    if company_id.trim().is_empty() {
        return Err(AppError::BadRequest("company id must not be empty".into()));
    }
    if !DownstreamTarget::accepts_segment(&company_id) {
        return Err(AppError::BadRequest("company id is not a valid identifier".into()));
    }
    state.aggregator.company(&company_id, auth.as_ref()).await
}
