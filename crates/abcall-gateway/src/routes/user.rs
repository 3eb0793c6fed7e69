//! # User Routes
//!
//! Company membership lookups and the aggregated user view. All three
//! propagate the caller's verified token when present.

use abcall_downstream::types::{AggregatedUserView, DocumentInfo};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use crate::auth::Caller;
use crate::error::{AppError, ErrorBody};
use crate::extractors::{extract_json, extract_validated_json};
use crate::schemas::{UserCompanyRequest, UserDocumentInfo, UserIdRequest};
use crate::state::AppState;
use crate::translate::CallerResult;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user-management/user/companies", post(companies_by_document))
        .route("/user-management/user/companies-user", post(companies_by_user))
        .route("/user-management/user/users-view", post(users_view))
}

/// POST /user-management/user/companies: Companies linked to an identity document.
#[utoipa::path(
    post,
    path = "/user-management/user/companies",
    request_body = UserDocumentInfo,
    responses(
        (status = 200, description = "Company list relayed as-is"),
        (status = 401, description = "Authentication required by configuration", body = ErrorBody),
        (status = 422, description = "Field validation failed", body = ErrorBody),
        (status = 502, description = "Directory service unreachable", body = ErrorBody),
    ),
    tag = "user"
)]
pub async fn companies_by_document(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<UserDocumentInfo>, JsonRejection>,
) -> CallerResult {
    let auth = state.config.policies.companies_by_document.enforce(caller)?;
    let document: DocumentInfo = extract_validated_json(body)?.into();
    state
        .aggregator
        .companies_by_document(&document, auth.as_ref())
        .await
}

/// POST /user-management/user/companies-user: Companies a user belongs to.
#[utoipa::path(
    post,
    path = "/user-management/user/companies-user",
    request_body = UserIdRequest,
    responses(
        (status = 200, description = "User id with company list, relayed as-is"),
        (status = 400, description = "Body is not JSON or id is not a UUID", body = ErrorBody),
        (status = 401, description = "Authentication required by configuration", body = ErrorBody),
        (status = 502, description = "Directory service unreachable", body = ErrorBody),
    ),
    tag = "user"
)]
pub async fn companies_by_user(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<UserIdRequest>, JsonRejection>,
) -> CallerResult {
    let auth = state.config.policies.companies_by_user.enforce(caller)?;
    let req = extract_json(body)?;
    state.aggregator.companies_by_user(req.id, auth.as_ref()).await
}

/// POST /user-management/user/users-view: A user with their incidents in one company.
///
/// Succeeds only if both the directory and the incident-query service answer 200.
#[utoipa::path(
    post,
    path = "/user-management/user/users-view",
    request_body = UserCompanyRequest,
    responses(
        (status = 200, description = "User fields plus an `incidents` list"),
        (status = 400, description = "Body is not JSON or ids are not UUIDs", body = ErrorBody),
        (status = 401, description = "Authentication required by configuration", body = ErrorBody),
        (status = 502, description = "A backend is unreachable or answered with an unreadable body", body = ErrorBody),
    ),
    tag = "user"
)]
pub async fn users_view(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<UserCompanyRequest>, JsonRejection>,
) -> Result<Json<AggregatedUserView>, AppError> {
    let auth = state.config.policies.users_view.enforce(caller)?;
    let req = extract_json(body)?;
    let view = state
        .aggregator
        .user_with_incidents(req.user_id, req.company_id, auth.as_ref())
        .await?;
    Ok(Json(view))
}
