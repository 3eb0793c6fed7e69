//! # OpenAPI Document Assembly
//!
//! Collects the utoipa-documented routes into one document served at
//! `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ABCall User Management Gateway",
        version = "0.1.0",
        description = "Companies, company membership and user incident views, relayed from the directory and incident-query services.",
        license(name = "MIT")
    ),
    paths(
        crate::routes::company::create_company,
        crate::routes::company::get_company,
        crate::routes::user::companies_by_document,
        crate::routes::user::companies_by_user,
        crate::routes::user::users_view,
    ),
    components(schemas(
        crate::schemas::CompanyCreate,
        crate::schemas::UserDocumentInfo,
        crate::schemas::UserIdRequest,
        crate::schemas::UserCompanyRequest,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "company", description = "Company creation and lookup"),
        (name = "user", description = "Company membership and incident views"),
    )
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
