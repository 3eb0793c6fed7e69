//! End-to-end tests: the full router in-process, backends on wiremock.
//!
//! ## Coverage
//!
//! | Area | Tests |
//! |------|-------|
//! | Company creation | `create_company_*`, `invalid_company_*`, `malformed_json_*` |
//! | Company lookup | `get_company_*`, `downstream_error_*` |
//! | User lookups | `companies_by_*`, `users_view_*` |
//! | Auth policy | `required_policy_*`, `bearer_header_*` |
//! | Operational | `banner_*`, `health_*`, `db_test_*`, `metrics_*`, `openapi_*` |

use abcall_downstream::DownstreamConfig;
use abcall_gateway::auth::{AuthConfig, RoutePolicies};
use abcall_gateway::state::{AppConfig, AppState};
use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &str = "integration-secret";

// -- Helpers ------------------------------------------------------------------

fn config_with_urls(user: String, incident: String) -> AppConfig {
    let mut downstream =
        DownstreamConfig::with_urls(user.parse().unwrap(), incident.parse().unwrap());
    downstream.timeout_secs = 2;
    downstream.get_retries = 0;
    AppConfig::new(
        AuthConfig::new(SECRET, Algorithm::HS256).unwrap(),
        downstream,
    )
}

fn config_for(server: &MockServer) -> AppConfig {
    config_with_urls(
        format!("{}/user", server.uri()),
        format!("{}/incident-query", server.uri()),
    )
}

fn app_with(config: AppConfig) -> Router {
    abcall_gateway::app(AppState::new(config).unwrap())
}

fn app_for(server: &MockServer) -> Router {
    app_with(config_for(server))
}

fn sign(sub: &str) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        &json!({"sub": sub, "exp": chrono::Utc::now().timestamp() + 3600}),
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn with_token(mut req: Request<Body>, token: &str) -> Request<Body> {
    req.headers_mut().insert("token", token.parse().unwrap());
    req
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Bytes) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes)
}

fn as_json(bytes: &Bytes) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

fn company_payload() -> Value {
    json!({
        "username": "testuser@example.com",
        "password": "testpass",
        "first_name": "John",
        "last_name": "Doe",
        "name": "Test Company",
        "birth_date": "2023-01-01",
        "phone_number": "+12 345 678 9012",
        "country": "TestCountry",
        "city": "TestCity"
    })
}

// -- Company creation ---------------------------------------------------------

#[tokio::test]
async fn create_company_relays_created_record_byte_for_byte() {
    let server = MockServer::start().await;
    let record = format!(
        r#"{{"id": "{}", "name": "Test Company",  "username": "testuser@example.com"}}"#,
        Uuid::new_v4()
    );

    Mock::given(method("POST"))
        .and(path("/user/company/"))
        .and(body_json(company_payload()))
        .respond_with(ResponseTemplate::new(201).set_body_raw(record.clone(), "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(
        app_for(&server),
        post_json("/user-management/company/", &company_payload()),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body.as_ref(), record.as_bytes());
}

#[tokio::test]
async fn create_company_never_forwards_a_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/company/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": Uuid::new_v4()})))
        .mount(&server)
        .await;

    let req = with_token(
        post_json("/user-management/company/", &company_payload()),
        &sign("admin"),
    );
    let (status, _) = send(app_for(&server), req).await;
    assert_eq!(status, StatusCode::CREATED);

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(received[0].headers.get("token").is_none());
}

#[tokio::test]
async fn create_company_relays_directory_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/company/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "Error creating company"})),
        )
        .mount(&server)
        .await;

    let (status, body) = send(
        app_for(&server),
        post_json("/user-management/company/", &company_payload()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(as_json(&body), json!({"detail": "Error creating company"}));
}

#[tokio::test]
async fn invalid_company_payload_never_reaches_directory() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/company/"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let mut payload = company_payload();
    payload["phone_number"] = json!("3001234567");
    payload["password"] = json!("short");

    let (status, body) = send(
        app_for(&server),
        post_json("/user-management/company/", &payload),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let body = as_json(&body);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    let fields: Vec<&str> = body["error"]["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["password", "phone_number"]);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let server = MockServer::start().await;
    let req = Request::builder()
        .method("POST")
        .uri("/user-management/company/")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(app_for(&server), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(as_json(&body)["error"]["code"], "BAD_REQUEST");
}

// -- Company lookup -----------------------------------------------------------

#[tokio::test]
async fn get_company_propagates_verified_token() {
    let server = MockServer::start().await;
    let token = sign("agent-1");
    let company_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(format!("/user/company/{company_id}")))
        .and(header("token", token.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": company_id, "name": "Test Company"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let req = with_token(get(&format!("/user-management/company/{company_id}")), &token);
    let (status, body) = send(app_for(&server), req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body)["name"], "Test Company");
}

#[tokio::test]
async fn get_company_drops_unverifiable_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/company/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "abc"})))
        .mount(&server)
        .await;

    let req = with_token(get("/user-management/company/abc"), "forged.token.value");
    let (status, _) = send(app_for(&server), req).await;
    assert_eq!(status, StatusCode::OK);

    let received = server.received_requests().await.unwrap();
    assert!(received[0].headers.get("token").is_none());
}

#[tokio::test]
async fn downstream_error_is_relayed_verbatim() {
    let server = MockServer::start().await;
    let raw = r#"{"detail":   "Company not found"}"#;
    Mock::given(method("GET"))
        .and(path("/user/company/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_raw(raw, "application/json"))
        .mount(&server)
        .await;

    let (status, body) = send(app_for(&server), get("/user-management/company/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.as_ref(), raw.as_bytes());
}

#[tokio::test]
async fn bearer_header_is_propagated_as_token() {
    let server = MockServer::start().await;
    let token = sign("agent-2");
    Mock::given(method("GET"))
        .and(path("/user/company/abc"))
        .and(header("token", token.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "abc"})))
        .expect(1)
        .mount(&server)
        .await;

    let req = Request::builder()
        .uri("/user-management/company/abc")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app_for(&server), req).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn company_id_with_encoded_slashes_stays_one_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/user/secret-user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "secret-user"})))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user/company/..%2Fuser%2Fsecret-user"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Company not found"})))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(
        app_for(&server),
        get("/user-management/company/..%2Fuser%2Fsecret-user"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(as_json(&body)["detail"], "Company not found");
}

#[tokio::test]
async fn company_id_with_encoded_query_stays_in_the_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/company/x%3Fadmin=1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Company not found"})))
        .expect(1)
        .mount(&server)
        .await;

    let (status, _) = send(app_for(&server), get("/user-management/company/x%3Fadmin=1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].url.query(), None);
}

#[tokio::test]
async fn dot_segment_company_id_is_bad_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    for uri in ["/user-management/company/%2E%2E", "/user-management/company/%2E"] {
        let (status, body) = send(app_for(&server), get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(as_json(&body)["error"]["code"], "BAD_REQUEST");
    }
}

// -- User lookups -------------------------------------------------------------

#[tokio::test]
async fn companies_by_document_forwards_document_pair() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/user/companies"))
        .and(body_json(json!({"document_type": "passport", "document_id": "A1234567"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "companies": [{"company_name": "Test Company"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(
        app_for(&server),
        post_json(
            "/user-management/user/companies",
            &json!({"document_type": "passport", "document_id": "A1234567"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body)["companies"][0]["company_name"], "Test Company");
}

#[tokio::test]
async fn companies_by_document_rejects_blank_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/user/companies"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (status, _) = send(
        app_for(&server),
        post_json(
            "/user-management/user/companies",
            &json!({"document_type": "passport", "document_id": "  "}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn companies_by_user_requires_uuid() {
    let server = MockServer::start().await;
    let (status, _) = send(
        app_for(&server),
        post_json("/user-management/user/companies-user", &json!({"id": "42"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn companies_by_user_relays_list() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path("/user/user/companies-user"))
        .and(body_json(json!({"id": user_id})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_id": user_id,
            "companies": [{"id": Uuid::new_v4(), "name": "Test Company"}]
        })))
        .mount(&server)
        .await;

    let (status, body) = send(
        app_for(&server),
        post_json("/user-management/user/companies-user", &json!({"id": user_id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body)["companies"][0]["name"], "Test Company");
}

#[tokio::test]
async fn users_view_merges_user_and_incidents() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    let company_id = Uuid::new_v4();
    let token = sign("agent-3");

    Mock::given(method("GET"))
        .and(path(format!("/user/user/{user_id}")))
        .and(header("token", token.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": user_id, "username": "testuser@example.com", "allow_sms": true
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/incident-query/user-company"))
        .and(header("token", token.as_str()))
        .and(body_json(json!({"user_id": user_id, "company_id": company_id})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": Uuid::new_v4(), "description": "Test Incident", "state": "OPEN"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let req = with_token(
        post_json(
            "/user-management/user/users-view",
            &json!({"user_id": user_id, "company_id": company_id}),
        ),
        &token,
    );
    let (status, body) = send(app_for(&server), req).await;

    assert_eq!(status, StatusCode::OK);
    let body = as_json(&body);
    assert_eq!(body["id"], user_id.to_string());
    assert_eq!(body["allow_sms"], true);
    assert_eq!(body["incidents"][0]["description"], "Test Incident");
}

#[tokio::test]
async fn users_view_with_incident_service_unreachable_is_transport_failure() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path(format!("/user/user/{user_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": user_id})))
        .mount(&server)
        .await;

    let config = config_with_urls(
        format!("{}/user", server.uri()),
        "http://127.0.0.1:1/incident-query".to_string(),
    );
    let (status, body) = send(
        app_with(config),
        post_json(
            "/user-management/user/users-view",
            &json!({"user_id": user_id, "company_id": Uuid::new_v4()}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        as_json(&body),
        json!({"error": {"code": "UPSTREAM_UNREACHABLE", "message": "upstream unreachable"}})
    );
}

#[tokio::test]
async fn users_view_relays_user_leg_failure() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path(format!("/user/user/{user_id}")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "User not found"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/incident-query/user-company"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let (status, body) = send(
        app_for(&server),
        post_json(
            "/user-management/user/users-view",
            &json!({"user_id": user_id, "company_id": Uuid::new_v4()}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(as_json(&body), json!({"detail": "User not found"}));
}

// -- Auth policy --------------------------------------------------------------

#[tokio::test]
async fn required_policy_rejects_anonymous_without_downstream_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/company/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "abc"})))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.policies = RoutePolicies::default().require_all();

    let (status, body) = send(app_with(config), get("/user-management/company/abc")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(as_json(&body)["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn required_policy_accepts_verified_caller() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/company/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "abc"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.policies = RoutePolicies::default().require_all();

    let req = with_token(get("/user-management/company/abc"), &sign("agent-4"));
    let (status, _) = send(app_with(config), req).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn required_policy_still_allows_company_creation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/company/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": Uuid::new_v4()})))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.policies = RoutePolicies::default().require_all();

    let (status, _) = send(
        app_with(config),
        post_json("/user-management/company/", &company_payload()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

// -- Operational --------------------------------------------------------------

#[tokio::test]
async fn banner_answers() {
    let server = MockServer::start().await;
    let (status, body) = send(app_for(&server), get("/user-management")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body), json!({"message": "User Management Blue Green"}));
}

#[tokio::test]
async fn health_answers_ok() {
    let server = MockServer::start().await;
    let (status, body) = send(app_for(&server), get("/user-management/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body), json!({"status": "OK"}));
}

#[tokio::test]
async fn db_test_without_database_is_unavailable() {
    let server = MockServer::start().await;
    let (status, body) = send(app_for(&server), get("/user-management/db-test")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(as_json(&body)["error"]["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn metrics_count_credential_outcomes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/company/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "abc"})))
        .mount(&server)
        .await;

    let app = app_for(&server);
    send(app.clone(), get("/user-management/company/abc")).await;
    send(
        app.clone(),
        with_token(get("/user-management/company/abc"), "garbage"),
    )
    .await;
    send(
        app.clone(),
        with_token(get("/user-management/company/abc"), &sign("agent-5")),
    )
    .await;

    let (status, body) = send(app, get("/user-management/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    let snapshot = as_json(&body);
    assert_eq!(snapshot["requests"], 3);
    assert_eq!(snapshot["credentials_absent"], 1);
    assert_eq!(snapshot["credentials_invalid"], 1);
    assert_eq!(snapshot["credentials_resolved"], 1);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let server = MockServer::start().await;
    let (status, body) = send(app_for(&server), get("/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    let doc = as_json(&body);
    assert!(doc["paths"]["/user-management/user/users-view"].is_object());
}
