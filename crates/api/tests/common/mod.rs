#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tower::ServiceExt;

use surgiguide_api::auth::jwt::{generate_access_token, JwtConfig};
use surgiguide_api::config::ServerConfig;
use surgiguide_api::middleware::auth::AuthUser;
use surgiguide_api::router::build_app_router;
use surgiguide_api::state::AppState;
use surgiguide_core::roles::Role;
use surgiguide_events::EventBus;

const TEST_JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_mins: 15,
        },
        quote_validity_days: 30,
        public_app_url: "http://localhost:5173".to_string(),
    }
}

/// Application state over `pool` with a fresh event bus.
pub fn build_test_state(pool: PgPool) -> AppState {
    AppState {
        pool,
        config: Arc::new(test_config()),
        event_bus: Arc::new(EventBus::default()),
    }
}

/// Build the full application router with the production middleware stack.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    build_app_router(build_test_state(pool), &config)
}

// ---------------------------------------------------------------------------
// Principals
// ---------------------------------------------------------------------------

/// A seeded profile together with a signed token for it.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: i64,
    pub profile_id: i64,
    pub role: Role,
    pub token: String,
}

impl Principal {
    pub fn auth_user(&self) -> AuthUser {
        AuthUser {
            user_id: self.user_id,
            role: self.role,
            profile_id: self.profile_id,
        }
    }
}

pub fn token_for(user_id: i64, role: Role, profile_id: i64) -> String {
    generate_access_token(user_id, role, profile_id, &test_config().jwt).unwrap()
}

pub async fn seed_client(pool: &PgPool, user_id: i64) -> Principal {
    let profile_id: i64 = sqlx::query_scalar(
        "INSERT INTO client_profiles (user_id, display_name, email) \
         VALUES ($1, 'Dr. Test', 'doctor@example.com') RETURNING id",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
    .unwrap();
    Principal {
        user_id,
        profile_id,
        role: Role::Client,
        token: token_for(user_id, Role::Client, profile_id),
    }
}

async fn seed_staff(pool: &PgPool, user_id: i64, is_admin: bool) -> Principal {
    let profile_id: i64 = sqlx::query_scalar(
        "INSERT INTO designer_profiles (user_id, display_name, email, is_admin) \
         VALUES ($1, 'Staff', 'staff@example.com', $2) RETURNING id",
    )
    .bind(user_id)
    .bind(is_admin)
    .fetch_one(pool)
    .await
    .unwrap();
    let role = if is_admin { Role::Admin } else { Role::Designer };
    Principal {
        user_id,
        profile_id,
        role,
        token: token_for(user_id, role, profile_id),
    }
}

pub async fn seed_designer(pool: &PgPool, user_id: i64) -> Principal {
    seed_staff(pool, user_id, false).await
}

pub async fn seed_admin(pool: &PgPool, user_id: i64) -> Principal {
    seed_staff(pool, user_id, true).await
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Collect the response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Send a GET request with an optional bearer token.
pub async fn get(app: Router, uri: &str, token: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    app.oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Send a request with a JSON body and a bearer token.
pub async fn send_json(
    app: Router,
    method: Method,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send_json(app, Method::POST, uri, token, body).await
}

/// Send a bodiless request (POST actions, DELETE) with a bearer token.
pub async fn send(app: Router, method: Method, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Read a money field, which is serialized as a decimal string.
pub fn money(value: &serde_json::Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

// ---------------------------------------------------------------------------
// Workflow fixtures
// ---------------------------------------------------------------------------

/// Create a complete draft for `client`, returning its id.
pub async fn create_complete_draft(pool: &PgPool, client: &Principal) -> i64 {
    let response = post_json(
        build_test_app(pool.clone()),
        "/api/v1/cases",
        &client.token,
        serde_json::json!({
            "procedure_category": "single_implant",
            "guide_type": "tooth_supported",
            "required_service": "design_and_production",
            "patient_reference": "P-001",
        }),
    )
    .await;
    assert_eq!(response.status(), 201);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Move a case through `/status` as `staff`, asserting every step succeeds.
pub async fn walk_status(pool: &PgPool, staff: &Principal, case_id: i64, steps: &[&str]) {
    for step in steps {
        let response = post_json(
            build_test_app(pool.clone()),
            &format!("/api/v1/cases/{case_id}/status"),
            &staff.token,
            serde_json::json!({ "status": step }),
        )
        .await;
        assert_eq!(response.status(), 200, "transition to {step} failed");
    }
}

/// Submit a complete draft and take it to `study_completed`.
pub async fn case_ready_for_quote(
    pool: &PgPool,
    client: &Principal,
    designer: &Principal,
) -> i64 {
    let case_id = create_complete_draft(pool, client).await;
    let response = send(
        build_test_app(pool.clone()),
        Method::POST,
        &format!("/api/v1/cases/{case_id}/submit"),
        &client.token,
    )
    .await;
    assert_eq!(response.status(), 200);
    walk_status(pool, designer, case_id, &["study_in_progress", "study_completed"]).await;
    case_id
}

/// The fee set used across quote tests: 100 + 50 + 300 + 20 at 15% VAT.
pub fn standard_quote_body() -> serde_json::Value {
    serde_json::json!({
        "study_fee": "100.00",
        "design_fee": "50.00",
        "production_fee": "300.00",
        "delivery_fee": "20.00",
        "vat_rate": "15",
    })
}

/// Send the standard quote for a case as `admin`, returning the quote id.
pub async fn send_standard_quote(pool: &PgPool, admin: &Principal, case_id: i64) -> i64 {
    let response = post_json(
        build_test_app(pool.clone()),
        &format!("/api/v1/cases/{case_id}/quotes"),
        &admin.token,
        standard_quote_body(),
    )
    .await;
    assert_eq!(response.status(), 201);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Current status string of a case, read straight from the table.
pub async fn case_status(pool: &PgPool, case_id: i64) -> String {
    sqlx::query_scalar("SELECT status FROM cases WHERE id = $1")
        .bind(case_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn history_count(pool: &PgPool, case_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM case_status_history WHERE case_id = $1")
        .bind(case_id)
        .fetch_one(pool)
        .await
        .unwrap()
}
