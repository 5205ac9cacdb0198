//! HTTP-level tests for discount codes: validation, pricing on quotes,
//! usage caps at acceptance and admin management.

mod common;

use axum::http::{Method, StatusCode};
use common::{
    body_json, build_test_app, case_ready_for_quote, case_status, get, money, post_json, send,
    send_json, send_standard_quote, seed_admin, seed_client, seed_designer, Principal,
};
use rust_decimal_macros::dec;
use sqlx::PgPool;

async fn create_code(pool: &PgPool, admin: &Principal, body: serde_json::Value) -> i64 {
    let response = post_json(
        build_test_app(pool.clone()),
        "/api/v1/admin/discount-codes",
        &admin.token,
        body,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

async fn apply(
    pool: &PgPool,
    client: &Principal,
    quote_id: i64,
    code: &str,
) -> axum::http::Response<axum::body::Body> {
    post_json(
        build_test_app(pool.clone()),
        &format!("/api/v1/quotes/{quote_id}/discount"),
        &client.token,
        serde_json::json!({ "code": code }),
    )
    .await
}

async fn times_used(pool: &PgPool, code_id: i64) -> i32 {
    sqlx::query_scalar("SELECT times_used FROM discount_codes WHERE id = $1")
        .bind(code_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_validate_reports_discount(pool: PgPool) {
    let client = seed_client(&pool, 100).await;
    let admin = seed_admin(&pool, 300).await;
    create_code(
        &pool,
        &admin,
        serde_json::json!({
            "code": "spring10",
            "discount_type": "percentage",
            "discount_value": "10",
            "max_discount_amount": "25.00",
        }),
    )
    .await;

    let response = post_json(
        build_test_app(pool.clone()),
        "/api/v1/discount-codes/validate",
        &client.token,
        serde_json::json!({ "code": " Spring10 ", "order_amount": "400.00" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let preview = body_json(response).await["data"].clone();
    assert_eq!(preview["code"], "SPRING10");
    assert_eq!(preview["discount_type"], "percentage");
    assert_eq!(money(&preview["discount_amount"]), dec!(25));

    let response = post_json(
        build_test_app(pool.clone()),
        "/api/v1/discount-codes/validate",
        &client.token,
        serde_json::json!({ "code": "NOPE", "order_amount": "400.00" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_validate_enforces_minimum_order(pool: PgPool) {
    let client = seed_client(&pool, 100).await;
    let admin = seed_admin(&pool, 300).await;
    create_code(
        &pool,
        &admin,
        serde_json::json!({
            "code": "BIGORDER",
            "discount_type": "fixed",
            "discount_value": "50.00",
            "min_order_amount": "500.00",
        }),
    )
    .await;

    let response = post_json(
        build_test_app(pool.clone()),
        "/api/v1/discount-codes/validate",
        &client.token,
        serde_json::json!({ "code": "BIGORDER", "order_amount": "499.99" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Quote pricing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_apply_and_remove_reprices_quote(pool: PgPool) {
    let client = seed_client(&pool, 100).await;
    let designer = seed_designer(&pool, 200).await;
    let admin = seed_admin(&pool, 300).await;
    create_code(
        &pool,
        &admin,
        serde_json::json!({
            "code": "TENOFF",
            "discount_type": "percentage",
            "discount_value": "10",
        }),
    )
    .await;
    let case_id = case_ready_for_quote(&pool, &client, &designer).await;
    let quote_id = send_standard_quote(&pool, &admin, case_id).await;

    // 10% of design + production + delivery (370); the study fee is excluded.
    let response = apply(&pool, &client, quote_id, "tenoff").await;
    assert_eq!(response.status(), StatusCode::OK);
    let quote = body_json(response).await["data"].clone();
    assert_eq!(money(&quote["discount_amount"]), dec!(37));
    assert_eq!(money(&quote["subtotal"]), dec!(433));
    assert_eq!(money(&quote["vat_amount"]), dec!(64.95));
    assert_eq!(money(&quote["total_amount"]), dec!(497.95));
    assert!(quote["discount_code_id"].is_i64());

    let response = send(
        build_test_app(pool.clone()),
        Method::DELETE,
        &format!("/api/v1/quotes/{quote_id}/discount"),
        &client.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let quote = body_json(response).await["data"].clone();
    assert_eq!(money(&quote["discount_amount"]), dec!(0));
    assert_eq!(money(&quote["total_amount"]), dec!(540.5));
    assert!(quote["discount_code_id"].is_null());

    // Removing again has nothing to remove.
    let response = send(
        build_test_app(pool.clone()),
        Method::DELETE,
        &format!("/api/v1/quotes/{quote_id}/discount"),
        &client.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_acceptance_records_usage(pool: PgPool) {
    let client = seed_client(&pool, 100).await;
    let designer = seed_designer(&pool, 200).await;
    let admin = seed_admin(&pool, 300).await;
    let code_id = create_code(
        &pool,
        &admin,
        serde_json::json!({
            "code": "FLAT20",
            "discount_type": "fixed",
            "discount_value": "20.00",
        }),
    )
    .await;
    let case_id = case_ready_for_quote(&pool, &client, &designer).await;
    let quote_id = send_standard_quote(&pool, &admin, case_id).await;
    assert_eq!(apply(&pool, &client, quote_id, "FLAT20").await.status(), StatusCode::OK);
    assert_eq!(times_used(&pool, code_id).await, 0);

    let response = send(
        build_test_app(pool.clone()),
        Method::POST,
        &format!("/api/v1/quotes/{quote_id}/accept"),
        &client.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(times_used(&pool, code_id).await, 1);

    let response = get(
        build_test_app(pool.clone()),
        &format!("/api/v1/admin/discount-codes/{code_id}/usages"),
        Some(&admin.token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let usages = body_json(response).await["data"].clone();
    let usages = usages.as_array().unwrap();
    assert_eq!(usages.len(), 1);
    assert_eq!(usages[0]["quote_id"], quote_id);
    assert_eq!(money(&usages[0]["original_amount"]), dec!(470));
    assert_eq!(money(&usages[0]["discount_amount"]), dec!(20));
    assert_eq!(money(&usages[0]["final_amount"]), dec!(450));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_acceptance_respects_total_cap(pool: PgPool) {
    let first = seed_client(&pool, 100).await;
    let second = seed_client(&pool, 101).await;
    let designer = seed_designer(&pool, 200).await;
    let admin = seed_admin(&pool, 300).await;
    let code_id = create_code(
        &pool,
        &admin,
        serde_json::json!({
            "code": "ONCE",
            "discount_type": "fixed",
            "discount_value": "30.00",
            "max_uses_total": 1,
        }),
    )
    .await;

    let first_case = case_ready_for_quote(&pool, &first, &designer).await;
    let second_case = case_ready_for_quote(&pool, &second, &designer).await;
    let first_quote = send_standard_quote(&pool, &admin, first_case).await;
    let second_quote = send_standard_quote(&pool, &admin, second_case).await;
    assert_eq!(apply(&pool, &first, first_quote, "ONCE").await.status(), StatusCode::OK);
    assert_eq!(apply(&pool, &second, second_quote, "ONCE").await.status(), StatusCode::OK);

    let first_uri = format!("/api/v1/quotes/{first_quote}/accept");
    let second_uri = format!("/api/v1/quotes/{second_quote}/accept");
    let (a, b) = tokio::join!(
        send(
            build_test_app(pool.clone()),
            Method::POST,
            &first_uri,
            &first.token,
        ),
        send(
            build_test_app(pool.clone()),
            Method::POST,
            &second_uri,
            &second.token,
        ),
    );
    let mut statuses = [a.status(), b.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);
    assert_eq!(times_used(&pool, code_id).await, 1);

    // The losing case stays where it was.
    let mut case_statuses = [
        case_status(&pool, first_case).await,
        case_status(&pool, second_case).await,
    ];
    case_statuses.sort();
    assert_eq!(case_statuses, ["quote_accepted", "quote_sent"]);
}

// ---------------------------------------------------------------------------
// Administration
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_admin_manages_codes(pool: PgPool) {
    let admin = seed_admin(&pool, 300).await;
    let code_id = create_code(
        &pool,
        &admin,
        serde_json::json!({
            "code": "WINTER",
            "description": "Winter promotion",
            "discount_type": "percentage",
            "discount_value": "15",
        }),
    )
    .await;

    // Codes are unique once normalized.
    let response = post_json(
        build_test_app(pool.clone()),
        "/api/v1/admin/discount-codes",
        &admin.token,
        serde_json::json!({
            "code": "winter",
            "discount_type": "fixed",
            "discount_value": "10.00",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // A percentage over 100 is not a valid definition.
    let response = post_json(
        build_test_app(pool.clone()),
        "/api/v1/admin/discount-codes",
        &admin.token,
        serde_json::json!({
            "code": "TOOMUCH",
            "discount_type": "percentage",
            "discount_value": "120",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send_json(
        build_test_app(pool.clone()),
        Method::PUT,
        &format!("/api/v1/admin/discount-codes/{code_id}"),
        &admin.token,
        serde_json::json!({ "discount_value": "20", "max_uses_per_client": 1 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let code = body_json(response).await["data"].clone();
    assert_eq!(money(&code["discount_value"]), dec!(20));
    assert_eq!(code["max_uses_per_client"], 1);
    assert_eq!(code["description"], "Winter promotion");

    let response = get(
        build_test_app(pool.clone()),
        "/api/v1/admin/discount-codes",
        Some(&admin.token),
    )
    .await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);

    let response = send(
        build_test_app(pool.clone()),
        Method::DELETE,
        &format!("/api/v1/admin/discount-codes/{code_id}"),
        &admin.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get(
        build_test_app(pool.clone()),
        &format!("/api/v1/admin/discount-codes/{code_id}"),
        Some(&admin.token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The string is free again once the old code is deleted.
    create_code(
        &pool,
        &admin,
        serde_json::json!({
            "code": "WINTER",
            "discount_type": "fixed",
            "discount_value": "5.00",
        }),
    )
    .await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_designer_cannot_manage_codes(pool: PgPool) {
    let designer = seed_designer(&pool, 200).await;
    let response = post_json(
        build_test_app(pool.clone()),
        "/api/v1/admin/discount-codes",
        &designer.token,
        serde_json::json!({
            "code": "SNEAKY",
            "discount_type": "fixed",
            "discount_value": "10.00",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
