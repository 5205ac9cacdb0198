//! Integration tests for the repository layer against a real database.

use rust_decimal_macros::dec;
use sqlx::PgPool;
use surgiguide_core::case_status::CaseStatus;
use surgiguide_core::discount::DiscountType;
use surgiguide_core::payment::PaymentType;
use surgiguide_core::quote::{compute_totals, FeeBreakdown};
use surgiguide_core::roles::Actor;
use surgiguide_db::models::case::{CaseListFilter, CreateCase, UpdateCase};
use surgiguide_db::models::case_status_history::NewHistoryEntry;
use surgiguide_db::models::discount::{CreateDiscountCode, NewDiscountUsage};
use surgiguide_db::models::notification::NewNotification;
use surgiguide_db::models::payment::NewPayment;
use surgiguide_db::models::quote::NewQuote;
use surgiguide_db::repositories::{
    CaseHistoryRepo, CaseRepo, DiscountCodeRepo, DiscountUsageRepo, NotificationRepo,
    PaymentRepo, ProfileRepo, QuoteRepo,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_client(pool: &PgPool, user_id: i64) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO client_profiles (user_id, display_name, email) \
         VALUES ($1, 'Clinic', 'clinic@example.com') RETURNING id",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn seed_draft(pool: &PgPool, client_id: i64) -> i64 {
    let mut conn = pool.acquire().await.unwrap();
    CaseRepo::create_draft(&mut *conn, client_id, &CreateCase::default())
        .await
        .unwrap()
        .id
}

fn code_input(code: &str, max_uses_total: Option<i32>) -> CreateDiscountCode {
    CreateDiscountCode {
        code: code.to_string(),
        description: None,
        discount_type: DiscountType::Percentage,
        discount_value: dec!(10),
        max_discount_amount: None,
        min_order_amount: None,
        max_uses_total,
        max_uses_per_client: None,
        valid_from: None,
        valid_until: None,
        is_active: None,
    }
}

async fn seed_quote(pool: &PgPool, case_id: i64) -> i64 {
    let fees = FeeBreakdown {
        study_fee: dec!(100),
        design_fee: dec!(50),
        production_fee: dec!(300),
        delivery_fee: dec!(20),
    };
    let totals = compute_totals(&fees, dec!(0), dec!(15)).unwrap();
    QuoteRepo::insert_sent(
        pool,
        &NewQuote {
            case_id,
            fees,
            totals,
            vat_rate: dec!(15),
            valid_until: None,
            created_by_designer_id: None,
        },
    )
    .await
    .unwrap()
    .id
}

// ---------------------------------------------------------------------------
// Cases
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_draft_gets_formatted_case_number(pool: PgPool) {
    let client_id = seed_client(&pool, 10).await;
    let mut conn = pool.acquire().await.unwrap();
    let first = CaseRepo::create_draft(&mut *conn, client_id, &CreateCase::default())
        .await
        .unwrap();
    let second = CaseRepo::create_draft(&mut *conn, client_id, &CreateCase::default())
        .await
        .unwrap();

    assert!(first.case_number.starts_with("SG-"));
    assert_eq!(first.case_number.len(), "SG-2026-000001".len());
    assert_ne!(first.case_number, second.case_number);
    assert_eq!(first.case_status().unwrap(), CaseStatus::Draft);
    assert!(first.is_draft);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_draft_patches_only_given_fields(pool: PgPool) {
    let client_id = seed_client(&pool, 10).await;
    let case_id = seed_draft(&pool, client_id).await;

    let updated = CaseRepo::update_draft(
        &pool,
        case_id,
        &UpdateCase {
            guide_type: Some("tooth_supported".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.guide_type.as_deref(), Some("tooth_supported"));
    assert_eq!(updated.procedure_category, None);

    CaseRepo::mark_submitted(&pool, case_id, CaseStatus::Submitted)
        .await
        .unwrap();
    let after_submit = CaseRepo::update_draft(&pool, case_id, &UpdateCase::default())
        .await
        .unwrap();
    assert!(after_submit.is_none(), "submitted cases are not editable");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_soft_deleted_case_is_hidden(pool: PgPool) {
    let client_id = seed_client(&pool, 10).await;
    let case_id = seed_draft(&pool, client_id).await;

    assert!(CaseRepo::soft_delete_draft(&pool, case_id).await.unwrap());
    assert!(!CaseRepo::soft_delete_draft(&pool, case_id).await.unwrap());
    assert!(CaseRepo::find_by_id(&pool, case_id).await.unwrap().is_none());

    let listed = CaseRepo::list(
        &pool,
        &CaseListFilter {
            client_profile_id: Some(client_id),
            ..Default::default()
        },
        50,
        0,
    )
    .await
    .unwrap();
    assert!(listed.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_mark_submitted_clears_draft_flag(pool: PgPool) {
    let client_id = seed_client(&pool, 10).await;
    let case_id = seed_draft(&pool, client_id).await;

    let case = CaseRepo::mark_submitted(&pool, case_id, CaseStatus::Submitted)
        .await
        .unwrap();
    assert!(!case.is_draft);
    assert!(case.submitted_at.is_some());
    assert_eq!(case.status, "submitted");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_entering_delivered_stamps_delivered_at(pool: PgPool) {
    let client_id = seed_client(&pool, 10).await;
    let case_id = seed_draft(&pool, client_id).await;

    let case = CaseRepo::update_status(&pool, case_id, CaseStatus::OutForDelivery)
        .await
        .unwrap();
    assert!(case.delivered_at.is_none());

    let case = CaseRepo::update_status(&pool, case_id, CaseStatus::Delivered)
        .await
        .unwrap();
    assert!(case.delivered_at.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_staff_listing_excludes_drafts(pool: PgPool) {
    let client_id = seed_client(&pool, 10).await;
    let draft_id = seed_draft(&pool, client_id).await;
    let submitted_id = seed_draft(&pool, client_id).await;
    CaseRepo::mark_submitted(&pool, submitted_id, CaseStatus::Submitted)
        .await
        .unwrap();

    let listed = CaseRepo::list(
        &pool,
        &CaseListFilter {
            exclude_drafts: true,
            ..Default::default()
        },
        50,
        0,
    )
    .await
    .unwrap();
    let ids: Vec<i64> = listed.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![submitted_id]);
    assert!(!ids.contains(&draft_id));
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_history_records_actor_and_order(pool: PgPool) {
    let client_id = seed_client(&pool, 10).await;
    let case_id = seed_draft(&pool, client_id).await;

    CaseHistoryRepo::insert(
        &pool,
        &NewHistoryEntry {
            case_id,
            from_status: None,
            to_status: CaseStatus::Draft,
            actor: Actor::client(client_id),
            note: None,
            is_override: false,
        },
    )
    .await
    .unwrap();
    CaseHistoryRepo::insert(
        &pool,
        &NewHistoryEntry {
            case_id,
            from_status: Some(CaseStatus::Draft),
            to_status: CaseStatus::Cancelled,
            actor: Actor::admin(3),
            note: Some("admin override: duplicate".to_string()),
            is_override: true,
        },
    )
    .await
    .unwrap();

    let history = CaseHistoryRepo::list_for_case(&pool, case_id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].from_status, None);
    assert_eq!(history[0].actor_kind, "client");
    assert_eq!(history[1].from_status.as_deref(), Some("draft"));
    assert_eq!(history[1].actor_kind, "admin");
    assert!(history[1].is_override);
}

// ---------------------------------------------------------------------------
// Quotes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_quote_persists_exact_totals(pool: PgPool) {
    let client_id = seed_client(&pool, 10).await;
    let case_id = seed_draft(&pool, client_id).await;
    let quote_id = seed_quote(&pool, case_id).await;

    let quote = QuoteRepo::find_by_id(&pool, quote_id).await.unwrap().unwrap();
    assert_eq!(quote.subtotal, dec!(470));
    assert_eq!(quote.vat_amount, dec!(70.5));
    assert_eq!(quote.total_amount, dec!(540.5));
    assert!(quote.is_sent);
    assert_eq!(quote.revision, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_quote_cannot_be_both_accepted_and_rejected(pool: PgPool) {
    let client_id = seed_client(&pool, 10).await;
    let case_id = seed_draft(&pool, client_id).await;
    let quote_id = seed_quote(&pool, case_id).await;

    QuoteRepo::mark_accepted(&pool, quote_id).await.unwrap();
    let result = QuoteRepo::mark_rejected(&pool, quote_id, "changed my mind", false).await;
    assert!(result.is_err(), "CHECK constraint should reject the update");
}

// ---------------------------------------------------------------------------
// Discount codes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_code_lookup_ignores_case(pool: PgPool) {
    DiscountCodeRepo::create(&pool, "SAVE10", &code_input("save10", None))
        .await
        .unwrap();
    let found = DiscountCodeRepo::find_by_code(&pool, "save10").await.unwrap();
    assert_eq!(found.unwrap().code, "SAVE10");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_code_violates_unique_index(pool: PgPool) {
    DiscountCodeRepo::create(&pool, "SAVE10", &code_input("SAVE10", None))
        .await
        .unwrap();
    let err = DiscountCodeRepo::create(&pool, "SAVE10", &code_input("SAVE10", None))
        .await
        .unwrap_err();
    let db_err = err.as_database_error().expect("database error");
    assert_eq!(db_err.code().as_deref(), Some("23505"));
    assert_eq!(db_err.constraint(), Some("uq_discount_codes_code"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_soft_deleted_code_frees_its_string(pool: PgPool) {
    let code = DiscountCodeRepo::create(&pool, "SAVE10", &code_input("SAVE10", None))
        .await
        .unwrap();
    assert!(DiscountCodeRepo::soft_delete(&pool, code.id).await.unwrap());
    assert!(DiscountCodeRepo::find_by_code(&pool, "SAVE10").await.unwrap().is_none());
    DiscountCodeRepo::create(&pool, "SAVE10", &code_input("SAVE10", None))
        .await
        .unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_increment_usage_stops_at_cap(pool: PgPool) {
    let code = DiscountCodeRepo::create(&pool, "ONCE", &code_input("ONCE", Some(1)))
        .await
        .unwrap();

    assert!(DiscountCodeRepo::increment_usage(&pool, code.id).await.unwrap());
    assert!(!DiscountCodeRepo::increment_usage(&pool, code.id).await.unwrap());

    let code = DiscountCodeRepo::find_by_id(&pool, code.id).await.unwrap().unwrap();
    assert_eq!(code.times_used, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_usage_is_recorded_once_per_quote(pool: PgPool) {
    let client_id = seed_client(&pool, 10).await;
    let case_id = seed_draft(&pool, client_id).await;
    let quote_id = seed_quote(&pool, case_id).await;
    let code = DiscountCodeRepo::create(&pool, "SAVE10", &code_input("SAVE10", None))
        .await
        .unwrap();

    let usage = NewDiscountUsage {
        discount_code_id: code.id,
        client_profile_id: client_id,
        case_id,
        quote_id,
        original_amount: dec!(470),
        discount_amount: dec!(37),
        final_amount: dec!(497.95),
    };
    DiscountUsageRepo::insert(&pool, &usage).await.unwrap();
    assert!(DiscountUsageRepo::insert(&pool, &usage).await.is_err());

    let count = DiscountUsageRepo::count_for_client(&pool, code.id, client_id)
        .await
        .unwrap();
    assert_eq!(count, 1);
    let usages = DiscountUsageRepo::list_for_code(&pool, code.id).await.unwrap();
    assert_eq!(usages.len(), 1);
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

fn study_payment(case_id: i64) -> NewPayment {
    NewPayment {
        case_id,
        quote_id: None,
        payment_type: PaymentType::StudyFee,
        amount: dec!(100),
        proof_url: "uploads/proof.pdf".to_string(),
        proof_reference: None,
        payer_notes: None,
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failed_payment_allows_new_upload(pool: PgPool) {
    let client_id = seed_client(&pool, 10).await;
    let case_id = seed_draft(&pool, client_id).await;
    let admin_id: i64 = sqlx::query_scalar(
        "INSERT INTO designer_profiles (user_id, display_name, is_admin) \
         VALUES (99, 'Admin', true) RETURNING id",
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    let payment = PaymentRepo::create(&pool, &study_payment(case_id)).await.unwrap();
    assert!(PaymentRepo::has_open_payment(&pool, case_id, PaymentType::StudyFee)
        .await
        .unwrap());
    assert!(PaymentRepo::create(&pool, &study_payment(case_id)).await.is_err());

    PaymentRepo::mark_failed(&pool, payment.id, admin_id, "blurry")
        .await
        .unwrap();
    assert!(!PaymentRepo::has_open_payment(&pool, case_id, PaymentType::StudyFee)
        .await
        .unwrap());
    PaymentRepo::create(&pool, &study_payment(case_id)).await.unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_refund_request_lifecycle(pool: PgPool) {
    let client_id = seed_client(&pool, 10).await;
    let case_id = seed_draft(&pool, client_id).await;
    let quote_id = seed_quote(&pool, case_id).await;
    let admin_id: i64 = sqlx::query_scalar(
        "INSERT INTO designer_profiles (user_id, display_name, is_admin) \
         VALUES (99, 'Admin', true) RETURNING id",
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    let payment = PaymentRepo::create(
        &pool,
        &NewPayment {
            quote_id: Some(quote_id),
            payment_type: PaymentType::ProductionFee,
            amount: dec!(540.5),
            ..study_payment(case_id)
        },
    )
    .await
    .unwrap();
    PaymentRepo::mark_verified(&pool, payment.id, admin_id).await.unwrap();

    let requested = PaymentRepo::request_refund(&pool, payment.id, "cancelled surgery")
        .await
        .unwrap();
    assert!(requested.state().unwrap().refund_requested);
    assert_eq!(
        PaymentRepo::list_open_refund_requests(&pool).await.unwrap().len(),
        1
    );

    let cleared = PaymentRepo::reject_refund(&pool, payment.id, Some("already produced"))
        .await
        .unwrap();
    assert!(!cleared.state().unwrap().refund_requested);
    assert!(PaymentRepo::list_open_refund_requests(&pool).await.unwrap().is_empty());

    PaymentRepo::request_refund(&pool, payment.id, "again").await.unwrap();
    let refunded = PaymentRepo::approve_refund(&pool, payment.id, dec!(200), None)
        .await
        .unwrap();
    assert!(refunded.is_refunded);
    assert_eq!(refunded.status, "refunded");
    assert_eq!(refunded.refunded_amount, Some(dec!(200)));
}

// ---------------------------------------------------------------------------
// Notifications and profiles
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_notification_inbox(pool: PgPool) {
    for title in ["one", "two"] {
        NotificationRepo::create(
            &pool,
            &NewNotification {
                user_id: 10,
                purpose: "quote_sent".to_string(),
                title: title.to_string(),
                body: "body".to_string(),
                action_url: None,
                metadata: serde_json::json!({ "case_id": 1 }),
                language: "en".to_string(),
            },
        )
        .await
        .unwrap();
    }

    assert_eq!(NotificationRepo::unread_count(&pool, 10).await.unwrap(), 2);
    let list = NotificationRepo::list_for_user(&pool, 10, true, 50, 0).await.unwrap();
    assert_eq!(list[0].title, "two");

    assert!(NotificationRepo::mark_read(&pool, list[0].id, 10).await.unwrap());
    assert!(!NotificationRepo::mark_read(&pool, list[0].id, 11).await.unwrap());
    assert_eq!(NotificationRepo::mark_all_read(&pool, 10).await.unwrap(), 1);
    assert_eq!(NotificationRepo::unread_count(&pool, 10).await.unwrap(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_staff_recipients_filter_admins(pool: PgPool) {
    sqlx::query(
        "INSERT INTO designer_profiles (user_id, display_name, is_admin) \
         VALUES (1, 'Designer', false), (2, 'Admin', true)",
    )
    .execute(&pool)
    .await
    .unwrap();

    let all = ProfileRepo::staff_recipients(&pool, false).await.unwrap();
    let admins = ProfileRepo::staff_recipients(&pool, true).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0].user_id, 2);
}
