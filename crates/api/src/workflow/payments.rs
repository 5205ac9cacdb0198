//! Payment ledger: proof upload, admin review, refunds.

use sqlx::PgConnection;
use surgiguide_core::case_status::CaseStatus;
use surgiguide_core::error::CoreError;
use surgiguide_core::notification::NotificationPurpose;
use surgiguide_core::payment::{
    ensure_open_refund_request, ensure_pending, ensure_refund_requestable, ensure_uploadable,
    refund_rejected_case_status, validate_proof_url, validate_reason, validate_refund_amount,
    validate_upload_amount, PaymentType, STUDY_FEE_AMOUNT,
};
use surgiguide_core::policy::Action;
use surgiguide_core::types::{DbId, Money};
use surgiguide_db::models::case::Case;
use surgiguide_db::models::payment::{NewPayment, Payment};
use surgiguide_db::repositories::{PaymentRepo, QuoteRepo};
use surgiguide_events::Audience;

use super::{client_audience, lock_case, publish, submit_case_row, transition_case};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::authorize_case;
use crate::state::AppState;

/// A payment proof submitted by the client.
#[derive(Debug, Clone)]
pub struct UploadInput {
    pub payment_type: PaymentType,
    pub amount: Money,
    pub proof_url: String,
    pub proof_reference: Option<String>,
    pub payer_notes: Option<String>,
}

/// Lock the case owning `payment_id`, then the payment itself.
async fn lock_case_and_payment(
    conn: &mut PgConnection,
    payment_id: DbId,
) -> AppResult<(Case, Payment)> {
    let not_found = || CoreError::NotFound {
        entity: "Payment",
        id: payment_id,
    };
    let case_id = PaymentRepo::find_by_id(&mut *conn, payment_id)
        .await?
        .ok_or_else(not_found)?
        .case_id;
    let case = lock_case(conn, case_id).await?;
    let payment = PaymentRepo::find_for_update(&mut *conn, payment_id)
        .await?
        .ok_or_else(not_found)?;
    Ok((case, payment))
}

/// Record a payment proof and move the case to its pending-payment status.
///
/// The study fee is a fixed amount; the production fee must match the total
/// of the case's accepted quote.
pub async fn upload_payment(
    state: &AppState,
    user: &AuthUser,
    case_id: DbId,
    input: &UploadInput,
) -> AppResult<Payment> {
    validate_proof_url(&input.proof_url)?;

    let mut tx = state.pool.begin().await?;
    let case = lock_case(&mut tx, case_id).await?;
    authorize_case(user, Action::UploadPayment, &case)?;

    let has_open = PaymentRepo::has_open_payment(&mut *tx, case_id, input.payment_type).await?;
    ensure_uploadable(input.payment_type, case.case_status()?, has_open)?;

    let (quote_id, expected) = match input.payment_type {
        PaymentType::StudyFee => (None, STUDY_FEE_AMOUNT),
        PaymentType::ProductionFee => {
            let quote = QuoteRepo::find_accepted_for_case(&mut *tx, case_id)
                .await?
                .ok_or_else(|| {
                    CoreError::InvalidState("Case has no accepted quote".to_string())
                })?;
            (Some(quote.id), quote.total_amount)
        }
    };
    validate_upload_amount(input.amount, expected)?;

    let payment = PaymentRepo::create(
        &mut *tx,
        &NewPayment {
            case_id,
            quote_id,
            payment_type: input.payment_type,
            amount: input.amount,
            proof_url: input.proof_url.trim().to_string(),
            proof_reference: input.proof_reference.clone(),
            payer_notes: input.payer_notes.clone(),
        },
    )
    .await?;
    let case = transition_case(
        &mut tx,
        &case,
        input.payment_type.uploaded_case_status(),
        user.actor(),
        None,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        case_id,
        payment_id = payment.id,
        payment_type = %input.payment_type,
        amount = %payment.amount,
        "Payment proof uploaded"
    );
    publish(
        state,
        NotificationPurpose::PaymentUploaded,
        &case,
        Audience::Staff { admins_only: true },
        user,
        serde_json::json!({ "payment_id": payment.id, "payment_type": input.payment_type }),
    );
    Ok(payment)
}

/// Move the case after a payment review. A study-fee review always lands
/// the case in `submitted`, which also clears its draft flag.
async fn move_case_after_review(
    conn: &mut PgConnection,
    case: &Case,
    to: CaseStatus,
    user: &AuthUser,
    note: Option<String>,
) -> AppResult<Case> {
    if to == CaseStatus::Submitted {
        let from = case.case_status()?;
        submit_case_row(conn, case, Some(from), user.actor(), note).await
    } else {
        transition_case(conn, case, to, user.actor(), note).await
    }
}

/// Verify a pending payment.
pub async fn verify_payment(state: &AppState, user: &AuthUser, payment_id: DbId) -> AppResult<Payment> {
    let mut tx = state.pool.begin().await?;
    let (case, payment) = lock_case_and_payment(&mut tx, payment_id).await?;
    authorize_case(user, Action::ReviewPayment, &case)?;

    let payment_state = payment.state()?;
    ensure_pending(&payment_state)?;

    let verified = PaymentRepo::mark_verified(&mut *tx, payment_id, user.profile_id).await?;
    let case = move_case_after_review(
        &mut tx,
        &case,
        payment_state.payment_type.verified_case_status(),
        user,
        None,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(case_id = case.id, payment_id, verified_by = user.profile_id, "Payment verified");
    publish(
        state,
        NotificationPurpose::PaymentVerified,
        &case,
        client_audience(&case),
        user,
        serde_json::json!({ "payment_id": payment_id }),
    );
    Ok(verified)
}

/// Reject a pending payment with a reason; the payment becomes `failed`.
pub async fn reject_payment(
    state: &AppState,
    user: &AuthUser,
    payment_id: DbId,
    reason: &str,
) -> AppResult<Payment> {
    validate_reason("reason", reason)?;

    let mut tx = state.pool.begin().await?;
    let (case, payment) = lock_case_and_payment(&mut tx, payment_id).await?;
    authorize_case(user, Action::ReviewPayment, &case)?;

    let payment_state = payment.state()?;
    ensure_pending(&payment_state)?;

    let reason = reason.trim();
    let failed = PaymentRepo::mark_failed(&mut *tx, payment_id, user.profile_id, reason).await?;
    let case = move_case_after_review(
        &mut tx,
        &case,
        payment_state.payment_type.rejected_case_status(),
        user,
        Some(reason.to_string()),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(case_id = case.id, payment_id, "Payment rejected");
    publish(
        state,
        NotificationPurpose::PaymentRejected,
        &case,
        client_audience(&case),
        user,
        serde_json::json!({ "payment_id": payment_id, "reason": reason }),
    );
    Ok(failed)
}

/// Client asks for a refund of a verified production payment.
pub async fn request_refund(
    state: &AppState,
    user: &AuthUser,
    payment_id: DbId,
    reason: &str,
) -> AppResult<Payment> {
    validate_reason("reason", reason)?;

    let mut tx = state.pool.begin().await?;
    let (case, payment) = lock_case_and_payment(&mut tx, payment_id).await?;
    authorize_case(user, Action::RequestRefund, &case)?;
    ensure_refund_requestable(&payment.state()?)?;

    let reason = reason.trim();
    let case = transition_case(
        &mut tx,
        &case,
        CaseStatus::RefundRequested,
        user.actor(),
        Some(reason.to_string()),
    )
    .await?;
    let requested = PaymentRepo::request_refund(&mut *tx, payment_id, reason).await?;
    tx.commit().await?;

    tracing::info!(case_id = case.id, payment_id, "Refund requested");
    publish(
        state,
        NotificationPurpose::RefundRequested,
        &case,
        Audience::Staff { admins_only: true },
        user,
        serde_json::json!({ "payment_id": payment_id, "reason": reason }),
    );
    Ok(requested)
}

/// Approve an open refund request for `amount` (at most what was paid).
pub async fn approve_refund(
    state: &AppState,
    user: &AuthUser,
    payment_id: DbId,
    amount: Money,
    notes: Option<&str>,
) -> AppResult<Payment> {
    let mut tx = state.pool.begin().await?;
    let (case, payment) = lock_case_and_payment(&mut tx, payment_id).await?;
    authorize_case(user, Action::ReviewRefund, &case)?;

    let payment_state = payment.state()?;
    ensure_open_refund_request(&payment_state)?;
    validate_refund_amount(amount, payment_state.amount)?;

    let refunded = PaymentRepo::approve_refund(&mut *tx, payment_id, amount, notes).await?;
    let case = transition_case(
        &mut tx,
        &case,
        CaseStatus::Refunded,
        user.actor(),
        notes.map(str::to_string),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(case_id = case.id, payment_id, amount = %amount, "Refund approved");
    publish(
        state,
        NotificationPurpose::RefundApproved,
        &case,
        client_audience(&case),
        user,
        serde_json::json!({ "payment_id": payment_id, "refunded_amount": amount }),
    );
    Ok(refunded)
}

/// Decline an open refund request. The request fields are cleared so the
/// client may ask again; a case parked in `refund_requested` returns to
/// production.
pub async fn reject_refund(
    state: &AppState,
    user: &AuthUser,
    payment_id: DbId,
    notes: Option<&str>,
) -> AppResult<Payment> {
    let mut tx = state.pool.begin().await?;
    let (case, payment) = lock_case_and_payment(&mut tx, payment_id).await?;
    authorize_case(user, Action::ReviewRefund, &case)?;
    ensure_open_refund_request(&payment.state()?)?;

    let declined = PaymentRepo::reject_refund(&mut *tx, payment_id, notes).await?;
    let case = match refund_rejected_case_status(case.case_status()?) {
        Some(to) => {
            transition_case(&mut tx, &case, to, user.actor(), notes.map(str::to_string)).await?
        }
        None => case,
    };
    tx.commit().await?;

    tracing::info!(case_id = case.id, payment_id, "Refund request declined");
    publish(
        state,
        NotificationPurpose::RefundRejected,
        &case,
        client_audience(&case),
        user,
        serde_json::json!({ "payment_id": payment_id }),
    );
    Ok(declined)
}
