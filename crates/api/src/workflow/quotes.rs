//! Quote lifecycle: create, accept, reject, revise.
//!
//! Lock order is always case, then quote, then discount code, so two
//! operations on the same case never wait on each other in opposite order.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;
use surgiguide_core::case_status::CaseStatus;
use surgiguide_core::discount::calculate_discount;
use surgiguide_core::error::CoreError;
use surgiguide_core::notification::NotificationPurpose;
use surgiguide_core::policy::Action;
use surgiguide_core::quote::{
    compute_totals, ensure_respondable, ensure_revisable, validate_rejection_reason, FeeBreakdown,
};
use surgiguide_core::types::{DbId, Timestamp};
use surgiguide_db::models::case::Case;
use surgiguide_db::models::quote::{CaseQuote, NewQuote, QuotePricing};
use surgiguide_db::repositories::{DiscountCodeRepo, QuoteRepo};
use surgiguide_events::Audience;

use super::discounts::record_usage;
use super::{client_audience, lock_case, publish, transition_case};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{authorize, authorize_case};
use crate::state::AppState;

/// History note written when an expired quote cancels its case.
const QUOTE_EXPIRED_NOTE: &str = "quote expired before acceptance";

/// Pricing supplied when a quote is created.
#[derive(Debug, Clone)]
pub struct QuoteInput {
    pub fees: FeeBreakdown,
    pub vat_rate: Decimal,
    pub valid_until: Option<Timestamp>,
}

/// Pricing supplied when a rejected quote is revised. Absent values keep
/// the quote's current VAT rate and fall back to the default validity.
#[derive(Debug, Clone)]
pub struct RevisionInput {
    pub fees: FeeBreakdown,
    pub vat_rate: Option<Decimal>,
    pub valid_until: Option<Timestamp>,
}

/// Resolve the expiry of a quote being sent now.
fn resolve_valid_until(
    state: &AppState,
    requested: Option<Timestamp>,
    now: Timestamp,
) -> AppResult<Timestamp> {
    match requested {
        Some(until) if until <= now => Err(CoreError::Validation(
            "valid_until must be in the future".to_string(),
        )
        .into()),
        Some(until) => Ok(until),
        None => Ok(now + Duration::days(state.config.quote_validity_days)),
    }
}

/// Lock the case owning `quote_id`, then the quote itself.
pub(crate) async fn lock_case_and_quote(
    conn: &mut PgConnection,
    quote_id: DbId,
) -> AppResult<(Case, CaseQuote)> {
    let not_found = || CoreError::NotFound {
        entity: "CaseQuote",
        id: quote_id,
    };
    let case_id = QuoteRepo::find_by_id(&mut *conn, quote_id)
        .await?
        .ok_or_else(not_found)?
        .case_id;
    let case = lock_case(conn, case_id).await?;
    let quote = QuoteRepo::find_for_update(&mut *conn, quote_id)
        .await?
        .ok_or_else(not_found)?;
    Ok((case, quote))
}

/// Price and send a quote for a case whose study is complete.
pub async fn create_quote(
    state: &AppState,
    user: &AuthUser,
    case_id: DbId,
    input: &QuoteInput,
) -> AppResult<CaseQuote> {
    authorize(user, Action::CreateQuote)?;
    let now = Utc::now();
    let totals = compute_totals(&input.fees, Decimal::ZERO, input.vat_rate)?;
    let valid_until = resolve_valid_until(state, input.valid_until, now)?;

    let mut tx = state.pool.begin().await?;
    let case = lock_case(&mut tx, case_id).await?;
    let status = case.case_status()?;
    if status != CaseStatus::StudyCompleted {
        return Err(CoreError::InvalidState(format!(
            "A quote can only be created once the study is completed (current: '{status}')"
        ))
        .into());
    }

    let quote = QuoteRepo::insert_sent(
        &mut *tx,
        &NewQuote {
            case_id,
            fees: input.fees,
            totals,
            vat_rate: input.vat_rate,
            valid_until: Some(valid_until),
            created_by_designer_id: Some(user.profile_id),
        },
    )
    .await?;
    let case = transition_case(&mut tx, &case, CaseStatus::QuoteSent, user.actor(), None).await?;
    tx.commit().await?;

    tracing::info!(
        case_id,
        quote_id = quote.id,
        total_amount = %quote.total_amount,
        "Quote sent"
    );

    publish(
        state,
        NotificationPurpose::QuoteSent,
        &case,
        client_audience(&case),
        user,
        serde_json::json!({ "quote_id": quote.id, "total_amount": quote.total_amount }),
    );
    Ok(quote)
}

/// Accept a sent quote.
///
/// An expired quote cancels the case; that change is committed before the
/// call fails with [`CoreError::Expired`]. A quote carrying a discount code
/// records its usage in the same transaction as the acceptance.
pub async fn accept_quote(state: &AppState, user: &AuthUser, quote_id: DbId) -> AppResult<CaseQuote> {
    let now = Utc::now();
    let mut tx = state.pool.begin().await?;
    let (case, quote) = lock_case_and_quote(&mut tx, quote_id).await?;
    authorize_case(user, Action::RespondToQuote, &case)?;

    let quote_state = quote.state();
    ensure_respondable(&quote_state)?;

    if quote_state.is_expired(now) {
        let cancelled = transition_case(
            &mut tx,
            &case,
            CaseStatus::Cancelled,
            user.actor(),
            Some(QUOTE_EXPIRED_NOTE.to_string()),
        )
        .await?;
        tx.commit().await?;

        tracing::warn!(case_id = case.id, quote_id, "Expired quote cancelled its case");
        publish(
            state,
            NotificationPurpose::QuoteExpired,
            &cancelled,
            Audience::Staff { admins_only: false },
            user,
            serde_json::json!({ "quote_id": quote_id }),
        );
        return Err(CoreError::Expired(format!("Quote {quote_id} has expired")).into());
    }

    if let Some(code_id) = quote.discount_code_id {
        record_usage(&mut tx, &case, &quote, code_id).await?;
    }

    let accepted = QuoteRepo::mark_accepted(&mut *tx, quote_id).await?;
    let case = transition_case(&mut tx, &case, CaseStatus::QuoteAccepted, user.actor(), None).await?;
    tx.commit().await?;

    tracing::info!(case_id = case.id, quote_id, "Quote accepted");
    publish(
        state,
        NotificationPurpose::QuoteAccepted,
        &case,
        Audience::Staff { admins_only: false },
        user,
        serde_json::json!({ "quote_id": quote_id, "total_amount": accepted.total_amount }),
    );
    Ok(accepted)
}

/// Reject a sent quote. Asking for a revision parks the case in
/// `quote_rejected`; otherwise the case is cancelled.
pub async fn reject_quote(
    state: &AppState,
    user: &AuthUser,
    quote_id: DbId,
    reason: &str,
    request_revision: bool,
) -> AppResult<CaseQuote> {
    validate_rejection_reason(reason)?;

    let mut tx = state.pool.begin().await?;
    let (case, quote) = lock_case_and_quote(&mut tx, quote_id).await?;
    authorize_case(user, Action::RespondToQuote, &case)?;
    ensure_respondable(&quote.state())?;

    let rejected = QuoteRepo::mark_rejected(&mut *tx, quote_id, reason.trim(), request_revision).await?;
    let target = if request_revision {
        CaseStatus::QuoteRejected
    } else {
        CaseStatus::Cancelled
    };
    let case = transition_case(
        &mut tx,
        &case,
        target,
        user.actor(),
        Some(reason.trim().to_string()),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(case_id = case.id, quote_id, request_revision, "Quote rejected");
    publish(
        state,
        NotificationPurpose::QuoteRejected,
        &case,
        Audience::Staff { admins_only: false },
        user,
        serde_json::json!({ "quote_id": quote_id, "revision_requested": request_revision }),
    );
    Ok(rejected)
}

/// Re-price a quote whose client asked for a revision and send it again.
///
/// An attached discount code stays attached and is recalculated against the
/// new discountable base.
pub async fn revise_quote(
    state: &AppState,
    user: &AuthUser,
    quote_id: DbId,
    input: &RevisionInput,
) -> AppResult<CaseQuote> {
    authorize(user, Action::ReviseQuote)?;
    let now = Utc::now();
    let valid_until = resolve_valid_until(state, input.valid_until, now)?;

    let mut tx = state.pool.begin().await?;
    let (case, quote) = lock_case_and_quote(&mut tx, quote_id).await?;
    ensure_revisable(&quote.state())?;
    input.fees.validate()?;

    let vat_rate = input.vat_rate.unwrap_or(quote.vat_rate);
    let discount_amount = match quote.discount_code_id {
        Some(code_id) => {
            let code = DiscountCodeRepo::find_for_update(&mut *tx, code_id)
                .await?
                .ok_or(CoreError::NotFound {
                    entity: "DiscountCode",
                    id: code_id,
                })?;
            calculate_discount(&code.rules()?, input.fees.discountable_base())
        }
        None => Decimal::ZERO,
    };
    let totals = compute_totals(&input.fees, discount_amount, vat_rate)?;

    let revised = QuoteRepo::revise(
        &mut *tx,
        quote_id,
        &QuotePricing {
            fees: input.fees,
            totals,
            vat_rate,
            discount_code_id: quote.discount_code_id,
        },
        Some(valid_until),
    )
    .await?;
    let case = transition_case(&mut tx, &case, CaseStatus::QuoteSent, user.actor(), None).await?;
    tx.commit().await?;

    tracing::info!(
        case_id = case.id,
        quote_id,
        revision = revised.revision,
        total_amount = %revised.total_amount,
        "Quote revised"
    );
    publish(
        state,
        NotificationPurpose::QuoteSent,
        &case,
        client_audience(&case),
        user,
        serde_json::json!({ "quote_id": quote_id, "revision": revised.revision }),
    );
    Ok(revised)
}
