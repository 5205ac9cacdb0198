//! Discount codes: client-side validation, apply/remove on a quote, usage
//! recording at acceptance, and admin management.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgConnection;
use surgiguide_core::discount::{
    calculate_discount, check_eligibility, normalize_code, validate_code_format,
    validate_definition, DiscountRejection,
};
use surgiguide_core::error::CoreError;
use surgiguide_core::policy::Action;
use surgiguide_core::quote::{compute_totals, ensure_discount_applicable, ensure_discount_editable};
use surgiguide_core::types::{validate_money, DbId, Money};
use surgiguide_db::models::case::Case;
use surgiguide_db::models::discount::{
    CreateDiscountCode, DiscountCode, DiscountUsage, NewDiscountUsage, UpdateDiscountCode,
};
use surgiguide_db::models::quote::{CaseQuote, QuotePricing};
use surgiguide_db::repositories::{DiscountCodeRepo, DiscountUsageRepo, QuoteRepo};

use super::quotes::lock_case_and_quote;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{authorize, authorize_case};
use crate::state::AppState;

/// What a code would take off an order.
#[derive(Debug, Clone, Serialize)]
pub struct DiscountPreview {
    pub code: String,
    pub discount_type: String,
    pub discount_value: Decimal,
    pub order_amount: Money,
    pub discount_amount: Money,
}

/// Look up a live code by its user-typed form and check that `client` may
/// use it on an order of `order_amount`.
async fn eligible_code(
    conn: &mut PgConnection,
    raw_code: &str,
    client_profile_id: DbId,
    order_amount: Money,
) -> AppResult<DiscountCode> {
    let code = normalize_code(raw_code);
    let Some(found) = DiscountCodeRepo::find_by_code(&mut *conn, &code).await? else {
        return Err(DiscountRejection::NotFound.into_error(&code).into());
    };
    let client_uses =
        DiscountUsageRepo::count_for_client(&mut *conn, found.id, client_profile_id).await?;
    if let Err(rejection) =
        check_eligibility(&found.rules()?, Utc::now(), order_amount, client_uses)
    {
        tracing::info!(code = %found.code, client_profile_id, ?rejection, "Discount code rejected");
        return Err(rejection.into_error(&found.code).into());
    }
    Ok(found)
}

/// Check a code for the calling client without touching any quote.
pub async fn validate_code(
    state: &AppState,
    user: &AuthUser,
    raw_code: &str,
    order_amount: Money,
) -> AppResult<DiscountPreview> {
    authorize(user, Action::ValidateDiscountCode)?;
    validate_money("order_amount", order_amount)?;
    if order_amount.is_sign_negative() {
        return Err(CoreError::Validation("order_amount must not be negative".to_string()).into());
    }

    let mut conn = state.pool.acquire().await?;
    let code = eligible_code(&mut conn, raw_code, user.profile_id, order_amount).await?;
    let discount_amount = calculate_discount(&code.rules()?, order_amount);

    Ok(DiscountPreview {
        code: code.code,
        discount_type: code.discount_type,
        discount_value: code.discount_value,
        order_amount,
        discount_amount,
    })
}

/// Attach a code to an open quote and re-price it.
///
/// Minimum-order rules see the full order; the discount itself is computed
/// on the discountable base (the study fee is never discounted).
pub async fn apply_code(
    state: &AppState,
    user: &AuthUser,
    quote_id: DbId,
    raw_code: &str,
) -> AppResult<CaseQuote> {
    let mut tx = state.pool.begin().await?;
    let (case, quote) = lock_case_and_quote(&mut tx, quote_id).await?;
    authorize_case(user, Action::ApplyDiscount, &case)?;

    let quote_state = quote.state();
    ensure_discount_applicable(&quote_state)?;
    if quote_state.is_expired(Utc::now()) {
        return Err(CoreError::Expired(format!("Quote {quote_id} has expired")).into());
    }

    let code =
        eligible_code(&mut tx, raw_code, case.client_profile_id, quote.order_amount()).await?;
    let fees = quote.fees();
    let discount_amount = calculate_discount(&code.rules()?, fees.discountable_base());
    let totals = compute_totals(&fees, discount_amount, quote.vat_rate)?;

    let updated = QuoteRepo::update_pricing(
        &mut *tx,
        quote_id,
        &QuotePricing {
            fees,
            totals,
            vat_rate: quote.vat_rate,
            discount_code_id: Some(code.id),
        },
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        case_id = case.id,
        quote_id,
        code = %code.code,
        discount_amount = %updated.discount_amount,
        "Discount code applied"
    );
    Ok(updated)
}

/// Detach the code from an open quote and re-price it without discount.
pub async fn remove_code(state: &AppState, user: &AuthUser, quote_id: DbId) -> AppResult<CaseQuote> {
    let mut tx = state.pool.begin().await?;
    let (case, quote) = lock_case_and_quote(&mut tx, quote_id).await?;
    authorize_case(user, Action::ApplyDiscount, &case)?;

    let quote_state = quote.state();
    ensure_discount_editable(&quote_state)?;
    if !quote_state.has_discount {
        return Err(CoreError::InvalidState(
            "Quote has no discount code applied".to_string(),
        )
        .into());
    }

    let fees = quote.fees();
    let totals = compute_totals(&fees, Decimal::ZERO, quote.vat_rate)?;
    let updated = QuoteRepo::update_pricing(
        &mut *tx,
        quote_id,
        &QuotePricing {
            fees,
            totals,
            vat_rate: quote.vat_rate,
            discount_code_id: None,
        },
    )
    .await?;
    tx.commit().await?;

    tracing::info!(case_id = case.id, quote_id, "Discount code removed");
    Ok(updated)
}

/// Record that an accepted quote used `code_id`.
///
/// Runs inside the acceptance transaction. The code row is locked first so
/// concurrent acceptances serialize; the caps are re-checked under the lock
/// and a reached cap fails with [`CoreError::Conflict`].
pub(crate) async fn record_usage(
    conn: &mut PgConnection,
    case: &Case,
    quote: &CaseQuote,
    code_id: DbId,
) -> AppResult<DiscountUsage> {
    let code = DiscountCodeRepo::find_for_update(&mut *conn, code_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "DiscountCode",
            id: code_id,
        })?;
    let rules = code.rules()?;

    let limit_reached = || {
        tracing::warn!(code = %code.code, quote_id = quote.id, "Discount code usage cap reached at acceptance");
        CoreError::Conflict(format!(
            "Discount code {} can no longer be used",
            code.code
        ))
    };

    if rules.max_uses_total.is_some_and(|max| rules.times_used >= max) {
        return Err(limit_reached().into());
    }
    if let Some(max) = rules.max_uses_per_client {
        let used =
            DiscountUsageRepo::count_for_client(&mut *conn, code_id, case.client_profile_id)
                .await?;
        if used >= i64::from(max) {
            return Err(limit_reached().into());
        }
    }
    if !DiscountCodeRepo::increment_usage(&mut *conn, code_id).await? {
        return Err(limit_reached().into());
    }

    let original_amount = quote.order_amount();
    let usage = DiscountUsageRepo::insert(
        &mut *conn,
        &NewDiscountUsage {
            discount_code_id: code_id,
            client_profile_id: case.client_profile_id,
            case_id: case.id,
            quote_id: quote.id,
            original_amount,
            discount_amount: quote.discount_amount,
            final_amount: original_amount - quote.discount_amount,
        },
    )
    .await?;

    tracing::info!(
        code = %code.code,
        quote_id = quote.id,
        times_used = rules.times_used + 1,
        "Discount usage recorded"
    );
    Ok(usage)
}

/* --------------------------------------------------------------------------
Administration
-------------------------------------------------------------------------- */

pub async fn create_code(
    state: &AppState,
    user: &AuthUser,
    input: &CreateDiscountCode,
) -> AppResult<DiscountCode> {
    authorize(user, Action::ManageDiscountCodes)?;
    let code = normalize_code(&input.code);
    validate_code_format(&code)?;
    validate_definition(&input.rules())?;

    let created = DiscountCodeRepo::create(&state.pool, &code, input).await?;
    tracing::info!(code_id = created.id, code = %created.code, "Discount code created");
    Ok(created)
}

pub async fn list_codes(
    state: &AppState,
    user: &AuthUser,
    active_only: bool,
    limit: i64,
    offset: i64,
) -> AppResult<Vec<DiscountCode>> {
    authorize(user, Action::ManageDiscountCodes)?;
    Ok(DiscountCodeRepo::list(&state.pool, active_only, limit, offset).await?)
}

pub async fn get_code(state: &AppState, user: &AuthUser, id: DbId) -> AppResult<DiscountCode> {
    authorize(user, Action::ManageDiscountCodes)?;
    DiscountCodeRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| {
            CoreError::NotFound {
                entity: "DiscountCode",
                id,
            }
            .into()
        })
}

/// Update a code. The merged definition must still be valid and may not cap
/// total uses below what has already been used.
pub async fn update_code(
    state: &AppState,
    user: &AuthUser,
    id: DbId,
    input: &UpdateDiscountCode,
) -> AppResult<DiscountCode> {
    authorize(user, Action::ManageDiscountCodes)?;

    let mut tx = state.pool.begin().await?;
    let current = DiscountCodeRepo::find_for_update(&mut *tx, id)
        .await?
        .filter(|c| c.deleted_at.is_none())
        .ok_or(CoreError::NotFound {
            entity: "DiscountCode",
            id,
        })?;
    let merged = input.merged_rules(&current.rules()?);
    validate_definition(&merged)?;
    if merged.max_uses_total.is_some_and(|max| max < current.times_used) {
        return Err(CoreError::Validation(format!(
            "max_uses_total cannot be lower than the {} uses already recorded",
            current.times_used
        ))
        .into());
    }

    let updated = DiscountCodeRepo::update(&mut *tx, id, input)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "DiscountCode",
            id,
        })?;
    tx.commit().await?;

    tracing::info!(code_id = id, "Discount code updated");
    Ok(updated)
}

/// Deactivate a code by soft-deleting it. Recorded usages stay.
pub async fn deactivate_code(state: &AppState, user: &AuthUser, id: DbId) -> AppResult<()> {
    authorize(user, Action::ManageDiscountCodes)?;
    if !DiscountCodeRepo::soft_delete(&state.pool, id).await? {
        return Err(CoreError::NotFound {
            entity: "DiscountCode",
            id,
        }
        .into());
    }
    tracing::info!(code_id = id, "Discount code deactivated");
    Ok(())
}

/// Usages of a code, including codes deactivated since.
pub async fn list_usages(
    state: &AppState,
    user: &AuthUser,
    id: DbId,
) -> AppResult<Vec<DiscountUsage>> {
    authorize(user, Action::ManageDiscountCodes)?;
    Ok(DiscountUsageRepo::list_for_code(&state.pool, id).await?)
}
