//! Request handlers.
//!
//! Handlers parse and validate the request, evaluate the policy for the
//! caller and delegate compound writes to [`crate::workflow`]. Responses use
//! the `{ "data": ... }` envelope.

pub mod admin;
pub mod cases;
pub mod discounts;
pub mod notification;
pub mod payments;
pub mod quotes;

use surgiguide_core::error::CoreError;
use surgiguide_core::policy::Action;
use surgiguide_core::types::DbId;
use surgiguide_db::models::case::Case;
use surgiguide_db::repositories::CaseRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::authorize_case;
use crate::state::AppState;

/// Load a live case and check that the caller may perform `action` on it.
pub(crate) async fn load_case(
    state: &AppState,
    user: &AuthUser,
    case_id: DbId,
    action: Action,
) -> AppResult<Case> {
    let case = CaseRepo::find_by_id(&state.pool, case_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Case",
            id: case_id,
        })?;
    authorize_case(user, action, &case)?;
    Ok(case)
}
