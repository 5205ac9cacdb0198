//! Policy evaluation for the authenticated principal.
//!
//! Handlers call [`authorize`] or [`authorize_case`] before running an
//! operation. [`RequireAdmin`] additionally guards the `/admin` tree at the
//! type level.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use surgiguide_core::error::CoreError;
use surgiguide_core::policy::{self, Action, Ownership};
use surgiguide_core::roles::Role;
use surgiguide_db::models::case::Case;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Relationship between the caller and a case.
///
/// Only clients own cases; staff always get [`Ownership::NotApplicable`].
pub fn ownership(user: &AuthUser, case: &Case) -> Ownership {
    match user.role {
        Role::Client => Ownership::of(case.client_profile_id == user.profile_id),
        Role::Designer | Role::Admin => Ownership::NotApplicable,
    }
}

/// Evaluate the policy for an action that does not target a single case.
pub fn authorize(user: &AuthUser, action: Action) -> Result<(), AppError> {
    policy::authorize(user.role, action, Ownership::NotApplicable)?;
    Ok(())
}

/// Evaluate the policy for an action on `case`.
pub fn authorize_case(user: &AuthUser, action: Action, case: &Case) -> Result<(), AppError> {
    let ownership = ownership(user, case);
    if let Err(err) = policy::authorize(user.role, action, ownership) {
        tracing::warn!(
            user_id = user.user_id,
            role = %user.role,
            case_id = case.id,
            ?action,
            "Authorization denied"
        );
        return Err(err.into());
    }
    Ok(())
}

/// Requires the `admin` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(user): RequireAdmin) -> AppResult<Json<()>> {
///     // user is guaranteed to be an admin here
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin role required".into(),
            )));
        }
        Ok(RequireAdmin(user))
    }
}
