//! Authentication and authorization middleware extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the principal from a JWT Bearer token.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.
//! - [`rbac::authorize_case`] -- Evaluates the policy against a case.

pub mod auth;
pub mod rbac;
