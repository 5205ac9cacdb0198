//! Well-known role names and the acting-party tagged union.
//!
//! Role strings must match the `role` claim issued by the identity service
//! and the `actor_kind` CHECK constraint on `case_status_history`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

pub const ROLE_CLIENT: &str = "client";
pub const ROLE_DESIGNER: &str = "designer";
pub const ROLE_ADMIN: &str = "admin";

/// Caller role. An admin is a designer profile flagged `is_admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    Designer,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Client => ROLE_CLIENT,
            Role::Designer => ROLE_DESIGNER,
            Role::Admin => ROLE_ADMIN,
        }
    }

    /// Designers and admins share the staff side of the workflow.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Designer | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_CLIENT => Ok(Role::Client),
            ROLE_DESIGNER => Ok(Role::Designer),
            ROLE_ADMIN => Ok(Role::Admin),
            other => Err(CoreError::Validation(format!("Unknown role '{other}'"))),
        }
    }
}

/// Whoever caused a state change: `{ "kind": "client", "id": 12 }`.
///
/// `id` is the profile id for the given kind (client profile or designer
/// profile), never the raw user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub kind: Role,
    pub id: DbId,
}

impl Actor {
    pub fn client(id: DbId) -> Self {
        Self {
            kind: Role::Client,
            id,
        }
    }

    pub fn designer(id: DbId) -> Self {
        Self {
            kind: Role::Designer,
            id,
        }
    }

    pub fn admin(id: DbId) -> Self {
        Self {
            kind: Role::Admin,
            id,
        }
    }
}
