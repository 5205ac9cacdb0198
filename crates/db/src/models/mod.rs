//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for the writes the api crate performs
//! - Small accessors that lift stored strings into `surgiguide_core` enums

pub mod case;
pub mod case_status_history;
pub mod discount;
pub mod notification;
pub mod payment;
pub mod profile;
pub mod quote;
