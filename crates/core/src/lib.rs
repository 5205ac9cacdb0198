//! Domain rules for the surgical guide order workflow.
//!
//! Everything here is pure: no database access, no clock reads except where a
//! `now` is passed in. The db and api crates build on these types.

pub mod case_intake;
pub mod case_status;
pub mod discount;
pub mod error;
pub mod notification;
pub mod payment;
pub mod policy;
pub mod quote;
pub mod roles;
pub mod types;
