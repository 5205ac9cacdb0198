//! Authentication primitives.
//!
//! Tokens are issued by the identity service; this server only verifies
//! them. See [`jwt`].

pub mod jwt;
