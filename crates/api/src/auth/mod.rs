//! Authentication primitives.
//!
//! - [`jwt`] -- access-token validation (and generation, for internal tooling
//!   and tests).

pub mod jwt;
