//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the caller from a JWT Bearer token.
//! - [`rbac::RequireOwner`] -- Requires the `owner` role.

pub mod auth;
pub mod rbac;
