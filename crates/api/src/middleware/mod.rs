//! Request extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user and role from a
//!   JWT Bearer token. Role checks go through [`auth::AuthUser::authorize`],
//!   backed by the static table in `aduan_core::access`.

pub mod auth;
