//! Route definitions for the `/employees` roster.

use axum::routing::get;
use axum::Router;

use crate::handlers::employee;
use crate::state::AppState;

/// Routes mounted at `/employees`.
///
/// ```text
/// GET  /    -> list (office heads only)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(employee::list))
}
