//! Route definitions for the `/reports` resource.
//!
//! Employees and office heads only; citizens get 403.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::report;
use crate::state::AppState;

/// Routes mounted at `/reports`.
///
/// ```text
/// GET    /                  -> list
/// POST   /                  -> generate
/// GET    /metrics           -> metrics
/// GET    /{id}              -> get_by_id
/// PUT    /{id}/artifact     -> attach_artifact
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(report::list).post(report::generate))
        .route("/metrics", get(report::metrics))
        .route("/{id}", get(report::get_by_id))
        .route("/{id}/artifact", put(report::attach_artifact))
}
