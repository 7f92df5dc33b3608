//! Route definitions for the `/complaints` resource.
//!
//! All endpoints require authentication.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::complaint;
use crate::state::AppState;

/// Routes mounted at `/complaints`.
///
/// ```text
/// GET    /                        -> list
/// POST   /                        -> submit (multipart)
/// GET    /summary                 -> summary
/// GET    /{id}                    -> get_by_id
/// GET    /{id}/history            -> history
/// POST   /{id}/claim              -> claim
/// POST   /{id}/request-approval   -> request_approval
/// POST   /{id}/approve            -> approve
/// POST   /{id}/return             -> return_for_revision
/// POST   /{id}/complete           -> complete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(complaint::list).post(complaint::submit))
        .route("/summary", get(complaint::summary))
        .route("/{id}", get(complaint::get_by_id))
        .route("/{id}/history", get(complaint::history))
        // Lifecycle transitions
        .route("/{id}/claim", post(complaint::claim))
        .route("/{id}/request-approval", post(complaint::request_approval))
        .route("/{id}/approve", post(complaint::approve))
        .route("/{id}/return", post(complaint::return_for_revision))
        .route("/{id}/complete", post(complaint::complete))
}
