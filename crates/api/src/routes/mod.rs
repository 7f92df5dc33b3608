pub mod auth;
pub mod category;
pub mod complaint;
pub mod employee;
pub mod health;
pub mod notification;
pub mod report;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                      login (public)
/// /auth/me                                         current user
///
/// /categories                                      category reference list
///
/// /complaints                                      list, submit (multipart)
/// /complaints/summary                              role-shaped counters
/// /complaints/{id}                                 detail (+history, progress, priority)
/// /complaints/{id}/history                         audit ledger
/// /complaints/{id}/claim                           employee takes the complaint
/// /complaints/{id}/request-approval                assignee asks office heads
/// /complaints/{id}/approve                         office head approves
/// /complaints/{id}/return                          office head returns for revision
/// /complaints/{id}/complete                        assignee closes the complaint
///
/// /employees                                       employee roster (office heads)
///
/// /notifications                                   list (filter, page, limit)
/// /notifications/unread-count                      unread count
/// /notifications/read-all                          mark all read
/// /notifications/{id}/read                         mark one read
///
/// /reports                                         list, generate snapshot
/// /reports/metrics                                 period metrics and trends
/// /reports/{id}                                    snapshot
/// /reports/{id}/artifact                           attach export reference (PUT)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/categories", category::router())
        .nest("/complaints", complaint::router())
        .nest("/employees", employee::router())
        .nest("/notifications", notification::router())
        .nest("/reports", report::router())
}
