//! Handlers for the `/notifications` resource.
//!
//! Every endpoint acts on the authenticated user's own notifications.

use aduan_core::access::Action;
use aduan_core::error::CoreError;
use aduan_core::pagination::{Page, PageRequest};
use aduan_core::types::DbId;
use aduan_db::models::notification::{Notification, ReadFilter};
use aduan_db::repositories::NotificationRepo;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::{ok, DataResponse};
use crate::state::AppState;

/// Query parameters for `GET /notifications`.
#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    /// `all` (default), `unread` or `read`.
    #[serde(default)]
    pub filter: ReadFilter,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub marked_read: u64,
}

/// GET /api/v1/notifications
///
/// Newest first.
pub async fn list_notifications(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<NotificationQuery>,
) -> AppResult<Json<DataResponse<Page<Notification>>>> {
    auth.authorize(Action::ReadNotifications)?;

    let request = PageRequest::new(params.page, params.limit)?;
    let total = NotificationRepo::count_for_user(&state.pool, auth.user_id, params.filter).await?;
    let items = NotificationRepo::list_for_user(
        &state.pool,
        auth.user_id,
        params.filter,
        request.limit,
        request.offset(),
    )
    .await?;

    Ok(ok(Page::new(request, total, items)))
}

/// POST /api/v1/notifications/{id}/read
///
/// Returns 204 No Content, or 404 if the notification does not belong to
/// the caller. Marking an already-read notification succeeds.
pub async fn mark_read(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(notification_id): Path<DbId>,
) -> AppResult<StatusCode> {
    auth.authorize(Action::ReadNotifications)?;

    let found = NotificationRepo::mark_read(
        &state.pool,
        notification_id,
        auth.user_id,
        state.clock.now(),
    )
    .await?;

    if !found {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Notification",
            id: notification_id,
        }));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/notifications/read-all
///
/// Returns the number of notifications that were marked.
pub async fn mark_all_read(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<MarkedRead>>> {
    auth.authorize(Action::ReadNotifications)?;

    let marked_read =
        NotificationRepo::mark_all_read(&state.pool, auth.user_id, state.clock.now()).await?;
    Ok(ok(MarkedRead { marked_read }))
}

/// GET /api/v1/notifications/unread-count
pub async fn unread_count(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<UnreadCount>>> {
    auth.authorize(Action::ReadNotifications)?;

    let count = NotificationRepo::unread_count(&state.pool, auth.user_id).await?;
    Ok(ok(UnreadCount { count }))
}
