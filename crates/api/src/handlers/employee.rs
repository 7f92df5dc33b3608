//! Handlers for the `/employees` roster.

use aduan_core::access::Action;
use aduan_core::roles::Role;
use aduan_db::models::user::UserResponse;
use aduan_db::repositories::UserRepo;
use axum::extract::State;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::{ok, DataResponse};
use crate::state::AppState;

/// GET /api/v1/employees
///
/// Every employee account with its contact details, newest first.
/// Deactivated accounts are included and flagged by `is_active`.
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    auth.authorize(Action::ListEmployees)?;

    let employees = UserRepo::list_by_role(&state.pool, Role::Employee)
        .await?
        .iter()
        .map(|user| UserResponse::from_user(user, Role::Employee))
        .collect();
    Ok(ok(employees))
}
