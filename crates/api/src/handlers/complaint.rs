//! Handlers for the `/complaints` resource.
//!
//! Reads are scoped by role (see `aduan_core::access::read_scope`); a
//! complaint outside the caller's scope is reported as not found. All
//! status changes go through [`crate::engine::lifecycle::LifecycleEngine`].

use aduan_core::access::{self, Action, ReadScope, ReadTarget};
use aduan_core::error::CoreError;
use aduan_core::lifecycle::{
    available_transitions, ComplaintStatus, Priority, Progress, SubmitComplaint, Transition,
};
use aduan_core::pagination::{Page, PageRequest};
use aduan_core::report::{check_year, completion_rate, StatusCounts};
use aduan_core::roles::Role;
use aduan_core::types::{DbId, StatusId, Timestamp};
use aduan_core::upload::validate_photo;
use aduan_db::models::complaint::{
    Complaint, ComplaintListQuery, ComplaintRow, EmployeeSummary, ListScope,
};
use aduan_db::models::status_event::StatusEventEntry;
use aduan_db::repositories::{ComplaintRepo, StatusEventRepo};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::{ok, DataResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// A complaint as list and detail views show it.
#[derive(Debug, Serialize)]
pub struct ComplaintView {
    #[serde(flatten)]
    pub row: ComplaintRow,
    pub status: ComplaintStatus,
    pub progress: Progress,
    pub priority: Priority,
}

impl ComplaintView {
    fn build(row: ComplaintRow, now: Timestamp) -> AppResult<Self> {
        let status = row.complaint.status()?;
        let priority = Priority::classify(row.complaint.submitted_at, now);
        Ok(Self {
            row,
            status,
            progress: Progress::from(status),
            priority,
        })
    }
}

/// Response body for `GET /complaints/{id}`.
#[derive(Debug, Serialize)]
pub struct ComplaintDetail {
    #[serde(flatten)]
    pub complaint: ComplaintView,
    pub history: Vec<StatusEventEntry>,
    /// Transitions the caller could perform right now.
    pub available_actions: Vec<Transition>,
}

/// Query parameters for `GET /complaints`.
#[derive(Debug, Default, Deserialize)]
pub struct ComplaintListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Dashboard tab: citizen `all|waiting|in_progress|completed`,
    /// employee `all|incoming|handling`, office head `all|approval`.
    pub scope: Option<String>,
    /// Explicit status; takes precedence over `scope`.
    pub status: Option<String>,
    pub search: Option<String>,
    pub category_id: Option<DbId>,
    pub priority: Option<String>,
    /// Inclusive lower bound on the submission date.
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the submission date.
    pub to: Option<NaiveDate>,
}

/// Optional body for the transition endpoints. `recommendation` is accepted
/// as an alias on request-approval.
#[derive(Debug, Default, Deserialize)]
pub struct TransitionInput {
    #[serde(default, alias = "recommendation")]
    pub note: Option<String>,
}

/// Home-screen counters, shaped per role.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ComplaintSummary {
    Citizen {
        total: i64,
        waiting: i64,
        in_progress: i64,
        completed: i64,
    },
    Employee(EmployeeSummary),
    OfficeHead {
        total_all_time: i64,
        active: i64,
        /// Completed share of every complaint ever claimed, in percent.
        employee_performance: f64,
    },
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// POST /api/v1/complaints
///
/// Multipart form with `category_id`, `title`, `description`, `location`
/// and an optional `photo` (jpg, jpeg or png).
pub async fn submit(
    auth: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<Complaint>>)> {
    auth.authorize(Action::Submit)?;

    let mut category_id = String::new();
    let mut title = String::new();
    let mut description = String::new();
    let mut location = String::new();
    let mut photo: Option<(Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "photo" => {
                let file_name = field.file_name().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                // Browsers send an empty part when no file was picked.
                if !data.is_empty() || file_name.as_deref().is_some_and(|n| !n.is_empty()) {
                    photo = Some((file_name, data.to_vec()));
                }
            }
            "category_id" | "title" | "description" | "location" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                match name.as_str() {
                    "category_id" => category_id = text,
                    "title" => title = text,
                    "description" => description = text,
                    _ => location = text,
                }
            }
            _ => {} // ignore unknown fields
        }
    }

    let input = SubmitComplaint {
        // Unparseable ids fall through to the "Category is required" check.
        category_id: category_id.trim().parse().unwrap_or(0),
        title,
        description,
        location,
    }
    .validated()?;

    let photo_ref = match &photo {
        Some((file_name, data)) => {
            let ext =
                validate_photo(file_name.as_deref(), data.len(), state.config.max_photo_bytes)?;
            let reference = state
                .photos
                .save(ext, data)
                .await
                .map_err(|e| AppError::InternalError(format!("Failed to store photo: {e}")))?;
            Some(reference)
        }
        None => None,
    };

    match state
        .lifecycle()
        .submit(auth.actor(), input, photo_ref.clone())
        .await
    {
        Ok(complaint) => Ok((StatusCode::CREATED, ok(complaint))),
        Err(e) => {
            if let Some(reference) = &photo_ref {
                state.photos.delete(reference).await;
            }
            Err(e.into())
        }
    }
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/v1/complaints
///
/// Role-scoped, filtered, paginated list ordered newest submission first.
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ComplaintListParams>,
) -> AppResult<Json<DataResponse<Page<ComplaintView>>>> {
    auth.authorize(Action::ReadComplaints)?;

    let request = PageRequest::new(params.page, params.limit)?;
    let now = state.clock.now();
    let filter = list_filter(&auth, &params, now)?;

    let total = ComplaintRepo::count(&state.pool, &filter).await?;
    let rows = ComplaintRepo::list(&state.pool, &filter, request.limit, request.offset()).await?;
    let items = rows
        .into_iter()
        .map(|row| ComplaintView::build(row, now))
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ok(Page::new(request, total, items)))
}

/// GET /api/v1/complaints/summary
pub async fn summary(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<ComplaintSummary>>> {
    auth.authorize(Action::ReadComplaints)?;

    let summary = match auth.role {
        Role::Citizen => {
            let rows = ComplaintRepo::count_by_status(&state.pool, Some(auth.user_id)).await?;
            let counts = StatusCounts::tally(&rows);
            ComplaintSummary::Citizen {
                total: counts.total,
                waiting: counts.waiting,
                in_progress: counts.in_progress,
                completed: counts.completed,
            }
        }
        Role::Employee => {
            let day_start = state
                .clock
                .now()
                .date_naive()
                .and_time(NaiveTime::MIN)
                .and_utc();
            let counts = ComplaintRepo::employee_summary(
                &state.pool,
                auth.user_id,
                day_start,
                day_start + Duration::days(1),
            )
            .await?;
            ComplaintSummary::Employee(counts)
        }
        Role::OfficeHead => {
            let rows = ComplaintRepo::count_by_status(&state.pool, None).await?;
            let counts = StatusCounts::tally(&rows);
            let (claimed, completed) = ComplaintRepo::claimed_and_completed(&state.pool).await?;
            ComplaintSummary::OfficeHead {
                total_all_time: counts.total,
                active: counts.waiting + counts.in_progress,
                employee_performance: completion_rate(completed, claimed),
            }
        }
    };

    Ok(ok(summary))
}

/// GET /api/v1/complaints/{id}
///
/// Complaint with its history, progress, priority and the actions the
/// caller may take next.
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ComplaintDetail>>> {
    auth.authorize(Action::ReadComplaints)?;

    let row = load_visible(&state, &auth, id).await?;
    let history = StatusEventRepo::list_for_complaint(&state.pool, id).await?;
    let complaint = ComplaintView::build(row, state.clock.now())?;
    let available_actions = actions_for(&auth, &complaint);

    Ok(ok(ComplaintDetail {
        complaint,
        history,
        available_actions,
    }))
}

/// GET /api/v1/complaints/{id}/history
///
/// The audit ledger for one complaint, oldest entry first.
pub async fn history(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<StatusEventEntry>>>> {
    auth.authorize(Action::ReadComplaints)?;

    load_visible(&state, &auth, id).await?;
    let history = StatusEventRepo::list_for_complaint(&state.pool, id).await?;
    Ok(ok(history))
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// POST /api/v1/complaints/{id}/claim
pub async fn claim(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Option<Json<TransitionInput>>,
) -> AppResult<Json<DataResponse<Complaint>>> {
    let input = transition_input(body);
    let complaint = state
        .lifecycle()
        .claim(auth.actor(), id, input.note.as_deref())
        .await?;
    Ok(ok(complaint))
}

/// POST /api/v1/complaints/{id}/request-approval
pub async fn request_approval(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Option<Json<TransitionInput>>,
) -> AppResult<Json<DataResponse<Complaint>>> {
    let input = transition_input(body);
    let complaint = state
        .lifecycle()
        .request_approval(auth.actor(), id, input.note.as_deref())
        .await?;
    Ok(ok(complaint))
}

/// POST /api/v1/complaints/{id}/approve
pub async fn approve(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Option<Json<TransitionInput>>,
) -> AppResult<Json<DataResponse<Complaint>>> {
    let input = transition_input(body);
    let complaint = state
        .lifecycle()
        .approve(auth.actor(), id, input.note.as_deref())
        .await?;
    Ok(ok(complaint))
}

/// POST /api/v1/complaints/{id}/return
pub async fn return_for_revision(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Option<Json<TransitionInput>>,
) -> AppResult<Json<DataResponse<Complaint>>> {
    let input = transition_input(body);
    let complaint = state
        .lifecycle()
        .return_for_revision(auth.actor(), id, input.note.as_deref())
        .await?;
    Ok(ok(complaint))
}

/// POST /api/v1/complaints/{id}/complete
pub async fn complete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Option<Json<TransitionInput>>,
) -> AppResult<Json<DataResponse<Complaint>>> {
    let input = transition_input(body);
    let complaint = state
        .lifecycle()
        .complete(auth.actor(), id, input.note.as_deref())
        .await?;
    Ok(ok(complaint))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A missing body is the same as an empty one.
fn transition_input(body: Option<Json<TransitionInput>>) -> TransitionInput {
    body.map(|Json(input)| input).unwrap_or_default()
}

/// Load a complaint the caller is allowed to see, or 404.
async fn load_visible(state: &AppState, auth: &AuthUser, id: DbId) -> AppResult<ComplaintRow> {
    let not_found = || {
        AppError::Core(CoreError::NotFound {
            entity: "Complaint",
            id,
        })
    };

    let row = ComplaintRepo::find_row(&state.pool, id)
        .await?
        .ok_or_else(not_found)?;

    let target = ReadTarget {
        citizen_id: row.complaint.citizen_id,
        employee_id: row.complaint.employee_id,
        status: row.complaint.status()?,
    };
    if !access::can_read(auth.role, auth.user_id, &target) {
        return Err(not_found());
    }
    Ok(row)
}

fn actions_for(auth: &AuthUser, complaint: &ComplaintView) -> Vec<Transition> {
    available_transitions(complaint.status)
        .into_iter()
        .filter(|t| access::is_allowed(auth.role, t.action()))
        .filter(|t| {
            !t.requires_assignee() || complaint.row.complaint.employee_id == Some(auth.user_id)
        })
        .collect()
}

fn list_filter(
    auth: &AuthUser,
    params: &ComplaintListParams,
    now: Timestamp,
) -> Result<ComplaintListQuery, CoreError> {
    let scope = match access::read_scope(auth.role) {
        ReadScope::Own => ListScope::FiledBy(auth.user_id),
        ReadScope::UnassignedAndAssigned => ListScope::UnassignedOrAssignedTo(auth.user_id),
        ReadScope::All => ListScope::All,
    };
    let mut filter = ComplaintListQuery::new(scope);

    filter.status_ids = match (params.status.as_deref(), params.scope.as_deref()) {
        (Some(status), _) => Some(vec![ComplaintStatus::parse(status)?.id()]),
        (None, Some(tab)) => tab_statuses(auth.role, tab)?,
        (None, None) => None,
    };

    filter.category_id = params.category_id;
    filter.search = params
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    if let Some(priority) = params.priority.as_deref() {
        let (after, at_or_before) = Priority::parse(priority)?.submitted_bounds(now);
        filter.submitted_after = after;
        filter.submitted_at_or_before = at_or_before;
    }

    if let Some(from) = params.from {
        check_year("from", from)?;
    }
    if let Some(to) = params.to {
        check_year("to", to)?;
    }
    if let (Some(from), Some(to)) = (params.from, params.to) {
        if from > to {
            return Err(CoreError::field("to", "to must not be before from"));
        }
    }
    filter.submitted_from = params.from.map(midnight);
    filter.submitted_before = params.to.map(|to| midnight(to + Duration::days(1)));

    Ok(filter)
}

/// Status filter for a dashboard tab. `all` means no filter.
fn tab_statuses(role: Role, tab: &str) -> Result<Option<Vec<StatusId>>, CoreError> {
    use ComplaintStatus::*;

    fn ids(statuses: &[ComplaintStatus]) -> Option<Vec<StatusId>> {
        Some(statuses.iter().map(|s| s.id()).collect())
    }

    match (role, tab) {
        (_, "all") => Ok(None),
        (Role::Citizen, "waiting") | (Role::Employee, "incoming") => Ok(ids(&[Waiting])),
        (Role::Citizen, "in_progress") | (Role::Employee, "handling") => {
            Ok(ids(&ComplaintStatus::IN_PROGRESS_GROUP))
        }
        (Role::Citizen, "completed") => Ok(ids(&[Completed])),
        (Role::OfficeHead, "approval") => Ok(ids(&[PendingApproval])),
        (role, other) => Err(CoreError::field(
            "scope",
            format!("Unknown scope '{other}' for role {role}"),
        )),
    }
}

fn midnight(date: NaiveDate) -> Timestamp {
    date.and_time(NaiveTime::MIN).and_utc()
}
