//! Handlers for the `/reports` resource.

use aduan_core::access::Action;
use aduan_core::error::CoreError;
use aduan_core::pagination::Page;
use aduan_core::report::{DateRange, PeriodToken, ReportKind, ReportPeriod};
use aduan_core::types::DbId;
use aduan_db::models::report_snapshot::ReportSnapshot;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::engine::reports::ReportMetrics;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::{ok, DataResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /reports/metrics`.
#[derive(Debug, Default, Deserialize)]
pub struct MetricsParams {
    /// `this_month` (default), `3_months`, `6_months` or `this_year`.
    pub period: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Request body for `POST /reports`.
#[derive(Debug, Deserialize)]
pub struct GenerateReportRequest {
    pub kind: ReportKind,
    pub period: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Request body for `PUT /reports/{id}/artifact`.
#[derive(Debug, Deserialize)]
pub struct AttachArtifactRequest {
    #[serde(default)]
    pub artifact_ref: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/reports/metrics
pub async fn metrics(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<MetricsParams>,
) -> AppResult<Json<DataResponse<ReportMetrics>>> {
    auth.authorize(Action::ViewReports)?;

    let period = resolve_period(params.period.as_deref(), params.start_date, params.end_date)?
        .unwrap_or_default();
    let metrics = state.reports().metrics(auth.actor(), period).await?;
    Ok(ok(metrics))
}

/// POST /api/v1/reports
///
/// Compute and store a snapshot. Without a period or dates, the kind's own
/// calendar unit is used.
pub async fn generate(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<GenerateReportRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<ReportSnapshot>>)> {
    auth.authorize(Action::GenerateReport)?;

    let period = resolve_period(input.period.as_deref(), input.start_date, input.end_date)?;
    let snapshot = state
        .reports()
        .generate(auth.actor(), input.kind, period)
        .await?;
    Ok((StatusCode::CREATED, ok(snapshot)))
}

/// GET /api/v1/reports
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Page<ReportSnapshot>>>> {
    auth.authorize(Action::ViewReports)?;

    let request = params.page_request()?;
    let page = state.reports().list(auth.actor(), request).await?;
    Ok(ok(page))
}

/// GET /api/v1/reports/{id}
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ReportSnapshot>>> {
    let snapshot = state.reports().get(auth.actor(), id).await?;
    Ok(ok(snapshot))
}

/// PUT /api/v1/reports/{id}/artifact
///
/// Attach the exported file reference. A second attach is a 409.
pub async fn attach_artifact(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<AttachArtifactRequest>,
) -> AppResult<Json<DataResponse<ReportSnapshot>>> {
    let snapshot = state
        .reports()
        .attach_artifact(auth.actor(), id, &input.artifact_ref)
        .await?;
    Ok(ok(snapshot))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Explicit dates win over a period token; both dates are required together.
fn resolve_period(
    token: Option<&str>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<Option<ReportPeriod>, CoreError> {
    match (start_date, end_date) {
        (Some(start), Some(end)) => Ok(Some(ReportPeriod::Range(DateRange::new(start, end)?))),
        (Some(_), None) => Err(CoreError::field(
            "end_date",
            "end_date is required with start_date",
        )),
        (None, Some(_)) => Err(CoreError::field(
            "start_date",
            "start_date is required with end_date",
        )),
        (None, None) => token
            .map(|t| PeriodToken::parse(t).map(ReportPeriod::Token))
            .transpose(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn dates_win_over_token() {
        let period =
            resolve_period(Some("this_year"), Some(date(2026, 1, 1)), Some(date(2026, 1, 31)))
                .unwrap();
        assert_matches!(period, Some(ReportPeriod::Range(_)));
    }

    #[test]
    fn token_only() {
        assert_eq!(
            resolve_period(Some("3_months"), None, None).unwrap(),
            Some(ReportPeriod::Token(PeriodToken::ThreeMonths))
        );
        assert_eq!(resolve_period(None, None, None).unwrap(), None);
        assert_matches!(
            resolve_period(Some("fortnight"), None, None),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn half_a_range_is_rejected() {
        assert_matches!(
            resolve_period(None, Some(date(2026, 1, 1)), None),
            Err(CoreError::InvalidFields { .. })
        );
        assert_matches!(
            resolve_period(None, Some(date(2026, 2, 1)), Some(date(2026, 1, 1))),
            Err(CoreError::Validation(_))
        );
    }
}
