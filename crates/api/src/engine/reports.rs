//! Period metrics and persisted report snapshots.
//!
//! Window and metric arithmetic lives in `aduan_core::report`; this module
//! only runs the aggregate queries for each window and assembles the result.

use std::sync::Arc;

use aduan_core::access::{self, Action};
use aduan_core::clock::Clock;
use aduan_core::error::CoreError;
use aduan_core::pagination::{Page, PageRequest};
use aduan_core::report::{
    self, MonthlyPoint, ReportKind, ReportPeriod, StatusBreakdown, StatusCounts, TrendDelta,
    TrendingCategory, Window,
};
use aduan_core::types::DbId;
use aduan_db::models::report_snapshot::{NewReportSnapshot, ReportSnapshot};
use aduan_db::repositories::ReportRepo;
use aduan_db::DbPool;
use serde::Serialize;

use super::{store_error, Actor};

/// Label used for explicit date ranges in [`ReportMetrics::period`].
const CUSTOM_PERIOD: &str = "custom";

/// Everything the reports dashboard shows for one period.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetrics {
    pub period: String,
    pub current_window: Window,
    pub previous_window: Window,
    #[serde(flatten)]
    pub counts: StatusCounts,
    pub completion_rate: f64,
    pub avg_processing_days: f64,
    pub avg_response_days: f64,
    pub efficiency: f64,
    pub trending_category: TrendingCategory,
    pub breakdown: StatusBreakdown,
    pub trends: Trends,
    /// Last six calendar months, oldest first.
    pub monthly: Vec<MonthlyPoint>,
}

/// Change against the preceding window of the same length.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Trends {
    pub volume: TrendDelta,
    pub completion_rate: TrendDelta,
    pub efficiency: TrendDelta,
}

#[derive(Debug, Clone)]
pub struct ReportAggregator {
    pool: DbPool,
    clock: Arc<dyn Clock>,
}

impl ReportAggregator {
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    pub async fn metrics(
        &self,
        actor: Actor,
        period: ReportPeriod,
    ) -> Result<ReportMetrics, CoreError> {
        access::authorize(actor.role, Action::ViewReports)?;

        let now = self.clock.now();
        let windows = report::windows(period, now);
        let current = self.status_counts(windows.current).await?;
        let previous = self.status_counts(windows.previous).await?;

        let (processing_sum, processing_n) =
            ReportRepo::processing_days(&self.pool, windows.current.start, windows.current.end)
                .await
                .map_err(store_error)?;
        let (response_sum, response_n) =
            ReportRepo::response_days(&self.pool, windows.current.start, windows.current.end)
                .await
                .map_err(store_error)?;

        let trending_category = if current.total == 0 {
            TrendingCategory::no_data()
        } else {
            let counts =
                ReportRepo::category_counts(&self.pool, windows.current.start, windows.current.end)
                    .await
                    .map_err(store_error)?;
            report::trending_category(&counts)
        };

        let monthly_rows = ReportRepo::monthly_counts(&self.pool, report::monthly_series_start(now))
            .await
            .map_err(store_error)?;
        let monthly_rows: Vec<(i32, u32, i64)> = monthly_rows
            .into_iter()
            .filter_map(|(year, month, total)| {
                u32::try_from(month).ok().map(|month| (year, month, total))
            })
            .collect();

        let period_label = match period {
            ReportPeriod::Token(token) => token.as_str().to_string(),
            ReportPeriod::Range(_) => CUSTOM_PERIOD.to_string(),
        };

        Ok(ReportMetrics {
            period: period_label,
            current_window: windows.current,
            previous_window: windows.previous,
            counts: current,
            completion_rate: current.completion_rate(),
            avg_processing_days: report::average_days(processing_sum, processing_n),
            avg_response_days: report::average_days(response_sum, response_n),
            efficiency: current.efficiency(),
            trending_category,
            breakdown: current.breakdown(),
            trends: Trends {
                volume: report::trend(current.total as f64, previous.total as f64),
                completion_rate: report::trend(
                    current.completion_rate(),
                    previous.completion_rate(),
                ),
                efficiency: report::trend(current.efficiency(), previous.efficiency()),
            },
            monthly: report::monthly_series(now, &monthly_rows),
        })
    }

    /// Compute and persist a snapshot.
    ///
    /// Counts are taken over the same dates the snapshot records.
    pub async fn generate(
        &self,
        actor: Actor,
        kind: ReportKind,
        period: Option<ReportPeriod>,
    ) -> Result<ReportSnapshot, CoreError> {
        access::authorize(actor.role, Action::GenerateReport)?;

        let now = self.clock.now();
        let range = report::snapshot_range(kind, period, now);
        let counts = self.status_counts(range.window()).await?;

        let snapshot = ReportRepo::create_snapshot(
            &self.pool,
            &NewReportSnapshot {
                created_by: actor.id,
                kind: kind.as_str().to_string(),
                period_start: range.start,
                period_end: range.end,
                total_count: counts.total,
                completed_count: counts.completed,
                in_progress_count: counts.in_progress,
                created_at: now,
            },
        )
        .await
        .map_err(store_error)?;

        tracing::info!(
            report_id = snapshot.id,
            kind = kind.as_str(),
            period_start = %range.start,
            period_end = %range.end,
            total = counts.total,
            created_by = actor.id,
            "Report snapshot generated",
        );
        Ok(snapshot)
    }

    /// Snapshots, newest first.
    pub async fn list(
        &self,
        actor: Actor,
        request: PageRequest,
    ) -> Result<Page<ReportSnapshot>, CoreError> {
        access::authorize(actor.role, Action::ViewReports)?;

        let total = ReportRepo::count_snapshots(&self.pool)
            .await
            .map_err(store_error)?;
        let items = ReportRepo::list_snapshots(&self.pool, request.limit, request.offset())
            .await
            .map_err(store_error)?;
        Ok(Page::new(request, total, items))
    }

    pub async fn get(&self, actor: Actor, id: DbId) -> Result<ReportSnapshot, CoreError> {
        access::authorize(actor.role, Action::ViewReports)?;

        ReportRepo::find_snapshot(&self.pool, id)
            .await
            .map_err(store_error)?
            .ok_or(CoreError::NotFound {
                entity: "Report",
                id,
            })
    }

    /// Record where the exported file for a snapshot lives. Set once.
    pub async fn attach_artifact(
        &self,
        actor: Actor,
        id: DbId,
        reference: &str,
    ) -> Result<ReportSnapshot, CoreError> {
        access::authorize(actor.role, Action::GenerateReport)?;

        let reference = reference.trim();
        if reference.is_empty() {
            return Err(CoreError::field(
                "artifact_ref",
                "Artifact reference is required",
            ));
        }

        if let Some(snapshot) = ReportRepo::attach_artifact(&self.pool, id, reference)
            .await
            .map_err(store_error)?
        {
            tracing::info!(report_id = id, artifact_ref = %reference, "Report artifact attached");
            return Ok(snapshot);
        }

        // Nothing updated: either missing or already attached.
        match ReportRepo::find_snapshot(&self.pool, id)
            .await
            .map_err(store_error)?
        {
            Some(_) => Err(CoreError::Conflict(format!(
                "Report {id} already has an artifact attached"
            ))),
            None => Err(CoreError::NotFound {
                entity: "Report",
                id,
            }),
        }
    }

    async fn status_counts(&self, window: Window) -> Result<StatusCounts, CoreError> {
        let rows = ReportRepo::status_counts(&self.pool, window.start, window.end)
            .await
            .map_err(store_error)?;
        Ok(StatusCounts::tally(&rows))
    }
}
