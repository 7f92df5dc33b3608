//! Read-only aggregation queries over `complaints`, plus persistence for
//! `report_snapshots`.
//!
//! Every aggregate takes a half-open `[start, end)` window on
//! `submitted_at`; `end = None` leaves it unbounded above.

use aduan_core::lifecycle::ComplaintStatus;
use aduan_core::report::CategoryCount;
use aduan_core::types::{DbId, StatusId, Timestamp};
use sqlx::{FromRow, PgPool};

use crate::models::report_snapshot::{NewReportSnapshot, ReportSnapshot};

const SNAPSHOT_COLUMNS: &str = "id, created_by, kind, period_start, period_end, total_count, \
    completed_count, in_progress_count, artifact_ref, created_at";

/// Window predicate on `submitted_at` using `$1` and `$2`.
const IN_WINDOW: &str = "submitted_at >= $1 AND ($2::TIMESTAMPTZ IS NULL OR submitted_at < $2)";

#[derive(Debug, FromRow)]
struct CategoryCountRow {
    category_id: DbId,
    name: String,
    count: i64,
}

pub struct ReportRepo;

impl ReportRepo {
    // -----------------------------------------------------------------------
    // Aggregates
    // -----------------------------------------------------------------------

    /// Complaint counts per status inside the window.
    pub async fn status_counts(
        pool: &PgPool,
        start: Timestamp,
        end: Option<Timestamp>,
    ) -> Result<Vec<(StatusId, i64)>, sqlx::Error> {
        let query = format!(
            "SELECT status_id, COUNT(*) FROM complaints WHERE {IN_WINDOW} GROUP BY status_id"
        );
        sqlx::query_as(&query)
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await
    }

    /// `(sum of whole days, sample count)` from processing start to
    /// completion, over completed complaints with both timestamps.
    pub async fn processing_days(
        pool: &PgPool,
        start: Timestamp,
        end: Option<Timestamp>,
    ) -> Result<(i64, i64), sqlx::Error> {
        let query = format!(
            "SELECT \
                COALESCE(SUM(FLOOR(EXTRACT(EPOCH FROM (completed_at - processed_at)) / 86400)), 0)::BIGINT, \
                COUNT(*) \
             FROM complaints \
             WHERE {IN_WINDOW} AND status_id = $3 \
               AND processed_at IS NOT NULL AND completed_at IS NOT NULL"
        );
        sqlx::query_as(&query)
            .bind(start)
            .bind(end)
            .bind(ComplaintStatus::Completed.id())
            .fetch_one(pool)
            .await
    }

    /// `(sum of whole days, sample count)` from submission to processing
    /// start, over complaints that were picked up.
    pub async fn response_days(
        pool: &PgPool,
        start: Timestamp,
        end: Option<Timestamp>,
    ) -> Result<(i64, i64), sqlx::Error> {
        let query = format!(
            "SELECT \
                COALESCE(SUM(FLOOR(EXTRACT(EPOCH FROM (processed_at - submitted_at)) / 86400)), 0)::BIGINT, \
                COUNT(*) \
             FROM complaints \
             WHERE {IN_WINDOW} AND processed_at IS NOT NULL"
        );
        sqlx::query_as(&query)
            .bind(start)
            .bind(end)
            .fetch_one(pool)
            .await
    }

    /// Complaint count per category inside the window, categories with no
    /// complaints omitted.
    pub async fn category_counts(
        pool: &PgPool,
        start: Timestamp,
        end: Option<Timestamp>,
    ) -> Result<Vec<CategoryCount>, sqlx::Error> {
        let rows = sqlx::query_as::<_, CategoryCountRow>(
            "SELECT cat.id AS category_id, cat.name, COUNT(*) AS count \
             FROM complaints c JOIN categories cat ON cat.id = c.category_id \
             WHERE c.submitted_at >= $1 AND ($2::TIMESTAMPTZ IS NULL OR c.submitted_at < $2) \
             GROUP BY cat.id, cat.name \
             ORDER BY count DESC, cat.id ASC",
        )
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| CategoryCount {
                category_id: r.category_id,
                name: r.name,
                count: r.count,
            })
            .collect())
    }

    /// `(year, month, count)` for every UTC calendar month at or after
    /// `from` that has complaints.
    pub async fn monthly_counts(
        pool: &PgPool,
        from: Timestamp,
    ) -> Result<Vec<(i32, i32, i64)>, sqlx::Error> {
        sqlx::query_as(
            "SELECT \
                EXTRACT(YEAR FROM submitted_at AT TIME ZONE 'UTC')::INT AS year, \
                EXTRACT(MONTH FROM submitted_at AT TIME ZONE 'UTC')::INT AS month, \
                COUNT(*) \
             FROM complaints \
             WHERE submitted_at >= $1 \
             GROUP BY 1, 2 \
             ORDER BY 1, 2",
        )
        .bind(from)
        .fetch_all(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    pub async fn create_snapshot(
        pool: &PgPool,
        input: &NewReportSnapshot,
    ) -> Result<ReportSnapshot, sqlx::Error> {
        let query = format!(
            "INSERT INTO report_snapshots \
                (created_by, kind, period_start, period_end, total_count, completed_count, \
                 in_progress_count, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {SNAPSHOT_COLUMNS}"
        );
        sqlx::query_as::<_, ReportSnapshot>(&query)
            .bind(input.created_by)
            .bind(&input.kind)
            .bind(input.period_start)
            .bind(input.period_end)
            .bind(input.total_count)
            .bind(input.completed_count)
            .bind(input.in_progress_count)
            .bind(input.created_at)
            .fetch_one(pool)
            .await
    }

    pub async fn find_snapshot(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ReportSnapshot>, sqlx::Error> {
        let query = format!("SELECT {SNAPSHOT_COLUMNS} FROM report_snapshots WHERE id = $1");
        sqlx::query_as::<_, ReportSnapshot>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Most recent snapshots first.
    pub async fn list_snapshots(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ReportSnapshot>, sqlx::Error> {
        let query = format!(
            "SELECT {SNAPSHOT_COLUMNS} FROM report_snapshots \
             ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, ReportSnapshot>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count_snapshots(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM report_snapshots")
            .fetch_one(pool)
            .await
    }

    /// Set `artifact_ref` if it has not been set yet.
    ///
    /// Returns `None` when the snapshot is missing or already has one.
    pub async fn attach_artifact(
        pool: &PgPool,
        id: DbId,
        artifact_ref: &str,
    ) -> Result<Option<ReportSnapshot>, sqlx::Error> {
        let query = format!(
            "UPDATE report_snapshots SET artifact_ref = $2 \
             WHERE id = $1 AND artifact_ref IS NULL \
             RETURNING {SNAPSHOT_COLUMNS}"
        );
        sqlx::query_as::<_, ReportSnapshot>(&query)
            .bind(id)
            .bind(artifact_ref)
            .fetch_optional(pool)
            .await
    }
}
