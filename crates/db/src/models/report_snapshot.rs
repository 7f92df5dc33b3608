//! Persisted report snapshots.

use aduan_core::types::{DbId, Timestamp};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `report_snapshots` table. Immutable apart from a single
/// `artifact_ref` attachment.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReportSnapshot {
    pub id: DbId,
    pub created_by: DbId,
    pub kind: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_count: i64,
    pub completed_count: i64,
    pub in_progress_count: i64,
    pub artifact_ref: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for inserting a snapshot.
#[derive(Debug, Clone)]
pub struct NewReportSnapshot {
    pub created_by: DbId,
    pub kind: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_count: i64,
    pub completed_count: i64,
    pub in_progress_count: i64,
    pub created_at: Timestamp,
}
