//! Complaint entity models and DTOs.

use aduan_core::error::CoreError;
use aduan_core::lifecycle::{ComplaintStatus, GuardSnapshot};
use aduan_core::types::{DbId, StatusId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `complaints` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Complaint {
    pub id: DbId,
    pub tracking_number: String,
    pub citizen_id: DbId,
    pub employee_id: Option<DbId>,
    pub office_head_id: Option<DbId>,
    pub category_id: DbId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub photo_ref: Option<String>,
    pub status_id: StatusId,
    pub submitted_at: Timestamp,
    pub processed_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub employee_note: Option<String>,
    pub office_head_note: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Complaint {
    pub fn status(&self) -> Result<ComplaintStatus, CoreError> {
        ComplaintStatus::try_from_id(self.status_id)
    }

    /// The fields transition guards inspect.
    pub fn guard_snapshot(&self) -> Result<GuardSnapshot, CoreError> {
        Ok(GuardSnapshot {
            status: self.status()?,
            employee_id: self.employee_id,
        })
    }
}

/// A complaint joined with the display names list and detail views need.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ComplaintRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub complaint: Complaint,
    pub category_name: String,
    pub citizen_name: String,
    pub employee_name: Option<String>,
}

/// DTO for inserting a new complaint. Status, tracking number and
/// timestamps are supplied by the lifecycle engine.
#[derive(Debug, Clone)]
pub struct NewComplaint {
    pub citizen_id: DbId,
    pub category_id: DbId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub photo_ref: Option<String>,
}

/// A conditional status change.
///
/// The row is only written if its status is still one of `expected` (and,
/// when `assignee` is set, it is still assigned to that employee). `None`
/// fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct TransitionWrite {
    pub expected: Vec<StatusId>,
    pub target: StatusId,
    pub assignee: Option<DbId>,
    pub employee_id: Option<DbId>,
    pub office_head_id: Option<DbId>,
    pub processed_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub employee_note: Option<String>,
    pub office_head_note: Option<String>,
}

/// Visibility rule applied to complaint listings, mirroring
/// [`aduan_core::access::ReadScope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// Complaints filed by the given citizen.
    FiledBy(DbId),
    /// Unclaimed complaints plus those assigned to the given employee.
    UnassignedOrAssignedTo(DbId),
    /// Everything.
    All,
}

/// Filters for complaint listings. `None` means "do not filter".
#[derive(Debug, Clone)]
pub struct ComplaintListQuery {
    pub scope: ListScope,
    pub status_ids: Option<Vec<StatusId>>,
    pub category_id: Option<DbId>,
    /// Case-insensitive substring over tracking number, title, location
    /// and description.
    pub search: Option<String>,
    /// `submitted_at > this` (priority lower edge).
    pub submitted_after: Option<Timestamp>,
    /// `submitted_at <= this` (priority upper edge).
    pub submitted_at_or_before: Option<Timestamp>,
    /// `submitted_at >= this` (date filter).
    pub submitted_from: Option<Timestamp>,
    /// `submitted_at < this` (date filter, exclusive).
    pub submitted_before: Option<Timestamp>,
}

impl ComplaintListQuery {
    pub fn new(scope: ListScope) -> Self {
        Self {
            scope,
            status_ids: None,
            category_id: None,
            search: None,
            submitted_after: None,
            submitted_at_or_before: None,
            submitted_from: None,
            submitted_before: None,
        }
    }
}

/// Counters for the employee home screen.
#[derive(Debug, Clone, Copy, FromRow, Serialize)]
pub struct EmployeeSummary {
    pub incoming: i64,
    pub handling: i64,
    pub completed_today: i64,
}
