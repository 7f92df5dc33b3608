//! Repository for the `complaints` table.
//!
//! Status changes go through [`ComplaintRepo::apply_transition`] only: a
//! single conditional UPDATE whose WHERE clause repeats the lifecycle guard,
//! so two racing writers can never both succeed.

use aduan_core::lifecycle::ComplaintStatus;
use aduan_core::types::{DbId, StatusId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::complaint::{
    Complaint, ComplaintListQuery, ComplaintRow, EmployeeSummary, ListScope, NewComplaint,
    TransitionWrite,
};

/// Column list for `complaints` queries.
const COLUMNS: &str = "id, tracking_number, citizen_id, employee_id, office_head_id, \
    category_id, title, description, location, photo_ref, status_id, submitted_at, \
    processed_at, completed_at, employee_note, office_head_note, created_at, updated_at";

/// Same columns qualified with the `c` alias, plus joined display names.
const ROW_COLUMNS: &str = "c.id, c.tracking_number, c.citizen_id, c.employee_id, \
    c.office_head_id, c.category_id, c.title, c.description, c.location, c.photo_ref, \
    c.status_id, c.submitted_at, c.processed_at, c.completed_at, c.employee_note, \
    c.office_head_note, c.created_at, c.updated_at, \
    cat.name AS category_name, cu.name AS citizen_name, eu.name AS employee_name";

const ROW_JOINS: &str = "FROM complaints c \
    JOIN categories cat ON cat.id = c.category_id \
    JOIN users cu ON cu.id = c.citizen_id \
    LEFT JOIN users eu ON eu.id = c.employee_id";

/// Shared WHERE clause for listings. `$1` scope kind, `$2` actor id.
const LIST_FILTER: &str = "WHERE ($1::SMALLINT = 0 \
        OR ($1 = 1 AND c.citizen_id = $2) \
        OR ($1 = 2 AND ((c.status_id = $3 AND c.employee_id IS NULL) OR c.employee_id = $2))) \
    AND ($4::SMALLINT[] IS NULL OR c.status_id = ANY($4)) \
    AND ($5::BIGINT IS NULL OR c.category_id = $5) \
    AND ($6::TEXT IS NULL OR c.tracking_number ILIKE $6 OR c.title ILIKE $6 \
         OR c.location ILIKE $6 OR c.description ILIKE $6) \
    AND ($7::TIMESTAMPTZ IS NULL OR c.submitted_at > $7) \
    AND ($8::TIMESTAMPTZ IS NULL OR c.submitted_at <= $8) \
    AND ($9::TIMESTAMPTZ IS NULL OR c.submitted_at >= $9) \
    AND ($10::TIMESTAMPTZ IS NULL OR c.submitted_at < $10)";

/// Escape `%`, `_` and `\` so user input matches literally inside ILIKE.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn scope_params(scope: ListScope) -> (i16, DbId) {
    match scope {
        ListScope::All => (0, 0),
        ListScope::FiledBy(id) => (1, id),
        ListScope::UnassignedOrAssignedTo(id) => (2, id),
    }
}

/// Provides persistence for complaints.
pub struct ComplaintRepo;

impl ComplaintRepo {
    /// Insert a new complaint in the `Waiting` status.
    ///
    /// Runs on the submitting transaction; a unique violation on
    /// `uq_complaints_tracking_number` is surfaced to the caller for retry.
    pub async fn insert(
        conn: &mut PgConnection,
        input: &NewComplaint,
        tracking_number: &str,
        submitted_at: Timestamp,
    ) -> Result<Complaint, sqlx::Error> {
        let query = format!(
            "INSERT INTO complaints \
                (tracking_number, citizen_id, category_id, title, description, location, \
                 photo_ref, status_id, submitted_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Complaint>(&query)
            .bind(tracking_number)
            .bind(input.citizen_id)
            .bind(input.category_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.location)
            .bind(&input.photo_ref)
            .bind(ComplaintStatus::Waiting.id())
            .bind(submitted_at)
            .fetch_one(conn)
            .await
    }

    /// Find a complaint by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Complaint>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM complaints WHERE id = $1");
        sqlx::query_as::<_, Complaint>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a complaint with joined display names.
    pub async fn find_row(pool: &PgPool, id: DbId) -> Result<Option<ComplaintRow>, sqlx::Error> {
        let query = format!("SELECT {ROW_COLUMNS} {ROW_JOINS} WHERE c.id = $1");
        sqlx::query_as::<_, ComplaintRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Apply a guarded status change.
    ///
    /// Returns `None` when the row no longer satisfies the guard (another
    /// transition committed first) or does not exist.
    pub async fn apply_transition(
        conn: &mut PgConnection,
        id: DbId,
        write: &TransitionWrite,
    ) -> Result<Option<Complaint>, sqlx::Error> {
        let query = format!(
            "UPDATE complaints SET \
                status_id = $2, \
                employee_id = COALESCE($3, employee_id), \
                office_head_id = COALESCE($4, office_head_id), \
                processed_at = COALESCE($5, processed_at), \
                completed_at = COALESCE($6, completed_at), \
                employee_note = COALESCE($7, employee_note), \
                office_head_note = COALESCE($8, office_head_note) \
             WHERE id = $1 \
               AND status_id = ANY($9) \
               AND ($10::BIGINT IS NULL OR employee_id = $10) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Complaint>(&query)
            .bind(id)
            .bind(write.target)
            .bind(write.employee_id)
            .bind(write.office_head_id)
            .bind(write.processed_at)
            .bind(write.completed_at)
            .bind(&write.employee_note)
            .bind(&write.office_head_note)
            .bind(&write.expected)
            .bind(write.assignee)
            .fetch_optional(conn)
            .await
    }

    /// List complaints matching `filter`, newest submission first.
    pub async fn list(
        pool: &PgPool,
        filter: &ComplaintListQuery,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ComplaintRow>, sqlx::Error> {
        let query = format!(
            "SELECT {ROW_COLUMNS} {ROW_JOINS} {LIST_FILTER} \
             ORDER BY c.submitted_at DESC, c.id DESC \
             LIMIT $11 OFFSET $12"
        );
        let (kind, actor) = scope_params(filter.scope);
        sqlx::query_as::<_, ComplaintRow>(&query)
            .bind(kind)
            .bind(actor)
            .bind(ComplaintStatus::Waiting.id())
            .bind(&filter.status_ids)
            .bind(filter.category_id)
            .bind(filter.search.as_deref().map(like_pattern))
            .bind(filter.submitted_after)
            .bind(filter.submitted_at_or_before)
            .bind(filter.submitted_from)
            .bind(filter.submitted_before)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count complaints matching `filter`.
    pub async fn count(pool: &PgPool, filter: &ComplaintListQuery) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM complaints c {LIST_FILTER}");
        let (kind, actor) = scope_params(filter.scope);
        sqlx::query_scalar(&query)
            .bind(kind)
            .bind(actor)
            .bind(ComplaintStatus::Waiting.id())
            .bind(&filter.status_ids)
            .bind(filter.category_id)
            .bind(filter.search.as_deref().map(like_pattern))
            .bind(filter.submitted_after)
            .bind(filter.submitted_at_or_before)
            .bind(filter.submitted_from)
            .bind(filter.submitted_before)
            .fetch_one(pool)
            .await
    }

    /// Complaint counts per status, optionally restricted to one citizen.
    pub async fn count_by_status(
        pool: &PgPool,
        citizen_id: Option<DbId>,
    ) -> Result<Vec<(StatusId, i64)>, sqlx::Error> {
        sqlx::query_as(
            "SELECT status_id, COUNT(*) FROM complaints \
             WHERE ($1::BIGINT IS NULL OR citizen_id = $1) \
             GROUP BY status_id",
        )
        .bind(citizen_id)
        .fetch_all(pool)
        .await
    }

    /// Home-screen counters for one employee. `day_start..day_end` bounds
    /// "today" for the completed counter.
    pub async fn employee_summary(
        pool: &PgPool,
        employee_id: DbId,
        day_start: Timestamp,
        day_end: Timestamp,
    ) -> Result<EmployeeSummary, sqlx::Error> {
        sqlx::query_as::<_, EmployeeSummary>(
            "SELECT \
                COUNT(*) FILTER (WHERE status_id = $2 AND employee_id IS NULL) AS incoming, \
                COUNT(*) FILTER (WHERE employee_id = $1 AND status_id = ANY($3)) AS handling, \
                COUNT(*) FILTER (WHERE employee_id = $1 AND status_id = $4 \
                                  AND completed_at >= $5 AND completed_at < $6) AS completed_today \
             FROM complaints",
        )
        .bind(employee_id)
        .bind(ComplaintStatus::Waiting.id())
        .bind(
            ComplaintStatus::IN_PROGRESS_GROUP
                .iter()
                .map(|s| s.id())
                .collect::<Vec<_>>(),
        )
        .bind(ComplaintStatus::Completed.id())
        .bind(day_start)
        .bind(day_end)
        .fetch_one(pool)
        .await
    }

    /// `(claimed, completed)` across all complaints that were ever claimed.
    pub async fn claimed_and_completed(pool: &PgPool) -> Result<(i64, i64), sqlx::Error> {
        sqlx::query_as(
            "SELECT \
                COUNT(*) FILTER (WHERE employee_id IS NOT NULL), \
                COUNT(*) FILTER (WHERE employee_id IS NOT NULL AND status_id = $1) \
             FROM complaints",
        )
        .bind(ComplaintStatus::Completed.id())
        .fetch_one(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("road"), "%road%");
    }
}
