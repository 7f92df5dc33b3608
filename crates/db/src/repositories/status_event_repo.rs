//! Repository for the `complaint_status_events` audit ledger.
//!
//! Append-only: there is deliberately no update or delete method.

use aduan_core::lifecycle::ComplaintStatus;
use aduan_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::status_event::{StatusEvent, StatusEventEntry};

const COLUMNS: &str = "id, complaint_id, status_id, note, actor_id, created_at";

pub struct StatusEventRepo;

impl StatusEventRepo {
    /// Record a status change inside the caller's transaction.
    pub async fn append(
        conn: &mut PgConnection,
        complaint_id: DbId,
        status: ComplaintStatus,
        note: &str,
        actor_id: DbId,
        at: Timestamp,
    ) -> Result<StatusEvent, sqlx::Error> {
        let query = format!(
            "INSERT INTO complaint_status_events (complaint_id, status_id, note, actor_id, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StatusEvent>(&query)
            .bind(complaint_id)
            .bind(status.id())
            .bind(note)
            .bind(actor_id)
            .bind(at)
            .fetch_one(conn)
            .await
    }

    /// Full history of one complaint, oldest first. Insertion order breaks
    /// timestamp ties.
    pub async fn list_for_complaint(
        pool: &PgPool,
        complaint_id: DbId,
    ) -> Result<Vec<StatusEventEntry>, sqlx::Error> {
        sqlx::query_as::<_, StatusEventEntry>(
            "SELECT e.id, e.complaint_id, e.status_id, e.note, e.actor_id, e.created_at, \
                    u.name AS actor_name \
             FROM complaint_status_events e \
             JOIN users u ON u.id = e.actor_id \
             WHERE e.complaint_id = $1 \
             ORDER BY e.created_at ASC, e.id ASC",
        )
        .bind(complaint_id)
        .fetch_all(pool)
        .await
    }
}
