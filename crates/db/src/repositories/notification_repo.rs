//! Repository for the `notifications` table.

use aduan_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::notification::{Notification, ReadFilter};

/// Column list for `notifications` queries.
const COLUMNS: &str = "id, user_id, complaint_id, title, body, is_read, read_at, created_at";

/// Creates notifications for lifecycle events and serves the read side.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Create one notification inside the caller's transaction.
    pub async fn notify(
        conn: &mut PgConnection,
        user_id: DbId,
        complaint_id: Option<DbId>,
        title: &str,
        body: &str,
        at: Timestamp,
    ) -> Result<Notification, sqlx::Error> {
        let query = format!(
            "INSERT INTO notifications (user_id, complaint_id, title, body, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(complaint_id)
            .bind(title)
            .bind(body)
            .bind(at)
            .fetch_one(conn)
            .await
    }

    /// Create the same notification for every user in `user_ids`, one row
    /// each, in a single statement.
    pub async fn notify_many(
        conn: &mut PgConnection,
        user_ids: &[DbId],
        complaint_id: Option<DbId>,
        title: &str,
        body: &str,
        at: Timestamp,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "INSERT INTO notifications (user_id, complaint_id, title, body, created_at) \
             SELECT target, $2, $3, $4, $5 FROM UNNEST($1::BIGINT[]) AS target \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(user_ids)
            .bind(complaint_id)
            .bind(title)
            .bind(body)
            .bind(at)
            .fetch_all(conn)
            .await
    }

    /// List notifications for a user, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        filter: ReadFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE user_id = $1 AND ($2::BOOL IS NULL OR is_read = $2) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(filter.is_read())
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count notifications for a user under `filter`.
    pub async fn count_for_user(
        pool: &PgPool,
        user_id: DbId,
        filter: ReadFilter,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications \
             WHERE user_id = $1 AND ($2::BOOL IS NULL OR is_read = $2)",
        )
        .bind(user_id)
        .bind(filter.is_read())
        .fetch_one(pool)
        .await
    }

    /// Mark a single notification as read.
    ///
    /// Returns `true` if the notification belongs to the given user. Marking
    /// an already-read notification keeps its original `read_at`.
    pub async fn mark_read(
        pool: &PgPool,
        notification_id: DbId,
        user_id: DbId,
        at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_read = true, read_at = COALESCE(read_at, $3) \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(notification_id)
        .bind(user_id)
        .bind(at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark all unread notifications as read for a user.
    ///
    /// Returns the number of notifications that were marked read.
    pub async fn mark_all_read(
        pool: &PgPool,
        user_id: DbId,
        at: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_read = true, read_at = $2 \
             WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .bind(at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Get the number of unread notifications for a user.
    pub async fn unread_count(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        Self::count_for_user(pool, user_id, ReadFilter::Unread).await
    }
}
