//! Per-day tracking-number counter (`complaint_daily_sequences`).

use chrono::NaiveDate;
use sqlx::PgConnection;

pub struct TrackingSequenceRepo;

impl TrackingSequenceRepo {
    /// Atomically take the next 1-based sequence value for `day`.
    ///
    /// The upsert row-locks the day's counter until the surrounding
    /// transaction ends, so concurrent submitters queue behind each other
    /// and a rollback hands the value back.
    pub async fn next_value(conn: &mut PgConnection, day: NaiveDate) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO complaint_daily_sequences (day, last_value) VALUES ($1, 1) \
             ON CONFLICT (day) DO UPDATE \
                SET last_value = complaint_daily_sequences.last_value + 1 \
             RETURNING last_value",
        )
        .bind(day)
        .fetch_one(conn)
        .await
    }
}
