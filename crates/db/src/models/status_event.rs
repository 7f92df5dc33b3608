//! Audit ledger entries.

use aduan_core::types::{DbId, StatusId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the append-only `complaint_status_events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StatusEvent {
    pub id: DbId,
    pub complaint_id: DbId,
    pub status_id: StatusId,
    pub note: String,
    pub actor_id: DbId,
    pub created_at: Timestamp,
}

/// A ledger entry with the actor's display name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StatusEventEntry {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub event: StatusEvent,
    pub actor_name: String,
}
