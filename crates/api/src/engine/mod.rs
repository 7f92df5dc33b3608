//! Transactional services behind the HTTP handlers.
//!
//! - [`lifecycle::LifecycleEngine`] -- submission and every status
//!   transition, each as one unit of work (complaint row, ledger entry and
//!   notifications commit or roll back together).
//! - [`reports::ReportAggregator`] -- period metrics and report snapshots.
//!
//! Both return [`CoreError`]; store failures surface as
//! [`CoreError::Unavailable`] once the transaction has been dropped.

pub mod lifecycle;
pub mod reports;

use aduan_core::error::CoreError;
use aduan_core::roles::Role;
use aduan_core::types::DbId;

/// The authenticated user an operation runs on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: DbId,
    pub role: Role,
}

/// Log a store failure and turn it into the error callers see.
pub(crate) fn store_error(err: sqlx::Error) -> CoreError {
    tracing::error!(error = %err, "Store operation failed");
    CoreError::Unavailable(err.to_string())
}
