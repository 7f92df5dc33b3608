//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods. Reads
//! take `&PgPool`; writes that must share a unit of work take
//! `&mut PgConnection` so callers can pass `&mut *tx`.

pub mod category_repo;
pub mod complaint_repo;
pub mod notification_repo;
pub mod report_repo;
pub mod status_event_repo;
pub mod tracking_repo;
pub mod user_repo;

pub use category_repo::CategoryRepo;
pub use complaint_repo::ComplaintRepo;
pub use notification_repo::NotificationRepo;
pub use report_repo::ReportRepo;
pub use status_event_repo::StatusEventRepo;
pub use tracking_repo::TrackingSequenceRepo;
pub use user_repo::UserRepo;
