//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - Insert DTOs and query filters for the matching repository

pub mod category;
pub mod complaint;
pub mod notification;
pub mod report_snapshot;
pub mod status_event;
pub mod user;
