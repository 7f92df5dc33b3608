//! Domain logic for the complaint service.
//!
//! Pure types and rules with no I/O: the lifecycle transition table, the
//! access policy, tracking-number format, notification wording, report
//! arithmetic, and the injectable clock. The db and api crates build on it.

pub mod access;
pub mod clock;
pub mod error;
pub mod lifecycle;
pub mod notification;
pub mod pagination;
pub mod report;
pub mod roles;
pub mod tracking;
pub mod types;
pub mod upload;
