pub mod auth;
pub mod category;
pub mod complaint;
pub mod employee;
pub mod notification;
pub mod report;
