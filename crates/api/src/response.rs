//! Shared response envelope for API handlers.
//!
//! Successful responses use `{ "success": true, "data": ... }`; failures are
//! rendered by [`crate::error::AppError`]. Use [`DataResponse`] instead of
//! ad-hoc `serde_json::json!` so every handler serializes the same shape.

use axum::Json;
use serde::Serialize;

/// Standard `{ "success": true, "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Wrap `data` in the envelope, ready to return from a handler.
pub fn ok<T: Serialize>(data: T) -> Json<DataResponse<T>> {
    Json(DataResponse::new(data))
}
