//! Success envelope: `{"success": true, "data": ...}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

/// Wrap `data` in the success envelope with the given status.
pub fn success<T: Serialize>(status: StatusCode, data: T) -> Response {
    (
        status,
        Json(ApiResponse {
            success: true,
            data,
        }),
    )
        .into_response()
}

/// `200 OK` with `data`.
pub fn ok<T: Serialize>(data: T) -> Response {
    success(StatusCode::OK, data)
}
