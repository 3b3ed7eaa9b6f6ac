//! Response envelope shared by the routers: `{"data": ...}` on success,
//! `{"error": {"code", "message"}}` on failure.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::error::ErrorKind;

pub const VALIDATION_ERROR_CODE: &str = "VALIDATION_ERROR";

pub fn data_response<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(json!({ "data": data }))).into_response()
}

pub fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    let payload = json!({
        "error": {
            "code": code,
            "message": message.into(),
        }
    });
    (status, Json(payload)).into_response()
}

pub fn validation_failure(message: impl Into<String>) -> Response {
    error_response(StatusCode::BAD_REQUEST, VALIDATION_ERROR_CODE, message)
}

pub const fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Infrastructure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn kind_failure(kind: ErrorKind, message: impl Into<String>) -> Response {
    error_response(status_for(kind), kind.code(), message)
}
