use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use shopfront_core::StoreError;

/// Map a core error onto the wire.
///
/// Expected categories become structured 4xx bodies; `Server` is logged in
/// full and surfaced opaquely.
pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        StoreError::NotFound(what) => {
            json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
        }
        StoreError::InsufficientStock { available } => (
            StatusCode::CONFLICT,
            axum::Json(json!({
                "error": "insufficient_stock",
                "message": format!("insufficient stock: {available} available"),
                "available": available,
            })),
        )
            .into_response(),
        StoreError::AlreadyAvailable => json_error(
            StatusCode::CONFLICT,
            "already_available",
            "product is already in stock",
        ),
        StoreError::Duplicate(msg) => json_error(StatusCode::CONFLICT, "duplicate", msg),
        StoreError::Server(detail) => {
            tracing::error!(error = %detail, "internal error");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal error",
            )
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
