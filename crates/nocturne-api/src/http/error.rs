//! Application error type mapping to HTTP status codes.
//!
//! Bodies are short plain-text reasons. Nothing secret ever ends up in one.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Missing or invalid signature.
    Unauthorized(&'static str),
    /// Body could not be read or parsed.
    MalformedInput(String),
    /// Server-side failure, e.g. an unreadable credential file.
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
            AppError::MalformedInput(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error handling request");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
            }
        }
    }
}
