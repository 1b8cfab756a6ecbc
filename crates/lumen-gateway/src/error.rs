// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rendering of [`LumenError`] as HTTP error responses.

use std::any::Any;

use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lumen_core::LumenError;
use lumen_core::types::{ErrorBody, now_iso8601};
use tracing::{error, warn};

/// Wraps every error returned by a route handler.
///
/// Renders `{error, details?, code, timestamp}` with the status derived from
/// the error kind, and logs the failure once.
#[derive(Debug)]
pub struct ApiError(pub LumenError);

impl From<LumenError> for ApiError {
    fn from(err: LumenError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(LumenError::validation(
            "request body is not valid JSON",
            Some(rejection.body_text()),
        ))
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError(LumenError::validation(
            "request body is not a valid multipart form",
            Some(rejection.body_text()),
        ))
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError(LumenError::validation(
            "request body is not a valid multipart form",
            Some(err.body_text()),
        ))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(status = status.as_u16(), code = %err.code(), error = %err, "request failed");
        } else {
            warn!(status = status.as_u16(), code = %err.code(), error = %err, "request rejected");
        }

        let body = ErrorBody {
            error: err.user_message(),
            details: err.details(),
            code: err.code(),
            timestamp: now_iso8601(),
        };
        (status, Json(body)).into_response()
    }
}

/// Renders a handler panic as a generic INTERNAL error.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    error!(panic = %detail, "request handler panicked");
    ApiError(LumenError::Internal("request handler panicked".to_string())).into_response()
}
