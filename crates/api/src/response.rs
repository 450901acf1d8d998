//! Success envelope and error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use fundline_core::ledger::LedgerError;
use fundline_shared::AppError;
use serde::Serialize;
use serde_json::json;

/// `{success, data, message?, timestamp}` wrapper for every successful response.
#[derive(Debug, Serialize)]
pub struct ApiSuccess<T> {
    /// Always `true`.
    pub success: bool,
    /// Payload.
    pub data: T,
    /// Human-readable note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    /// When the response was produced.
    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> ApiSuccess<T> {
    /// Wraps `data` without a message.
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
            timestamp: Utc::now(),
        }
    }

    /// Wraps `data` with a message.
    pub fn with_message(data: T, message: &'static str) -> Self {
        Self {
            message: Some(message),
            ..Self::new(data)
        }
    }

    /// 200 response.
    pub fn ok(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }

    /// 201 response.
    pub fn created(self) -> Response {
        (StatusCode::CREATED, Json(self)).into_response()
    }
}

/// Error response rendered as `{"error": message}` with the mapped status.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// 400 with the given message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(AppError::Validation(message.into()))
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = if self.0.is_internal() {
            tracing::error!(error = %self.0, "request failed");
            "An error occurred".to_string()
        } else {
            tracing::debug!(error = %self.0, code = self.0.error_code(), "request rejected");
            self.0.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Handler result type.
pub type ApiResult = Result<Response, ApiError>;
