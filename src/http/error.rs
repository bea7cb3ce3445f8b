//! Error-to-HTTP response conversion.
//!
//! Handlers return `Result<T, AppError>`; the body is always
//! `{"error": {"kind", "message", "segments"?}, "request_id"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::domain::errors::DomainError;

/// Wrapper so we can implement `IntoResponse` for the domain error.
#[derive(Debug)]
pub struct AppError {
    inner: DomainError,
    request_id: Option<String>,
}

impl AppError {
    pub fn new(inner: DomainError) -> Self {
        Self {
            inner,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        status_for(&self.inner)
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        Self::new(e)
    }
}

pub fn status_for(error: &DomainError) -> StatusCode {
    match error {
        DomainError::InvalidSegment { .. } | DomainError::BadArgs(_) => StatusCode::BAD_REQUEST,
        DomainError::Upstream(_) => StatusCode::BAD_REQUEST,
        DomainError::SourceUnavailable(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DomainError::DownloadFailed(_) | DomainError::ToolFailed { .. } => StatusCode::BAD_GATEWAY,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        DomainError::Cancelled | DomainError::ToolNotFound(_) => StatusCode::SERVICE_UNAVAILABLE,
        DomainError::CutFailed { .. }
        | DomainError::ConcatFailed { .. }
        | DomainError::CleanupFailed(_)
        | DomainError::FsFail(_)
        | DomainError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                kind = self.inner.kind(),
                error = %self.inner,
                "Server error in API handler"
            );
        } else {
            tracing::debug!(status = %status, kind = self.inner.kind(), error = %self.inner, "request rejected");
        }

        let mut error = json!({
            "kind": self.inner.kind(),
            "message": self.inner.to_string(),
        });
        let failures = self.inner.segment_failures();
        if !failures.is_empty() {
            error["segments"] = json!(failures);
        }

        let body = json!({
            "error": error,
            "request_id": self.request_id,
        });

        (status, axum::Json(body)).into_response()
    }
}
