use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kepler_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and implements [`IntoResponse`] to produce
/// consistent JSON error responses of the form
/// `{"detail": "...", "code": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `kepler_core`.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

/// Status code and machine-readable code for each error kind.
pub fn classify(err: &CoreError) -> (StatusCode, &'static str) {
    match err {
        CoreError::Unreachable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNREACHABLE"),
        CoreError::NotFound(_) => (StatusCode::INTERNAL_SERVER_ERROR, "NOT_FOUND"),
        CoreError::InvalidWorkflow(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INVALID_WORKFLOW"),
        CoreError::UpstreamFailure(_) => (StatusCode::INTERNAL_SERVER_ERROR, "UPSTREAM_FAILURE"),
        CoreError::EmptyResult(_) => (StatusCode::INTERNAL_SERVER_ERROR, "EMPTY_RESULT"),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let AppError::Core(core) = self;
        let (status, code) = classify(&core);
        let message = core.to_string();

        if status == StatusCode::SERVICE_UNAVAILABLE {
            tracing::warn!(code, error = %message, "Downstream service unreachable");
        } else {
            tracing::error!(code, error = %message, "Generation request failed");
        }

        let body = json!({
            "detail": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
