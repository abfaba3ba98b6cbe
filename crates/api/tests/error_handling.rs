//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no server is
//! involved.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use kepler_api::error::AppError;
use kepler_core::error::CoreError;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn unreachable_returns_503_with_fixed_detail() {
    let err = AppError::Core(CoreError::Unreachable(
        "ComfyUI service is not reachable.".into(),
    ));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "SERVICE_UNREACHABLE");
    assert_eq!(json["detail"], "ComfyUI service is not reachable.");
}

#[tokio::test]
async fn empty_result_returns_500() {
    let err = AppError::Core(CoreError::EmptyResult("No images generated.".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "EMPTY_RESULT");
    assert_eq!(json["detail"], "No images generated.");
}

#[tokio::test]
async fn upstream_failure_keeps_message_text() {
    let err = AppError::Core(CoreError::UpstreamFailure(
        "Image generation failed: ComfyUI API error (400): invalid prompt".into(),
    ));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "UPSTREAM_FAILURE");
    assert_eq!(
        json["detail"],
        "Image generation failed: ComfyUI API error (400): invalid prompt"
    );
}

#[tokio::test]
async fn not_found_and_invalid_workflow_are_500() {
    let (status, json) =
        error_to_response(AppError::Core(CoreError::NotFound("gone".into()))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "NOT_FOUND");

    let (status, json) =
        error_to_response(AppError::Core(CoreError::InvalidWorkflow("bad".into()))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INVALID_WORKFLOW");
    assert_eq!(json["detail"], "Invalid workflow: bad");
}
