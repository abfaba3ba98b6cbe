use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// GET / -- static liveness check. Does not contact downstream services.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "Kepler AI Backend is running",
    })
}

/// Mount the health check at the root.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}
