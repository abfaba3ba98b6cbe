pub mod health;

use axum::routing::post;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /text      POST   proxy a prompt to Ollama
/// /image     POST   text-to-image through ComfyUI
/// /video     POST   text-to-video through ComfyUI
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/text", post(handlers::text::generate_text))
        .route("/image", post(handlers::media::generate_image))
        .route("/video", post(handlers::media::generate_video))
}
