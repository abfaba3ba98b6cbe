//! Handlers for image and video generation through ComfyUI.
//!
//! Routes:
//! - `POST /api/image` -- SD 1.5 text-to-image
//! - `POST /api/video` -- CogVideoX text-to-video
//!
//! Both open the ComfyUI event socket, load and patch a template, run it
//! to completion and return the first artifact base64-encoded. Extra
//! artifacts are dropped.

use axum::extract::State;
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use kepler_comfyui::executor::ExecuteError;
use kepler_core::error::CoreError;
use kepler_core::generation::{
    ImageRequest, ImageResponse, VideoRequest, VideoResponse, IMAGE_FORMAT, VIDEO_FORMAT,
};
use kepler_core::workflow::{
    patch_image_workflow, patch_video_workflow, random_seed, WorkflowGraph, IMAGE_WORKFLOW,
    VIDEO_WORKFLOW,
};

use crate::error::AppResult;
use crate::state::AppState;

/// Detail returned by `/api/video` when ComfyUI refuses the connection.
pub const VIDEO_COMFYUI_UNREACHABLE: &str = "ComfyUI service is not reachable.";

/// POST /api/image
pub async fn generate_image(
    State(state): State<AppState>,
    Json(input): Json<ImageRequest>,
) -> AppResult<Json<ImageResponse>> {
    let unreachable = format!(
        "ComfyUI service is not reachable on port {}.",
        state.config.comfyui_port()
    );

    let artifact = first_artifact(&state, IMAGE_WORKFLOW, unreachable, |graph| {
        let seed = random_seed();
        tracing::info!(seed, width = input.width, height = input.height, "Patching image workflow");
        patch_image_workflow(graph, &input, seed)
    })
    .await
    .map_err(|e| e.context("Image generation failed"))?
    .ok_or_else(|| CoreError::EmptyResult("No images generated.".to_string()))?;

    Ok(Json(ImageResponse {
        image_base64: STANDARD.encode(artifact),
        format: IMAGE_FORMAT,
    }))
}

/// POST /api/video
pub async fn generate_video(
    State(state): State<AppState>,
    Json(input): Json<VideoRequest>,
) -> AppResult<Json<VideoResponse>> {
    let artifact = first_artifact(
        &state,
        VIDEO_WORKFLOW,
        VIDEO_COMFYUI_UNREACHABLE.to_string(),
        |graph| {
            tracing::info!(frames = input.frames, "Patching video workflow");
            patch_video_workflow(graph, &input, random_seed)
        },
    )
    .await
    .map_err(|e| e.context("Video generation failed"))?
    .ok_or_else(|| CoreError::EmptyResult("No video generated.".to_string()))?;

    Ok(Json(VideoResponse {
        video_base64: STANDARD.encode(artifact),
        format: VIDEO_FORMAT,
    }))
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Connect to ComfyUI, load `template`, apply `patch`, run it, and
/// return the first artifact produced (if any).
///
/// The connection comes first so a refused ComfyUI is always reported as
/// `unreachable`, whatever the state of the template.
async fn first_artifact(
    state: &AppState,
    template: &str,
    unreachable: String,
    patch: impl FnOnce(&mut WorkflowGraph) -> Result<(), CoreError>,
) -> Result<Option<Vec<u8>>, CoreError> {
    let map_execute = |e: ExecuteError| match e {
        ExecuteError::Unreachable(detail) => {
            tracing::warn!(detail = %detail, "ComfyUI refused the connection");
            CoreError::Unreachable(unreachable.clone())
        }
        missing @ ExecuteError::HistoryNotFound(_) => CoreError::NotFound(missing.to_string()),
        other => CoreError::UpstreamFailure(other.to_string()),
    };

    let conn = state.comfyui.connect().await.map_err(map_execute)?;

    let mut graph = state.workflows.load(template).await?;
    patch(&mut graph)?;

    let artifacts = state
        .comfyui
        .run(conn, &graph.into_value())
        .await
        .map_err(map_execute)?;

    if artifacts.len() > 1 {
        tracing::debug!(
            template,
            discarded = artifacts.len() - 1,
            "Returning first artifact only",
        );
    }

    Ok(artifacts.into_iter().next())
}
