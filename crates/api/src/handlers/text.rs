use axum::extract::State;
use axum::Json;
use kepler_core::error::CoreError;
use kepler_core::generation::TextRequest;

use crate::error::AppResult;
use crate::state::AppState;

/// Detail returned when the text daemon refuses the connection.
pub const OLLAMA_UNREACHABLE: &str = "Ollama service is not reachable. Is it running?";

/// POST /api/text
///
/// Forwards the prompt and model name to Ollama with streaming disabled
/// and returns the daemon's JSON untouched.
pub async fn generate_text(
    State(state): State<AppState>,
    Json(input): Json<TextRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let output = state
        .ollama
        .generate(&input.model, &input.prompt)
        .await
        .map_err(|e| {
            if e.is_unreachable() {
                CoreError::Unreachable(OLLAMA_UNREACHABLE.to_string())
            } else {
                CoreError::UpstreamFailure(e.to_string())
            }
        })?;

    Ok(Json(output))
}
