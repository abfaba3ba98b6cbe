//! ComfyUI WebSocket message types and parser.
//!
//! ComfyUI sends JSON text frames shaped `{"type": "<kind>", "data": {...}}`.
//! Only the kinds the executor reacts to or logs are modelled; anything
//! else fails to parse and is skipped by the caller.

use serde::Deserialize;

/// Known ComfyUI WebSocket message types.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ComfyUIMessage {
    /// Server status broadcast (queue depth).
    #[serde(rename = "status")]
    Status(StatusData),

    /// A prompt has started executing.
    #[serde(rename = "execution_start")]
    ExecutionStart(PromptRef),

    /// A node is executing, or the prompt finished when `node` is `None`.
    #[serde(rename = "executing")]
    Executing(ExecutingData),

    /// Step-level progress from a long-running node (e.g. a sampler).
    #[serde(rename = "progress")]
    Progress(ProgressData),

    /// Execution failed with an error.
    #[serde(rename = "execution_error")]
    ExecutionError(ErrorData),
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusData {
    pub status: QueueStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueStatus {
    pub exec_info: ExecInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecInfo {
    pub queue_remaining: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptRef {
    pub prompt_id: String,
}

/// Payload for `executing` messages.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutingData {
    pub node: Option<String>,
    /// Older ComfyUI builds omit this on per-node events.
    #[serde(default)]
    pub prompt_id: Option<String>,
}

impl ExecutingData {
    /// True when this event signals that `prompt_id` has finished.
    pub fn completes(&self, prompt_id: &str) -> bool {
        self.node.is_none() && self.prompt_id.as_deref() == Some(prompt_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgressData {
    pub value: i32,
    pub max: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorData {
    pub prompt_id: String,
    #[serde(default)]
    pub node_id: Option<String>,
    #[serde(default)]
    pub exception_message: String,
    #[serde(default)]
    pub exception_type: String,
}

/// Parse a ComfyUI WebSocket text message into a typed enum.
///
/// Returns `Err` for malformed JSON or unmodelled `type` values.
pub fn parse_message(text: &str) -> Result<ComfyUIMessage, serde_json::Error> {
    serde_json::from_str(text)
}
