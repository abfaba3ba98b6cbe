//! Blocking wait on the ComfyUI event stream.
//!
//! Reads frames until ComfyUI reports that a specific prompt has
//! finished executing. There is no timeout and no cancellation: the
//! caller waits for as long as the generation takes.

use futures::{Stream, StreamExt};
use tokio_tungstenite::tungstenite::{self, Message};

use crate::client::ComfyUIClientError;
use crate::messages::{parse_message, ComfyUIMessage};

/// Read frames from `ws_stream` until `prompt_id` completes.
///
/// Completion is an `executing` event whose `node` is null and whose
/// `prompt_id` matches. Binary frames (previews) and every other event,
/// including `execution_error`, are logged and skipped. Fails only if the
/// stream closes or errors before completion arrives.
pub async fn wait_for_completion<S>(
    ws_stream: &mut S,
    prompt_id: &str,
) -> Result<(), ComfyUIClientError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    while let Some(msg_result) = ws_stream.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                if handle_text_message(&text, prompt_id) {
                    tracing::info!(prompt_id, "Execution completed");
                    return Ok(());
                }
            }
            Ok(Message::Binary(data)) => {
                tracing::trace!(prompt_id, bytes = data.len(), "Ignoring binary preview frame");
            }
            Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
            Ok(Message::Close(frame)) => {
                tracing::warn!(prompt_id, ?frame, "ComfyUI closed the WebSocket before completion");
                return Err(ComfyUIClientError::Protocol(format!(
                    "WebSocket closed before prompt {prompt_id} completed"
                )));
            }
            Err(e) => {
                tracing::error!(prompt_id, error = %e, "WebSocket receive error");
                return Err(ComfyUIClientError::Protocol(e.to_string()));
            }
        }
    }

    Err(ComfyUIClientError::Protocol(format!(
        "WebSocket stream ended before prompt {prompt_id} completed"
    )))
}

/// Log one text frame. Returns `true` if it completes `prompt_id`.
fn handle_text_message(text: &str, prompt_id: &str) -> bool {
    match parse_message(text) {
        Ok(ComfyUIMessage::Executing(data)) => {
            if data.completes(prompt_id) {
                return true;
            }
            if let Some(node) = &data.node {
                tracing::debug!(prompt_id, node = %node, "Executing node");
            }
            false
        }
        Ok(ComfyUIMessage::Progress(data)) => {
            tracing::debug!(prompt_id, value = data.value, max = data.max, "Generation progress");
            false
        }
        Ok(ComfyUIMessage::ExecutionStart(data)) => {
            tracing::debug!(started = %data.prompt_id, "Execution started");
            false
        }
        Ok(ComfyUIMessage::ExecutionError(data)) => {
            tracing::error!(
                failed = %data.prompt_id,
                node_id = ?data.node_id,
                error_type = %data.exception_type,
                error_message = %data.exception_message,
                "ComfyUI reported an execution error",
            );
            false
        }
        Ok(ComfyUIMessage::Status(data)) => {
            tracing::trace!(
                queue_remaining = data.status.exec_info.queue_remaining,
                "ComfyUI queue status",
            );
            false
        }
        Err(e) => {
            tracing::trace!(error = %e, "Skipping unrecognised ComfyUI message");
            false
        }
    }
}
