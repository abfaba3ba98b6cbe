//! End-to-end execution of one workflow.
//!
//! [`Executor::connect`] opens a fresh WebSocket; [`Executor::run`] then
//! queues the graph on it, blocks until ComfyUI reports completion, reads
//! the history record and downloads every produced file. Nothing is
//! shared between runs except the client ID.

use serde_json::Value;

use crate::api::{ComfyUIApi, ComfyUIApiError};
use crate::client::{ComfyUIClient, ComfyUIClientError, ComfyUIConnection};
use crate::history::{artifact_descriptors, history_entry};
use crate::processor::wait_for_completion;

/// Errors from [`Executor::connect`] and [`Executor::run`].
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    /// ComfyUI refused the WebSocket or HTTP connection.
    #[error("ComfyUI is not reachable: {0}")]
    Unreachable(String),

    /// The history response had no record for the submitted prompt.
    #[error("No history entry for prompt {0}")]
    HistoryNotFound(String),

    /// An HTTP call to ComfyUI failed after connecting.
    #[error(transparent)]
    Api(ComfyUIApiError),

    /// The WebSocket failed after connecting.
    #[error(transparent)]
    Client(ComfyUIClientError),
}

impl From<ComfyUIApiError> for ExecuteError {
    fn from(err: ComfyUIApiError) -> Self {
        if err.is_connect() {
            ExecuteError::Unreachable(err.to_string())
        } else {
            ExecuteError::Api(err)
        }
    }
}

impl From<ComfyUIClientError> for ExecuteError {
    fn from(err: ComfyUIClientError) -> Self {
        match err {
            ComfyUIClientError::Refused(url) => ExecuteError::Unreachable(url),
            other => ExecuteError::Client(other),
        }
    }
}

/// Drives workflows through one ComfyUI instance.
#[derive(Debug, Clone)]
pub struct Executor {
    client: ComfyUIClient,
    api: ComfyUIApi,
}

impl Executor {
    pub fn new(client: ComfyUIClient, api: ComfyUIApi) -> Self {
        Self { client, api }
    }

    /// Build an executor for `host` (e.g. `127.0.0.1:8188`) using plain
    /// `ws://` and `http://` URLs.
    pub fn for_host(host: &str, client_id: String) -> Self {
        Self::new(
            ComfyUIClient::new(client_id, format!("ws://{host}")),
            ComfyUIApi::new(format!("http://{host}")),
        )
    }

    /// Open the event socket for one run.
    ///
    /// Must happen before the workflow is queued, otherwise the
    /// completion event can be missed. A refused connection is
    /// [`ExecuteError::Unreachable`].
    pub async fn connect(&self) -> Result<ComfyUIConnection, ExecuteError> {
        Ok(self.client.connect().await?)
    }

    /// Queue `workflow` on `conn`, wait for it, and return every
    /// artifact's bytes in history order. The result may be empty.
    pub async fn run(
        &self,
        mut conn: ComfyUIConnection,
        workflow: &Value,
    ) -> Result<Vec<Vec<u8>>, ExecuteError> {
        let submitted = self
            .api
            .submit_workflow(workflow, &conn.client_id)
            .await?;
        let prompt_id = submitted.prompt_id;
        tracing::info!(
            prompt_id = %prompt_id,
            queue_position = submitted.number,
            "Workflow submitted to ComfyUI",
        );

        wait_for_completion(&mut conn.ws_stream, &prompt_id).await?;
        if let Err(e) = conn.ws_stream.close(None).await {
            tracing::debug!(error = %e, "Error closing ComfyUI WebSocket");
        }

        let history = self.api.get_history(&prompt_id).await?;
        let entry = history_entry(&history, &prompt_id)
            .ok_or_else(|| ExecuteError::HistoryNotFound(prompt_id.clone()))?;

        let descriptors = artifact_descriptors(entry);
        let mut artifacts = Vec::with_capacity(descriptors.len());
        for descriptor in &descriptors {
            let bytes = self
                .api
                .view(
                    &descriptor.filename,
                    &descriptor.subfolder,
                    &descriptor.folder_type,
                )
                .await?;
            tracing::debug!(
                prompt_id = %prompt_id,
                filename = %descriptor.filename,
                bytes = bytes.len(),
                "Fetched artifact",
            );
            artifacts.push(bytes);
        }

        tracing::info!(prompt_id = %prompt_id, count = artifacts.len(), "Artifacts retrieved");
        Ok(artifacts)
    }
}
