//! HTTP side of the ComfyUI protocol.
//!
//! Three calls are needed per generation: queue the graph (`/prompt`),
//! read what it produced (`/history/{id}`), and download each file
//! (`/view`).

use serde::Deserialize;
use serde_json::Value;

/// `reqwest` wrapper bound to one ComfyUI base URL.
#[derive(Debug, Clone)]
pub struct ComfyUIApi {
    client: reqwest::Client,
    api_url: String,
}

/// Body of a successful `POST /prompt`.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    /// Correlates the completion event and the history record.
    pub prompt_id: String,
    /// Queue position at submission time.
    #[serde(default)]
    pub number: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum ComfyUIApiError {
    /// Transport or decoding failure.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// ComfyUI answered with a non-2xx status.
    #[error("ComfyUI API error ({status}): {body}")]
    ApiError { status: u16, body: String },
}

impl ComfyUIApiError {
    /// Whether the failure was a refused or otherwise failed TCP connect.
    pub fn is_connect(&self) -> bool {
        matches!(self, ComfyUIApiError::Request(e) if e.is_connect())
    }
}

impl ComfyUIApi {
    /// `api_url` is the HTTP base, e.g. `http://127.0.0.1:8188`.
    pub fn new(api_url: String) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    pub fn with_client(client: reqwest::Client, api_url: String) -> Self {
        Self { client, api_url }
    }

    /// Queue `workflow` for execution.
    ///
    /// Progress events go to the WebSocket registered under `client_id`.
    pub async fn submit_workflow(
        &self,
        workflow: &Value,
        client_id: &str,
    ) -> Result<SubmitResponse, ComfyUIApiError> {
        let payload = serde_json::json!({
            "prompt": workflow,
            "client_id": client_id,
        });

        let response = self
            .client
            .post(self.endpoint("prompt"))
            .json(&payload)
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    /// Fetch the raw history document for `prompt_id`.
    ///
    /// The document is keyed by prompt ID; see
    /// [`crate::history::history_entry`].
    pub async fn get_history(&self, prompt_id: &str) -> Result<Value, ComfyUIApiError> {
        let response = self
            .client
            .get(self.endpoint(&format!("history/{prompt_id}")))
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    /// Download one output file as raw bytes.
    pub async fn view(
        &self,
        filename: &str,
        subfolder: &str,
        folder_type: &str,
    ) -> Result<Vec<u8>, ComfyUIApiError> {
        let response = self
            .client
            .get(self.endpoint("view"))
            .query(&[
                ("filename", filename),
                ("subfolder", subfolder),
                ("type", folder_type),
            ])
            .send()
            .await?;

        Ok(check_status(response).await?.bytes().await?.to_vec())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.api_url.trim_end_matches('/'))
    }
}

/// Turn a non-2xx response into [`ComfyUIApiError::ApiError`].
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ComfyUIApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ComfyUIApiError::ApiError {
        status: status.as_u16(),
        body,
    })
}
