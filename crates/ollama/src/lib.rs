//! REST client for an Ollama text-completion daemon.
//!
//! Only the non-streaming `/api/generate` call is wrapped. The response
//! body is handed back as raw JSON so callers can pass it through
//! unmodified.

/// HTTP client for one Ollama daemon.
#[derive(Debug, Clone)]
pub struct OllamaApi {
    client: reqwest::Client,
    base_url: String,
}

/// Errors from the Ollama REST layer.
#[derive(Debug, thiserror::Error)]
pub enum OllamaError {
    /// The HTTP request itself failed (network, decoding, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Ollama returned a non-2xx status code.
    #[error("Ollama API error ({status}): {body}")]
    ApiError { status: u16, body: String },
}

impl OllamaError {
    /// Whether the daemon could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, OllamaError::Request(e) if e.is_connect())
    }
}

impl OllamaApi {
    /// * `base_url` - daemon root, e.g. `http://localhost:11434`.
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Run one completion with streaming disabled.
    ///
    /// Sends `POST /api/generate` with `{model, prompt, stream: false}`.
    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<serde_json::Value, OllamaError> {
        let body = serde_json::json!({
            "model": model,
            "prompt": prompt,
            "stream": false,
        });

        tracing::debug!(model, prompt_len = prompt.len(), "Forwarding prompt to Ollama");

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(OllamaError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}
