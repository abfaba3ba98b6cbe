//! WebSocket client for connecting to a ComfyUI instance.
//!
//! [`ComfyUIClient`] holds the connection configuration, including the
//! client ID that ComfyUI uses to address progress events. Call
//! [`ComfyUIClient::connect`] to open a fresh [`ComfyUIConnection`].

use tokio_tungstenite::tungstenite;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// The raw WebSocket stream type produced by [`ComfyUIClient::connect`].
pub type ComfyUIStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Configuration handle for a ComfyUI instance.
#[derive(Debug, Clone)]
pub struct ComfyUIClient {
    client_id: String,
    ws_url: String,
}

/// A live WebSocket connection to a ComfyUI instance.
pub struct ComfyUIConnection {
    /// Client ID sent during the WebSocket handshake.
    pub client_id: String,
    /// The raw WebSocket stream for reading frames.
    pub ws_stream: ComfyUIStream,
}

impl ComfyUIClient {
    /// Create a new client.
    ///
    /// * `client_id` - identifier sent as `clientId`; the same value must
    ///   accompany every workflow submission.
    /// * `ws_url`    - WebSocket base URL, e.g. `ws://127.0.0.1:8188`.
    pub fn new(client_id: String, ws_url: String) -> Self {
        Self { client_id, ws_url }
    }

    /// Connect to the ComfyUI WebSocket endpoint at `/ws?clientId=<id>`.
    pub async fn connect(&self) -> Result<ComfyUIConnection, ComfyUIClientError> {
        let url = format!("{}/ws?clientId={}", self.ws_url, self.client_id);

        let (ws_stream, _response) = connect_async(&url).await.map_err(|e| {
            if is_connection_refused(&e) {
                ComfyUIClientError::Refused(self.ws_url.clone())
            } else {
                ComfyUIClientError::Connection(format!(
                    "Failed to connect to ComfyUI at {}: {e}",
                    self.ws_url
                ))
            }
        })?;

        tracing::debug!(
            client_id = %self.client_id,
            "Connected to ComfyUI at {}",
            self.ws_url,
        );

        Ok(ComfyUIConnection {
            client_id: self.client_id.clone(),
            ws_stream,
        })
    }
}

fn is_connection_refused(err: &tungstenite::Error) -> bool {
    matches!(err, tungstenite::Error::Io(io) if io.kind() == std::io::ErrorKind::ConnectionRefused)
}

/// Errors that can occur when working with the WebSocket client.
#[derive(Debug, thiserror::Error)]
pub enum ComfyUIClientError {
    /// Nothing is listening at the WebSocket address.
    #[error("Connection refused by ComfyUI at {0}")]
    Refused(String),

    /// Failed to establish the WebSocket connection for another reason.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A protocol-level error on an already-established connection.
    #[error("Protocol error: {0}")]
    Protocol(String),
}
