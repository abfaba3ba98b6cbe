#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::ws::{Message, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::routing::{get as route_get, post};
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tower::ServiceExt;

use kepler_api::config::ServerConfig;
use kepler_api::router::build_app_router;
use kepler_api::state::AppState;

/// Prompt ID the fake ComfyUI hands out for every submission.
pub const FAKE_PROMPT_ID: &str = "X";

/// Directory of the workflow templates shipped with the repository.
pub fn shipped_workflows_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../workflows")
}

/// Build a test `ServerConfig` pointing at the given downstream services.
pub fn test_config(comfyui_host: &str, ollama_url: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["*".to_string()],
        ollama_url: ollama_url.to_string(),
        comfyui_host: comfyui_host.to_string(),
        workflows_dir: shipped_workflows_dir(),
    }
}

/// Build the full application router with all middleware layers.
pub fn build_test_app(config: ServerConfig) -> Router {
    let state = AppState::new(config.clone(), "test-client".to_string());
    build_app_router(state, &config)
}

/// An address with nothing listening on it.
pub fn closed_addr() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);
    addr
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr.to_string()
}

// ---------------------------------------------------------------------------
// Fake ComfyUI
// ---------------------------------------------------------------------------

/// In-process ComfyUI stand-in.
///
/// Every submission is recorded and answered with [`FAKE_PROMPT_ID`];
/// each WebSocket then receives a binary preview and the completion
/// event. History and files are fixed at spawn time.
#[derive(Clone)]
pub struct FakeComfy {
    pub addr: String,
    submissions: Arc<Mutex<Vec<Value>>>,
}

impl FakeComfy {
    /// Workflow graphs submitted so far, in order.
    pub fn submitted_workflows(&self) -> Vec<Value> {
        self.submissions
            .lock()
            .unwrap()
            .iter()
            .map(|body| body["prompt"].clone())
            .collect()
    }
}

#[derive(Clone)]
struct FakeComfyState {
    history: Value,
    files: Arc<HashMap<String, Vec<u8>>>,
    submissions: Arc<Mutex<Vec<Value>>>,
    done_tx: broadcast::Sender<String>,
}

/// Spawn a fake ComfyUI whose history lists `files` as image outputs of
/// node `9`.
pub async fn spawn_fake_comfy(files: &[(&str, &[u8])]) -> FakeComfy {
    let images: Vec<Value> = files
        .iter()
        .map(|(name, _)| json!({ "filename": name, "subfolder": "", "type": "output" }))
        .collect();
    let outputs = if images.is_empty() {
        json!({})
    } else {
        json!({ "9": { "images": images } })
    };
    let history = json!({ FAKE_PROMPT_ID: { "outputs": outputs } });

    let (done_tx, _) = broadcast::channel(8);
    let state = FakeComfyState {
        history,
        files: Arc::new(
            files
                .iter()
                .map(|(name, bytes)| (name.to_string(), bytes.to_vec()))
                .collect(),
        ),
        submissions: Arc::new(Mutex::new(Vec::new())),
        done_tx,
    };
    let submissions = Arc::clone(&state.submissions);

    let app = Router::new()
        .route("/prompt", post(fake_submit))
        .route("/history/{id}", route_get(fake_history))
        .route("/view", route_get(fake_view))
        .route("/ws", route_get(fake_ws))
        .with_state(state);

    FakeComfy {
        addr: serve(app).await,
        submissions,
    }
}

async fn fake_submit(State(state): State<FakeComfyState>, Json(body): Json<Value>) -> Json<Value> {
    state.submissions.lock().unwrap().push(body);
    let _ = state.done_tx.send(FAKE_PROMPT_ID.to_string());
    Json(json!({ "prompt_id": FAKE_PROMPT_ID, "number": 0, "node_errors": {} }))
}

async fn fake_history(State(state): State<FakeComfyState>, Path(id): Path<String>) -> Json<Value> {
    if id == FAKE_PROMPT_ID {
        Json(state.history.clone())
    } else {
        Json(json!({}))
    }
}

async fn fake_view(
    State(state): State<FakeComfyState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Vec<u8>, StatusCode> {
    let name = params.get("filename").cloned().unwrap_or_default();
    state.files.get(&name).cloned().ok_or(StatusCode::NOT_FOUND)
}

async fn fake_ws(State(state): State<FakeComfyState>, upgrade: WebSocketUpgrade) -> Response {
    let mut rx = state.done_tx.subscribe();
    upgrade.on_upgrade(move |mut socket| async move {
        if let Ok(prompt_id) = rx.recv().await {
            let _ = socket.send(Message::Binary(vec![0u8; 16].into())).await;
            let done = json!({ "type": "executing", "data": { "node": null, "prompt_id": prompt_id } });
            let _ = socket.send(Message::Text(done.to_string().into())).await;
        }
        while let Some(Ok(_)) = socket.recv().await {}
    })
}

// ---------------------------------------------------------------------------
// Fake Ollama
// ---------------------------------------------------------------------------

/// Spawn a fake Ollama that echoes the request it received.
pub async fn spawn_fake_ollama() -> String {
    let app = Router::new().route(
        "/api/generate",
        post(|Json(body): Json<Value>| async move {
            Json(json!({
                "model": body["model"],
                "response": format!("echo: {}", body["prompt"].as_str().unwrap_or_default()),
                "stream": body["stream"],
                "done": true,
            }))
        }),
    );
    format!("http://{}", serve(app).await)
}
