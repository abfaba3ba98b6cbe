//! End-to-end tests for [`Executor`] against an in-process fake ComfyUI.
//!
//! The fake serves `/prompt`, `/history/{id}`, `/view` and `/ws` on an
//! ephemeral port. Each WebSocket waits for the next submission, then
//! sends one binary preview frame followed by the completion event.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use axum::extract::ws::{Message, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use kepler_comfyui::executor::{ExecuteError, Executor};
use serde_json::{json, Value};
use tokio::sync::broadcast;

const PROMPT_ID: &str = "X";

#[derive(Clone)]
struct Fake {
    history: Value,
    files: Arc<HashMap<String, Vec<u8>>>,
    submissions: Arc<Mutex<Vec<Value>>>,
    done_tx: broadcast::Sender<String>,
}

async fn fake_submit(State(fake): State<Fake>, Json(body): Json<Value>) -> Json<Value> {
    fake.submissions.lock().unwrap().push(body);
    let _ = fake.done_tx.send(PROMPT_ID.to_string());
    Json(json!({ "prompt_id": PROMPT_ID, "number": 1, "node_errors": {} }))
}

async fn fake_history(State(fake): State<Fake>, Path(id): Path<String>) -> Json<Value> {
    if id == PROMPT_ID {
        Json(fake.history.clone())
    } else {
        Json(json!({}))
    }
}

async fn fake_view(
    State(fake): State<Fake>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Vec<u8>, StatusCode> {
    let name = params.get("filename").cloned().unwrap_or_default();
    fake.files.get(&name).cloned().ok_or(StatusCode::NOT_FOUND)
}

async fn fake_ws(State(fake): State<Fake>, upgrade: WebSocketUpgrade) -> axum::response::Response {
    let mut rx = fake.done_tx.subscribe();
    upgrade.on_upgrade(move |mut socket| async move {
        if let Ok(prompt_id) = rx.recv().await {
            let _ = socket.send(Message::Binary(vec![0u8, 1, 2].into())).await;
            let done = json!({ "type": "executing", "data": { "node": null, "prompt_id": prompt_id } });
            let _ = socket.send(Message::Text(done.to_string().into())).await;
        }
        // Keep the socket open until the client hangs up.
        while let Some(Ok(_)) = socket.recv().await {}
    })
}

async fn spawn_fake(history: Value, files: &[(&str, &[u8])]) -> (String, Fake) {
    let (done_tx, _) = broadcast::channel(8);
    let fake = Fake {
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

    let app = Router::new()
        .route("/prompt", post(fake_submit))
        .route("/history/{id}", get(fake_history))
        .route("/view", get(fake_view))
        .route("/ws", get(fake_ws))
        .with_state(fake.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr.to_string(), fake)
}

/// Connect, then run `workflow` on the fresh connection.
async fn execute(executor: &Executor, workflow: &Value) -> Result<Vec<Vec<u8>>, ExecuteError> {
    let conn = executor.connect().await?;
    executor.run(conn, workflow).await
}

// ---------------------------------------------------------------------------
// Test: artifacts come back in history order, all fetched
// ---------------------------------------------------------------------------

#[tokio::test]
async fn execute_returns_all_artifacts_in_order() {
    let history = json!({
        "X": {
            "outputs": {
                "9": {
                    "images": [ { "filename": "first.png", "subfolder": "", "type": "output" } ],
                    "gifs": [ { "filename": "second.gif", "subfolder": "", "type": "output" } ]
                },
                "10": {
                    "videos": [ { "filename": "third.mp4", "subfolder": "", "type": "output" } ]
                }
            }
        }
    });
    let (host, fake) = spawn_fake(
        history,
        &[
            ("first.png", b"png-bytes"),
            ("second.gif", b"gif-bytes"),
            ("third.mp4", b"mp4-bytes"),
        ],
    )
    .await;

    let executor = Executor::for_host(&host, "client-1".into());
    let workflow = json!({ "6": { "class_type": "CLIPTextEncode", "inputs": { "text": "a cat" } } });

    let artifacts = execute(&executor, &workflow).await.unwrap();

    assert_eq!(
        artifacts,
        vec![b"png-bytes".to_vec(), b"gif-bytes".to_vec(), b"mp4-bytes".to_vec()]
    );

    let submissions = fake.submissions.lock().unwrap();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0]["client_id"], "client-1");
    assert_eq!(submissions[0]["prompt"], workflow);
}

// ---------------------------------------------------------------------------
// Test: a history record without outputs yields an empty result
// ---------------------------------------------------------------------------

#[tokio::test]
async fn execute_with_no_outputs_returns_empty() {
    let (host, _fake) = spawn_fake(json!({ "X": { "outputs": {} } }), &[]).await;
    let executor = Executor::for_host(&host, "client-2".into());

    let artifacts = execute(&executor, &json!({})).await.unwrap();
    assert!(artifacts.is_empty());
}

// ---------------------------------------------------------------------------
// Test: missing history record is reported, not treated as empty
// ---------------------------------------------------------------------------

#[tokio::test]
async fn execute_without_history_entry_fails() {
    let (host, _fake) = spawn_fake(json!({ "someone-else": { "outputs": {} } }), &[]).await;
    let executor = Executor::for_host(&host, "client-3".into());

    let err = execute(&executor, &json!({})).await.unwrap_err();
    assert_matches!(err, ExecuteError::HistoryNotFound(ref id) if id == PROMPT_ID);
}

// ---------------------------------------------------------------------------
// Test: a failed artifact download fails the whole execution
// ---------------------------------------------------------------------------

#[tokio::test]
async fn execute_fails_when_artifact_download_fails() {
    let history = json!({
        "X": { "outputs": { "9": { "images": [ { "filename": "gone.png", "subfolder": "", "type": "output" } ] } } }
    });
    let (host, _fake) = spawn_fake(history, &[]).await;
    let executor = Executor::for_host(&host, "client-4".into());

    let err = execute(&executor, &json!({})).await.unwrap_err();
    assert_matches!(err, ExecuteError::Api(_));
}

// ---------------------------------------------------------------------------
// Test: nothing listening maps to Unreachable
// ---------------------------------------------------------------------------

#[tokio::test]
async fn connect_to_closed_port_is_unreachable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let host = listener.local_addr().unwrap().to_string();
    drop(listener);

    let executor = Executor::for_host(&host, "client-5".into());
    match executor.connect().await {
        Err(err) => assert_matches!(err, ExecuteError::Unreachable(_)),
        Ok(_) => panic!("connect should fail with nothing listening"),
    }
}
