use std::sync::Arc;

use kepler_comfyui::executor::Executor;
use kepler_core::workflow::WorkflowStore;
use kepler_ollama::OllamaApi;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Workflow template directory.
    pub workflows: Arc<WorkflowStore>,
    /// ComfyUI executor, carrying this process's client ID.
    pub comfyui: Arc<Executor>,
    /// Ollama text daemon client.
    pub ollama: Arc<OllamaApi>,
}

impl AppState {
    /// Wire up downstream clients from configuration.
    ///
    /// `client_id` is the ComfyUI client identifier shared by every
    /// request this process serves.
    pub fn new(config: ServerConfig, client_id: String) -> Self {
        let workflows = WorkflowStore::new(config.workflows_dir.clone());
        let comfyui = Executor::for_host(&config.comfyui_host, client_id);
        let ollama = OllamaApi::new(config.ollama_url.clone());

        Self {
            config: Arc::new(config),
            workflows: Arc::new(workflows),
            comfyui: Arc::new(comfyui),
            ollama: Arc::new(ollama),
        }
    }
}
