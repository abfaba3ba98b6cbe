use std::path::PathBuf;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults matching a single-machine setup where the
/// text daemon and ComfyUI run next to the backend.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins; `*` allows any origin.
    pub cors_origins: Vec<String>,
    /// Ollama base URL (default: `http://localhost:11434`).
    pub ollama_url: String,
    /// ComfyUI `host:port`, used for both `ws://` and `http://`.
    pub comfyui_host: String,
    /// Directory holding the workflow templates.
    pub workflows_dir: PathBuf,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var         | Default                  |
    /// |-----------------|--------------------------|
    /// | `HOST`          | `0.0.0.0`                |
    /// | `PORT`          | `8000`                   |
    /// | `CORS_ORIGINS`  | `*`                      |
    /// | `OLLAMA_URL`    | `http://localhost:11434` |
    /// | `COMFYUI_HOST`  | `127.0.0.1:8188`         |
    /// | `WORKFLOWS_DIR` | `workflows`              |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let ollama_url = std::env::var("OLLAMA_URL")
            .unwrap_or_else(|_| "http://localhost:11434".into())
            .trim_end_matches('/')
            .to_string();

        let comfyui_host =
            std::env::var("COMFYUI_HOST").unwrap_or_else(|_| "127.0.0.1:8188".into());

        let workflows_dir = std::env::var("WORKFLOWS_DIR")
            .unwrap_or_else(|_| "workflows".into())
            .into();

        Self {
            host,
            port,
            cors_origins,
            ollama_url,
            comfyui_host,
            workflows_dir,
        }
    }

    /// Port component of `comfyui_host`, used in operator-facing messages.
    pub fn comfyui_port(&self) -> &str {
        self.comfyui_host
            .rsplit_once(':')
            .map(|(_, port)| port)
            .unwrap_or("8188")
    }

    /// Whether CORS should accept any origin.
    pub fn cors_allows_any(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}
