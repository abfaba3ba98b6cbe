//! Definitions of the model services the supervisor runs.

use std::path::{Path, PathBuf};

use crate::config::SupervisorConfig;

/// Port ComfyUI listens on.
pub const COMFYUI_PORT: u16 = 8188;

/// Port the CogVideo API listens on.
pub const COGVIDEO_PORT: u16 = 7860;

/// A long-running service: what to run, where, and which port it serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    pub name: String,
    /// Working directory; the service is skipped when it is missing.
    pub dir: PathBuf,
    pub program: String,
    pub args: Vec<String>,
    pub port: u16,
}

impl ServiceSpec {
    /// ComfyUI in low-VRAM mode.
    pub fn comfyui(base_dir: &Path, python: &str) -> Self {
        Self {
            name: "comfyui".to_string(),
            dir: base_dir.join("ComfyUI"),
            program: python.to_string(),
            args: vec![
                "main.py".to_string(),
                "--port".to_string(),
                COMFYUI_PORT.to_string(),
                "--lowvram".to_string(),
            ],
            port: COMFYUI_PORT,
        }
    }

    /// CogVideo API server in low-resource mode.
    pub fn cogvideo(base_dir: &Path, python: &str) -> Self {
        Self {
            name: "cogvideo".to_string(),
            dir: base_dir.join("CogVideo"),
            program: python.to_string(),
            args: vec![
                "-m".to_string(),
                "cogvideo.cli.api".to_string(),
                "--port".to_string(),
                COGVIDEO_PORT.to_string(),
                "--low-resource-mode".to_string(),
            ],
            port: COGVIDEO_PORT,
        }
    }

    /// Whether the service's working directory exists.
    pub fn is_installed(&self) -> bool {
        self.dir.is_dir()
    }

    /// The command line as it would be typed in a shell, for logging.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// The services started by default, in start order.
pub fn default_services(config: &SupervisorConfig) -> Vec<ServiceSpec> {
    vec![
        ServiceSpec::comfyui(&config.base_dir, &config.python),
        ServiceSpec::cogvideo(&config.base_dir, &config.python),
    ]
}
