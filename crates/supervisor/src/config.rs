use std::path::PathBuf;
use std::time::Duration;

/// Supervisor configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Directory containing the `ComfyUI/` and `CogVideo/` checkouts.
    pub base_dir: PathBuf,
    /// Python interpreter used to run both services.
    pub python: String,
    /// How long to wait after spawning a service before starting the next.
    pub startup_grace: Duration,
    /// How long a service gets to exit after SIGTERM before it is killed.
    pub stop_timeout: Duration,
    /// Interval between liveness checks.
    pub poll_interval: Duration,
}

impl SupervisorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default   |
    /// |----------------------|-----------|
    /// | `KEPLER_BASE_DIR`    | `.`       |
    /// | `PYTHON`             | `python3` |
    /// | `STARTUP_GRACE_SECS` | `3`       |
    /// | `STOP_TIMEOUT_SECS`  | `5`       |
    pub fn from_env() -> Self {
        let base_dir = std::env::var("KEPLER_BASE_DIR")
            .unwrap_or_else(|_| ".".into())
            .into();

        let python = std::env::var("PYTHON").unwrap_or_else(|_| "python3".into());

        Self {
            base_dir,
            python,
            startup_grace: Duration::from_secs(secs_from_env("STARTUP_GRACE_SECS", 3)),
            stop_timeout: Duration::from_secs(secs_from_env("STOP_TIMEOUT_SECS", 5)),
            poll_interval: Duration::from_secs(1),
        }
    }
}

fn secs_from_env(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
