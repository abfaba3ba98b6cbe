//! `kepler-supervisor` -- runs the model services in the foreground.
//!
//! Starts ComfyUI and CogVideo from `KEPLER_BASE_DIR`, forwards their
//! output to the log, and stops them all on SIGINT/SIGTERM. Services that
//! exit on their own are logged and not restarted.
//!
//! `kepler-supervisor status` checks the service ports and exits.
//!
//! # Environment variables
//!
//! | Variable             | Required | Default   | Description                         |
//! |----------------------|----------|-----------|-------------------------------------|
//! | `KEPLER_BASE_DIR`    | no       | `.`       | Holds `ComfyUI/` and `CogVideo/`    |
//! | `PYTHON`             | no       | `python3` | Interpreter for both services       |
//! | `STARTUP_GRACE_SECS` | no       | `3`       | Pause after each service start      |
//! | `STOP_TIMEOUT_SECS`  | no       | `5`       | SIGTERM-to-kill window on shutdown  |

use kepler_supervisor::config::SupervisorConfig;
use kepler_supervisor::manager::ServiceManager;
use kepler_supervisor::liveness::check_services;
use kepler_supervisor::service::default_services;
use kepler_supervisor::signal::shutdown_signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kepler_supervisor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = SupervisorConfig::from_env();
    let services = default_services(&config);

    if std::env::args().nth(1).as_deref() == Some("status") {
        let reports = check_services(&services).await;
        let all_up = reports.iter().all(|r| r.status.is_up());
        std::process::exit(if all_up { 0 } else { 1 });
    }

    tracing::info!(
        base_dir = %config.base_dir.display(),
        python = %config.python,
        "Starting kepler-supervisor",
    );

    // Handlers are live from here on; no child exists yet.
    let signal = shutdown_signal();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        signal.await;
        trigger.cancel();
    });

    let mut manager = ServiceManager::new(&config);
    for spec in &services {
        if cancel.is_cancelled() {
            break;
        }
        if let Err(e) = manager.start(spec, &cancel).await {
            tracing::error!(error = %e, "Failed to start service");
        }
    }

    if manager.running().is_empty() {
        tracing::warn!("No services started");
    } else if !cancel.is_cancelled() {
        check_services(&services).await;
    }

    manager.run(cancel).await;

    tracing::info!("All services stopped");
}
