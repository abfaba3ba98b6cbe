//! `kepler-launch` -- starts the model services detached and exits.
//!
//! Reads the same environment as `kepler-supervisor`. The services are
//! not tracked afterwards; stop them with your process manager of choice.

use kepler_supervisor::config::SupervisorConfig;
use kepler_supervisor::launcher::launch_detached;
use kepler_supervisor::service::default_services;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kepler_supervisor=info,kepler_launch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = SupervisorConfig::from_env();

    let mut failed = false;
    for spec in default_services(&config) {
        if let Err(e) = launch_detached(&spec) {
            tracing::error!(error = %e, "Failed to launch service");
            failed = true;
        }
    }

    if failed {
        std::process::exit(1);
    }
}
