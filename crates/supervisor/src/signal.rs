use std::future::Future;

/// Install SIGINT/SIGTERM handlers and return a future that resolves on
/// the first of them.
///
/// On Unix the handlers are registered when this is called, not when the
/// future is first polled. Must be called inside a Tokio runtime.
#[cfg(unix)]
pub fn shutdown_signal() -> impl Future<Output = ()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt()).expect("Failed to install SIGINT handler");
    let mut terminate = signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");

    async move {
        tokio::select! {
            _ = interrupt.recv() => {
                tracing::info!("Received SIGINT (Ctrl-C), stopping services");
            }
            _ = terminate.recv() => {
                tracing::info!("Received SIGTERM, stopping services");
            }
        }
    }
}

#[cfg(not(unix))]
pub fn shutdown_signal() -> impl Future<Output = ()> {
    async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
        tracing::info!("Received Ctrl-C, stopping services");
    }
}
