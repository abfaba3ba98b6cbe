//! Liveness check for the model services.

use std::time::Duration;

use crate::service::ServiceSpec;

/// Per-service check timeout.
const CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Outcome of probing one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceStatus {
    /// The service answered with this HTTP status.
    Up(u16),
    /// No HTTP answer; carries the reason.
    Down(String),
}

impl ServiceStatus {
    pub fn is_up(&self) -> bool {
        matches!(self, ServiceStatus::Up(_))
    }
}

#[derive(Debug, Clone)]
pub struct ServiceReport {
    pub name: String,
    pub status: ServiceStatus,
}

/// Check every service with `GET http://localhost:<port>`.
///
/// Any HTTP response counts as up, whatever its status code.
pub async fn check_services(specs: &[ServiceSpec]) -> Vec<ServiceReport> {
    let client = reqwest::Client::builder()
        .timeout(CHECK_TIMEOUT)
        .build()
        .unwrap_or_default();

    let mut reports = Vec::with_capacity(specs.len());
    for spec in specs {
        let status = check_port(&client, spec.port).await;
        match &status {
            ServiceStatus::Up(code) => {
                tracing::info!(service = %spec.name, port = spec.port, status = code, "Service is up");
            }
            ServiceStatus::Down(reason) => {
                tracing::warn!(service = %spec.name, port = spec.port, reason = %reason, "Service is down");
            }
        }
        reports.push(ServiceReport {
            name: spec.name.clone(),
            status,
        });
    }
    reports
}

async fn check_port(client: &reqwest::Client, port: u16) -> ServiceStatus {
    match client.get(format!("http://localhost:{port}")).send().await {
        Ok(resp) => ServiceStatus::Up(resp.status().as_u16()),
        Err(e) if e.is_timeout() => ServiceStatus::Down("timed out".to_string()),
        Err(e) => ServiceStatus::Down(e.to_string()),
    }
}
