//! Foreground supervision of model services.
//!
//! [`ServiceManager`] owns the table of running children. It starts
//! services one after another, polls them for unexpected exits, and stops
//! them all on shutdown. Exited services are logged and dropped from the
//! table; they are not restarted.

use std::collections::BTreeMap;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;

use crate::config::SupervisorConfig;
use crate::error::SupervisorError;
use crate::service::ServiceSpec;

/// A service that exited while supervised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitedService {
    pub name: String,
    /// Exit code, or `None` if killed by a signal or the poll failed.
    pub code: Option<i32>,
}

/// Owns the running service processes, keyed by service name.
pub struct ServiceManager {
    children: BTreeMap<String, Child>,
    startup_grace: Duration,
    stop_timeout: Duration,
    poll_interval: Duration,
}

impl ServiceManager {
    pub fn new(config: &SupervisorConfig) -> Self {
        Self {
            children: BTreeMap::new(),
            startup_grace: config.startup_grace,
            stop_timeout: config.stop_timeout,
            poll_interval: config.poll_interval,
        }
    }

    /// Names of the services currently tracked, sorted.
    pub fn running(&self) -> Vec<&str> {
        self.children.keys().map(String::as_str).collect()
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    /// Spawn `spec` and wait out the startup grace period.
    ///
    /// The grace wait ends early when `cancel` fires; the child stays
    /// tracked so a following [`stop_all`](Self::stop_all) still reaches
    /// it. Returns the child's PID, or `None` if the service directory is
    /// missing and the service was skipped.
    pub async fn start(
        &mut self,
        spec: &ServiceSpec,
        cancel: &CancellationToken,
    ) -> Result<Option<u32>, SupervisorError> {
        if let Some(child) = self.children.get(&spec.name) {
            tracing::debug!(service = %spec.name, "Service already running");
            return Ok(child.id());
        }

        if !spec.is_installed() {
            tracing::warn!(
                service = %spec.name,
                dir = %spec.dir.display(),
                "Service directory not found, skipping",
            );
            return Ok(None);
        }

        let mut child = Command::new(&spec.program)
            .args(&spec.args)
            .current_dir(&spec.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SupervisorError::Spawn {
                name: spec.name.clone(),
                command: spec.command_line(),
                source,
            })?;

        let pid = child.id();

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_output(spec.name.clone(), "stdout", stdout));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_output(spec.name.clone(), "stderr", stderr));
        }

        tracing::info!(
            service = %spec.name,
            pid = ?pid,
            command = %spec.command_line(),
            "Service started",
        );
        self.children.insert(spec.name.clone(), child);

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(service = %spec.name, "Startup interrupted by shutdown");
            }
            _ = tokio::time::sleep(self.startup_grace) => {}
        }
        Ok(pid)
    }

    /// Poll every child once, dropping those that have exited.
    pub fn reap_exited(&mut self) -> Vec<ExitedService> {
        let mut exited = Vec::new();

        self.children.retain(|name, child| match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                tracing::warn!(service = %name, code = ?status.code(), "Service exited");
                exited.push(ExitedService {
                    name: name.clone(),
                    code: status.code(),
                });
                false
            }
            Err(e) => {
                tracing::error!(service = %name, error = %e, "Failed to poll service");
                exited.push(ExitedService {
                    name: name.clone(),
                    code: None,
                });
                false
            }
        });

        exited
    }

    /// Ask every child to terminate, then kill any that outlive the stop
    /// timeout.
    pub async fn stop_all(&mut self) {
        let children = std::mem::take(&mut self.children);

        for (name, mut child) in children {
            if let Ok(Some(status)) = child.try_wait() {
                tracing::info!(service = %name, code = ?status.code(), "Service already exited");
                continue;
            }

            tracing::info!(service = %name, "Stopping service");
            if let Err(e) = terminate(&mut child) {
                tracing::warn!(service = %name, error = %e, "Failed to send SIGTERM");
            }

            match tokio::time::timeout(self.stop_timeout, child.wait()).await {
                Ok(Ok(status)) => {
                    tracing::info!(service = %name, code = ?status.code(), "Service stopped");
                }
                Ok(Err(e)) => {
                    tracing::error!(service = %name, error = %e, "Failed to wait for service");
                }
                Err(_) => {
                    tracing::warn!(
                        service = %name,
                        timeout_secs = self.stop_timeout.as_secs_f32(),
                        "Service ignored SIGTERM, killing",
                    );
                    if let Err(e) = child.kill().await {
                        tracing::error!(service = %name, error = %e, "Failed to kill service");
                    }
                }
            }
        }
    }

    /// Watch the children until `cancel` fires, then stop them all.
    pub async fn run(&mut self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.poll_interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Supervisor shutting down");
                    break;
                }
                _ = interval.tick() => {
                    for exited in self.reap_exited() {
                        tracing::debug!(service = %exited.name, "Removed from process table");
                    }
                }
            }
        }

        self.stop_all().await;
    }
}

/// Forward each line of a child's output stream to the log.
async fn forward_output<R: AsyncRead + Unpin>(service: String, stream: &'static str, reader: R) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        tracing::info!(service = %service, stream, "{line}");
    }
}

#[cfg(unix)]
fn terminate(child: &mut Child) -> std::io::Result<()> {
    let Some(pid) = child.id() else {
        return Ok(());
    };
    // Safety: `pid` is our own child and has not been reaped, so it cannot
    // have been recycled.
    let ret = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if ret == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) -> std::io::Result<()> {
    child.start_kill()
}
