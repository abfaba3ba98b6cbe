//! Fire-and-forget service launch.
//!
//! Used by `kepler-launch`: each service is started in its own session
//! with no stdio attached, and the launcher exits without waiting. The
//! services keep running after the launching terminal closes.

use std::process::{Command, Stdio};

use crate::error::SupervisorError;
use crate::service::ServiceSpec;

/// Start `spec` detached from the current process.
///
/// Returns the PID, or `None` if the service directory is missing.
pub fn launch_detached(spec: &ServiceSpec) -> Result<Option<u32>, SupervisorError> {
    if !spec.is_installed() {
        tracing::warn!(
            service = %spec.name,
            dir = %spec.dir.display(),
            "Service directory not found, skipping",
        );
        return Ok(None);
    }

    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args)
        .current_dir(&spec.dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        // Safety: `setsid` is async-signal-safe and touches no parent state.
        unsafe {
            cmd.pre_exec(|| {
                if libc::setsid() == -1 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }
    }

    let child = cmd.spawn().map_err(|source| SupervisorError::Spawn {
        name: spec.name.clone(),
        command: spec.command_line(),
        source,
    })?;

    let pid = child.id();
    tracing::info!(service = %spec.name, pid, command = %spec.command_line(), "Service launched");
    Ok(Some(pid))
}
