use crate::config::ProcessCheckConfig;
use crate::error::{TransportError, TransportErrorKind};
use crate::probe::RemoteHost;
use std::process::{Command, Stdio};

/// Liveness check for a process id, locally or on a remote host over ssh.
#[derive(Clone, Debug, Default)]
pub struct ProcessCheck {
    config: ProcessCheckConfig,
}

impl ProcessCheck {
    pub fn new(config: ProcessCheckConfig) -> Self {
        Self { config }
    }

    pub fn check(&self, pid: u32, remote: Option<&RemoteHost>) -> Result<(), TransportError> {
        match remote {
            None => local_process_alive(pid),
            Some(host) => self.remote_process_alive(pid, host),
        }
    }

    fn remote_process_alive(&self, pid: u32, host: &RemoteHost) -> Result<(), TransportError> {
        let status = Command::new(&self.config.ssh_binary)
            .args(self.ssh_args(pid, host))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|err| {
                TransportError::new(
                    TransportErrorKind::Io,
                    format!("failed to run {}: {err}", self.config.ssh_binary.display()),
                )
            })?;

        match status.code() {
            Some(0) => Ok(()),
            // ssh reserves 255 for its own failures
            Some(255) => Err(TransportError::new(
                TransportErrorKind::Connect,
                format!("ssh to {} failed", host.destination()),
            )),
            _ => Err(TransportError::new(
                TransportErrorKind::Process,
                format!("process {pid} not found on {}", host.host),
            )),
        }
    }

    fn ssh_args(&self, pid: u32, host: &RemoteHost) -> Vec<String> {
        vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!(
                "ConnectTimeout={}",
                self.config.ssh_connect_timeout.as_secs().max(1)
            ),
            "-p".to_string(),
            host.port.to_string(),
            "--".to_string(),
            host.destination(),
            "ps".to_string(),
            "-p".to_string(),
            pid.to_string(),
        ]
    }
}

#[cfg(unix)]
fn local_process_alive(pid: u32) -> Result<(), TransportError> {
    let raw = libc::pid_t::try_from(pid).map_err(|_| {
        TransportError::new(TransportErrorKind::Process, format!("pid {pid} out of range"))
    })?;

    // Signal 0 only performs the existence and permission checks.
    let rc = unsafe { libc::kill(raw, 0) };
    if rc == 0 {
        return Ok(());
    }

    let err = std::io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::EPERM) {
        // Exists, owned by someone else.
        return Ok(());
    }
    Err(TransportError::new(
        TransportErrorKind::Process,
        format!("process {pid} not found: {err}"),
    ))
}

#[cfg(not(unix))]
fn local_process_alive(pid: u32) -> Result<(), TransportError> {
    Err(TransportError::new(
        TransportErrorKind::Process,
        format!("process liveness checks are unsupported on this platform (pid {pid})"),
    ))
}
