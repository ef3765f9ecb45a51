pub mod engine;
pub mod process;

use crate::error::{TransportError, TransportErrorKind};
use crate::probe::ProbeTarget;
use engine::HttpTransport;
use process::ProcessCheck;
use std::sync::Arc;

/// One health check of a target. `Ok` means the target is UP.
pub trait CheckEngine: Send + Sync {
    fn check(&self, target: &ProbeTarget) -> Result<(), TransportError>;
}

/// Dispatches each probe kind to its check.
#[derive(Clone)]
pub struct Checker {
    http: Arc<dyn HttpTransport>,
    process: ProcessCheck,
}

impl Checker {
    pub fn new(http: Arc<dyn HttpTransport>, process: ProcessCheck) -> Self {
        Self { http, process }
    }
}

impl CheckEngine for Checker {
    fn check(&self, target: &ProbeTarget) -> Result<(), TransportError> {
        match target {
            ProbeTarget::Http(url) => {
                let response = self.http.get(url)?;
                if response.status == 200 {
                    return Ok(());
                }
                let mut message = format!("HTTP status {}", response.status);
                let excerpt = response.body_excerpt.trim();
                if !excerpt.is_empty() {
                    message.push_str(&format!(": '{excerpt}'"));
                }
                Err(TransportError::new(TransportErrorKind::HttpStatus, message))
            }
            ProbeTarget::Process { pid, remote } => self.process.check(*pid, remote.as_ref()),
        }
    }
}
