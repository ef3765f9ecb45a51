pub use crate::features::probe::engine::{CurlTransport, HttpResponse, HttpTransport};
pub use crate::features::probe::process::ProcessCheck;
pub use crate::features::probe::{CheckEngine, Checker};

use crate::config::{ProcessCheckConfig, TransportConfig};
use std::sync::Arc;

/// Checker wired to libcurl for HTTP targets and to the local/ssh process check.
pub fn default_checker(transport: TransportConfig, process: ProcessCheckConfig) -> Checker {
    Checker::new(
        Arc::new(CurlTransport::new(transport)),
        ProcessCheck::new(process),
    )
}
