use crate::error::TargetError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

pub const PID_SCHEME: &str = "pid";
pub const DEFAULT_SSH_PORT: u16 = 22;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProbeStatus {
    #[default]
    Unknown,
    Up,
    Down,
}

impl ProbeStatus {
    pub fn label(self) -> &'static str {
        match self {
            ProbeStatus::Unknown => "UNKNOWN",
            ProbeStatus::Up => "UP",
            ProbeStatus::Down => "DOWN",
        }
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Durable part of a probe. Also used as the candidate for create/update.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ProbeRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "Delay")]
    pub delay: u64,
}

impl ProbeRecord {
    pub fn new(name: impl Into<String>, url: impl Into<String>, delay: u64) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            delay,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.delay)
    }
}

/// Snapshot of a registered probe, including its live status.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Probe {
    pub name: String,
    pub url: String,
    pub delay: u64,
    pub status: ProbeStatus,
}

impl Probe {
    pub fn from_record(record: &ProbeRecord, status: ProbeStatus) -> Self {
        Self {
            name: record.name.clone(),
            url: record.url.clone(),
            delay: record.delay,
            status,
        }
    }

}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RemoteHost {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
}

impl RemoteHost {
    /// `user@host` or `host`, as passed to ssh.
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{user}@{}", self.host),
            None => self.host.clone(),
        }
    }
}

/// What a runner actually checks, derived from the probe URL.
///
/// `http(s)://...` targets are fetched and must answer 200. `pid://localhost/<pid>`
/// checks a local process, any other host is reached over ssh
/// (`pid://user@host:port/<pid>`).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProbeTarget {
    Http(Url),
    Process {
        pid: u32,
        remote: Option<RemoteHost>,
    },
}

impl ProbeTarget {
    pub fn from_url(url: &Url) -> Result<Self, TargetError> {
        match url.scheme() {
            "http" | "https" => Ok(ProbeTarget::Http(url.clone())),
            PID_SCHEME => {
                let raw = url.path().trim_matches('/');
                let pid = raw
                    .parse::<u32>()
                    .ok()
                    .filter(|pid| *pid > 0 && i32::try_from(*pid).is_ok())
                    .ok_or_else(|| TargetError::InvalidPid(raw.to_string()))?;
                let host = url.host_str().unwrap_or_default();
                let remote = if is_local_host(host) {
                    None
                } else {
                    let user = Some(url.username())
                        .filter(|user| !user.is_empty())
                        .map(str::to_string);
                    // Both end up in ssh's argv.
                    if host.starts_with('-') || user.as_deref().is_some_and(|u| u.starts_with('-'))
                    {
                        return Err(TargetError::OptionLikeHost(
                            user.as_deref()
                                .map_or_else(|| host.to_string(), |u| format!("{u}@{host}")),
                        ));
                    }
                    Some(RemoteHost {
                        host: host.to_string(),
                        port: url.port().unwrap_or(DEFAULT_SSH_PORT),
                        user,
                    })
                };
                Ok(ProbeTarget::Process { pid, remote })
            }
            other => Err(TargetError::UnsupportedScheme(other.to_string())),
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            ProbeTarget::Http(_) => "HTTP",
            ProbeTarget::Process { remote: None, .. } => "PID",
            ProbeTarget::Process {
                remote: Some(_), ..
            } => "PID/SSH",
        }
    }
}

fn is_local_host(host: &str) -> bool {
    matches!(host, "localhost" | "127.0.0.1" | "[::1]")
}
