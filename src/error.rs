use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Probe field a [`ValidationError`] refers to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ProbeField {
    Name,
    Url,
    Delay,
}

impl ProbeField {
    pub fn label(self) -> &'static str {
        match self {
            ProbeField::Name => "Name",
            ProbeField::Url => "URL",
            ProbeField::Delay => "Delay",
        }
    }
}

impl fmt::Display for ProbeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("Field [{field}]: {message}")]
pub struct ValidationError {
    pub field: ProbeField,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: ProbeField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Reasons a well-formed URL does not describe a checkable target.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TargetError {
    #[error("URL scheme '{0}' is not supported")]
    UnsupportedScheme(String),
    #[error("process id '{0}' is not a valid pid")]
    InvalidPid(String),
    #[error("remote host '{0}' must not start with '-'")]
    OptionLikeHost(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("store file {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("store lock poisoned")]
    Unavailable,
}

/// Errors surfaced synchronously by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("probe with name [{name}] already exists")]
    AlreadyExists { name: String },
    #[error("probe [{name}] was not found")]
    NotFound { name: String },
    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
    #[error("failed to start runner for probe [{name}]: {source}")]
    Runner { name: String, source: io::Error },
}

impl RegistryError {
    pub fn not_found(name: impl Into<String>) -> Self {
        RegistryError::NotFound { name: name.into() }
    }

    pub fn already_exists(name: impl Into<String>) -> Self {
        RegistryError::AlreadyExists { name: name.into() }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum TransportErrorKind {
    Dns,
    Connect,
    Timeout,
    Tls,
    Protocol,
    HttpStatus,
    Process,
    Io,
}

impl TransportErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            TransportErrorKind::Dns => "dns",
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Tls => "tls",
            TransportErrorKind::Protocol => "protocol",
            TransportErrorKind::HttpStatus => "http_status",
            TransportErrorKind::Process => "process",
            TransportErrorKind::Io => "io",
        }
    }
}

/// Failure of a single check. Runners turn these into a `DOWN` observation.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("{}: {message}", .kind.label())]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
#[error("alert sink [{sink}] failed: {message}")]
pub struct SinkError {
    pub sink: String,
    pub message: String,
}

impl SinkError {
    pub fn new(sink: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sink: sink.into(),
            message: message.into(),
        }
    }
}
