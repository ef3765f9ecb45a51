use crate::config::{AlertBusConfig, ProcessCheckConfig, RegistryConfig, TransportConfig};
use crate::probe::ProbeRecord;
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run,
    Add(ProbeRecord),
    Remove { name: String },
    List,
}

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub command: Command,
    pub db_path: PathBuf,
    pub webhook: Option<Url>,
    pub registry: RegistryConfig,
    pub transport: TransportConfig,
    pub alerts: AlertBusConfig,
    pub process: ProcessCheckConfig,
}
