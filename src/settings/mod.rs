use crate::common::net::parse_absolute_url;
use crate::config::{AlertBusConfig, ProcessCheckConfig, RegistryConfig, TransportConfig};
use crate::data_model::settings::{AppSettings, Command};
use crate::probe::ProbeRecord;
use crate::storage::JsonFileStore;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "probed")]
#[command(about = "Persistent HTTP and process health probes with status-change alerts", long_about = None)]
pub struct CliArgs {
    /// Probe database file
    #[arg(long, value_name = "PATH", global = true)]
    db: Option<PathBuf>,

    /// CA bundle used to verify HTTPS targets
    #[arg(long, value_name = "PATH", global = true)]
    ca_cert: Option<PathBuf>,

    /// Per-check HTTP timeout (seconds)
    #[arg(long, default_value_t = 10, global = true)]
    timeout_secs: u64,

    /// Alert bus capacity (events)
    #[arg(long, default_value_t = 256, global = true)]
    alert_capacity: usize,

    /// How long a runner waits on a full alert bus (milliseconds)
    #[arg(long, default_value_t = 5000, global = true)]
    publish_timeout_ms: u64,

    /// Webhook receiving status changes as JSON
    #[arg(long, value_name = "URL", global = true)]
    webhook: Option<String>,

    /// Alert on the first status observed after a probe starts
    #[arg(long, global = true)]
    notify_initial: bool,

    /// ssh binary used for remote pid probes
    #[arg(long, value_name = "PATH", default_value = "ssh", global = true)]
    ssh: PathBuf,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Monitor every stored probe until interrupted
    Run,
    /// Store a new probe
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        url: String,
        /// Seconds between checks
        #[arg(long)]
        delay: u64,
    },
    /// Remove a stored probe
    Remove { name: String },
    /// List stored probes
    List,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("check timeout must be greater than zero (got {value})")]
    InvalidTimeout { value: u64 },
    #[error("alert bus capacity must be greater than zero (got {value})")]
    InvalidAlertCapacity { value: usize },
    #[error("webhook must be an absolute URL (got {value})")]
    InvalidWebhook { value: String },
    #[error("CA certificate {} does not exist", .path.display())]
    MissingCaCert { path: PathBuf },
    #[error("could not determine a data directory; pass --db")]
    NoDataDir,
}

pub fn load_from_cli() -> Result<AppSettings, SettingsError> {
    let args = CliArgs::parse();
    from_args(args)
}

pub fn from_args(args: CliArgs) -> Result<AppSettings, SettingsError> {
    if args.timeout_secs == 0 {
        return Err(SettingsError::InvalidTimeout {
            value: args.timeout_secs,
        });
    }
    if args.alert_capacity == 0 {
        return Err(SettingsError::InvalidAlertCapacity {
            value: args.alert_capacity,
        });
    }
    if let Some(path) = &args.ca_cert
        && !path.exists()
    {
        return Err(SettingsError::MissingCaCert { path: path.clone() });
    }

    let webhook = match args.webhook {
        Some(raw) => Some(
            parse_absolute_url(&raw).ok_or(SettingsError::InvalidWebhook { value: raw })?,
        ),
        None => None,
    };

    let db_path = match args.db {
        Some(path) => path,
        None => JsonFileStore::default_path().ok_or(SettingsError::NoDataDir)?,
    };

    let timeout = Duration::from_secs(args.timeout_secs);
    let transport = TransportConfig {
        timeout,
        connect_timeout: timeout.min(TransportConfig::default().connect_timeout),
        ca_cert: args.ca_cert,
        ..TransportConfig::default()
    };

    let command = match args.command {
        CliCommand::Run => Command::Run,
        CliCommand::Add { name, url, delay } => Command::Add(ProbeRecord::new(name, url, delay)),
        CliCommand::Remove { name } => Command::Remove { name },
        CliCommand::List => Command::List,
    };

    Ok(AppSettings {
        command,
        db_path,
        webhook,
        registry: RegistryConfig {
            notify_initial_status: args.notify_initial,
        },
        transport,
        alerts: AlertBusConfig {
            capacity: args.alert_capacity,
            publish_timeout: Duration::from_millis(args.publish_timeout_ms),
            ..AlertBusConfig::default()
        },
        process: ProcessCheckConfig {
            ssh_binary: args.ssh,
            ..ProcessCheckConfig::default()
        },
    })
}

#[cfg(test)]
mod tests {
    use super::{CliArgs, SettingsError, from_args};
    use crate::data_model::settings::Command;
    use crate::probe::ProbeRecord;
    use clap::Parser;
    use std::path::PathBuf;
    use std::time::Duration;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(args).expect("cli args")
    }

    #[test]
    fn run_uses_defaults() {
        let settings = from_args(parse(&["probed", "--db", "/tmp/p.json", "run"]))
            .expect("settings");

        assert_eq!(settings.command, Command::Run);
        assert_eq!(settings.db_path, PathBuf::from("/tmp/p.json"));
        assert_eq!(settings.transport.timeout, Duration::from_secs(10));
        assert_eq!(settings.alerts.capacity, 256);
        assert_eq!(settings.alerts.publish_timeout, Duration::from_millis(5000));
        assert!(!settings.registry.notify_initial_status);
        assert!(settings.webhook.is_none());
    }

    #[test]
    fn add_builds_probe_record() {
        let settings = from_args(parse(&[
            "probed", "--db", "p.json", "add", "--name", "svc", "--url", "http://x/", "--delay",
            "5",
        ]))
        .expect("settings");

        assert_eq!(
            settings.command,
            Command::Add(ProbeRecord::new("svc", "http://x/", 5))
        );
    }

    #[test]
    fn global_flags_after_subcommand_apply() {
        let settings = from_args(parse(&[
            "probed",
            "run",
            "--db",
            "p.json",
            "--notify-initial",
            "--timeout-secs",
            "2",
            "--webhook",
            "https://hooks.example/alert",
        ]))
        .expect("settings");

        assert!(settings.registry.notify_initial_status);
        assert_eq!(settings.transport.timeout, Duration::from_secs(2));
        assert_eq!(settings.transport.connect_timeout, Duration::from_secs(2));
        assert_eq!(
            settings.webhook.map(|url| url.to_string()),
            Some("https://hooks.example/alert".to_string())
        );
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = from_args(parse(&["probed", "--db", "p.json", "--timeout-secs", "0", "list"]))
            .expect_err("should error");
        assert!(matches!(err, SettingsError::InvalidTimeout { value: 0 }));
    }

    #[test]
    fn rejects_relative_webhook() {
        let err = from_args(parse(&["probed", "--db", "p.json", "--webhook", "hooks", "list"]))
            .expect_err("should error");
        assert!(matches!(err, SettingsError::InvalidWebhook { .. }));
    }

    #[test]
    fn rejects_missing_ca_cert() {
        let err = from_args(parse(&[
            "probed",
            "--db",
            "p.json",
            "--ca-cert",
            "/nonexistent/ca.pem",
            "list",
        ]))
        .expect_err("should error");
        assert!(matches!(err, SettingsError::MissingCaCert { .. }));
    }
}
