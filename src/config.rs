use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug, Default)]
pub struct RegistryConfig {
    /// Alert on the first observation after a runner starts (UNKNOWN -> UP/DOWN).
    pub notify_initial_status: bool,
}

#[derive(Clone, Debug)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub ca_cert: Option<PathBuf>,
    pub follow_redirects: bool,
    /// Bytes of an error response body kept for logging.
    pub max_body_bytes: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            ca_cert: None,
            follow_redirects: false,
            max_body_bytes: 4096,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AlertBusConfig {
    pub capacity: usize,
    /// How long a runner waits on a full bus before the event is dropped.
    pub publish_timeout: Duration,
    pub sink_capacity: usize,
}

impl Default for AlertBusConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            publish_timeout: Duration::from_secs(5),
            sink_capacity: 64,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProcessCheckConfig {
    pub ssh_binary: PathBuf,
    pub ssh_connect_timeout: Duration,
}

impl Default for ProcessCheckConfig {
    fn default() -> Self {
        Self {
            ssh_binary: PathBuf::from("ssh"),
            ssh_connect_timeout: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_defaults_to_silent_first_observation() {
        assert!(!RegistryConfig::default().notify_initial_status);
    }

    #[test]
    fn transport_defaults_do_not_follow_redirects() {
        let cfg = TransportConfig::default();
        assert!(!cfg.follow_redirects);
        assert!(cfg.connect_timeout <= cfg.timeout);
        assert!(cfg.ca_cert.is_none());
    }

    #[test]
    fn alert_bus_defaults_are_bounded() {
        let cfg = AlertBusConfig::default();
        assert!(cfg.capacity > 0);
        assert!(cfg.sink_capacity > 0);
        assert_eq!(cfg.publish_timeout, Duration::from_secs(5));
    }
}
