mod bus;
mod sinks;

pub use bus::{AlertBus, AlertPublisher};
pub use sinks::{AlertSink, ChannelSink, LogSink, WebhookSink};

use crate::probe::{ProbeRecord, ProbeStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A probe's status changed. Published by its runner, consumed by sinks.
///
/// Delivery is at most once; `id` lets a sink spot replays from its own retries.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub status: ProbeStatus,
    pub previous: ProbeStatus,
    pub delay: u64,
    pub observed_at: DateTime<Utc>,
}

impl AlertEvent {
    pub fn transition(record: &ProbeRecord, previous: ProbeStatus, status: ProbeStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: record.name.clone(),
            url: record.url.clone(),
            status,
            previous,
            delay: record.delay,
            observed_at: Utc::now(),
        }
    }

    pub fn summary(&self) -> String {
        format!("Probe [{}] is currently [{}]", self.name, self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_copies_record_fields() {
        let record = ProbeRecord::new("svc", "http://x/", 5);
        let event = AlertEvent::transition(&record, ProbeStatus::Up, ProbeStatus::Down);
        assert_eq!(event.name, "svc");
        assert_eq!(event.url, "http://x/");
        assert_eq!(event.delay, 5);
        assert_eq!(event.previous, ProbeStatus::Up);
        assert_eq!(event.summary(), "Probe [svc] is currently [DOWN]");
    }

    #[test]
    fn events_get_distinct_ids() {
        let record = ProbeRecord::new("svc", "http://x/", 5);
        let a = AlertEvent::transition(&record, ProbeStatus::Up, ProbeStatus::Down);
        let b = AlertEvent::transition(&record, ProbeStatus::Down, ProbeStatus::Up);
        assert_ne!(a.id, b.id);
    }
}
