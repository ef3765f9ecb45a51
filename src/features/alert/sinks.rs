use super::AlertEvent;
use crate::error::SinkError;
use crate::probe::ProbeStatus;
use crossbeam_channel::Sender;
use curl::easy::{Easy2, Handler, List, WriteError};
use log::{info, warn};
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// Something that forwards status changes outside the process.
pub trait AlertSink: Send {
    fn name(&self) -> &str;
    fn deliver(&mut self, event: &AlertEvent) -> Result<(), SinkError>;
}

/// Writes every transition to the process log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl AlertSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    fn deliver(&mut self, event: &AlertEvent) -> Result<(), SinkError> {
        match event.status {
            ProbeStatus::Down => warn!(
                "{} (was {}, target {})",
                event.summary(),
                event.previous,
                event.url
            ),
            _ => info!(
                "{} (was {}, target {})",
                event.summary(),
                event.previous,
                event.url
            ),
        }
        Ok(())
    }
}

/// Hands events to an in-process consumer.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    tx: Sender<AlertEvent>,
}

impl ChannelSink {
    pub fn new(tx: Sender<AlertEvent>) -> Self {
        Self { tx }
    }
}

impl AlertSink for ChannelSink {
    fn name(&self) -> &str {
        "channel"
    }

    fn deliver(&mut self, event: &AlertEvent) -> Result<(), SinkError> {
        self.tx
            .send(event.clone())
            .map_err(|_| SinkError::new(self.name(), "receiver dropped"))
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    content: String,
    #[serde(flatten)]
    event: &'a AlertEvent,
}

#[derive(Default)]
struct DiscardBody;

impl Handler for DiscardBody {
    fn write(&mut self, data: &[u8]) -> Result<usize, WriteError> {
        Ok(data.len())
    }
}

/// POSTs each event as JSON. `content` carries a one-line summary, which is
/// what chat webhooks render.
#[derive(Clone, Debug)]
pub struct WebhookSink {
    url: Url,
    timeout: Duration,
}

impl WebhookSink {
    pub fn new(url: Url, timeout: Duration) -> Self {
        Self { url, timeout }
    }

    fn post(&self, body: &[u8]) -> Result<u32, curl::Error> {
        let mut easy = Easy2::new(DiscardBody);
        easy.url(self.url.as_str())?;
        easy.signal(false)?;
        easy.timeout(self.timeout)?;
        easy.post(true)?;
        easy.post_fields_copy(body)?;
        let mut headers = List::new();
        headers.append("Content-Type: application/json")?;
        easy.http_headers(headers)?;
        easy.perform()?;
        easy.response_code()
    }
}

impl AlertSink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    fn deliver(&mut self, event: &AlertEvent) -> Result<(), SinkError> {
        let body = serde_json::to_vec(&payload(event))
            .map_err(|err| SinkError::new(self.name(), err.to_string()))?;
        let status = self
            .post(&body)
            .map_err(|err| SinkError::new(self.name(), err.to_string()))?;
        if !(200..300).contains(&status) {
            return Err(SinkError::new(
                self.name(),
                format!("webhook answered HTTP {status}"),
            ));
        }
        Ok(())
    }
}

fn payload(event: &AlertEvent) -> WebhookPayload<'_> {
    WebhookPayload {
        content: event.summary(),
        event,
    }
}
