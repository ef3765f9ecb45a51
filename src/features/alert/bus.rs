use super::AlertEvent;
use super::sinks::AlertSink;
use crate::config::AlertBusConfig;
use crossbeam_channel::{Receiver, SendTimeoutError, Sender, TrySendError, bounded, select};
use log::{debug, warn};
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Write side of the alert bus, cloned into every runner.
///
/// A full bus makes `publish` wait up to the configured timeout; after that
/// the event is dropped and counted instead of stalling the runner.
#[derive(Clone, Debug)]
pub struct AlertPublisher {
    tx: Sender<AlertEvent>,
    publish_timeout: Duration,
    dropped: Arc<AtomicU64>,
}

impl AlertPublisher {
    /// A bare bounded bus without dispatcher, for embedders draining events themselves.
    pub fn channel(capacity: usize, publish_timeout: Duration) -> (Self, Receiver<AlertEvent>) {
        let (tx, rx) = bounded(capacity.max(1));
        let publisher = Self {
            tx,
            publish_timeout,
            dropped: Arc::new(AtomicU64::new(0)),
        };
        (publisher, rx)
    }

    pub fn publish(&self, event: AlertEvent) -> bool {
        match self.tx.send_timeout(event, self.publish_timeout) {
            Ok(()) => true,
            Err(SendTimeoutError::Timeout(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "alert bus full, dropping [{}] event for probe [{}]",
                    event.status, event.name
                );
                false
            }
            Err(SendTimeoutError::Disconnected(event)) => {
                debug!("alert bus closed, dropping event for probe [{}]", event.name);
                false
            }
        }
    }

    /// Events dropped because the bus stayed full past the publish timeout.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

struct SinkLane {
    name: String,
    tx: Sender<AlertEvent>,
}

/// Fan-out point between runners and alert sinks.
///
/// One dispatcher thread drains the bus and copies each event into every
/// sink's own bounded queue; each sink runs on its own thread so a slow sink
/// only loses its own events.
pub struct AlertBus {
    config: AlertBusConfig,
    publisher: AlertPublisher,
    lanes: Arc<Mutex<Vec<SinkLane>>>,
    sink_dropped: Arc<AtomicU64>,
    close_tx: Option<Sender<()>>,
    dispatcher: Option<JoinHandle<()>>,
    sink_joins: Vec<JoinHandle<()>>,
}

impl AlertBus {
    pub fn start(config: AlertBusConfig) -> io::Result<Self> {
        let (publisher, events) = AlertPublisher::channel(config.capacity, config.publish_timeout);
        let (close_tx, close_rx) = bounded::<()>(0);
        let lanes = Arc::new(Mutex::new(Vec::new()));
        let sink_dropped = Arc::new(AtomicU64::new(0));

        let thread_lanes = Arc::clone(&lanes);
        let thread_dropped = Arc::clone(&sink_dropped);
        let dispatcher = thread::Builder::new()
            .name("probed-alert-bus".to_string())
            .spawn(move || dispatch_loop(events, close_rx, thread_lanes, thread_dropped))?;

        Ok(Self {
            config,
            publisher,
            lanes,
            sink_dropped,
            close_tx: Some(close_tx),
            dispatcher: Some(dispatcher),
            sink_joins: Vec::new(),
        })
    }

    pub fn publisher(&self) -> AlertPublisher {
        self.publisher.clone()
    }

    pub fn subscribe(&mut self, mut sink: Box<dyn AlertSink>) -> io::Result<()> {
        let name = sink.name().to_string();
        let (tx, rx) = bounded::<AlertEvent>(self.config.sink_capacity.max(1));
        let join = thread::Builder::new()
            .name(format!("probed-sink-{name}"))
            .spawn(move || {
                for event in rx.iter() {
                    if let Err(err) = sink.deliver(&event) {
                        warn!("{err}");
                    }
                }
                debug!("alert sink [{}] stopped", sink.name());
            })?;

        self.lanes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SinkLane { name, tx });
        self.sink_joins.push(join);
        Ok(())
    }

    pub fn sink_count(&self) -> usize {
        self.lanes.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Events lost on the bus itself plus events a full sink queue refused.
    pub fn dropped(&self) -> u64 {
        self.publisher.dropped() + self.sink_dropped.load(Ordering::Relaxed)
    }

    /// Delivers whatever is queued, then stops the dispatcher and every sink.
    pub fn shutdown(mut self) {
        self.close_tx.take();
        if let Some(join) = self.dispatcher.take()
            && join.join().is_err()
        {
            warn!("alert bus dispatcher panicked");
        }
        for join in self.sink_joins.drain(..) {
            if join.join().is_err() {
                warn!("alert sink thread panicked");
            }
        }
    }
}

impl Drop for AlertBus {
    fn drop(&mut self) {
        self.close_tx.take();
    }
}

fn dispatch_loop(
    events: Receiver<AlertEvent>,
    close: Receiver<()>,
    lanes: Arc<Mutex<Vec<SinkLane>>>,
    dropped: Arc<AtomicU64>,
) {
    loop {
        select! {
            recv(events) -> msg => match msg {
                Ok(event) => fan_out(&lanes, event, &dropped),
                Err(_) => break,
            },
            recv(close) -> _ => {
                for event in events.try_iter() {
                    fan_out(&lanes, event, &dropped);
                }
                break;
            }
        }
    }
    // Closing the lanes lets every sink thread finish its queue and exit.
    lanes.lock().unwrap_or_else(PoisonError::into_inner).clear();
}

fn fan_out(lanes: &Mutex<Vec<SinkLane>>, event: AlertEvent, dropped: &AtomicU64) {
    let mut lanes = lanes.lock().unwrap_or_else(PoisonError::into_inner);
    lanes.retain(|lane| match lane.tx.try_send(event.clone()) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            dropped.fetch_add(1, Ordering::Relaxed);
            warn!(
                "alert sink [{}] is lagging, dropping event for probe [{}]",
                lane.name, event.name
            );
            true
        }
        Err(TrySendError::Disconnected(_)) => {
            warn!("alert sink [{}] is gone, unsubscribing it", lane.name);
            false
        }
    });
}
