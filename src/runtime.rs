use crate::alert::{AlertEvent, AlertPublisher};
use crate::features::probe::CheckEngine;
use crate::probe::{ProbeRecord, ProbeStatus, ProbeTarget};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use log::{debug, info, warn};
use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Live status of one probe. Written only by the probe's runner.
pub type SharedStatus = Arc<Mutex<ProbeStatus>>;

#[derive(Clone, Debug)]
pub enum ControlMessage {
    Stop,
}

/// Everything a runner needs besides the probe itself.
#[derive(Clone)]
pub struct RunnerContext {
    pub checker: Arc<dyn CheckEngine>,
    pub alerts: AlertPublisher,
    pub notify_initial_status: bool,
}

pub struct RunnerSpec {
    pub record: ProbeRecord,
    pub target: ProbeTarget,
    pub interval: Duration,
}

impl RunnerSpec {
    pub fn new(record: ProbeRecord, target: ProbeTarget) -> Self {
        let interval = record.interval();
        Self {
            record,
            target,
            interval,
        }
    }
}

/// Owner side of a running probe: the single-slot stop signal and the thread.
///
/// Dropping the handle also stops the runner, since its control channel disconnects.
pub struct RunnerHandle {
    sender: Sender<ControlMessage>,
    join: Option<JoinHandle<()>>,
}

impl RunnerHandle {
    /// Signals the runner to exit at its next loop boundary. Never blocks.
    pub fn stop(&self) {
        // Full: a stop is already pending. Disconnected: the runner is gone.
        let _ = self.sender.try_send(ControlMessage::Stop);
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stops the runner and waits for an in-flight check to finish.
    pub fn stop_and_join(mut self) {
        self.stop();
        if let Some(join) = self.join.take()
            && join.join().is_err()
        {
            warn!("probe runner thread panicked");
        }
    }
}

pub fn spawn_runner(
    spec: RunnerSpec,
    status: SharedStatus,
    ctx: RunnerContext,
) -> io::Result<RunnerHandle> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let join = thread::Builder::new()
        .name(format!("probe-{}", spec.record.name.replace('\0', "")))
        .spawn(move || run_worker(spec, status, ctx, rx))?;
    Ok(RunnerHandle {
        sender: tx,
        join: Some(join),
    })
}

fn run_worker(
    spec: RunnerSpec,
    status: SharedStatus,
    ctx: RunnerContext,
    control_rx: Receiver<ControlMessage>,
) {
    let name = spec.record.name.as_str();
    info!(
        "<<{} PROBE [{name}]>> monitoring {} every {:?}",
        spec.target.kind_label(),
        spec.record.url,
        spec.interval
    );

    loop {
        match control_rx.try_recv() {
            Ok(ControlMessage::Stop) | Err(TryRecvError::Disconnected) => break,
            Err(TryRecvError::Empty) => {}
        }

        let observed = observe(&*ctx.checker, &spec);
        let previous = replace_status(&status, observed);
        if should_alert(previous, observed, ctx.notify_initial_status) {
            ctx.alerts
                .publish(AlertEvent::transition(&spec.record, previous, observed));
        }

        match control_rx.recv_timeout(spec.interval) {
            Ok(ControlMessage::Stop) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
    }

    info!(
        "<<{} PROBE [{name}]>> stopping probe",
        spec.target.kind_label()
    );
}

fn observe(checker: &dyn CheckEngine, spec: &RunnerSpec) -> ProbeStatus {
    let kind = spec.target.kind_label();
    let name = spec.record.name.as_str();
    match checker.check(&spec.target) {
        Ok(()) => {
            debug!("<<{kind} PROBE [{name}]>> {} is alive", spec.record.url);
            ProbeStatus::Up
        }
        Err(err) => {
            debug!("<<{kind} PROBE [{name}]>> {} is down: {err}", spec.record.url);
            ProbeStatus::Down
        }
    }
}

fn replace_status(status: &SharedStatus, observed: ProbeStatus) -> ProbeStatus {
    let mut current = status.lock().unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *current, observed)
}

pub(crate) fn should_alert(
    previous: ProbeStatus,
    observed: ProbeStatus,
    notify_initial_status: bool,
) -> bool {
    if previous == observed {
        return false;
    }
    previous != ProbeStatus::Unknown || notify_initial_status
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{TransportError, TransportErrorKind};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;
    use url::Url;

    /// Plays back a script of outcomes, repeating the last one forever.
    struct ScriptedChecker {
        script: Mutex<VecDeque<bool>>,
        last: Mutex<bool>,
        calls: AtomicUsize,
    }

    impl ScriptedChecker {
        fn new(script: &[bool]) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.iter().copied().collect()),
                last: Mutex::new(false),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl CheckEngine for ScriptedChecker {
        fn check(&self, _target: &ProbeTarget) -> Result<(), TransportError> {
            let mut last = self.last.lock().expect("lock");
            if let Some(next) = self.script.lock().expect("lock").pop_front() {
                *last = next;
            }
            self.calls.fetch_add(1, Ordering::SeqCst);
            if *last {
                Ok(())
            } else {
                Err(TransportError::new(TransportErrorKind::HttpStatus, "HTTP status 500"))
            }
        }
    }

    fn spec(interval: Duration) -> RunnerSpec {
        let record = ProbeRecord::new("svc", "http://x/", 1);
        let target = ProbeTarget::Http(Url::parse("http://x/").expect("url"));
        RunnerSpec {
            record,
            target,
            interval,
        }
    }

    fn wait_for(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not met in time");
            thread::sleep(Duration::from_millis(2));
        }
    }

    fn start(
        checker: Arc<ScriptedChecker>,
        notify_initial_status: bool,
        interval: Duration,
    ) -> (RunnerHandle, SharedStatus, Receiver<AlertEvent>) {
        let (alerts, events) = AlertPublisher::channel(16, Duration::from_millis(50));
        let status = SharedStatus::default();
        let ctx = RunnerContext {
            checker,
            alerts,
            notify_initial_status,
        };
        let handle = spawn_runner(spec(interval), Arc::clone(&status), ctx).expect("spawn");
        (handle, status, events)
    }

    #[test]
    fn alerts_once_when_up_turns_down() {
        let checker = ScriptedChecker::new(&[true, false, false, false]);
        let (handle, status, events) =
            start(Arc::clone(&checker), false, Duration::from_millis(1));

        wait_for(|| checker.calls() >= 6);
        handle.stop_and_join();

        let received: Vec<AlertEvent> = events.try_iter().collect();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].previous, ProbeStatus::Up);
        assert_eq!(received[0].status, ProbeStatus::Down);
        assert_eq!(*status.lock().expect("lock"), ProbeStatus::Down);
    }

    #[test]
    fn first_observation_is_silent_by_default() {
        let checker = ScriptedChecker::new(&[true]);
        let (handle, status, events) =
            start(Arc::clone(&checker), false, Duration::from_millis(1));

        wait_for(|| checker.calls() >= 3);
        handle.stop_and_join();

        assert_eq!(*status.lock().expect("lock"), ProbeStatus::Up);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn first_observation_alerts_when_enabled() {
        let checker = ScriptedChecker::new(&[false]);
        let (handle, _status, events) =
            start(Arc::clone(&checker), true, Duration::from_millis(1));

        wait_for(|| checker.calls() >= 3);
        handle.stop_and_join();

        let received: Vec<AlertEvent> = events.try_iter().collect();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].previous, ProbeStatus::Unknown);
        assert_eq!(received[0].status, ProbeStatus::Down);
    }

    #[test]
    fn stop_ends_runner_during_long_interval() {
        let checker = ScriptedChecker::new(&[true]);
        let (handle, _status, _events) =
            start(Arc::clone(&checker), false, Duration::from_secs(3600));

        wait_for(|| checker.calls() >= 1);
        handle.stop();
        wait_for(|| handle.is_finished());
        assert_eq!(checker.calls(), 1);
    }

    #[test]
    fn dropping_handle_stops_runner() {
        let checker = ScriptedChecker::new(&[true]);
        let (handle, _status, _events) =
            start(Arc::clone(&checker), false, Duration::from_millis(1));
        wait_for(|| checker.calls() >= 1);
        drop(handle);

        thread::sleep(Duration::from_millis(50));
        let settled = checker.calls();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(checker.calls(), settled);
    }

    #[test]
    fn should_alert_only_on_change() {
        use ProbeStatus::*;
        assert!(!should_alert(Up, Up, true));
        assert!(should_alert(Up, Down, false));
        assert!(should_alert(Down, Up, false));
        assert!(!should_alert(Unknown, Up, false));
        assert!(should_alert(Unknown, Down, true));
    }
}
