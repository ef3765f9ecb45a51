mod admin;

pub use admin::{add_record, list_records, remove_record};

use crate::alert::AlertPublisher;
use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::features::probe::CheckEngine;
use crate::probe::{Probe, ProbeRecord, ProbeStatus, ProbeTarget};
use crate::runtime::{RunnerContext, RunnerHandle, RunnerSpec, SharedStatus, spawn_runner};
use crate::storage::ProbeStore;
use crate::validator::{validate_name, validate_probe};
use log::{error, info, warn};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct LiveProbe {
    record: ProbeRecord,
    status: SharedStatus,
    runner: RunnerHandle,
}

impl LiveProbe {
    fn snapshot(&self) -> Probe {
        let status = *self.status.lock().unwrap_or_else(PoisonError::into_inner);
        Probe::from_record(&self.record, status)
    }
}

/// Authoritative set of monitored probes.
///
/// Every mutation goes through one lock, so create/update/delete calls are
/// serialized against each other. Runners never take this lock; they only
/// write their own [`SharedStatus`].
pub struct ProbeRegistry {
    store: Arc<dyn ProbeStore>,
    ctx: RunnerContext,
    probes: Mutex<BTreeMap<String, LiveProbe>>,
}

impl ProbeRegistry {
    /// Replays every stored record and starts one runner per record.
    ///
    /// A stored record that no longer validates is skipped with a warning
    /// rather than failing startup.
    pub fn open(
        store: Arc<dyn ProbeStore>,
        checker: Arc<dyn CheckEngine>,
        alerts: AlertPublisher,
        config: RegistryConfig,
    ) -> Result<Self, RegistryError> {
        let registry = Self {
            store,
            ctx: RunnerContext {
                checker,
                alerts,
                notify_initial_status: config.notify_initial_status,
            },
            probes: Mutex::new(BTreeMap::new()),
        };

        let records = registry.store.get_all()?;
        let mut probes = registry.lock();
        for record in records {
            let target = match validate_probe(&record) {
                Ok(target) => target,
                Err(err) => {
                    warn!("skipping stored probe [{}]: {err}", record.name);
                    continue;
                }
            };
            let live = registry.launch(record, target)?;
            probes.insert(live.record.name.clone(), live);
        }
        info!("loaded {} stored probes", probes.len());
        drop(probes);

        Ok(registry)
    }

    pub fn create(&self, candidate: ProbeRecord) -> Result<(), RegistryError> {
        let target = validate_probe(&candidate)?;
        let mut probes = self.lock();

        if self.store.get(&candidate.name)?.is_some() {
            return Err(RegistryError::already_exists(candidate.name));
        }
        self.store.insert(&candidate).inspect_err(|err| {
            error!("failed to persist probe [{}]: {err}", candidate.name);
        })?;

        let live = match self.launch(candidate, target) {
            Ok(live) => live,
            Err(err) => {
                if let RegistryError::Runner { name, .. } = &err
                    && let Err(rollback) = self.store.delete(name)
                {
                    error!("failed to roll back probe [{name}]: {rollback}");
                }
                return Err(err);
            }
        };
        info!("probe [{}] has been successfully created", live.record.name);
        probes.insert(live.record.name.clone(), live);
        Ok(())
    }

    /// Existence is decided by the store; status comes from the live runner.
    pub fn read(&self, name: &str) -> Result<Probe, RegistryError> {
        let probes = self.lock();
        let record = self
            .store
            .get(name)?
            .ok_or_else(|| RegistryError::not_found(name))?;
        Ok(probes
            .get(name)
            .map(LiveProbe::snapshot)
            .unwrap_or_else(|| Probe::from_record(&record, ProbeStatus::Unknown)))
    }

    /// Current in-memory state of every registered probe, ordered by name.
    pub fn read_all(&self) -> Vec<Probe> {
        self.lock().values().map(LiveProbe::snapshot).collect()
    }

    /// Replaces probe `name` with `candidate`, possibly under a new name.
    ///
    /// The old runner is signalled before the store is touched. If the store
    /// then fails, the old entry stays registered but is no longer monitored
    /// until a later successful update or a restart reloads it.
    pub fn update(&self, name: &str, candidate: ProbeRecord) -> Result<(), RegistryError> {
        let target = validate_probe(&candidate)?;
        let mut probes = self.lock();

        if self.store.get(name)?.is_none() {
            return Err(RegistryError::not_found(name));
        }
        if candidate.name != name && self.store.get(&candidate.name)?.is_some() {
            return Err(RegistryError::already_exists(candidate.name));
        }

        if let Some(old) = probes.get(name) {
            old.runner.stop();
        }
        self.store.delete(name).inspect_err(|err| {
            error!("failed to delete probe [{name}] during update: {err}");
        })?;
        self.store.insert(&candidate).inspect_err(|err| {
            error!("failed to persist probe [{}] during update: {err}", candidate.name);
        })?;
        probes.remove(name);

        let live = self.launch(candidate, target)?;
        info!("probe [{name}] has been successfully updated as [{}]", live.record.name);
        probes.insert(live.record.name.clone(), live);
        Ok(())
    }

    pub fn delete(&self, name: &str) -> Result<(), RegistryError> {
        validate_name(name)?;
        let mut probes = self.lock();

        if self.store.get(name)?.is_none() {
            return Err(RegistryError::not_found(name));
        }
        self.store.delete(name).inspect_err(|err| {
            error!("failed to delete probe [{name}]: {err}");
        })?;
        if let Some(live) = probes.remove(name) {
            live.runner.stop();
        }
        info!("probe [{name}] has been successfully deleted");
        Ok(())
    }

    /// Stops every runner and waits for in-flight checks to finish.
    /// Stored records are left untouched.
    pub fn shutdown(&self) {
        let drained = std::mem::take(&mut *self.lock());
        for live in drained.values() {
            live.runner.stop();
        }
        for (_, live) in drained {
            live.runner.stop_and_join();
        }
    }

    fn launch(&self, record: ProbeRecord, target: ProbeTarget) -> Result<LiveProbe, RegistryError> {
        let status = SharedStatus::default();
        let runner = spawn_runner(
            RunnerSpec::new(record.clone(), target),
            Arc::clone(&status),
            self.ctx.clone(),
        )
        .map_err(|source| RegistryError::Runner {
            name: record.name.clone(),
            source,
        })?;
        Ok(LiveProbe {
            record,
            status,
            runner,
        })
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, LiveProbe>> {
        self.probes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
