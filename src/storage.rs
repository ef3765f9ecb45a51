use crate::error::StoreError;
use crate::probe::ProbeRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, RwLock};

const STATE_FILE_VERSION: &str = "1";
const PROBE_BUCKET: &str = "probe";

/// Durable mapping from probe name to its record.
///
/// A successful `insert` must be visible to the next `get`/`get_all`, and
/// deleting a missing name is not an error.
pub trait ProbeStore: Send + Sync {
    fn insert(&self, record: &ProbeRecord) -> Result<(), StoreError>;
    fn get(&self, name: &str) -> Result<Option<ProbeRecord>, StoreError>;
    fn get_all(&self) -> Result<Vec<ProbeRecord>, StoreError>;
    fn delete(&self, name: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, ProbeRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProbeStore for MemoryStore {
    fn insert(&self, record: &ProbeRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::Unavailable)?;
        records.insert(record.name.clone(), record.clone());
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Option<ProbeRecord>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::Unavailable)?;
        Ok(records.get(name).cloned())
    }

    fn get_all(&self) -> Result<Vec<ProbeRecord>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::Unavailable)?;
        Ok(records.values().cloned().collect())
    }

    fn delete(&self, name: &str) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::Unavailable)?;
        records.remove(name);
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoreFile {
    version: String,
    buckets: BTreeMap<String, BTreeMap<String, ProbeRecord>>,
}

impl Default for StoreFile {
    fn default() -> Self {
        let mut buckets = BTreeMap::new();
        buckets.insert(PROBE_BUCKET.to_string(), BTreeMap::new());
        Self {
            version: STATE_FILE_VERSION.to_string(),
            buckets,
        }
    }
}

impl StoreFile {
    fn probes(&self) -> Option<&BTreeMap<String, ProbeRecord>> {
        self.buckets.get(PROBE_BUCKET)
    }

    fn probes_mut(&mut self) -> &mut BTreeMap<String, ProbeRecord> {
        self.buckets.entry(PROBE_BUCKET.to_string()).or_default()
    }
}

/// Probe records kept in a single JSON document on disk.
///
/// Every mutation rewrites the whole file through a temporary sibling and a
/// rename, so a crash leaves either the old or the new document.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    state: Mutex<StoreFile>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
            && !dir.exists()
        {
            fs::create_dir_all(dir)?;
        }

        let mut state = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str::<StoreFile>(&content).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?
        } else {
            StoreFile::default()
        };
        state.probes_mut();

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("probed").join("probes.json"))
    }

    fn mutate(&self, apply: impl FnOnce(&mut StoreFile)) -> Result<(), StoreError> {
        let mut state = self.state.lock().map_err(|_| StoreError::Unavailable)?;
        let mut next = state.clone();
        apply(&mut next);
        self.persist(&next)?;
        *state = next;
        Ok(())
    }

    fn persist(&self, state: &StoreFile) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl ProbeStore for JsonFileStore {
    fn insert(&self, record: &ProbeRecord) -> Result<(), StoreError> {
        self.mutate(|state| {
            state.probes_mut().insert(record.name.clone(), record.clone());
        })
    }

    fn get(&self, name: &str) -> Result<Option<ProbeRecord>, StoreError> {
        let state = self.state.lock().map_err(|_| StoreError::Unavailable)?;
        Ok(state.probes().and_then(|probes| probes.get(name)).cloned())
    }

    fn get_all(&self) -> Result<Vec<ProbeRecord>, StoreError> {
        let state = self.state.lock().map_err(|_| StoreError::Unavailable)?;
        Ok(state
            .probes()
            .map(|probes| probes.values().cloned().collect())
            .unwrap_or_default())
    }

    fn delete(&self, name: &str) -> Result<(), StoreError> {
        self.mutate(|state| {
            state.probes_mut().remove(name);
        })
    }
}
