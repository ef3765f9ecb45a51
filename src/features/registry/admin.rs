//! Offline edits of the probe store, for when no registry is running.
//! A running registry picks these changes up on its next start.

use crate::error::RegistryError;
use crate::probe::ProbeRecord;
use crate::storage::ProbeStore;
use crate::validator::{validate_name, validate_probe};

pub fn add_record(store: &dyn ProbeStore, record: &ProbeRecord) -> Result<(), RegistryError> {
    validate_probe(record)?;
    if store.get(&record.name)?.is_some() {
        return Err(RegistryError::already_exists(record.name.clone()));
    }
    store.insert(record)?;
    Ok(())
}

pub fn remove_record(store: &dyn ProbeStore, name: &str) -> Result<(), RegistryError> {
    validate_name(name)?;
    if store.get(name)?.is_none() {
        return Err(RegistryError::not_found(name));
    }
    store.delete(name)?;
    Ok(())
}

pub fn list_records(store: &dyn ProbeStore) -> Result<Vec<ProbeRecord>, RegistryError> {
    Ok(store.get_all()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn add_validates_and_rejects_duplicates() {
        let store = MemoryStore::new();
        let record = ProbeRecord::new("svc", "http://localhost/", 5);

        add_record(&store, &record).expect("add");
        assert!(matches!(
            add_record(&store, &record),
            Err(RegistryError::AlreadyExists { .. })
        ));
        assert!(matches!(
            add_record(&store, &ProbeRecord::new("bad", "localhost:8080", 5)),
            Err(RegistryError::Validation(_))
        ));
        assert_eq!(list_records(&store).expect("list"), vec![record]);
    }

    #[test]
    fn remove_reports_missing_probe() {
        let store = MemoryStore::new();
        add_record(&store, &ProbeRecord::new("svc", "http://localhost/", 5)).expect("add");

        remove_record(&store, "svc").expect("remove");
        assert!(matches!(
            remove_record(&store, "svc"),
            Err(RegistryError::NotFound { .. })
        ));
        assert!(list_records(&store).expect("list").is_empty());
    }
}
