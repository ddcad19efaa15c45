use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::VersionStore;
use crate::{errors::StoreError, types::VersionRecord};

type Sets = HashMap<String, BTreeMap<u64, VersionRecord>>;

/// In-process version store with the same conditional-write semantics as Redis.
///
/// Clones share state, so two migrators built from clones race the same way
/// two processes racing against one Redis table would.
#[derive(Debug, Clone, Default)]
pub struct MemoryVersionStore {
    sets: Arc<Mutex<Sets>>,
}

impl MemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held for a set.
    pub fn len(&self, migration_set: &str) -> usize {
        self.lock().get(migration_set).map(BTreeMap::len).unwrap_or(0)
    }

    pub fn is_empty(&self, migration_set: &str) -> bool {
        self.len(migration_set) == 0
    }

    fn lock(&self) -> MutexGuard<'_, Sets> {
        self.sets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl VersionStore for MemoryVersionStore {
    async fn latest_version(&self, migration_set: &str) -> Result<Option<VersionRecord>, StoreError> {
        Ok(self
            .lock()
            .get(migration_set)
            .and_then(|records| records.last_key_value())
            .map(|(_, record)| record.clone()))
    }

    async fn commit(&self, record: &VersionRecord) -> Result<(), StoreError> {
        let mut sets = self.lock();
        let records = sets.entry(record.migration_set.clone()).or_default();

        if records.contains_key(&record.version_number) {
            return Err(StoreError::DuplicateVersion {
                migration_set: record.migration_set.clone(),
                version_number: record.version_number,
            });
        }

        records.insert(record.version_number, record.clone());
        Ok(())
    }

    async fn history(&self, migration_set: &str) -> Result<Vec<VersionRecord>, StoreError> {
        Ok(self
            .lock()
            .get(migration_set)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }
}
