//! In-memory document store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use roundkeeper_model::DurableId;

use crate::{DocumentKey, DocumentStore, StoreError, check_durable_id};

/// Keeps documents in a map. Nothing survives the process, which is
/// exactly what tests want; cloning the `Arc` around it is how tests
/// simulate "restart with the same disk".
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<DocumentKey, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.docs().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs().is_empty()
    }

    /// Overwrites a document with arbitrary bytes. Used to simulate
    /// on-disk corruption.
    pub fn put_raw(&self, key: DocumentKey, bytes: impl Into<Vec<u8>>) {
        self.docs().insert(key, bytes.into());
    }

    // A panic while holding the lock can't leave the map half-updated
    // (every operation is a single insert/remove), so recover the guard.
    fn docs(&self) -> MutexGuard<'_, HashMap<DocumentKey, Vec<u8>>> {
        self.docs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DocumentStore for MemoryStore {
    fn load(&self, key: &DocumentKey) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.docs().get(key).cloned())
    }

    fn save(&self, key: &DocumentKey, bytes: &[u8]) -> Result<(), StoreError> {
        if let DocumentKey::Snapshot(id) = key {
            check_durable_id(id)?;
        }
        self.docs().insert(key.clone(), bytes.to_vec());
        Ok(())
    }

    fn delete(&self, key: &DocumentKey) -> Result<bool, StoreError> {
        Ok(self.docs().remove(key).is_some())
    }

    fn snapshot_ids(&self) -> Result<Vec<DurableId>, StoreError> {
        let mut ids: Vec<DurableId> = self
            .docs()
            .keys()
            .filter_map(|k| match k {
                DocumentKey::Snapshot(id) => Some(id.clone()),
                _ => None,
            })
            .collect();
        ids.sort();
        Ok(ids)
    }
}
