//! Durable inventory snapshots.
//!
//! When a participant is admitted, their inventory is written to a
//! per-participant document *before* it is cleared. When they leave, the
//! document is read back, applied, and only then deleted. That ordering
//! is what makes the scheme crash-safe:
//!
//! ```text
//! stash():   capture ──→ save doc ──→ clear
//!                           │
//!                     (crash here: doc exists, inventory intact or cleared)
//!                           │
//! restore(): load doc ──→ apply ──→ delete doc
//!                                      │
//!                     (crash before delete: doc re-applied next time, same result)
//! ```
//!
//! The document is keyed by [`DurableId`] and carries everything needed
//! to restore, so a leftover from a crash can be applied on the
//! participant's next admission without any in-memory round state.

use std::time::{SystemTime, UNIX_EPOCH};

use roundkeeper_model::{DurableId, ParticipantId};
use roundkeeper_store::{DocumentKey, Documents};
use serde::{Deserialize, Serialize};

use crate::{Inventories, InventorySnapshot, SessionError};

const SNAPSHOT_VERSION: u8 = 1;

/// Reference to a saved snapshot, kept on the participant's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotHandle {
    pub durable: DurableId,
    /// Wall-clock save time, milliseconds since the Unix epoch.
    pub saved_at_ms: u64,
}

/// On-disk form of a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotDocument {
    version: u8,
    durable: DurableId,
    saved_at_ms: u64,
    inventory: InventorySnapshot,
}

/// Saves, restores, and lists participant snapshots.
#[derive(Clone)]
pub struct SnapshotStore {
    docs: Documents,
}

impl SnapshotStore {
    pub fn new(docs: Documents) -> Self {
        Self { docs }
    }

    /// Returns `true` if a snapshot is waiting to be restored.
    pub fn has(&self, durable: &DurableId) -> Result<bool, SessionError> {
        Ok(self.load(durable)?.is_some())
    }

    /// Reads a saved snapshot without deleting it.
    pub fn load(&self, durable: &DurableId) -> Result<Option<InventorySnapshot>, SessionError> {
        let doc: Option<SnapshotDocument> = self.docs.load(&key(durable))?;
        Ok(doc.map(|d| d.inventory))
    }

    /// Writes a snapshot document, replacing any previous one.
    ///
    /// # Errors
    /// [`SessionError::SnapshotSave`] if the document couldn't be written.
    pub fn save(
        &self,
        durable: &DurableId,
        inventory: &InventorySnapshot,
    ) -> Result<SnapshotHandle, SessionError> {
        let saved_at_ms = now_ms();
        let doc = SnapshotDocument {
            version: SNAPSHOT_VERSION,
            durable: durable.clone(),
            saved_at_ms,
            inventory: inventory.clone(),
        };
        self.docs
            .save(&key(durable), &doc)
            .map_err(|source| SessionError::SnapshotSave {
                durable: durable.clone(),
                source,
            })?;
        tracing::debug!(%durable, "inventory snapshot saved");
        Ok(SnapshotHandle {
            durable: durable.clone(),
            saved_at_ms,
        })
    }

    /// Captures, saves, then clears the participant's inventory.
    ///
    /// Fails closed: if capturing or saving fails, the inventory is not
    /// touched. If clearing fails after the save, the snapshot is applied
    /// back and discarded so the participant ends up where they started.
    pub fn stash(
        &self,
        durable: &DurableId,
        participant: ParticipantId,
        inventories: &dyn Inventories,
    ) -> Result<SnapshotHandle, SessionError> {
        let inventory = inventories.capture(participant)?;
        let handle = self.save(durable, &inventory)?;

        if let Err(e) = inventories.clear(participant) {
            tracing::error!(%durable, %participant, error = %e, "clearing inventory failed, undoing stash");
            if let Err(undo) = inventories.apply(participant, &inventory) {
                // Keep the document: it's the only copy that's known good.
                tracing::error!(%durable, error = %undo, "undo failed, snapshot kept for recovery");
                return Err(e);
            }
            self.discard(durable)?;
            return Err(e);
        }

        Ok(handle)
    }

    /// Applies the saved snapshot to the participant, then deletes it.
    ///
    /// Returns `Ok(false)` if there was nothing to restore. If applying
    /// fails, the document is kept so a later attempt can retry.
    pub fn restore(
        &self,
        durable: &DurableId,
        participant: ParticipantId,
        inventories: &dyn Inventories,
    ) -> Result<bool, SessionError> {
        let Some(inventory) = self.load(durable)? else {
            return Ok(false);
        };
        inventories.apply(participant, &inventory)?;
        self.discard(durable)?;
        tracing::debug!(%durable, %participant, "inventory restored");
        Ok(true)
    }

    /// Deletes a snapshot without applying it.
    pub fn discard(&self, durable: &DurableId) -> Result<bool, SessionError> {
        Ok(self.docs.delete(&key(durable))?)
    }

    /// Durable ids with a snapshot still on disk. Non-empty at startup
    /// means participants were mid-round when the process went down.
    pub fn pending(&self) -> Result<Vec<DurableId>, SessionError> {
        Ok(self.docs.store().snapshot_ids()?)
    }
}

fn key(durable: &DurableId) -> DocumentKey {
    DocumentKey::Snapshot(durable.clone())
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// =========================================================================
// Tests
// =========================================================================
