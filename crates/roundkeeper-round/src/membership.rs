//! Which round each participant is in, across namespaces.
//!
//! A participant's inventory can only be stashed once. Registries that
//! share a [`Memberships`] handle (through [`Services`](crate::Services))
//! refuse to admit someone who is already in a round in any of them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use roundkeeper_model::{ArenaKey, ParticipantId};

/// Where a participant is playing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub namespace: String,
    pub arena: ArenaKey,
}

/// Shared participant → round directory.
///
/// Cloning is cheap and every clone sees the same entries. A host running
/// several namespaces hands the same directory to each of them.
#[derive(Debug, Clone, Default)]
pub struct Memberships {
    entries: Arc<Mutex<HashMap<ParticipantId, Membership>>>,
}

impl Memberships {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<ParticipantId, Membership>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, participant: ParticipantId) -> Option<Membership> {
        self.entries().get(&participant).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// The arena `participant` is playing in within `namespace`.
    pub(crate) fn arena_in(&self, participant: ParticipantId, namespace: &str) -> Option<ArenaKey> {
        self.entries()
            .get(&participant)
            .filter(|m| m.namespace == namespace)
            .map(|m| m.arena.clone())
    }

    /// Records `participant` as playing in `arena`. Fails with the existing
    /// membership if they already hold one.
    pub(crate) fn claim(
        &self,
        participant: ParticipantId,
        namespace: &str,
        arena: &ArenaKey,
    ) -> Result<(), Membership> {
        let mut entries = self.entries();
        if let Some(existing) = entries.get(&participant) {
            return Err(existing.clone());
        }
        entries.insert(
            participant,
            Membership {
                namespace: namespace.to_string(),
                arena: arena.clone(),
            },
        );
        Ok(())
    }

    /// Drops `participant`'s membership if `namespace` owns it.
    pub(crate) fn release(&self, participant: ParticipantId, namespace: &str) -> bool {
        let mut entries = self.entries();
        if entries.get(&participant).is_some_and(|m| m.namespace == namespace) {
            entries.remove(&participant);
            return true;
        }
        false
    }

    pub(crate) fn release_arena(&self, namespace: &str, arena: &ArenaKey) {
        self.entries()
            .retain(|_, m| m.namespace != namespace || m.arena != *arena);
    }

    pub(crate) fn release_namespace(&self, namespace: &str) {
        self.entries().retain(|_, m| m.namespace != namespace);
    }
}
