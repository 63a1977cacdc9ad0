//! The namespace's arena definitions, persisted to the `arenas` document.

use std::collections::BTreeMap;

use roundkeeper_model::{ArenaDescriptor, ArenaKey};
use roundkeeper_store::{DocumentKey, Documents, StoreError};

/// Arena name → descriptor, looked up case-insensitively.
///
/// Every mutation is written through to the store immediately; arena
/// edits are rare and losing one to a crash would be surprising.
pub struct ArenaCatalog {
    docs: Documents,
    arenas: BTreeMap<ArenaKey, ArenaDescriptor>,
}

impl ArenaCatalog {
    /// Loads the catalog, or starts empty if the document doesn't exist.
    pub fn load(docs: Documents) -> Result<Self, StoreError> {
        let stored: BTreeMap<String, ArenaDescriptor> =
            docs.load_or_default(&DocumentKey::Arenas)?;
        let arenas = stored
            .into_values()
            .map(|arena| (arena.key(), arena))
            .collect::<BTreeMap<_, _>>();
        tracing::debug!(arenas = arenas.len(), "arena catalog loaded");
        Ok(Self { docs, arenas })
    }

    pub fn get(&self, key: &ArenaKey) -> Option<&ArenaDescriptor> {
        self.arenas.get(key)
    }

    pub fn contains(&self, key: &ArenaKey) -> bool {
        self.arenas.contains_key(key)
    }

    /// Adds or replaces an arena. Returns the previous definition.
    ///
    /// Definitions are not validated here so an arena can be built up
    /// one spawn at a time; validation happens when a round is created.
    pub fn define(&mut self, arena: ArenaDescriptor) -> Result<Option<ArenaDescriptor>, StoreError> {
        let key = arena.key();
        let previous = self.arenas.insert(key.clone(), arena);
        if let Err(e) = self.save() {
            // Keep memory and disk in agreement.
            match previous.clone() {
                Some(old) => self.arenas.insert(key, old),
                None => self.arenas.remove(&key),
            };
            return Err(e);
        }
        Ok(previous)
    }

    /// Removes an arena. Returns `Ok(None)` if it wasn't defined.
    pub fn remove(&mut self, key: &ArenaKey) -> Result<Option<ArenaDescriptor>, StoreError> {
        let Some(removed) = self.arenas.remove(key) else {
            return Ok(None);
        };
        if let Err(e) = self.save() {
            self.arenas.insert(key.clone(), removed);
            return Err(e);
        }
        Ok(Some(removed))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArenaDescriptor> {
        self.arenas.values()
    }

    pub fn len(&self) -> usize {
        self.arenas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arenas.is_empty()
    }

    fn save(&self) -> Result<(), StoreError> {
        let doc: BTreeMap<&str, &ArenaDescriptor> = self
            .arenas
            .values()
            .map(|arena| (arena.name.as_str(), arena))
            .collect();
        self.docs.save(&DocumentKey::Arenas, &doc)
    }
}
