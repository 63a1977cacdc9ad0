//! The write-once change log.

use std::collections::BTreeMap;

use roundkeeper_model::{ArenaKey, BlockPos, ContainerContents, ModelError};
use roundkeeper_store::{DocumentKey, Documents, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ChangeRecord, Environment, RollbackError};

/// When recorded changes reach the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Save the document on every new record.
    #[default]
    Immediate,
    /// Mark the log dirty and save on the next [`ChangeLog::flush`]. The
    /// host flushes once per tick.
    Deferred,
}

/// Outcome of rolling back one arena.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollbackReport {
    pub blocks_restored: usize,
    pub containers_restored: usize,
    /// Positions that could not be restored or whose record was corrupt.
    pub skipped: usize,
    /// `true` if the arena's world was unavailable and the log was kept
    /// for a later attempt.
    pub deferred: bool,
    /// `false` if the cleared log couldn't be written back. The log stays
    /// dirty and the next flush retries.
    pub persisted: bool,
}

impl RollbackReport {
    /// Total positions written back.
    pub fn restored(&self) -> usize {
        self.blocks_restored + self.containers_restored
    }

    /// `true` if there was nothing to roll back.
    pub fn is_noop(&self) -> bool {
        self.restored() == 0 && self.skipped == 0 && !self.deferred
    }
}

/// Recorded originals for one arena.
#[derive(Debug, Clone, Default)]
struct ArenaLog {
    world: String,
    blocks: BTreeMap<BlockPos, ChangeRecord>,
    containers: BTreeMap<BlockPos, ContainerContents>,
    /// Entries dropped at load time because they didn't decode.
    corrupt: usize,
}

impl ArenaLog {
    fn new(world: &str) -> Self {
        Self {
            world: world.to_string(),
            ..Default::default()
        }
    }

    fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.containers.is_empty() && self.corrupt == 0
    }
}

// On-disk shape. Records are kept as raw JSON values so one bad entry
// doesn't make the whole document unreadable.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ChangeLogDocument {
    #[serde(default)]
    arenas: BTreeMap<String, ArenaLogDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ArenaLogDocument {
    world: String,
    #[serde(default)]
    blocks: BTreeMap<String, Value>,
    #[serde(default)]
    containers: BTreeMap<String, Value>,
}

/// Per-namespace ledger of original environment state, keyed by arena and
/// position.
///
/// The log is always fully in memory; the document store only sees whole
/// snapshots of it. Rollback reads from memory, so a deferred write can
/// never make rollback miss a record.
pub struct ChangeLog {
    docs: Documents,
    policy: WritePolicy,
    arenas: BTreeMap<ArenaKey, ArenaLog>,
    dirty: bool,
}

impl ChangeLog {
    /// An empty log that hasn't touched the store.
    pub fn new(docs: Documents, policy: WritePolicy) -> Self {
        Self {
            docs,
            policy,
            arenas: BTreeMap::new(),
            dirty: false,
        }
    }

    /// Loads the persisted log. A missing document yields an empty log.
    ///
    /// Entries whose position key or record can't be decoded are logged
    /// and dropped; the arena still shows up in
    /// [`pending_arenas`](Self::pending_arenas) so its next rollback
    /// clears them from disk.
    ///
    /// # Errors
    /// Fails if the document exists but isn't a change log at all.
    pub fn load(docs: Documents, policy: WritePolicy) -> Result<Self, RollbackError> {
        let document: ChangeLogDocument = docs.load_or_default(&DocumentKey::Changes)?;
        let mut log = Self::new(docs, policy);

        for (name, doc) in document.arenas {
            let key = ArenaKey::new(&name);
            let mut arena = ArenaLog::new(&doc.world);

            for (raw_pos, value) in doc.blocks {
                match decode_entry::<ChangeRecord>(&raw_pos, value) {
                    Ok((pos, record)) => {
                        arena.blocks.insert(pos, record);
                    }
                    Err(reason) => {
                        tracing::error!(arena = %key, position = %raw_pos, %reason, "corrupt block record, skipping");
                        arena.corrupt += 1;
                    }
                }
            }
            for (raw_pos, value) in doc.containers {
                match decode_entry::<ContainerContents>(&raw_pos, value) {
                    Ok((pos, contents)) => {
                        arena.containers.insert(pos, contents);
                    }
                    Err(reason) => {
                        tracing::error!(arena = %key, position = %raw_pos, %reason, "corrupt container record, skipping");
                        arena.corrupt += 1;
                    }
                }
            }

            if !arena.is_empty() {
                log.arenas.insert(key, arena);
            }
        }

        tracing::debug!(arenas = log.arenas.len(), "change log loaded");
        Ok(log)
    }

    pub fn policy(&self) -> WritePolicy {
        self.policy
    }

    /// Records the current state at `pos` as its original, unless the
    /// position already has a record.
    ///
    /// Returns `Ok(true)` if a record was written, `Ok(false)` if one
    /// already existed (write-once).
    ///
    /// # Errors
    /// Fails if the environment can't be read. A failed save under
    /// [`WritePolicy::Immediate`] is also reported, but the record is kept
    /// in memory and the next flush retries.
    pub fn log_change(
        &mut self,
        arena: &ArenaKey,
        world: &str,
        pos: BlockPos,
        env: &dyn Environment,
    ) -> Result<bool, RollbackError> {
        if self
            .arenas
            .get(arena)
            .is_some_and(|log| log.blocks.contains_key(&pos))
        {
            return Ok(false);
        }

        let original = env.block(world, pos)?;
        let container = env.container(world, pos)?;

        self.arena_mut(arena, world)
            .blocks
            .insert(pos, ChangeRecord { original, container });
        tracing::trace!(%arena, %pos, "block change recorded");
        self.persist()?;
        Ok(true)
    }

    /// Records `contents` as the original contents of the container at
    /// `pos`, unless one is already recorded.
    pub fn log_container_change(
        &mut self,
        arena: &ArenaKey,
        world: &str,
        pos: BlockPos,
        contents: ContainerContents,
    ) -> Result<bool, RollbackError> {
        let log = self.arena_mut(arena, world);
        if log.containers.contains_key(&pos) {
            return Ok(false);
        }
        log.containers.insert(pos, contents);
        tracing::trace!(%arena, %pos, "container change recorded");
        self.persist()?;
        Ok(true)
    }

    /// Writes every recorded original for `arena` back into the
    /// environment and clears the arena's log.
    ///
    /// Block records are restored first (emptying any container currently
    /// at the position), then container records. A position that fails is
    /// logged and counted in [`RollbackReport::skipped`].
    ///
    /// If the arena's world isn't available, nothing is touched and the
    /// log is kept ([`RollbackReport::deferred`]).
    pub fn rollback(&mut self, arena: &ArenaKey, env: &dyn Environment) -> RollbackReport {
        let mut report = RollbackReport {
            persisted: true,
            ..Default::default()
        };

        let Some(log) = self.arenas.get(arena) else {
            return report;
        };
        if !env.has_world(&log.world) {
            tracing::error!(%arena, world = %log.world, "world unavailable, rollback deferred");
            report.deferred = true;
            return report;
        }
        let Some(log) = self.arenas.remove(arena) else {
            return report;
        };
        let world = log.world.as_str();

        for (pos, record) in &log.blocks {
            match env.container(world, *pos) {
                Ok(Some(_)) => {
                    if let Err(e) = env.clear_container(world, *pos) {
                        tracing::warn!(%arena, %pos, error = %e, "could not empty container before restore");
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(%arena, %pos, error = %e, "could not inspect position before restore");
                }
            }

            if let Err(e) = env.set_block(world, *pos, &record.original) {
                tracing::error!(%arena, %pos, error = %e, "block restore failed, skipping");
                report.skipped += 1;
                continue;
            }
            if let Some(contents) = &record.container {
                if let Err(e) = env.set_container(world, *pos, contents) {
                    tracing::error!(%arena, %pos, error = %e, "container contents of restored block lost");
                    report.skipped += 1;
                    continue;
                }
            }
            report.blocks_restored += 1;
        }

        for (pos, contents) in &log.containers {
            match env.set_container(world, *pos, contents) {
                Ok(()) => report.containers_restored += 1,
                Err(e) => {
                    tracing::error!(%arena, %pos, error = %e, "container restore failed, skipping");
                    report.skipped += 1;
                }
            }
        }
        report.skipped += log.corrupt;

        self.dirty = true;
        if let Err(e) = self.save() {
            tracing::error!(%arena, error = %e, "could not persist cleared change log");
            report.persisted = false;
        }

        tracing::info!(
            %arena,
            blocks = report.blocks_restored,
            containers = report.containers_restored,
            skipped = report.skipped,
            "arena rolled back"
        );
        report
    }

    /// Arenas with a non-empty log, in name order.
    pub fn pending_arenas(&self) -> Vec<ArenaKey> {
        self.arenas
            .iter()
            .filter(|(_, log)| !log.is_empty())
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Returns `true` if nothing is recorded for `arena`.
    pub fn is_clean(&self, arena: &ArenaKey) -> bool {
        self.arenas.get(arena).is_none_or(ArenaLog::is_empty)
    }

    /// Number of recorded positions (blocks plus containers) for `arena`.
    pub fn len(&self, arena: &ArenaKey) -> usize {
        self.arenas
            .get(arena)
            .map_or(0, |log| log.blocks.len() + log.containers.len())
    }

    /// The block record at `pos`, if any.
    pub fn record(&self, arena: &ArenaKey, pos: BlockPos) -> Option<&ChangeRecord> {
        self.arenas.get(arena)?.blocks.get(&pos)
    }

    /// The container record at `pos`, if any.
    pub fn container_record(&self, arena: &ArenaKey, pos: BlockPos) -> Option<&ContainerContents> {
        self.arenas.get(arena)?.containers.get(&pos)
    }

    /// `true` if there are changes not yet written to the store.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Writes the log if anything changed since the last save.
    pub fn flush(&mut self) -> Result<(), RollbackError> {
        if self.dirty {
            self.save()?;
        }
        Ok(())
    }

    fn arena_mut(&mut self, arena: &ArenaKey, world: &str) -> &mut ArenaLog {
        let log = self
            .arenas
            .entry(arena.clone())
            .or_insert_with(|| ArenaLog::new(world));
        if log.world != world {
            tracing::warn!(%arena, logged = %log.world, now = %world, "arena moved worlds while changes are pending");
        }
        log
    }

    fn persist(&mut self) -> Result<(), RollbackError> {
        self.dirty = true;
        match self.policy {
            WritePolicy::Immediate => self.save(),
            WritePolicy::Deferred => Ok(()),
        }
    }

    fn save(&mut self) -> Result<(), RollbackError> {
        let document = self.to_document().map_err(StoreError::from)?;
        self.docs.save(&DocumentKey::Changes, &document)?;
        self.dirty = false;
        Ok(())
    }

    fn to_document(&self) -> Result<ChangeLogDocument, ModelError> {
        let mut document = ChangeLogDocument::default();
        for (key, log) in &self.arenas {
            if log.blocks.is_empty() && log.containers.is_empty() {
                continue;
            }
            let mut doc = ArenaLogDocument {
                world: log.world.clone(),
                blocks: BTreeMap::new(),
                containers: BTreeMap::new(),
            };
            for (pos, record) in &log.blocks {
                let value = serde_json::to_value(record).map_err(ModelError::Encode)?;
                doc.blocks.insert(pos.to_string(), value);
            }
            for (pos, contents) in &log.containers {
                let value = serde_json::to_value(contents).map_err(ModelError::Encode)?;
                doc.containers.insert(pos.to_string(), value);
            }
            document.arenas.insert(key.to_string(), doc);
        }
        Ok(document)
    }
}

fn decode_entry<T: serde::de::DeserializeOwned>(
    raw_pos: &str,
    value: Value,
) -> Result<(BlockPos, T), String> {
    let pos = raw_pos.parse::<BlockPos>().map_err(|e| e.to_string())?;
    let record = serde_json::from_value(value).map_err(|e| e.to_string())?;
    Ok((pos, record))
}
