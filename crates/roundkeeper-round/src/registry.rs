//! Session registry: creates, tracks, and routes participants to rounds.

use std::collections::BTreeMap;
use std::sync::Arc;

use roundkeeper_model::{ArenaDescriptor, ArenaKey, BlockPos, ContainerContents, ParticipantId};
use roundkeeper_rollback::{ChangeLog, Environment, RollbackReport};
use roundkeeper_session::{
    Inventories, ParticipantResolver, PlainSessions, SessionFactory, SnapshotStore,
};
use roundkeeper_store::{DocumentStore, Documents};

use crate::admission::Exit;
use crate::lifecycle::{Context, rollback_arena};
use crate::notify::{Notification, NotificationBus};
use crate::{
    ArenaCatalog, Memberships, RegistryConfig, Round, RoundConfig, RoundError, RoundMut, Stage,
};

/// The host collaborators every round in a namespace talks to.
pub struct Services {
    pub resolver: Box<dyn ParticipantResolver>,
    pub inventories: Box<dyn Inventories>,
    pub environment: Box<dyn Environment>,
    /// Shared with every other namespace the participants can join.
    pub memberships: Memberships,
}

impl Services {
    pub fn new(
        resolver: impl ParticipantResolver,
        inventories: impl Inventories,
        environment: impl Environment,
    ) -> Self {
        Self {
            resolver: Box::new(resolver),
            inventories: Box::new(inventories),
            environment: Box::new(environment),
            memberships: Memberships::new(),
        }
    }

    /// Uses `memberships` instead of a directory private to this
    /// namespace.
    pub fn with_memberships(mut self, memberships: Memberships) -> Self {
        self.memberships = memberships;
        self
    }
}

/// All rounds of one namespace, plus the state they share.
///
/// The registry is the only place that decides whether an arena has a
/// live round (at most one). Which round a participant is in lives in
/// [`Services::memberships`], so registries sharing that directory never
/// admit the same participant twice. Hosts create one registry per
/// namespace and keep it for the life of the process; there is no global
/// instance.
pub struct SessionRegistry<F: SessionFactory = PlainSessions> {
    namespace: String,
    config: RegistryConfig,
    catalog: ArenaCatalog,
    rounds: BTreeMap<ArenaKey, Round<F::Extra>>,
    change_log: ChangeLog,
    snapshots: SnapshotStore,
    services: Services,
    factory: F,
    bus: NotificationBus,
}

impl<F: SessionFactory> SessionRegistry<F> {
    /// Opens a namespace over `store`, loading its arena catalog and
    /// change log.
    ///
    /// Doesn't roll anything back; call [`check_rollbacks`](Self::check_rollbacks)
    /// once the host's environment is ready.
    pub fn open(
        namespace: impl Into<String>,
        config: RegistryConfig,
        store: Arc<dyn DocumentStore>,
        services: Services,
        factory: F,
    ) -> Result<Self, RoundError> {
        let namespace = namespace.into();
        let docs = Documents::json(store);
        let catalog = ArenaCatalog::load(docs.clone())?;
        let change_log = ChangeLog::load(docs.clone(), config.write_policy())?;
        let snapshots = SnapshotStore::new(docs);

        let pending = change_log.pending_arenas().len();
        tracing::info!(%namespace, arenas = catalog.len(), pending_rollbacks = pending, "namespace opened");

        Ok(Self {
            bus: NotificationBus::new(namespace.clone()),
            namespace,
            config,
            catalog,
            rounds: BTreeMap::new(),
            change_log,
            snapshots,
            services,
            factory,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Registers a listener for this namespace's notifications.
    pub fn subscribe<L>(&mut self, listener: L)
    where
        L: FnMut(&mut Notification) + Send + 'static,
    {
        self.bus.subscribe(listener);
    }

    // -- Arenas -------------------------------------------------------------

    pub fn catalog(&self) -> &ArenaCatalog {
        &self.catalog
    }

    pub fn arena(&self, name: &str) -> Option<&ArenaDescriptor> {
        self.catalog.get(&ArenaKey::new(name))
    }

    /// Adds or replaces an arena definition.
    ///
    /// A live round keeps the definition it was created with.
    pub fn define_arena(&mut self, arena: ArenaDescriptor) -> Result<(), RoundError> {
        let name = arena.name.clone();
        let replaced = self.catalog.define(arena)?.is_some();
        tracing::info!(namespace = %self.namespace, arena = %name, replaced, "arena defined");
        Ok(())
    }

    /// Removes an arena definition.
    ///
    /// # Errors
    /// [`RoundError::ArenaBusy`] while a round is live in it,
    /// [`RoundError::ArenaNotFound`] if it isn't defined.
    pub fn remove_arena(&mut self, name: &str) -> Result<ArenaDescriptor, RoundError> {
        let key = ArenaKey::new(name);
        if self.rounds.contains_key(&key) {
            return Err(RoundError::ArenaBusy(key));
        }
        let removed = self
            .catalog
            .remove(&key)?
            .ok_or_else(|| RoundError::ArenaNotFound(name.to_string()))?;
        tracing::info!(namespace = %self.namespace, arena = %key, "arena removed");
        Ok(removed)
    }

    // -- Rounds -------------------------------------------------------------

    /// Creates a WAITING round in `arena` with the namespace's default
    /// round config.
    pub fn create_round(&mut self, arena: &str) -> Result<RoundMut<'_, F>, RoundError> {
        let config = self.config.default_round.clone();
        self.create_round_with(arena, config)
    }

    /// Creates a WAITING round in `arena`.
    ///
    /// # Errors
    /// [`RoundError::ArenaNotFound`], [`RoundError::RoundExists`], or
    /// [`RoundError::InvalidPosition`] if the arena isn't playable.
    pub fn create_round_with(
        &mut self,
        arena: &str,
        config: RoundConfig,
    ) -> Result<RoundMut<'_, F>, RoundError> {
        let key = ArenaKey::new(arena);
        let descriptor = self
            .catalog
            .get(&key)
            .cloned()
            .ok_or_else(|| RoundError::ArenaNotFound(arena.to_string()))?;
        if self.rounds.contains_key(&key) {
            return Err(RoundError::RoundExists(key));
        }

        let round = Round::new(descriptor, config)?;
        self.rounds.insert(key.clone(), round);
        tracing::info!(namespace = %self.namespace, arena = %key, "round created");
        self.split(&key).ok_or(RoundError::RoundNotFound(key))
    }

    pub fn round(&self, arena: &str) -> Option<&Round<F::Extra>> {
        self.rounds.get(&ArenaKey::new(arena))
    }

    /// Mutable access to the live round in `arena`.
    pub fn round_mut(&mut self, arena: &str) -> Result<RoundMut<'_, F>, RoundError> {
        let key = ArenaKey::new(arena);
        self.split(&key).ok_or(RoundError::RoundNotFound(key))
    }

    pub fn rounds(&self) -> impl Iterator<Item = &Round<F::Extra>> {
        self.rounds.values()
    }

    /// Tears down the round in `arena`: any running round is force-ended,
    /// everyone is evicted, and the arena is rolled back if enabled.
    pub fn destroy_round(&mut self, arena: &str) -> Result<(), RoundError> {
        let key = ArenaKey::new(arena);
        let mut round = self
            .split(&key)
            .ok_or_else(|| RoundError::RoundNotFound(key.clone()))?;
        round.force_end();
        self.rounds.remove(&key);
        self.services.memberships.release_arena(&self.namespace, &key);
        tracing::info!(namespace = %self.namespace, arena = %key, "round destroyed");
        Ok(())
    }

    /// The arena whose round `participant` is in, if any.
    pub fn round_of(&self, participant: ParticipantId) -> Option<ArenaKey> {
        self.services.memberships.arena_in(participant, &self.namespace)
    }

    /// Advances every live round by one second. Called by the host clock.
    pub fn tick(&mut self) {
        let keys: Vec<ArenaKey> = self.rounds.keys().cloned().collect();
        for key in keys {
            if let Some(mut round) = self.split(&key) {
                round.tick();
            }
        }
    }

    // -- Participants leaving on their own ----------------------------------

    /// Removes a participant who disconnected. Returns `false` if they
    /// weren't in a round.
    pub fn handle_disconnect(&mut self, participant: ParticipantId) -> Result<bool, RoundError> {
        let Some(key) = self.round_of(participant) else {
            return Ok(false);
        };
        tracing::info!(namespace = %self.namespace, arena = %key, %participant, "participant disconnected");
        self.detach(&key, participant)?;
        Ok(true)
    }

    /// Reacts to a participant moving into `world`. Leaving the arena's
    /// world removes them from the round; moving within it does nothing.
    pub fn handle_world_change(
        &mut self,
        participant: ParticipantId,
        world: &str,
    ) -> Result<bool, RoundError> {
        let Some(key) = self.round_of(participant) else {
            return Ok(false);
        };
        let same_world = self
            .rounds
            .get(&key)
            .is_some_and(|round| round.arena().world == world);
        if same_world {
            return Ok(false);
        }
        tracing::info!(namespace = %self.namespace, arena = %key, %participant, %world, "participant left arena world");
        self.detach(&key, participant)?;
        Ok(true)
    }

    fn detach(&mut self, key: &ArenaKey, participant: ParticipantId) -> Result<(), RoundError> {
        match self.split(key) {
            Some(mut round) => round.remove_with(participant, Exit::Stay),
            None => {
                // Stale membership; the round is gone.
                self.services.memberships.release(participant, &self.namespace);
                Ok(())
            }
        }
    }

    // -- Change log ---------------------------------------------------------

    /// Records the current state at `pos` in `arena` before it changes.
    ///
    /// Returns `Ok(false)` when nothing was recorded: the position was
    /// already recorded, or the arena's round is resetting or has rollback
    /// turned off.
    pub fn log_change(&mut self, arena: &str, pos: BlockPos) -> Result<bool, RoundError> {
        let (key, world) = self.loggable(arena)?;
        let Some(world) = world else {
            return Ok(false);
        };
        Ok(self
            .change_log
            .log_change(&key, &world, pos, self.services.environment.as_ref())?)
    }

    /// Records `contents` as the original contents of the container at
    /// `pos`. Same gating as [`log_change`](Self::log_change).
    pub fn log_container_change(
        &mut self,
        arena: &str,
        pos: BlockPos,
        contents: ContainerContents,
    ) -> Result<bool, RoundError> {
        let (key, world) = self.loggable(arena)?;
        let Some(world) = world else {
            return Ok(false);
        };
        Ok(self
            .change_log
            .log_container_change(&key, &world, pos, contents)?)
    }

    /// Resolves an arena for logging. `None` world means logging is
    /// currently refused.
    fn loggable(&self, arena: &str) -> Result<(ArenaKey, Option<String>), RoundError> {
        let key = ArenaKey::new(arena);
        let descriptor = self
            .catalog
            .get(&key)
            .ok_or_else(|| RoundError::ArenaNotFound(arena.to_string()))?;
        let refused = self
            .rounds
            .get(&key)
            .is_some_and(|round| round.stage() == Stage::Resetting || !round.config().rollback);
        let world = (!refused).then(|| descriptor.world.clone());
        Ok((key, world))
    }

    /// Rolls back `arena` now. A live round in it goes through RESETTING
    /// and ends up WAITING with its roster intact.
    pub fn rollback(&mut self, arena: &str) -> RollbackReport {
        let key = ArenaKey::new(arena);
        rollback_arena(
            &key,
            self.rounds.get_mut(&key),
            &mut self.change_log,
            self.services.environment.as_ref(),
            &mut self.bus,
        )
    }

    /// Rolls back every arena with a non-empty change log. Run once at
    /// startup to repair arenas left mutated by a crash.
    pub fn check_rollbacks(&mut self) -> Vec<(ArenaKey, RollbackReport)> {
        let pending = self.change_log.pending_arenas();
        if pending.is_empty() {
            return Vec::new();
        }
        tracing::warn!(namespace = %self.namespace, arenas = pending.len(), "unfinished rollbacks found");
        pending
            .into_iter()
            .map(|key| {
                let report = self.rollback(key.as_str());
                (key, report)
            })
            .collect()
    }

    pub fn change_log(&self) -> &ChangeLog {
        &self.change_log
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    /// Writes out any batched change-log records.
    pub fn flush(&mut self) -> Result<(), RoundError> {
        Ok(self.change_log.flush()?)
    }

    /// Ends every round without asking listeners, restores every
    /// participant, and flushes. The registry is empty afterwards.
    pub fn shutdown(&mut self) -> Result<(), RoundError> {
        let keys: Vec<ArenaKey> = self.rounds.keys().cloned().collect();
        for key in &keys {
            if let Some(mut round) = self.split(key) {
                round.force_end();
            }
        }
        self.rounds.clear();
        self.services.memberships.release_namespace(&self.namespace);
        tracing::info!(namespace = %self.namespace, rounds = keys.len(), "namespace shut down");
        self.flush()
    }

    /// Borrows one round together with the shared state it may touch.
    fn split(&mut self, key: &ArenaKey) -> Option<RoundMut<'_, F>> {
        let round = self.rounds.get_mut(key)?;
        Some(RoundMut {
            round,
            ctx: Context {
                namespace: &self.namespace,
                change_log: &mut self.change_log,
                snapshots: &self.snapshots,
                services: &self.services,
                factory: &self.factory,
                bus: &mut self.bus,
            },
        })
    }
}

impl<F: SessionFactory> Drop for SessionRegistry<F> {
    fn drop(&mut self) {
        // Snapshots stay on disk; only the shared directory forgets us.
        self.services.memberships.release_namespace(&self.namespace);
    }
}
