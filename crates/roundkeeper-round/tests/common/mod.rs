//! In-memory host shared by the round integration tests.
//!
//! `FakeHost` plays every host role at once (resolver, inventories,
//! environment). It is a cheap handle over shared state, so a test keeps
//! one clone to poke and inspect while the registry owns the others.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use roundkeeper_model::{
    ArenaDescriptor, BlockPos, BlockState, BoundingBox, ContainerContents, DurableId, ItemStack,
    Location, ParticipantId, Point,
};
use roundkeeper_rollback::{Environment, EnvironmentError};
use roundkeeper_round::{
    Memberships, NotificationKind, PhaseLimit, RegistryConfig, RoundConfig, Services,
    SessionRegistry,
};
use roundkeeper_session::{
    Inventories, InventorySnapshot, ParticipantResolver, PlainSessions, SessionError,
};
use roundkeeper_store::MemoryStore;

pub const WORLD: &str = "world";

#[derive(Default)]
struct HostState {
    connected: HashSet<ParticipantId>,
    locations: HashMap<ParticipantId, Location>,
    inventories: HashMap<ParticipantId, InventorySnapshot>,
    blocks: HashMap<BlockPos, BlockState>,
    containers: HashMap<BlockPos, ContainerContents>,
    fail_capture: HashSet<ParticipantId>,
    fail_teleport: HashSet<ParticipantId>,
    teleports: Vec<(ParticipantId, Location)>,
}

#[derive(Clone, Default)]
pub struct FakeHost {
    state: Arc<Mutex<HostState>>,
    memberships: Memberships,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// The membership directory every registry opened on this host shares.
    pub fn memberships(&self) -> Memberships {
        self.memberships.clone()
    }

    pub fn services(&self) -> Services {
        Services::new(self.clone(), self.clone(), self.clone()).with_memberships(self.memberships())
    }

    fn with<R>(&self, f: impl FnOnce(&mut HostState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    /// Brings a participant online at the lobby with a sword and some food.
    pub fn connect(&self, id: u64) -> ParticipantId {
        let id = ParticipantId(id);
        self.with(|s| {
            s.connected.insert(id);
            s.locations.insert(id, lobby());
            s.inventories.insert(id, kit());
        });
        id
    }

    pub fn disconnect(&self, id: ParticipantId) {
        self.with(|s| s.connected.remove(&id));
    }

    pub fn move_to(&self, id: ParticipantId, to: Location) {
        self.with(|s| s.locations.insert(id, to));
    }

    pub fn location_of(&self, id: ParticipantId) -> Option<Location> {
        self.with(|s| s.locations.get(&id).cloned())
    }

    pub fn inventory(&self, id: ParticipantId) -> InventorySnapshot {
        self.with(|s| s.inventories.get(&id).cloned().unwrap_or_default())
    }

    pub fn set_inventory(&self, id: ParticipantId, inv: InventorySnapshot) {
        self.with(|s| s.inventories.insert(id, inv));
    }

    pub fn fail_capture(&self, id: ParticipantId) {
        self.with(|s| s.fail_capture.insert(id));
    }

    pub fn fail_teleport(&self, id: ParticipantId) {
        self.with(|s| s.fail_teleport.insert(id));
    }

    pub fn teleports_of(&self, id: ParticipantId) -> Vec<Location> {
        self.with(|s| {
            s.teleports
                .iter()
                .filter(|(who, _)| *who == id)
                .map(|(_, to)| to.clone())
                .collect()
        })
    }

    pub fn block_at(&self, pos: BlockPos) -> BlockState {
        self.with(|s| s.blocks.get(&pos).cloned().unwrap_or_else(|| BlockState::new("air")))
    }

    pub fn place(&self, pos: BlockPos, state: BlockState) {
        self.with(|s| s.blocks.insert(pos, state));
    }
}

impl ParticipantResolver for FakeHost {
    fn is_connected(&self, id: ParticipantId) -> bool {
        self.with(|s| s.connected.contains(&id))
    }

    fn location(&self, id: ParticipantId) -> Option<Location> {
        self.location_of(id)
    }

    fn durable_id(&self, id: ParticipantId) -> Result<DurableId, SessionError> {
        Ok(durable(id))
    }

    fn teleport(&self, id: ParticipantId, to: &Location) -> Result<(), SessionError> {
        self.with(|s| {
            if s.fail_teleport.contains(&id) {
                return Err(SessionError::Teleport {
                    participant: id,
                    reason: "chunk not loaded".into(),
                });
            }
            s.locations.insert(id, to.clone());
            s.teleports.push((id, to.clone()));
            Ok(())
        })
    }
}

impl Inventories for FakeHost {
    fn capture(&self, id: ParticipantId) -> Result<InventorySnapshot, SessionError> {
        self.with(|s| {
            if s.fail_capture.contains(&id) {
                return Err(SessionError::Inventory {
                    participant: id,
                    reason: "inventory locked".into(),
                });
            }
            Ok(s.inventories.get(&id).cloned().unwrap_or_default())
        })
    }

    fn clear(&self, id: ParticipantId) -> Result<(), SessionError> {
        self.with(|s| s.inventories.insert(id, InventorySnapshot::default()));
        Ok(())
    }

    fn apply(&self, id: ParticipantId, snapshot: &InventorySnapshot) -> Result<(), SessionError> {
        self.with(|s| s.inventories.insert(id, snapshot.clone()));
        Ok(())
    }
}

impl Environment for FakeHost {
    fn has_world(&self, world: &str) -> bool {
        world == WORLD
    }

    fn block(&self, world: &str, pos: BlockPos) -> Result<BlockState, EnvironmentError> {
        check_world(world)?;
        Ok(self.block_at(pos))
    }

    fn set_block(&self, world: &str, pos: BlockPos, state: &BlockState) -> Result<(), EnvironmentError> {
        check_world(world)?;
        self.place(pos, state.clone());
        Ok(())
    }

    fn container(
        &self,
        world: &str,
        pos: BlockPos,
    ) -> Result<Option<ContainerContents>, EnvironmentError> {
        check_world(world)?;
        Ok(self.with(|s| s.containers.get(&pos).cloned()))
    }

    fn set_container(
        &self,
        world: &str,
        pos: BlockPos,
        contents: &ContainerContents,
    ) -> Result<(), EnvironmentError> {
        check_world(world)?;
        self.with(|s| s.containers.insert(pos, contents.clone()));
        Ok(())
    }

    fn clear_container(&self, world: &str, pos: BlockPos) -> Result<(), EnvironmentError> {
        check_world(world)?;
        self.with(|s| s.containers.remove(&pos));
        Ok(())
    }
}

fn check_world(world: &str) -> Result<(), EnvironmentError> {
    if world == WORLD {
        Ok(())
    } else {
        Err(EnvironmentError::WorldNotFound(world.to_string()))
    }
}

pub fn durable(id: ParticipantId) -> DurableId {
    DurableId::new(format!("p{}", id.0))
}

pub fn lobby() -> Location {
    Location::new(WORLD, 500.5, 70.0, 500.5)
}

pub fn kit() -> InventorySnapshot {
    let mut inv = InventorySnapshot::default();
    inv.contents.insert(0, ItemStack::new("stone_sword", 1));
    inv.contents.insert(1, ItemStack::new("bread", 8));
    inv.level = 5;
    inv
}

/// A 40×40 arena centred on the origin with a spawn in each quadrant.
pub fn arena(name: &str) -> ArenaDescriptor {
    ArenaDescriptor::new(name, WORLD)
        .with_spawn(Location::new(WORLD, 10.5, 64.0, 10.5))
        .with_spawn(Location::new(WORLD, -10.5, 64.0, 10.5))
        .with_spawn(Location::new(WORLD, -10.5, 64.0, -10.5))
        .with_spawn(Location::new(WORLD, 10.5, 64.0, -10.5))
        .with_bounds(BoundingBox::from_corners(
            Point::new(-20.0, 0.0, -20.0),
            Point::new(20.0, 128.0, 20.0),
        ))
}

/// Two to four participants, five seconds to prepare, ten to play.
pub fn short_round() -> RoundConfig {
    RoundConfig {
        min_participants: 2,
        max_participants: 4,
        preparation: PhaseLimit::secs(5),
        playing: PhaseLimit::secs(10),
        exit: Some(lobby()),
        ..RoundConfig::default()
    }
}

pub fn open_registry(host: &FakeHost, store: Arc<MemoryStore>) -> SessionRegistry {
    open_registry_in(host, store, "games")
}

/// Like [`open_registry`], under another namespace.
pub fn open_registry_in(host: &FakeHost, store: Arc<MemoryStore>, namespace: &str) -> SessionRegistry {
    let config = RegistryConfig {
        default_round: short_round(),
        ..RegistryConfig::default()
    };
    let mut registry = SessionRegistry::open(
        namespace,
        config,
        store,
        host.services(),
        PlainSessions,
    )
    .unwrap();
    registry.define_arena(arena("arena1")).unwrap();
    registry.define_arena(arena("arena2")).unwrap();
    registry
}

/// A registry over a fresh store with `arena1` and `arena2` defined.
pub fn setup() -> (FakeHost, SessionRegistry) {
    let host = FakeHost::new();
    let registry = open_registry(&host, Arc::new(MemoryStore::new()));
    (host, registry)
}

/// Collects every notification kind published on the registry's bus.
pub fn record(registry: &mut SessionRegistry) -> Arc<Mutex<Vec<NotificationKind>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    registry.subscribe(move |n| sink.lock().unwrap().push(n.kind.clone()));
    seen
}

/// Vetoes every cancellable notification matching `pred`.
pub fn veto(registry: &mut SessionRegistry, pred: fn(&NotificationKind) -> bool) {
    registry.subscribe(move |n| {
        if pred(&n.kind) {
            n.cancel();
        }
    });
}

pub fn tick_n(registry: &mut SessionRegistry, n: u32) {
    for _ in 0..n {
        registry.tick();
    }
}
