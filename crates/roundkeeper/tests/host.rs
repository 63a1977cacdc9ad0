//! End-to-end tests for the Tokio host: ticking, crash repair, config.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use roundkeeper::prelude::*;
use tokio::sync::oneshot;

const WORLD: &str = "world";

/// Online participants and a block grid, shared by every host role.
#[derive(Clone, Default)]
struct World {
    players: Arc<Mutex<HashMap<ParticipantId, (Location, InventorySnapshot)>>>,
    blocks: Arc<Mutex<HashMap<BlockPos, BlockState>>>,
}

impl World {
    fn join(&self, id: u64) -> ParticipantId {
        let id = ParticipantId(id);
        let mut inv = InventorySnapshot::default();
        inv.contents.insert(0, ItemStack::new("bow", 1));
        self.players.lock().unwrap().insert(id, (lobby(), inv));
        id
    }

    fn inventory(&self, id: ParticipantId) -> InventorySnapshot {
        self.players.lock().unwrap()[&id].1.clone()
    }

    fn block_at(&self, pos: BlockPos) -> BlockState {
        self.blocks
            .lock()
            .unwrap()
            .get(&pos)
            .cloned()
            .unwrap_or_else(|| BlockState::new("air"))
    }
}

impl ParticipantResolver for World {
    fn is_connected(&self, id: ParticipantId) -> bool {
        self.players.lock().unwrap().contains_key(&id)
    }

    fn location(&self, id: ParticipantId) -> Option<Location> {
        self.players.lock().unwrap().get(&id).map(|(loc, _)| loc.clone())
    }

    fn durable_id(&self, id: ParticipantId) -> Result<DurableId, SessionError> {
        Ok(DurableId::new(format!("player-{}", id.0)))
    }

    fn teleport(&self, id: ParticipantId, to: &Location) -> Result<(), SessionError> {
        if let Some(entry) = self.players.lock().unwrap().get_mut(&id) {
            entry.0 = to.clone();
        }
        Ok(())
    }
}

impl Inventories for World {
    fn capture(&self, id: ParticipantId) -> Result<InventorySnapshot, SessionError> {
        Ok(self.inventory(id))
    }

    fn clear(&self, id: ParticipantId) -> Result<(), SessionError> {
        self.apply(id, &InventorySnapshot::default())
    }

    fn apply(&self, id: ParticipantId, snapshot: &InventorySnapshot) -> Result<(), SessionError> {
        if let Some(entry) = self.players.lock().unwrap().get_mut(&id) {
            entry.1 = snapshot.clone();
        }
        Ok(())
    }
}

impl Environment for World {
    fn has_world(&self, world: &str) -> bool {
        world == WORLD
    }

    fn block(&self, _world: &str, pos: BlockPos) -> Result<BlockState, EnvironmentError> {
        Ok(self.block_at(pos))
    }

    fn set_block(&self, _world: &str, pos: BlockPos, state: &BlockState) -> Result<(), EnvironmentError> {
        self.blocks.lock().unwrap().insert(pos, state.clone());
        Ok(())
    }

    fn container(&self, _world: &str, _pos: BlockPos) -> Result<Option<ContainerContents>, EnvironmentError> {
        Ok(None)
    }

    fn set_container(
        &self,
        _world: &str,
        _pos: BlockPos,
        _contents: &ContainerContents,
    ) -> Result<(), EnvironmentError> {
        Ok(())
    }

    fn clear_container(&self, _world: &str, _pos: BlockPos) -> Result<(), EnvironmentError> {
        Ok(())
    }
}

fn lobby() -> Location {
    Location::new(WORLD, 0.5, 80.0, 0.5)
}

fn arena() -> ArenaDescriptor {
    ArenaDescriptor::new("skywars", WORLD)
        .with_spawn(Location::new(WORLD, 30.5, 64.0, 30.5))
        .with_spawn(Location::new(WORLD, 40.5, 64.0, 30.5))
}

fn host_config(data_dir: &std::path::Path) -> HostConfig {
    HostConfig {
        namespace: "tests".to_string(),
        data_dir: data_dir.to_path_buf(),
        registry: RegistryConfig {
            default_round: RoundConfig {
                min_participants: 1,
                max_participants: 2,
                preparation: PhaseLimit::secs(2),
                playing: PhaseLimit::secs(60),
                exit: Some(lobby()),
                ..RoundConfig::default()
            },
            ..RegistryConfig::default()
        },
        ..HostConfig::default()
    }
}

fn build(world: &World, config: HostConfig) -> RoundHost {
    RoundHost::<PlainSessions>::builder()
        .config(config)
        .build(
            Services::new(world.clone(), world.clone(), world.clone()),
            PlainSessions,
        )
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_host_drives_rounds_and_restores_everyone_on_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let world = World::default();
    let host = build(&world, host_config(dir.path()));
    let registry = host.registry();
    let p1 = world.join(1);
    {
        let mut registry = registry.lock().await;
        registry.define_arena(arena()).unwrap();
        let mut round = registry.create_round("skywars").unwrap();
        assert!(round.add_player(p1, None).unwrap().is_success());
        assert_eq!(round.stage(), Stage::Preparing);
    }
    assert!(world.inventory(p1).is_empty());

    let (stop, stopped) = oneshot::channel::<()>();
    let task = tokio::spawn(host.run_until(async {
        let _ = stopped.await;
    }));

    tokio::time::sleep(Duration::from_millis(2_500)).await;
    {
        let registry = registry.lock().await;
        let round = registry.round("skywars").unwrap();
        assert_eq!(round.stage(), Stage::Playing);
        assert_eq!(round.remaining(), Some(60));
    }

    stop.send(()).unwrap();
    task.await.unwrap().unwrap();

    let registry = registry.lock().await;
    assert_eq!(registry.rounds().count(), 0);
    assert_eq!(registry.round_of(p1), None);
    assert_eq!(world.inventory(p1).contents[&0], ItemStack::new("bow", 1));
    assert_eq!(world.location(p1), Some(lobby()));
}

#[test]
fn test_build_repairs_arena_left_dirty_by_crash() {
    let dir = tempfile::tempdir().unwrap();
    let world = World::default();
    let pos = BlockPos::new(31, 63, 31);
    world.set_block(WORLD, pos, &BlockState::new("glass")).unwrap();

    {
        let host = build(&world, host_config(dir.path()));
        let registry = host.registry();
        let mut registry = registry.blocking_lock();
        registry.define_arena(arena()).unwrap();
        assert!(registry.log_change("skywars", pos).unwrap());
        world.set_block(WORLD, pos, &BlockState::new("air")).unwrap();
        // Dropped without shutdown.
    }
    assert!(dir.path().join("tests").join("changes.json").exists());

    let host = build(&world, host_config(dir.path()));

    assert_eq!(world.block_at(pos), BlockState::new("glass"));
    let registry = host.registry();
    let registry = registry.blocking_lock();
    assert!(registry.change_log().pending_arenas().is_empty());
    assert!(registry.arena("skywars").is_some());
}

#[test]
fn test_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roundkeeper.json");
    std::fs::write(
        &path,
        r#"{ "namespace": "minigames", "tick_interval_ms": 500,
             "registry": { "default_round": { "max_participants": 12 } } }"#,
    )
    .unwrap();

    let config = HostConfig::from_file(&path).unwrap();

    assert_eq!(config.namespace, "minigames");
    assert_eq!(config.tick_config().interval, Duration::from_millis(500));
    assert_eq!(config.registry.default_round.max_participants, 12);
    assert_eq!(config.registry.default_round.min_participants, 2);
    assert!(config.registry.immediate_writes);
}

#[test]
fn test_config_errors_name_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    let err = HostConfig::from_file(&missing).unwrap_err();
    assert!(matches!(err, RoundkeeperError::ConfigRead { .. }));
    assert!(err.to_string().contains("missing.json"));

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{ namespace").unwrap();
    assert!(matches!(
        HostConfig::from_file(&broken),
        Err(RoundkeeperError::ConfigParse { .. })
    ));
}
