//! Registry-level behavior: arenas, round ownership, recovery, shutdown.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use common::{FakeHost, durable, kit, open_registry, open_registry_in, record, setup};
use roundkeeper_model::{
    ArenaDescriptor, ArenaKey, BlockPos, BlockState, ContainerContents, ItemStack, Location,
    ParticipantId,
};
use roundkeeper_round::{
    NotificationKind, RegistryConfig, RoundError, Services, SessionRegistry, Stage,
};
use roundkeeper_session::{ParticipantSession, SessionFactory};
use roundkeeper_store::MemoryStore;

#[test]
fn test_create_round_for_unknown_arena_fails() {
    let (_host, mut registry) = setup();
    assert!(matches!(
        registry.create_round("nowhere"),
        Err(RoundError::ArenaNotFound(name)) if name == "nowhere"
    ));
}

#[test]
fn test_one_round_per_arena() {
    let (_host, mut registry) = setup();
    registry.create_round("arena1").unwrap();
    assert!(matches!(
        registry.create_round("ARENA1"),
        Err(RoundError::RoundExists(_))
    ));
    assert_eq!(registry.rounds().count(), 1);
}

#[test]
fn test_unplayable_arena_cannot_host_round() {
    let (_host, mut registry) = setup();
    registry.define_arena(ArenaDescriptor::new("empty", common::WORLD)).unwrap();
    assert!(matches!(
        registry.create_round("empty"),
        Err(RoundError::InvalidPosition(_))
    ));
    assert!(registry.round("empty").is_none());
}

#[test]
fn test_arena_with_live_round_cannot_be_removed() {
    let (_host, mut registry) = setup();
    registry.create_round("arena1").unwrap();

    assert!(matches!(registry.remove_arena("arena1"), Err(RoundError::ArenaBusy(_))));
    registry.destroy_round("arena1").unwrap();
    assert_eq!(registry.remove_arena("arena1").unwrap().name, "arena1");
    assert!(matches!(
        registry.remove_arena("arena1"),
        Err(RoundError::ArenaNotFound(_))
    ));
}

#[test]
fn test_arena_definitions_survive_reopen() {
    let host = FakeHost::new();
    let store = Arc::new(MemoryStore::new());
    drop(open_registry(&host, store.clone()));

    let registry = open_registry(&host, store);
    assert_eq!(registry.catalog().len(), 2);
    assert!(registry.arena("Arena2").is_some());
}

#[test]
fn test_destroy_round_restores_everyone_and_frees_arena() {
    let (host, mut registry) = setup();
    let p1 = host.connect(1);
    let p2 = host.connect(2);
    let mut round = registry.create_round("arena1").unwrap();
    round.add_player(p1, None).unwrap();
    round.add_player(p2, None).unwrap();

    registry.destroy_round("arena1").unwrap();

    assert!(registry.round("arena1").is_none());
    assert_eq!(registry.round_of(p1), None);
    assert_eq!(host.inventory(p2), kit());
    assert!(registry.create_round("arena1").is_ok());
}

#[test]
fn test_destroy_missing_round_is_an_error() {
    let (_host, mut registry) = setup();
    assert!(matches!(
        registry.destroy_round("arena1"),
        Err(RoundError::RoundNotFound(_))
    ));
}

#[test]
fn test_disconnect_removes_without_relocating() {
    let (host, mut registry) = setup();
    let p1 = host.connect(1);
    registry.create_round("arena1").unwrap().add_player(p1, None).unwrap();
    let teleports_before = host.teleports_of(p1).len();

    assert!(registry.handle_disconnect(p1).unwrap());

    assert_eq!(registry.round_of(p1), None);
    assert!(registry.round("arena1").unwrap().is_empty());
    assert_eq!(host.teleports_of(p1).len(), teleports_before);
    assert_eq!(host.inventory(p1), kit());
    assert!(!registry.handle_disconnect(p1).unwrap());
}

#[test]
fn test_world_change_out_of_arena_world_removes_participant() {
    let (host, mut registry) = setup();
    let p1 = host.connect(1);
    registry.create_round("arena1").unwrap().add_player(p1, None).unwrap();

    assert!(!registry.handle_world_change(p1, common::WORLD).unwrap());
    assert_eq!(registry.round_of(p1), Some(ArenaKey::new("arena1")));

    assert!(registry.handle_world_change(p1, "world_nether").unwrap());
    assert_eq!(registry.round_of(p1), None);
    assert_eq!(host.inventory(p1), kit());
}

#[test]
fn test_change_logging_requires_defined_arena() {
    let (_host, mut registry) = setup();
    assert!(matches!(
        registry.log_change("nowhere", BlockPos::new(0, 0, 0)),
        Err(RoundError::ArenaNotFound(_))
    ));
}

#[test]
fn test_container_logging_is_write_once() {
    let (_host, mut registry) = setup();
    let pos = BlockPos::new(4, 64, 4);
    let mut first = ContainerContents::empty(27);
    first.slots.insert(0, ItemStack::new("golden_apple", 2));

    assert!(registry.log_container_change("arena1", pos, first.clone()).unwrap());
    assert!(!registry
        .log_container_change("arena1", pos, ContainerContents::empty(27))
        .unwrap());
    assert_eq!(
        registry.change_log().container_record(&ArenaKey::new("arena1"), pos),
        Some(&first)
    );
}

#[test]
fn test_check_rollbacks_repairs_arena_after_restart() {
    let host = FakeHost::new();
    let store = Arc::new(MemoryStore::new());
    let pos = BlockPos::new(-7, 65, 2);
    host.place(pos, BlockState::new("oak_planks"));

    {
        let mut registry = open_registry(&host, store.clone());
        let mut round = registry.create_round("arena2").unwrap();
        round.add_player(host.connect(1), None).unwrap();
        round.add_player(host.connect(2), None).unwrap();
        assert!(registry.log_change("arena2", pos).unwrap());
        host.place(pos, BlockState::new("air"));
        // Crash: the registry goes away without ending the round.
    }

    let mut registry = open_registry(&host, store);
    let seen = record(&mut registry);
    assert_eq!(registry.change_log().pending_arenas(), vec![ArenaKey::new("arena2")]);

    let reports = registry.check_rollbacks();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].1.blocks_restored, 1);
    assert_eq!(host.block_at(pos), BlockState::new("oak_planks"));
    assert!(registry.change_log().pending_arenas().is_empty());
    assert!(seen.lock().unwrap().contains(&NotificationKind::RolledBack {
        restored: 1,
        skipped: 0
    }));
    // Nothing left to do on a second pass.
    assert!(registry.check_rollbacks().is_empty());
}

#[test]
fn test_participant_snapshot_survives_crash_and_is_restored_on_next_join() {
    let host = FakeHost::new();
    let store = Arc::new(MemoryStore::new());
    let p1 = host.connect(1);

    {
        let mut registry = open_registry(&host, store.clone());
        registry.create_round("arena1").unwrap().add_player(p1, None).unwrap();
        assert!(host.inventory(p1).is_empty());
    }

    let mut registry = open_registry(&host, store);
    assert_eq!(registry.snapshots().pending().unwrap(), vec![durable(p1)]);

    let mut round = registry.create_round("arena1").unwrap();
    assert!(round.add_player(p1, None).unwrap().is_success());
    round.remove_player(p1, None).unwrap();
    assert_eq!(host.inventory(p1), kit());
}

#[test]
fn test_manual_rollback_of_live_round_returns_it_to_waiting() {
    let (host, mut registry) = setup();
    let seen = record(&mut registry);
    let pos = BlockPos::new(0, 64, 0);
    let mut round = registry.create_round("arena1").unwrap();
    round.add_player(host.connect(1), None).unwrap();
    round.add_player(host.connect(2), None).unwrap();
    registry.log_change("arena1", pos).unwrap();
    host.place(pos, BlockState::new("cobblestone"));

    let report = registry.rollback("arena1");

    assert_eq!(report.blocks_restored, 1);
    assert_eq!(host.block_at(pos), BlockState::new("air"));
    let round = registry.round("arena1").unwrap();
    assert_eq!(round.stage(), Stage::Waiting);
    assert_eq!(round.len(), 2);
    let seen = seen.lock().unwrap();
    let rolling = seen.iter().position(|k| *k == NotificationKind::RollingBack);
    let refresh = seen.iter().rposition(|k| *k == NotificationKind::RefreshDisplay);
    assert!(rolling.is_some() && refresh > rolling);
}

#[test]
fn test_shutdown_ends_every_round_and_restores_participants() {
    let (host, mut registry) = setup();
    let seen = record(&mut registry);
    let p1 = host.connect(1);
    let p3 = host.connect(3);
    let pos = BlockPos::new(5, 64, 5);
    {
        let mut round = registry.create_round("arena1").unwrap();
        round.add_player(p1, None).unwrap();
        round.add_player(host.connect(2), None).unwrap();
    }
    registry.create_round("arena2").unwrap().add_player(p3, None).unwrap();
    registry.log_change("arena2", pos).unwrap();
    host.place(pos, BlockState::new("glass"));

    registry.shutdown().unwrap();

    assert_eq!(registry.rounds().count(), 0);
    assert_eq!(registry.round_of(p1), None);
    assert_eq!(host.inventory(p1), kit());
    assert_eq!(host.inventory(p3), kit());
    // arena2's round never started, but its changes are still undone.
    assert_eq!(host.block_at(pos), BlockState::new("air"));
    assert!(seen.lock().unwrap().contains(&NotificationKind::Ending {
        timed_out: false,
        forced: true
    }));
}

#[test]
fn test_notifications_are_scoped_to_their_namespace() {
    let host = FakeHost::new();
    let open = |namespace: &str| {
        let mut registry = SessionRegistry::open(
            namespace,
            RegistryConfig::default(),
            Arc::new(MemoryStore::new()),
            Services::new(host.clone(), host.clone(), host.clone()),
            roundkeeper_session::PlainSessions,
        )
        .unwrap();
        registry.define_arena(common::arena("arena1")).unwrap();
        registry
    };
    let mut games = open("games");
    let mut minigames = open("minigames");
    let games_seen = Arc::new(Mutex::new(Vec::new()));
    let sink = games_seen.clone();
    games.subscribe(move |n| sink.lock().unwrap().push(n.namespace.clone()));

    minigames
        .create_round("arena1")
        .unwrap()
        .add_player(host.connect(1), None)
        .unwrap();
    assert!(games_seen.lock().unwrap().is_empty());

    games
        .create_round("arena1")
        .unwrap()
        .add_player(host.connect(2), None)
        .unwrap();
    assert!(!games_seen.lock().unwrap().is_empty());
    assert!(games_seen.lock().unwrap().iter().all(|ns| ns == "games"));
}

/// Counts kills per session and remembers how many sessions were closed.
struct ScoredSessions {
    closed: Arc<AtomicUsize>,
}

impl SessionFactory for ScoredSessions {
    type Extra = u32;

    fn create(&self, _participant: ParticipantId, _arena: &ArenaKey) -> u32 {
        0
    }

    fn on_remove(&self, _session: &mut ParticipantSession<u32>) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_session_factory_extra_data_lives_with_the_session() {
    let host = FakeHost::new();
    let closed = Arc::new(AtomicUsize::new(0));
    let mut registry = SessionRegistry::open(
        "games",
        RegistryConfig::default(),
        Arc::new(MemoryStore::new()),
        Services::new(host.clone(), host.clone(), host.clone()),
        ScoredSessions {
            closed: closed.clone(),
        },
    )
    .unwrap();
    registry.define_arena(common::arena("arena1")).unwrap();
    let p1 = host.connect(1);

    let mut round = registry.create_round("arena1").unwrap();
    round.add_player(p1, None).unwrap();
    round.session_mut(p1).unwrap().extra += 3;
    assert_eq!(round.session(p1).unwrap().extra, 3);

    round.remove_player(p1, Some(Location::new(common::WORLD, 0.0, 64.0, 0.0))).unwrap();
    assert_eq!(closed.load(Ordering::SeqCst), 1);
}

#[test]
fn test_participant_cannot_join_rounds_in_two_namespaces() {
    let host = FakeHost::new();
    let mut games = open_registry_in(&host, Arc::new(MemoryStore::new()), "games");
    let mut minigames = open_registry_in(&host, Arc::new(MemoryStore::new()), "minigames");
    let p1 = host.connect(1);

    games.create_round("arena1").unwrap().add_player(p1, None).unwrap();
    assert!(host.inventory(p1).is_empty());

    let mut other = minigames.create_round("arena1").unwrap();
    let err = other.add_player(p1, None).unwrap_err();
    assert!(matches!(
        err,
        RoundError::AlreadyInRound { ref namespace, .. } if namespace == "games"
    ));
    assert!(other.is_empty());
    drop(other);
    assert!(!minigames.snapshots().has(&durable(p1)).unwrap());
    assert_eq!(minigames.round_of(p1), None);

    games.round_mut("arena1").unwrap().remove_player(p1, None).unwrap();
    assert_eq!(host.inventory(p1), kit());

    let mut other = minigames.round_mut("arena1").unwrap();
    assert!(other.add_player(p1, None).unwrap().is_success());
    other.remove_player(p1, None).unwrap();
    assert_eq!(host.inventory(p1), kit());
    assert!(host.memberships().is_empty());
}

#[test]
fn test_dropped_namespace_releases_its_participants() {
    let host = FakeHost::new();
    let mut games = open_registry_in(&host, Arc::new(MemoryStore::new()), "games");
    let mut minigames = open_registry_in(&host, Arc::new(MemoryStore::new()), "minigames");
    let p1 = host.connect(1);
    let p2 = host.connect(2);

    games.create_round("arena1").unwrap().add_player(p1, None).unwrap();
    minigames.create_round("arena1").unwrap().add_player(p2, None).unwrap();
    assert_eq!(host.memberships().len(), 2);

    drop(games);
    assert!(host.memberships().get(p1).is_none());
    assert_eq!(
        host.memberships().get(p2).map(|m| m.namespace),
        Some("minigames".to_string())
    );
}
