//! # Roundkeeper
//!
//! Session management for round-based games.
//!
//! A [`SessionRegistry`] owns the rounds of one namespace. Each round
//! walks WAITING → PREPARING → PLAYING → RESETTING on a one-second tick.
//! Participants are admitted with their inventory stashed to disk, and
//! every world change made during a round is logged once so the arena can
//! be rolled back afterwards, even after a crash.
//!
//! This crate re-exports the layers and adds a Tokio [`RoundHost`] that
//! ticks the registry until shutdown.
//!
//! Hosts running several namespaces should hand every registry the same
//! [`Memberships`] through [`Services::with_memberships`], so a
//! participant can only be in one round at a time.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roundkeeper::prelude::*;
//!
//! // Implement ParticipantResolver, Inventories and Environment for your
//! // host, then:
//! // let host = RoundHost::builder()
//! //     .config(HostConfig::from_file("roundkeeper.json")?)
//! //     .build(Services::new(players, players, worlds), PlainSessions)?;
//! // host.registry().lock().await.create_round("arena1")?;
//! // host.run_until(shutdown_signal).await
//! ```

mod config;
mod error;
mod host;
pub mod telemetry;

pub use config::HostConfig;
pub use error::RoundkeeperError;
pub use host::{RoundHost, RoundHostBuilder, SharedRegistry};

pub use roundkeeper_model as model;
pub use roundkeeper_rollback as rollback;
pub use roundkeeper_round as round;
pub use roundkeeper_session as session;
pub use roundkeeper_store as store;
pub use roundkeeper_tick as tick;

pub use roundkeeper_round::{
    JoinResult, Membership, Memberships, Notification, NotificationKind, PhaseLimit,
    RegistryConfig, Round, RoundConfig, RoundError, RoundMut, Services, SessionRegistry, Stage,
    Transition,
};

/// The types most hosts need, in one import.
pub mod prelude {
    pub use crate::{HostConfig, RoundHost, RoundHostBuilder, RoundkeeperError, SharedRegistry};
    pub use roundkeeper_model::{
        ArenaDescriptor, ArenaKey, BlockPos, BlockState, BoundingBox, ContainerContents,
        DurableId, ItemStack, Location, ParticipantId, Point,
    };
    pub use roundkeeper_rollback::{Environment, EnvironmentError, RollbackReport};
    pub use roundkeeper_round::{
        JoinResult, Memberships, Notification, NotificationKind, PhaseLimit, RegistryConfig,
        RoundConfig, RoundError, Services, SessionRegistry, SpawnSelection, Stage, Transition,
    };
    pub use roundkeeper_session::{
        Inventories, InventorySnapshot, ParticipantResolver, ParticipantSession, PlainSessions,
        SessionError, SessionFactory,
    };
    pub use roundkeeper_store::{DocumentStore, FileStore, MemoryStore};
}
