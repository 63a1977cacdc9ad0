//! Round lifecycle for roundkeeper.
//!
//! A *round* is one match in one *arena*. It moves through four stages:
//!
//! ```text
//! Waiting ──→ Preparing ──→ Playing ──→ Resetting ──→ Waiting
//! ```
//!
//! driven by explicit calls (`start`, `end`), by admissions (auto-start
//! at the minimum roster, auto-stop below it), and by a once-per-second
//! [`tick`](SessionRegistry::tick) from the host clock.
//!
//! # Key types
//!
//! - [`SessionRegistry`]: every round of one namespace, the arena
//!   catalog, the change log, and the participant → round index.
//! - [`Round`]: read-only view of one round (stage, timer, roster).
//! - [`RoundMut`]: the handle through which a round changes.
//! - [`NotificationBus`]: synchronous, per-namespace listeners that can
//!   veto cancellable steps.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use roundkeeper_model::{ArenaDescriptor, Location, ParticipantId};
//! use roundkeeper_round::{RegistryConfig, Services, SessionRegistry, Stage};
//! use roundkeeper_session::PlainSessions;
//! use roundkeeper_store::MemoryStore;
//! # use roundkeeper_model::{BlockPos, BlockState, ContainerContents, DurableId};
//! # use roundkeeper_rollback::{Environment, EnvironmentError};
//! # use roundkeeper_session::{Inventories, InventorySnapshot, ParticipantResolver, SessionError};
//! # struct Host;
//! # impl ParticipantResolver for Host {
//! #     fn is_connected(&self, _: ParticipantId) -> bool { true }
//! #     fn location(&self, _: ParticipantId) -> Option<Location> { None }
//! #     fn durable_id(&self, id: ParticipantId) -> Result<DurableId, SessionError> {
//! #         Ok(DurableId::new(format!("p{}", id.0)))
//! #     }
//! #     fn teleport(&self, _: ParticipantId, _: &Location) -> Result<(), SessionError> { Ok(()) }
//! # }
//! # impl Inventories for Host {
//! #     fn capture(&self, _: ParticipantId) -> Result<InventorySnapshot, SessionError> { Ok(Default::default()) }
//! #     fn clear(&self, _: ParticipantId) -> Result<(), SessionError> { Ok(()) }
//! #     fn apply(&self, _: ParticipantId, _: &InventorySnapshot) -> Result<(), SessionError> { Ok(()) }
//! # }
//! # impl Environment for Host {
//! #     fn has_world(&self, _: &str) -> bool { true }
//! #     fn block(&self, _: &str, _: BlockPos) -> Result<BlockState, EnvironmentError> { Ok(BlockState::new("air")) }
//! #     fn set_block(&self, _: &str, _: BlockPos, _: &BlockState) -> Result<(), EnvironmentError> { Ok(()) }
//! #     fn container(&self, _: &str, _: BlockPos) -> Result<Option<ContainerContents>, EnvironmentError> { Ok(None) }
//! #     fn set_container(&self, _: &str, _: BlockPos, _: &ContainerContents) -> Result<(), EnvironmentError> { Ok(()) }
//! #     fn clear_container(&self, _: &str, _: BlockPos) -> Result<(), EnvironmentError> { Ok(()) }
//! # }
//!
//! let mut registry = SessionRegistry::open(
//!     "games",
//!     RegistryConfig::default(),
//!     Arc::new(MemoryStore::new()),
//!     Services::new(Host, Host, Host),
//!     PlainSessions,
//! )?;
//! registry.define_arena(
//!     ArenaDescriptor::new("arena1", "world").with_spawn(Location::new("world", 0.5, 64.0, 0.5)),
//! )?;
//!
//! let mut round = registry.create_round("arena1")?;
//! assert!(round.add_player(ParticipantId(1), None)?.is_success());
//! assert!(round.add_player(ParticipantId(2), None)?.is_success());
//! assert_eq!(round.stage(), Stage::Preparing);
//! # Ok::<(), roundkeeper_round::RoundError>(())
//! ```

mod admission;
mod catalog;
mod config;
mod error;
mod lifecycle;
mod membership;
mod notify;
mod registry;
mod round;

pub use catalog::ArenaCatalog;
pub use config::{PhaseLimit, RegistryConfig, RoundConfig, SpawnSelection, Stage};
pub use error::RoundError;
pub use lifecycle::RoundMut;
pub use membership::{Membership, Memberships};
pub use notify::{Listener, Notification, NotificationBus, NotificationKind};
pub use registry::{Services, SessionRegistry};
pub use round::{JoinResult, Round, Transition};
