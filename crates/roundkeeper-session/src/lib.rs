//! Participant session management for roundkeeper.
//!
//! This crate handles everything about a participant that outlives a
//! single method call:
//!
//! 1. **Identity and presence**: the host tells us who is connected,
//!    where they stand, and their durable id ([`ParticipantResolver`]).
//! 2. **Session records**: one [`ParticipantSession`] per participant per
//!    round, extended with host data through a [`SessionFactory`].
//! 3. **Snapshot/restore**: a participant's inventory is saved to a
//!    durable document on admission and written back on removal
//!    ([`SnapshotStore`]), surviving crashes in between.
//!
//! # How it fits in the stack
//!
//! ```text
//! Round layer (above)  ← admits/removes participants, owns the roster
//!     ↕
//! Session layer (this crate)  ← sessions, snapshots, host collaborators
//!     ↕
//! Store + model (below)  ← documents, ids, item stacks
//! ```

mod error;
mod inventory;
mod resolver;
mod session;
mod snapshots;

pub use error::SessionError;
pub use inventory::{Inventories, InventorySnapshot};
pub use resolver::ParticipantResolver;
pub use session::{ParticipantSession, PlainSessions, SessionFactory};
pub use snapshots::{SnapshotHandle, SnapshotStore};
