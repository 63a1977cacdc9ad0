//! Environment change log and rollback for roundkeeper.
//!
//! While a round runs, participants mutate the shared environment. The
//! [`ChangeLog`] remembers what every touched position looked like
//! *before* the first mutation, and [`ChangeLog::rollback`] writes those
//! originals back once the round is over.
//!
//! # Guarantees
//!
//! - **Write-once**: only the first mutation at a position is recorded;
//!   later ones are no-ops, so rollback always restores the pre-round
//!   state rather than some intermediate one.
//! - **Durable**: the log is persisted to the namespace's `changes`
//!   document, so a crash mid-round is repaired at next startup by
//!   replaying every non-empty arena log ([`ChangeLog::pending_arenas`]).
//! - **Best-effort**: a position that fails to restore (or a record that
//!   fails to decode) is logged and skipped; it never aborts the rest of
//!   the rollback.
//! - **Idempotent**: rolling back an empty log does nothing.

mod change_log;
mod environment;
mod error;
mod record;

pub use change_log::{ChangeLog, RollbackReport, WritePolicy};
pub use environment::Environment;
pub use error::{EnvironmentError, RollbackError};
pub use record::ChangeRecord;
