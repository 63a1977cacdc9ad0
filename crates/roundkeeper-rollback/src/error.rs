//! Error types for the change log.

use roundkeeper_model::BlockPos;
use roundkeeper_store::StoreError;

/// Failures reported by an [`Environment`](crate::Environment)
/// implementation.
#[derive(Debug, thiserror::Error)]
pub enum EnvironmentError {
    /// The world isn't loaded or doesn't exist.
    #[error("world {0} not found")]
    WorldNotFound(String),

    /// Reading or writing one position failed.
    #[error("cannot access {pos} in {world}: {reason}")]
    Access {
        world: String,
        pos: BlockPos,
        reason: String,
    },
}

/// Errors raised while recording changes or persisting the log.
#[derive(Debug, thiserror::Error)]
pub enum RollbackError {
    /// The environment couldn't be read when capturing an original.
    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    /// Loading or saving the change-log document failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
