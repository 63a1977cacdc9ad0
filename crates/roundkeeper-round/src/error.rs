//! Error types for the round layer.

use roundkeeper_model::{ArenaKey, ModelError, ParticipantId};
use roundkeeper_rollback::RollbackError;
use roundkeeper_session::SessionError;
use roundkeeper_store::StoreError;

use crate::Stage;

/// Errors that can occur during round and registry operations.
///
/// Admission outcomes a caller is expected to branch on (round full of
/// time, vetoed, snapshot failed) are reported through
/// [`JoinResult`](crate::JoinResult) instead; these are the cases where
/// the request itself was wrong.
#[derive(Debug, thiserror::Error)]
pub enum RoundError {
    /// No arena with this name is defined in the namespace.
    #[error("arena {0} not found")]
    ArenaNotFound(String),

    /// The arena already hosts a live round.
    #[error("a round already exists in arena {0}")]
    RoundExists(ArenaKey),

    /// The arena has no live round.
    #[error("no round in arena {0}")]
    RoundNotFound(ArenaKey),

    /// The arena can't be removed while a round is live in it.
    #[error("arena {0} has a live round")]
    ArenaBusy(ArenaKey),

    /// A location or arena definition is unusable: no spawns, inverted
    /// bounds, a spawn outside the bounds, an unparsable position.
    #[error("invalid position: {0}")]
    InvalidPosition(#[from] ModelError),

    /// The roster is at `max_participants`.
    #[error("round in arena {0} is full")]
    RoundFull(ArenaKey),

    /// The participant already belongs to a round, here or in another
    /// namespace sharing the membership directory.
    #[error("participant {participant} already in round {arena} of namespace {namespace}")]
    AlreadyInRound {
        participant: ParticipantId,
        namespace: String,
        arena: ArenaKey,
    },

    #[error("participant {0} is not connected")]
    NotConnected(ParticipantId),

    #[error("participant {participant} not in round {arena}")]
    NotInRound {
        participant: ParticipantId,
        arena: ArenaKey,
    },

    /// `start()` on a round that isn't WAITING.
    #[error("round in arena {arena} already started (stage {stage})")]
    AlreadyStarted { arena: ArenaKey, stage: Stage },

    /// `end()` on a round that isn't PREPARING or PLAYING.
    #[error("round in arena {0} is not running")]
    NotRunning(ArenaKey),

    /// The arena is being rolled back; admission waits until it is done.
    #[error("arena {0} is resetting")]
    Resetting(ArenaKey),

    #[error(transparent)]
    Rollback(#[from] RollbackError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
