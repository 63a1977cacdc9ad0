//! Error types for the session layer.

use roundkeeper_model::{DurableId, ParticipantId};
use roundkeeper_store::StoreError;

/// Errors raised by session bookkeeping and by the host collaborators
/// the session layer talks to.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The participant is not reachable (offline, unknown id).
    #[error("participant {0} is not connected")]
    NotConnected(ParticipantId),

    /// The host could not map a runtime id to a durable one.
    #[error("could not resolve a durable id for {0}")]
    Unresolved(ParticipantId),

    /// Reading, clearing, or writing the participant's inventory failed on
    /// the host side.
    #[error("inventory access failed for {participant}: {reason}")]
    Inventory {
        participant: ParticipantId,
        reason: String,
    },

    /// Moving the participant failed on the host side.
    #[error("teleport failed for {participant}: {reason}")]
    Teleport {
        participant: ParticipantId,
        reason: String,
    },

    /// Persisting a snapshot failed. Admission must not proceed.
    #[error("could not save snapshot for {durable}: {source}")]
    SnapshotSave {
        durable: DurableId,
        #[source]
        source: StoreError,
    },

    /// Any other storage failure (loading, deleting, listing snapshots).
    #[error(transparent)]
    Store(#[from] StoreError),
}
