//! Unified error type for the roundkeeper facade.

use std::path::PathBuf;

use roundkeeper_model::ModelError;
use roundkeeper_rollback::RollbackError;
use roundkeeper_round::RoundError;
use roundkeeper_session::SessionError;
use roundkeeper_store::StoreError;

/// Top-level error that wraps every crate-specific error.
///
/// Hosts embedding the `roundkeeper` crate only need to match on this
/// one type. `?` converts sub-crate errors through the `#[from]` impls.
#[derive(Debug, thiserror::Error)]
pub enum RoundkeeperError {
    /// Bad arena geometry or an undecodable value.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Document storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A participant-side operation failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Change-log bookkeeping or restoration failed.
    #[error(transparent)]
    Rollback(#[from] RollbackError),

    /// A round or registry operation was refused.
    #[error(transparent)]
    Round(#[from] RoundError),

    /// The host configuration file couldn't be read.
    #[error("could not read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The host configuration file isn't valid JSON for [`HostConfig`](crate::HostConfig).
    #[error("invalid config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
