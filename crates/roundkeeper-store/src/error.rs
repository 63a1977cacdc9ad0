//! Error types for the storage layer.

use std::path::PathBuf;

use roundkeeper_model::ModelError;

/// Errors that can occur while reading or writing documents.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem I/O failed.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document bytes could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] ModelError),

    /// The key can't name a document (e.g. a durable id with path
    /// separators in it).
    #[error("invalid document key: {0}")]
    InvalidKey(String),
}
