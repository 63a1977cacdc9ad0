//! Document storage abstraction for roundkeeper.
//!
//! Provides the [`DocumentStore`] trait that the engine persists through,
//! plus two implementations:
//!
//! - [`FileStore`]: one JSON file per document under a namespace
//!   directory, written atomically (temp file + rename).
//! - [`MemoryStore`]: an in-process map, for tests and embedding.
//!
//! [`Documents`] layers a [`Codec`](roundkeeper_model::Codec) on top so
//! callers load and save typed values instead of raw bytes.
//!
//! # Layout
//!
//! One namespace owns three kinds of document:
//!
//! ```text
//! arenas.json               arena name → spawns, bounds
//! changes.json              arena name → position → original state
//! snapshots/<durable>.json  one saved inventory per participant
//! ```

mod documents;
mod error;
mod file;
mod memory;

pub use documents::Documents;
pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;

use std::fmt;

use roundkeeper_model::DurableId;

/// Names one document inside a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentKey {
    /// The arena catalog.
    Arenas,
    /// The change log for every arena in the namespace.
    Changes,
    /// A participant's saved inventory, keyed by durable identity.
    Snapshot(DurableId),
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arenas => f.write_str("arenas"),
            Self::Changes => f.write_str("changes"),
            Self::Snapshot(id) => write!(f, "snapshots/{id}"),
        }
    }
}

/// Loads and saves raw document bytes.
///
/// Implementations must treat a missing document as `Ok(None)` rather
/// than an error: "does not exist yet" is the normal state of a fresh
/// namespace.
pub trait DocumentStore: Send + Sync + 'static {
    /// Reads a document, or `None` if it was never written.
    fn load(&self, key: &DocumentKey) -> Result<Option<Vec<u8>>, StoreError>;

    /// Writes a document, replacing any previous contents.
    fn save(&self, key: &DocumentKey, bytes: &[u8]) -> Result<(), StoreError>;

    /// Removes a document. Returns `true` if it existed.
    fn delete(&self, key: &DocumentKey) -> Result<bool, StoreError>;

    /// Lists the durable ids that currently have a saved snapshot.
    fn snapshot_ids(&self) -> Result<Vec<DurableId>, StoreError>;
}

/// Rejects durable ids that can't be used as a file name.
pub(crate) fn check_durable_id(id: &DurableId) -> Result<(), StoreError> {
    let ok = !id.as_str().is_empty()
        && id
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(id.to_string()))
    }
}
