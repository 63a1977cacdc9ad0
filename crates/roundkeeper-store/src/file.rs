//! On-disk document store.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use roundkeeper_model::DurableId;

use crate::{DocumentKey, DocumentStore, StoreError, check_durable_id};

const SNAPSHOT_DIR: &str = "snapshots";
const EXTENSION: &str = "json";

/// Stores each document as a file under one namespace directory.
///
/// Directories are created lazily on first write, so pointing a
/// `FileStore` at a path that doesn't exist yet is fine: every load
/// simply returns `None` until something is saved.
///
/// Writes go to `<file>.tmp` first and are then renamed over the target.
/// A crash mid-write leaves the previous version intact instead of a
/// truncated document.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `root` (usually `<data dir>/<namespace>`).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The namespace directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &DocumentKey) -> Result<PathBuf, StoreError> {
        Ok(match key {
            DocumentKey::Arenas => self.root.join(format!("arenas.{EXTENSION}")),
            DocumentKey::Changes => self.root.join(format!("changes.{EXTENSION}")),
            DocumentKey::Snapshot(id) => {
                check_durable_id(id)?;
                self.root
                    .join(SNAPSHOT_DIR)
                    .join(format!("{id}.{EXTENSION}"))
            }
        })
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl DocumentStore for FileStore {
    fn load(&self, key: &DocumentKey) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_err(&path)(e)),
        }
    }

    fn save(&self, key: &DocumentKey, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        let tmp = path.with_extension(format!("{EXTENSION}.tmp"));
        fs::write(&tmp, bytes).map_err(io_err(&tmp))?;
        fs::rename(&tmp, &path).map_err(io_err(&path))?;
        tracing::trace!(document = %key, bytes = bytes.len(), "document saved");
        Ok(())
    }

    fn delete(&self, key: &DocumentKey) -> Result<bool, StoreError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_err(&path)(e)),
        }
    }

    fn snapshot_ids(&self) -> Result<Vec<DurableId>, StoreError> {
        let dir = self.root.join(SNAPSHOT_DIR);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(&dir)(e)),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry.map_err(io_err(&dir))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(DurableId::new(stem));
            }
        }
        ids.sort();
        Ok(ids)
    }
}
