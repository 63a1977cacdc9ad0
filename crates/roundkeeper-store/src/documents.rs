//! Typed access to a [`DocumentStore`].

use std::sync::Arc;

use roundkeeper_model::{Codec, JsonCodec};
use serde::{Serialize, de::DeserializeOwned};

use crate::{DocumentKey, DocumentStore, StoreError};

/// A document store paired with a codec.
///
/// Cheap to clone: it's an `Arc` plus a (usually zero-sized) codec.
#[derive(Clone)]
pub struct Documents<C: Codec = JsonCodec> {
    store: Arc<dyn DocumentStore>,
    codec: C,
}

impl Documents<JsonCodec> {
    /// Wraps a store with the JSON codec.
    pub fn json(store: Arc<dyn DocumentStore>) -> Self {
        Self::new(store, JsonCodec)
    }
}

impl<C: Codec> Documents<C> {
    pub fn new(store: Arc<dyn DocumentStore>, codec: C) -> Self {
        Self { store, codec }
    }

    /// The underlying raw store.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Loads and decodes a document, or `None` if it doesn't exist.
    pub fn load<T: DeserializeOwned>(&self, key: &DocumentKey) -> Result<Option<T>, StoreError> {
        match self.store.load(key)? {
            Some(bytes) => Ok(Some(self.codec.decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Loads a document, falling back to `T::default()` when it has never
    /// been written.
    pub fn load_or_default<T: DeserializeOwned + Default>(
        &self,
        key: &DocumentKey,
    ) -> Result<T, StoreError> {
        Ok(self.load(key)?.unwrap_or_default())
    }

    /// Encodes and writes a document.
    pub fn save<T: Serialize>(&self, key: &DocumentKey, value: &T) -> Result<(), StoreError> {
        let bytes = self.codec.encode(value)?;
        self.store.save(key, &bytes)
    }

    /// Removes a document. Returns `true` if it existed.
    pub fn delete(&self, key: &DocumentKey) -> Result<bool, StoreError> {
        self.store.delete(key)
    }
}
