//! Codec trait and implementations for persisted documents.
//!
//! Arena catalogs, change logs, and inventory snapshots all end up as
//! bytes in a document store. The store doesn't care how they were
//! serialized; it only moves bytes. The [`Codec`] trait is the seam
//! between the two, so a compact binary format can replace JSON later
//! without touching the storage or engine code.

use serde::{Serialize, de::DeserializeOwned};

use crate::ModelError;

/// Encodes Rust values to bytes and decodes them back.
///
/// `Send + Sync + 'static` because a codec lives inside long-lived,
/// shared engine state.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ModelError::Encode`] if the value can't be represented
    /// in this format.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ModelError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ModelError::Decode`] if the bytes are malformed or don't
    /// match the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ModelError>;
}

/// A [`Codec`] backed by `serde_json`, pretty-printed so operators can
/// read and hand-fix documents on disk.
///
/// ```rust
/// use roundkeeper_model::{BlockPos, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&BlockPos::new(1, 64, -3)).unwrap();
/// let decoded: BlockPos = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded, BlockPos::new(1, 64, -3));
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ModelError> {
        serde_json::to_vec_pretty(value).map_err(ModelError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ModelError> {
        serde_json::from_slice(data).map_err(ModelError::Decode)
    }
}
