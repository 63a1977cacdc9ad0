//! Error types for the model layer.

/// Errors raised while decoding documents or validating model values.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Serializing a document failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserializing a document failed (malformed or truncated bytes,
    /// missing fields, wrong types).
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A position could not be parsed or lies outside the allowed region.
    #[error("invalid position: {0}")]
    InvalidPosition(String),
}
