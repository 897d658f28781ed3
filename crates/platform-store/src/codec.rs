//! Payload codecs
//!
//! The store never interprets payload bytes itself; a codec turns a typed
//! payload into the opaque bytes held by the backing container and back.

use std::marker::PhantomData;
use thiserror::Error;

use crate::resource::Payload;

/// Codec error types.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The payload could not be encoded.
    #[error("Encode error: {0}")]
    Encode(String),

    /// The stored bytes could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Converts payloads to and from opaque bytes.
pub trait Codec<T>: Send + Sync {
    /// Encode a payload.
    fn encode(&self, payload: &T) -> Result<Vec<u8>, CodecError>;

    /// Decode a payload.
    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError>;

    /// Media type of the encoded form.
    fn content_type(&self) -> &'static str;
}

/// JSON codec backed by `serde_json`.
pub struct JsonCodec<T> {
    _payload: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    /// Create a JSON codec.
    pub fn new() -> Self {
        Self {
            _payload: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for JsonCodec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JsonCodec")
    }
}

impl<T: Payload> Codec<T> for JsonCodec<T> {
    fn encode(&self, payload: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(payload).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }
}
