//! Codec trait and implementations for serializing/deserializing messages.
//!
//! The protocol layer doesn't care how messages become bytes, only that
//! something implements [`Codec`]. The dispatcher is generic over it, so
//! tests and alternative front ends can plug in their own.
//!
//! [`JsonCodec`] is what the browser clients speak. Its output is always
//! UTF-8, which lets the WebSocket transport send every frame as text.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes Rust values to bytes and decodes them back.
///
/// ## Trait bounds
///
/// - `Send + Sync`: the codec lives in the host actor, which Tokio may
///   run on any worker thread.
/// - `'static`: the codec owns everything it needs, so it can live inside
///   a spawned task for the life of the room.
///
/// ## Generic methods
///
/// `encode` and `decode` are generic over the message type, so the same
/// codec handles [`ClientMessage`](crate::ClientMessage) inbound and
/// [`ServerMessage`](crate::ServerMessage) outbound, as well as anything
/// else serde can describe.
///
/// `decode` asks for `DeserializeOwned` rather than `Deserialize<'de>`:
/// the decoded message must not borrow from the frame, because the frame
/// buffer is dropped as soon as decoding returns.
///
/// A decode failure is never fatal. The dispatcher logs it and drops the
/// frame, which is how unknown message types, missing required fields
/// (such as a roll without `visibility`) and plain garbage are rejected.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value can't be represented
    /// in this format (for example a map with non-string keys in JSON).
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`. Always produces UTF-8, so its output
/// can be sent as WebSocket text frames.
///
/// ```rust
/// use rolltable_protocol::{ClientMessage, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let msg: ClientMessage = codec
///     .decode(br#"{"type":"CLEAR_MY_TABLE"}"#)
///     .unwrap();
/// assert_eq!(msg, ClientMessage::ClearMyTable);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
