//! Error types for the protocol layer.
//!
//! Every crate in the workspace has its own error enum, so a
//! `ProtocolError` always means "these bytes or this message were wrong",
//! never a socket or room problem. The host crate folds them all into
//! `RolltableError` with `#[from]`.

/// Errors that can occur while encoding, decoding, or validating messages.
///
/// None of these end a connection. Inbound failures are logged at `debug`
/// and the offending frame is dropped; the player keeps their seat.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    ///
    /// The host only encodes its own well-formed `ServerMessage`s, so in
    /// practice this signals a bug rather than bad input. The actor logs
    /// it at `error` and skips that one message.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, unknown `type`, missing
    /// fields, or values of the wrong type.
    ///
    /// The inner `serde_json::Error` carries line and column, which is
    /// usually enough to spot what a client sent.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message parsed but breaks a protocol rule, such as a die with
    /// one side or a blank nickname.
    ///
    /// Produced by [`validate`](crate::validate) after decoding succeeds.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
