//! Error types for the protocol layer.

/// Errors that can occur while encoding, decoding, or validating events.
///
/// None of these are fatal to a connection: the relay logs them and drops
/// the offending frame.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, a missing required field,
    /// or a field of the wrong type (e.g. `"x": "abc"`).
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The event decoded but violates a protocol rule, such as a
    /// non-finite coordinate.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
