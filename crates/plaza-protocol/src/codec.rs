//! Codec trait and implementations for serializing/deserializing events.
//!
//! The relay doesn't care how events are represented on the wire, only that
//! something implements [`Codec`]. Browser clients speak JSON, so
//! [`JsonCodec`] is the only implementation today.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use plaza_protocol::{ClientEvent, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let event: ClientEvent = codec
///     .decode(br#"{"type":"move","x":10,"y":20.5}"#)
///     .unwrap();
/// assert!(matches!(event, ClientEvent::Move { x, y, .. } if x == 10.0 && y == 20.5));
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{ClientEvent, ServerEvent, SessionId};

    #[test]
    fn test_decode_malformed_json_returns_decode_error() {
        let result: Result<ClientEvent, _> = JsonCodec.decode(b"{not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_wrong_field_type_returns_decode_error() {
        let result: Result<ClientEvent, _> =
            JsonCodec.decode(br#"{"type":"move","x":"abc","y":5}"#);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_encode_server_event_produces_json_bytes() {
        let bytes = JsonCodec
            .encode(&ServerEvent::Left { id: SessionId(3) })
            .unwrap();
        assert_eq!(bytes, br#"{"type":"left","id":3}"#);
    }
}
