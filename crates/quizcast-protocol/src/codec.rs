//! Codec trait and implementations for serializing/deserializing events.
//!
//! A "codec" converts between Rust types and raw bytes. The protocol layer
//! doesn't care HOW events are serialized — it just needs something that
//! implements the [`Codec`] trait, so a binary format can be swapped in
//! later without touching the rest of the stack.
//!
//! Currently we provide [`JsonCodec`] (human-readable, what browser quiz
//! clients speak natively).

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because the codec is shared across connection
/// handler tasks on the Tokio thread pool. The methods are generic over
/// any serde-compatible type; `DeserializeOwned` means decoded values own
/// their data, so the input buffer can be dropped immediately.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Behind the `json` feature flag (enabled by default). JSON frames can be
/// inspected in browser DevTools, which makes debugging quiz clients easy;
/// the size overhead is irrelevant at trivia message rates.
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
    use crate::{RoomId, ServerEvent};

    #[test]
    fn test_json_codec_round_trip() {
        let codec = JsonCodec;
        let event = ServerEvent::TimerUpdate { seconds_left: 12 };

        let bytes = codec.encode(&event).unwrap();
        let decoded: ServerEvent = codec.decode(&bytes).unwrap();

        assert_eq!(event, decoded);
    }

    #[test]
    fn test_json_codec_output_is_json_text() {
        let codec = JsonCodec;
        let bytes = codec.encode(&RoomId::from("r1")).unwrap();
        assert_eq!(bytes, b"\"r1\"");
    }

    #[test]
    fn test_json_codec_decode_error() {
        let codec = JsonCodec;
        let result: Result<ServerEvent, _> = codec.decode(b"{{{{");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
