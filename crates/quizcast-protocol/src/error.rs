//! Error types for the protocol layer.
//!
//! Each crate in Quizcast defines its own error enum. When you see a
//! `ProtocolError`, the problem is in serialization/deserialization,
//! not in networking or room state.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed. Common causes: malformed JSON, missing
    /// required fields, an unknown event tag, or a truncated frame.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The event is invalid at the protocol level — it parsed, but
    /// violates a protocol rule (e.g. an empty room name).
    #[error("invalid event: {0}")]
    InvalidEvent(String),
}
