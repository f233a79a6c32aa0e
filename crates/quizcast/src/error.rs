//! Unified error type for the Quizcast server.

use quizcast_bank::BankError;
use quizcast_protocol::ProtocolError;
use quizcast_room::RoomError;
use quizcast_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `quizcast` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (session gone, room not found).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A question bank error (load, parse, validation).
    #[error(transparent)]
    Bank(#[from] BankError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizcast_protocol::RoomId;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let server_err: ServerError = err.into();
        assert!(matches!(server_err, ServerError::Transport(_)));
        assert!(server_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::NotFound(RoomId::from("r1"));
        let server_err: ServerError = err.into();
        assert!(matches!(server_err, ServerError::Room(_)));
        assert_eq!(server_err.to_string(), "room r1 not found");
    }

    #[test]
    fn test_from_bank_error() {
        let err = BankError::Empty;
        let server_err: ServerError = err.into();
        assert!(matches!(server_err, ServerError::Bank(_)));
    }
}
