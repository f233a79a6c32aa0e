use quizcast_protocol::RoomId;
use thiserror::Error;

/// Errors from room operations.
#[derive(Debug, Error)]
pub enum RoomError {
    /// The room's session task is gone (shut down or panicked), so the
    /// command could not be delivered or answered.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),

    /// No session exists for this room.
    #[error("room {0} not found")]
    NotFound(RoomId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_room() {
        let err = RoomError::Unavailable(RoomId::from("r1"));
        assert_eq!(err.to_string(), "room r1 is unavailable");

        let err = RoomError::NotFound(RoomId::from("lobby"));
        assert_eq!(err.to_string(), "room lobby not found");
    }
}
