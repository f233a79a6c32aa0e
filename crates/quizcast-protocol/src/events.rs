//! Core event types for Quizcast's wire format.
//!
//! The wire format is deliberately simple: every frame is one JSON object
//! with a `"type"` tag naming the event. Clients send [`ClientEvent`]s,
//! the server sends [`ServerEvent`]s. There is no envelope, sequence
//! number, or handshake — the transport already guarantees in-order
//! delivery per connection, and players identify themselves by display
//! name inside the events.

use serde::{Deserialize, Serialize};

use std::fmt;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a room: the room's name as chosen by players.
///
/// A newtype wrapper around `String` so a room name can't be confused
/// with a player name or an answer string in function signatures.
/// `#[serde(transparent)]` makes it serialize as the bare string, so
/// `RoomId("lobby")` is just `"lobby"` in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Returns the room name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoomId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

// ---------------------------------------------------------------------------
// Recipient — who should receive an event?
// ---------------------------------------------------------------------------

/// Specifies who should receive a server event.
///
/// When the room session processes an action, it emits a list of
/// `(Recipient, ServerEvent)` pairs. This enum tells the dispatch layer
/// WHERE to deliver each one. Players are addressed by display name,
/// which is unique within a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Broadcast to every player in the room.
    Room,

    /// Send to one specific player's connection (e.g. the
    /// `already_answered` rejection, which only the submitter sees).
    Player(String),
}

// ---------------------------------------------------------------------------
// Roster entries
// ---------------------------------------------------------------------------

/// One row of the roster / score listing: a display name and its score.
///
/// `player_list` and `update_scores` carry these in roster order —
/// the order players joined the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerEntry {
    /// The player's display name.
    pub name: String,
    /// The player's current score.
    pub score: u32,
}

// ---------------------------------------------------------------------------
// ClientEvent — inbound
// ---------------------------------------------------------------------------

/// Events a client sends to the server.
///
/// `#[serde(tag = "type", rename_all = "snake_case")]` produces internally
/// tagged JSON with snake_case event names, e.g.:
///   `{ "type": "join_room", "room": "r1", "player": "alice" }`
/// which is what a browser client naturally emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// "Add me to this room under this display name."
    JoinRoom { room: RoomId, player: String },

    /// "I'm ready to start."
    PlayerReady { room: RoomId, player: String },

    /// "Start (or restart) the quiz in this room."
    StartQuiz { room: RoomId },

    /// "Here is my answer to the current question."
    Answer {
        room: RoomId,
        player: String,
        answer: String,
    },
}

impl ClientEvent {
    /// The room this event targets. Every client event is room-scoped.
    pub fn room(&self) -> &RoomId {
        match self {
            Self::JoinRoom { room, .. }
            | Self::PlayerReady { room, .. }
            | Self::StartQuiz { room }
            | Self::Answer { room, .. } => room,
        }
    }

    /// Checks the protocol rules the type system can't express: room and
    /// player names must be non-empty.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidEvent`] naming the offending field.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.room().as_str().is_empty() {
            return Err(ProtocolError::InvalidEvent("empty room name".into()));
        }
        match self {
            Self::JoinRoom { player, .. }
            | Self::PlayerReady { player, .. }
            | Self::Answer { player, .. }
                if player.is_empty() =>
            {
                Err(ProtocolError::InvalidEvent("empty player name".into()))
            }
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerEvent — outbound
// ---------------------------------------------------------------------------

/// Events the server sends to clients.
///
/// Same JSON shape as [`ClientEvent`]: one object, `"type"` tag,
/// snake_case names. Most are room broadcasts; `already_answered` is the
/// only event addressed to a single connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// The full roster in join order, sent after every join or leave.
    PlayerList { players: Vec<PlayerEntry> },

    /// Every joined player has marked ready.
    AllReady,

    /// A new question is open. Never includes the answer.
    Question { text: String, choices: Vec<String> },

    /// The correct answer has been disclosed.
    ///
    /// `is_answer_reveal` is `false` when a player earned the point
    /// (`player` names them) and `true` for a forced reveal (timeout or
    /// everyone wrong), in which case `player` is absent.
    CorrectAnswer {
        is_answer_reveal: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        player: Option<String>,
        answer: String,
    },

    /// A player guessed wrong. Visible to the whole room.
    WrongAnswer { player: String, answer: String },

    /// The full score mapping in roster order, sent when a score changes.
    UpdateScores { scores: Vec<PlayerEntry> },

    /// Seconds remaining on the current question's clock.
    TimerUpdate { seconds_left: u64 },

    /// Rejection sent only to a player who retries a question they
    /// already missed.
    AlreadyAnswered { message: String },

    /// The question sequence is exhausted. Terminal for this run.
    EndQuiz { message: String },
}

// =========================================================================
// Tests
// =========================================================================
