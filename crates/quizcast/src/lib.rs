//! # Quizcast
//!
//! Real-time multiplayer trivia server over WebSockets.
//!
//! Players join named rooms, mark themselves ready, and race to answer
//! multiple-choice questions against a per-question countdown. Each room
//! runs as its own task; the server layer here ties transport, protocol,
//! and rooms together.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use quizcast::{QuestionBank, QuizServer, ServerError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ServerError> {
//!     let bank = Arc::new(QuestionBank::from_path("questions.json")?);
//!     let server = QuizServer::builder()
//!         .bind("0.0.0.0:3310")
//!         .build(bank)
//!         .await?;
//!     server.run().await
//! }
//! ```

mod error;
mod handler;
mod server;

pub use error::ServerError;
pub use server::{QuizServer, QuizServerBuilder};

// Re-export the sub-crate types callers need, so a single dependency on
// `quizcast` is enough to run a server.
pub use quizcast_bank::{BankError, QuestionBank, QuestionRecord};
pub use quizcast_protocol::{
    ClientEvent, Codec, JsonCodec, PlayerEntry, ProtocolError, RoomId,
    ServerEvent,
};
pub use quizcast_room::{QuizConfig, QuizPhase, RoomError, RoomRegistry};
pub use quizcast_transport::{Transport, TransportError, WebSocketTransport};
