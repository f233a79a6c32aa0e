//! Room lifecycle management for Quizcast.
//!
//! Each room runs as an isolated Tokio task (actor model) owning the quiz
//! state machine for that room: roster, readiness, question pointer,
//! wrong-answer ledger, countdown, and the reveal-to-next delay. Because
//! every mutation — player command, countdown tick, delayed advance —
//! flows through the one actor loop, they are serialized by construction
//! and the timer-vs-answer race cannot occur.
//!
//! # Key types
//!
//! - [`RoomRegistry`] — lazily creates sessions, routes by room name
//! - [`RoomHandle`] — send commands to a running room session
//! - [`QuizPhase`] — per-question lifecycle state machine
//! - [`QuizConfig`] — timing settings (question duration, reveal delay)

mod config;
mod error;
mod registry;
mod session;

pub use config::{QuizConfig, QuizPhase};
pub use error::RoomError;
pub use registry::RoomRegistry;
pub use session::{EventSender, RoomHandle, RoomInfo};
