//! Quiz timing configuration and the per-question state machine.

use std::time::Duration;

// ---------------------------------------------------------------------------
// QuizConfig
// ---------------------------------------------------------------------------

/// Timing configuration for a quiz room.
///
/// The defaults are the product numbers (30 s per question, 2 s between
/// reveal and the next question); tests shrink them to keep scenarios
/// fast.
#[derive(Debug, Clone, Copy)]
pub struct QuizConfig {
    /// How long a question stays open before a forced reveal.
    pub question_duration: Duration,

    /// Grace delay between the answer reveal and the next question.
    pub reveal_delay: Duration,

    /// How long an empty room may sit inactive before the idle sweep
    /// evicts it.
    pub idle_timeout: Duration,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            question_duration: Duration::from_secs(30),
            reveal_delay: Duration::from_secs(2),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

// ---------------------------------------------------------------------------
// QuizPhase
// ---------------------------------------------------------------------------

/// The lifecycle state of a room's quiz.
///
/// ```text
///            start_quiz                    advance
/// Lobby ────────────────→ Open ⇄ Revealed ────────→ Finished
///                           ↑                           │
///                           └──────── start_quiz ───────┘
/// ```
///
/// - **Lobby**: players are joining and marking ready; no question open.
/// - **Open**: a question is live, answers are accepted, the countdown
///   is armed.
/// - **Revealed**: the correct answer has been disclosed (a player won
///   it, everyone missed, or the clock ran out); further answers for
///   this question are rejected while the 2-second grace delay runs.
/// - **Finished**: the question sequence is exhausted; terminal until a
///   fresh `start_quiz`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Lobby,
    Open,
    Revealed,
    Finished,
}

impl QuizPhase {
    /// Returns `true` if answers for the current question are accepted.
    ///
    /// This is the inverse of the "answer revealed" guard: submissions
    /// are only evaluated while a question is open.
    pub fn accepts_answers(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns `true` if a quiz run is in progress (a question is open
    /// or in its reveal grace delay).
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Open | Self::Revealed)
    }
}

impl std::fmt::Display for QuizPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::Open => write!(f, "Open"),
            Self::Revealed => write!(f, "Revealed"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}
