//! The per-room quiz session actor.
//!
//! One [`QuizSession`] task owns all mutable state for a room. Commands
//! arrive over an mpsc channel, countdown ticks and the reveal-to-next
//! delay are folded into the same `select!` loop, so every state change
//! runs on one task in a single serialized stream. An answer and a
//! timer expiry can never interleave mid-update.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use quizcast_bank::QuestionBank;
use quizcast_countdown::{Countdown, CountdownConfig, CountdownTick};
use quizcast_protocol::{PlayerEntry, Recipient, RoomId, ServerEvent};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant};
use tracing::{debug, info};

use crate::config::{QuizConfig, QuizPhase};
use crate::error::RoomError;

/// Per-player channel for outbound server events. The connection layer
/// owns the receiving half and forwards events onto the socket.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Command channel depth per room. Commands are small and handled
/// quickly, so a modest buffer is plenty.
const DEFAULT_CHANNEL_SIZE: usize = 64;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Commands a [`RoomHandle`] can send to its session task.
#[derive(Debug)]
enum RoomCommand {
    Join {
        player: String,
        sender: EventSender,
        reply: oneshot::Sender<()>,
    },
    Ready {
        player: String,
    },
    Start,
    Answer {
        player: String,
        answer: String,
    },
    Leave {
        player: String,
        reply: oneshot::Sender<()>,
    },
    Info {
        reply: oneshot::Sender<RoomInfo>,
    },
    Shutdown,
}

/// A snapshot of a room's state, for the registry and for diagnostics.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub phase: QuizPhase,
    pub player_count: usize,
    /// Time since the last player command reached this room.
    pub idle_for: Duration,
}

// ---------------------------------------------------------------------------
// RoomHandle
// ---------------------------------------------------------------------------

/// A cheap-to-clone handle for sending commands to a room session.
///
/// All methods queue a command on the session's channel; the session
/// processes them in arrival order. Methods fail with
/// [`RoomError::Unavailable`] only if the session task is gone.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// The room this handle points at.
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Adds (or re-attaches) a player and registers their event channel.
    /// Resolves once the join has been applied and the roster broadcast.
    pub async fn join(
        &self,
        player: impl Into<String>,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Join { player: player.into(), sender, reply })
            .await?;
        rx.await.map_err(|_| self.unavailable())
    }

    /// Marks a player ready.
    pub async fn ready(&self, player: impl Into<String>) -> Result<(), RoomError> {
        self.send(RoomCommand::Ready { player: player.into() }).await
    }

    /// Starts (or restarts) the quiz from the first question.
    pub async fn start(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Start).await
    }

    /// Submits an answer to the current question.
    pub async fn answer(
        &self,
        player: impl Into<String>,
        answer: impl Into<String>,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::Answer {
            player: player.into(),
            answer: answer.into(),
        })
        .await
    }

    /// Removes a player from the room, parking their score for a
    /// possible rejoin. Resolves once the removal has been applied.
    pub async fn leave(&self, player: impl Into<String>) -> Result<(), RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Leave { player: player.into(), reply }).await?;
        rx.await.map_err(|_| self.unavailable())
    }

    /// A snapshot of the room's current state.
    ///
    /// Because commands are processed in order, awaiting `info` also
    /// guarantees every command sent before it has been applied.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Info { reply }).await?;
        rx.await.map_err(|_| self.unavailable())
    }

    /// Asks the session task to stop.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Shutdown).await
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender.send(cmd).await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.room_id.clone())
    }
}

// ---------------------------------------------------------------------------
// QuizSession — the actor
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct PlayerState {
    score: u32,
}

/// The state machine behind one room. Runs until shut down or until
/// every handle is dropped.
struct QuizSession {
    room_id: RoomId,
    bank: Arc<QuestionBank>,
    config: QuizConfig,
    receiver: mpsc::Receiver<RoomCommand>,

    /// Roster in join order. IndexMap keeps the broadcast order stable.
    players: IndexMap<String, PlayerState>,
    /// Live event channels, keyed by display name.
    senders: HashMap<String, EventSender>,
    /// Names that have marked ready since the last quiz start.
    ready: HashSet<String>,
    /// Scores of players who left, restored if they rejoin by name.
    parked_scores: HashMap<String, u32>,

    phase: QuizPhase,
    /// Index into the bank of the question currently open or revealed.
    current_question: usize,
    /// question-index sets per player: which questions they have
    /// already missed. Cleared on quiz start.
    wrong_answers: HashMap<String, HashSet<usize>>,

    countdown: Countdown,
    /// When set, the reveal grace delay is running; the next question
    /// opens at this instant.
    advance_at: Option<Instant>,
    last_activity: Instant,
}

/// Spawns a session task for `room_id` and returns its handle.
pub(crate) fn spawn_session(
    room_id: RoomId,
    bank: Arc<QuestionBank>,
    config: QuizConfig,
) -> RoomHandle {
    let (sender, receiver) = mpsc::channel(DEFAULT_CHANNEL_SIZE);
    let session = QuizSession {
        room_id: room_id.clone(),
        bank,
        config,
        receiver,
        players: IndexMap::new(),
        senders: HashMap::new(),
        ready: HashSet::new(),
        parked_scores: HashMap::new(),
        phase: QuizPhase::Lobby,
        current_question: 0,
        wrong_answers: HashMap::new(),
        countdown: Countdown::new(CountdownConfig::with_duration(
            config.question_duration,
        )),
        advance_at: None,
        last_activity: Instant::now(),
    };

    tokio::spawn(session.run());

    RoomHandle { room_id, sender }
}

/// Resolves at `at`, or pends forever when there is no deadline.
async fn deadline(at: Option<Instant>) {
    match at {
        Some(at) => time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

impl QuizSession {
    async fn run(mut self) {
        info!(room = %self.room_id, "room session started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    match cmd {
                        None | Some(RoomCommand::Shutdown) => break,
                        Some(cmd) => self.handle_command(cmd),
                    }
                }
                tick = self.countdown.tick() => {
                    self.handle_tick(tick);
                }
                () = deadline(self.advance_at), if self.advance_at.is_some() => {
                    self.advance_at = None;
                    self.advance_question();
                }
            }
        }

        info!(room = %self.room_id, "room session stopped");
    }

    fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join { player, sender, reply } => {
                self.last_activity = Instant::now();
                self.handle_join(player, sender);
                let _ = reply.send(());
            }
            RoomCommand::Ready { player } => {
                self.last_activity = Instant::now();
                self.handle_ready(player);
            }
            RoomCommand::Start => {
                self.last_activity = Instant::now();
                self.handle_start();
            }
            RoomCommand::Answer { player, answer } => {
                self.last_activity = Instant::now();
                self.handle_answer(player, answer);
            }
            RoomCommand::Leave { player, reply } => {
                self.last_activity = Instant::now();
                self.handle_leave(&player);
                let _ = reply.send(());
            }
            RoomCommand::Info { reply } => {
                let _ = reply.send(RoomInfo {
                    room_id: self.room_id.clone(),
                    phase: self.phase,
                    player_count: self.players.len(),
                    idle_for: self.last_activity.elapsed(),
                });
            }
            // Handled in `run` before we get here.
            RoomCommand::Shutdown => {}
        }
    }

    // -- joins and readiness -----------------------------------------------

    fn handle_join(&mut self, player: String, sender: EventSender) {
        if !self.players.contains_key(&player) {
            // Returning players pick their old score back up.
            let score = self.parked_scores.remove(&player).unwrap_or(0);
            debug!(room = %self.room_id, %player, score, "player joined");
            self.players.insert(player.clone(), PlayerState { score });
        }
        // A rejoin under an existing name replaces the event channel, so
        // the newest connection wins.
        self.senders.insert(player, sender);
        self.emit(Recipient::Room, ServerEvent::PlayerList { players: self.roster() });
    }

    fn handle_ready(&mut self, player: String) {
        if !self.players.contains_key(&player) {
            debug!(room = %self.room_id, %player, "ready from unknown player ignored");
            return;
        }
        // Fires only on the transition to all-ready, not on repeats.
        if self.ready.insert(player) && self.ready.len() == self.players.len() {
            debug!(room = %self.room_id, "all players ready");
            self.emit(Recipient::Room, ServerEvent::AllReady);
        }
    }

    // -- quiz flow ---------------------------------------------------------

    fn handle_start(&mut self) {
        info!(room = %self.room_id, "quiz starting");
        self.advance_at = None;
        self.countdown.disarm();
        self.current_question = 0;
        self.ready.clear();
        self.wrong_answers.clear();
        self.begin_question();
    }

    /// Opens the question at `current_question`, or ends the quiz if the
    /// bank is exhausted.
    fn begin_question(&mut self) {
        let Some(question) = self.bank.question(self.current_question) else {
            self.phase = QuizPhase::Finished;
            self.countdown.disarm();
            info!(room = %self.room_id, "quiz finished");
            self.emit(
                Recipient::Room,
                ServerEvent::EndQuiz { message: "The quiz is over!".into() },
            );
            return;
        };

        let event = ServerEvent::Question {
            text: question.text.clone(),
            choices: question.choices.clone(),
        };
        debug!(
            room = %self.room_id,
            index = self.current_question,
            "question opened"
        );
        self.phase = QuizPhase::Open;
        self.emit(Recipient::Room, event);
        self.countdown.arm();
    }

    fn handle_answer(&mut self, player: String, answer: String) {
        // The reveal closes the question; anything arriving after it is
        // a race the submitter lost.
        if !self.phase.accepts_answers() {
            debug!(room = %self.room_id, %player, "answer after reveal ignored");
            return;
        }
        if !self.players.contains_key(&player) {
            return;
        }
        // Read the index now, not when the question was scheduled:
        // stale indices are how answers score against the wrong question.
        let index = self.current_question;
        let Some(question) = self.bank.question(index) else {
            return;
        };
        let correct_answer = question.answer.clone();

        if self
            .wrong_answers
            .get(&player)
            .is_some_and(|missed| missed.contains(&index))
        {
            self.emit(
                Recipient::Player(player),
                ServerEvent::AlreadyAnswered {
                    message: "You already answered this question!".into(),
                },
            );
            return;
        }

        if answer == correct_answer {
            if let Some(state) = self.players.get_mut(&player) {
                state.score += 1;
            }
            info!(room = %self.room_id, %player, index, "correct answer");
            self.emit(
                Recipient::Room,
                ServerEvent::UpdateScores { scores: self.roster() },
            );
            self.emit(
                Recipient::Room,
                ServerEvent::CorrectAnswer {
                    is_answer_reveal: false,
                    player: Some(player),
                    answer: correct_answer,
                },
            );
            self.reveal_and_schedule_advance();
        } else {
            debug!(room = %self.room_id, %player, index, "wrong answer");
            self.wrong_answers.entry(player.clone()).or_default().insert(index);
            self.emit(
                Recipient::Room,
                ServerEvent::WrongAnswer { player, answer },
            );
            if self.everyone_missed(index) {
                info!(room = %self.room_id, index, "everyone missed, revealing");
                self.emit(
                    Recipient::Room,
                    ServerEvent::CorrectAnswer {
                        is_answer_reveal: true,
                        player: None,
                        answer: correct_answer,
                    },
                );
                self.reveal_and_schedule_advance();
            }
        }
    }

    /// Whether every player currently in the room has missed `index`.
    /// Counts the roster as it stands now, so departures shrink the
    /// denominator.
    fn everyone_missed(&self, index: usize) -> bool {
        !self.players.is_empty()
            && self.players.keys().all(|name| {
                self.wrong_answers
                    .get(name)
                    .is_some_and(|missed| missed.contains(&index))
            })
    }

    fn reveal_and_schedule_advance(&mut self) {
        self.phase = QuizPhase::Revealed;
        self.countdown.disarm();
        self.advance_at = Some(Instant::now() + self.config.reveal_delay);
    }

    fn advance_question(&mut self) {
        self.current_question += 1;
        self.begin_question();
    }

    fn handle_tick(&mut self, tick: CountdownTick) {
        self.emit(
            Recipient::Room,
            ServerEvent::TimerUpdate { seconds_left: tick.seconds_left },
        );
        if tick.expired && self.phase.accepts_answers() {
            let Some(question) = self.bank.question(self.current_question)
            else {
                return;
            };
            info!(
                room = %self.room_id,
                index = self.current_question,
                "time up, revealing"
            );
            self.emit(
                Recipient::Room,
                ServerEvent::CorrectAnswer {
                    is_answer_reveal: true,
                    player: None,
                    answer: question.answer.clone(),
                },
            );
            self.reveal_and_schedule_advance();
        }
    }

    // -- departures --------------------------------------------------------

    fn handle_leave(&mut self, player: &str) {
        let Some((name, state)) = self.players.shift_remove_entry(player)
        else {
            return;
        };
        debug!(room = %self.room_id, %player, "player left");
        self.parked_scores.insert(name, state.score);
        self.senders.remove(player);
        self.ready.remove(player);
        self.wrong_answers.remove(player);
        self.emit(Recipient::Room, ServerEvent::PlayerList { players: self.roster() });
    }

    // -- event dispatch ----------------------------------------------------

    /// Delivers an event. Send failures mean the connection task is
    /// gone; the eventual leave command cleans the entry up.
    fn emit(&self, recipient: Recipient, event: ServerEvent) {
        match recipient {
            Recipient::Room => {
                for sender in self.senders.values() {
                    let _ = sender.send(event.clone());
                }
            }
            Recipient::Player(name) => {
                if let Some(sender) = self.senders.get(&name) {
                    let _ = sender.send(event);
                }
            }
        }
    }

    /// The roster with scores, in join order.
    fn roster(&self) -> Vec<PlayerEntry> {
        self.players
            .iter()
            .map(|(name, state)| PlayerEntry {
                name: name.clone(),
                score: state.score,
            })
            .collect()
    }
}
