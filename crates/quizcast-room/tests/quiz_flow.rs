//! Integration tests for the room session state machine.
//!
//! All timer-sensitive tests run with `start_paused = true`: the runtime
//! auto-advances virtual time whenever every task is blocked on a timer,
//! so a full 30-second question plays out instantly and deterministically.
//!
//! Two patterns recur here:
//! - awaiting `handle.info()` acts as a barrier: commands are processed
//!   in order, so once `info` resolves, every earlier command has been
//!   applied. `try_recv` can then assert an event did or did not fire
//!   without letting virtual time move.
//! - `next_event` awaits the channel, which lets the runtime advance to
//!   the next timer deadline when the event is timer-driven.

use std::sync::Arc;
use std::time::Duration;

use quizcast_bank::{QuestionBank, QuestionRecord};
use quizcast_protocol::{PlayerEntry, RoomId, ServerEvent};
use quizcast_room::{QuizConfig, QuizPhase, RoomError, RoomHandle, RoomRegistry};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::timeout;

// =========================================================================
// Helpers
// =========================================================================

fn q(text: &str, choices: &[&str], answer: &str) -> QuestionRecord {
    QuestionRecord {
        text: text.into(),
        choices: choices.iter().map(|c| (*c).to_string()).collect(),
        answer: answer.into(),
    }
}

fn bank() -> Arc<QuestionBank> {
    Arc::new(
        QuestionBank::new(vec![
            q("What is 1+1?", &["1", "2", "3", "4"], "2"),
            q(
                "What is the capital of Japan?",
                &["Osaka", "Tokyo", "Kyoto", "Sapporo"],
                "Tokyo",
            ),
            q(
                "What is the tallest mountain in the world?",
                &["K2", "Everest", "Fuji", "Denali"],
                "Everest",
            ),
        ])
        .unwrap(),
    )
}

fn new_registry() -> RoomRegistry {
    RoomRegistry::new(bank(), QuizConfig::default())
}

fn new_room(name: &str) -> RoomHandle {
    new_registry().get_or_create(&RoomId::from(name))
}

async fn join(handle: &RoomHandle, name: &str) -> UnboundedReceiver<ServerEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    handle.join(name, tx).await.unwrap();
    rx
}

/// Awaits the next event. The generous timeout never elapses in a
/// passing test; it exists so a missing event fails instead of hanging.
async fn next_event(rx: &mut UnboundedReceiver<ServerEvent>) -> ServerEvent {
    timeout(Duration::from_secs(300), rx.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("event channel closed")
}

async fn skip_events(rx: &mut UnboundedReceiver<ServerEvent>, n: usize) {
    for _ in 0..n {
        let _ = next_event(rx).await;
    }
}

/// Barrier: once this resolves, every command sent before it has been
/// applied by the session task.
async fn settle(handle: &RoomHandle) {
    handle.info().await.unwrap();
}

fn assert_no_event(rx: &mut UnboundedReceiver<ServerEvent>) {
    if let Ok(event) = rx.try_recv() {
        panic!("expected no event, got {event:?}");
    }
}

fn entry(name: &str, score: u32) -> PlayerEntry {
    PlayerEntry { name: name.into(), score }
}

fn as_player_list(event: ServerEvent) -> Vec<PlayerEntry> {
    match event {
        ServerEvent::PlayerList { players } => players,
        other => panic!("expected player_list, got {other:?}"),
    }
}

fn as_scores(event: ServerEvent) -> Vec<PlayerEntry> {
    match event {
        ServerEvent::UpdateScores { scores } => scores,
        other => panic!("expected update_scores, got {other:?}"),
    }
}

fn as_question_text(event: ServerEvent) -> String {
    match event {
        ServerEvent::Question { text, .. } => text,
        other => panic!("expected question, got {other:?}"),
    }
}

// =========================================================================
// Joining and readiness
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_join_broadcasts_roster_in_join_order() {
    let room = new_room("r1");
    let mut rx_a = join(&room, "alice").await;
    assert_eq!(as_player_list(next_event(&mut rx_a).await), vec![entry("alice", 0)]);

    let mut rx_b = join(&room, "bob").await;
    let expected = vec![entry("alice", 0), entry("bob", 0)];
    assert_eq!(as_player_list(next_event(&mut rx_a).await), expected);
    assert_eq!(as_player_list(next_event(&mut rx_b).await), expected);
}

#[tokio::test(start_paused = true)]
async fn test_all_ready_fires_once_on_final_ready() {
    let room = new_room("r1");
    let mut rx_a = join(&room, "alice").await;
    let mut rx_b = join(&room, "bob").await;
    skip_events(&mut rx_a, 2).await;
    skip_events(&mut rx_b, 1).await;

    room.ready("alice").await.unwrap();
    settle(&room).await;
    assert_no_event(&mut rx_a);
    assert_no_event(&mut rx_b);

    room.ready("bob").await.unwrap();
    assert_eq!(next_event(&mut rx_a).await, ServerEvent::AllReady);
    assert_eq!(next_event(&mut rx_b).await, ServerEvent::AllReady);

    // Repeat readiness must not re-announce.
    room.ready("alice").await.unwrap();
    settle(&room).await;
    assert_no_event(&mut rx_a);
    assert_no_event(&mut rx_b);
}

#[tokio::test(start_paused = true)]
async fn test_ready_from_unknown_player_is_ignored() {
    let room = new_room("r1");
    let mut rx_a = join(&room, "alice").await;
    let mut rx_b = join(&room, "bob").await;
    skip_events(&mut rx_a, 2).await;
    skip_events(&mut rx_b, 1).await;

    room.ready("ghost").await.unwrap();
    room.ready("alice").await.unwrap();
    settle(&room).await;
    // A stranger's ready must not count toward the roster.
    assert_no_event(&mut rx_a);

    room.ready("bob").await.unwrap();
    assert_eq!(next_event(&mut rx_a).await, ServerEvent::AllReady);
}

#[tokio::test(start_paused = true)]
async fn test_rejoin_restores_parked_score() {
    let room = new_room("r1");
    let mut rx_a = join(&room, "alice").await;
    let mut rx_b = join(&room, "bob").await;
    skip_events(&mut rx_a, 2).await;
    skip_events(&mut rx_b, 1).await;

    room.start().await.unwrap();
    skip_events(&mut rx_a, 1).await; // question
    skip_events(&mut rx_b, 1).await;

    room.answer("alice", "2").await.unwrap();
    skip_events(&mut rx_b, 2).await; // update_scores, correct_answer

    room.leave("alice").await.unwrap();
    assert_eq!(as_player_list(next_event(&mut rx_b).await), vec![entry("bob", 0)]);

    // Rejoining under the same name picks the old score back up, at the
    // end of the roster.
    let mut rx_a2 = join(&room, "alice").await;
    let expected = vec![entry("bob", 0), entry("alice", 1)];
    assert_eq!(as_player_list(next_event(&mut rx_a2).await), expected);
    assert_eq!(as_player_list(next_event(&mut rx_b).await), expected);
}

// =========================================================================
// Quiz flow
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_start_opens_first_question_and_ticks() {
    let room = new_room("r1");
    let mut rx = join(&room, "alice").await;
    skip_events(&mut rx, 1).await;

    room.start().await.unwrap();
    match next_event(&mut rx).await {
        ServerEvent::Question { text, choices } => {
            assert_eq!(text, "What is 1+1?");
            assert_eq!(choices, vec!["1", "2", "3", "4"]);
        }
        other => panic!("expected question, got {other:?}"),
    }

    // One virtual second later the first countdown tick arrives.
    assert_eq!(
        next_event(&mut rx).await,
        ServerEvent::TimerUpdate { seconds_left: 29 }
    );

    let info = room.info().await.unwrap();
    assert_eq!(info.phase, QuizPhase::Open);
}

#[tokio::test(start_paused = true)]
async fn test_correct_answer_scores_reveals_and_advances() {
    let room = new_room("r1");
    let mut rx_a = join(&room, "alice").await;
    let mut rx_b = join(&room, "bob").await;
    skip_events(&mut rx_a, 2).await;
    skip_events(&mut rx_b, 1).await;

    room.start().await.unwrap();
    skip_events(&mut rx_a, 1).await;
    skip_events(&mut rx_b, 1).await;

    room.answer("alice", "2").await.unwrap();

    assert_eq!(
        as_scores(next_event(&mut rx_a).await),
        vec![entry("alice", 1), entry("bob", 0)]
    );
    assert_eq!(
        next_event(&mut rx_a).await,
        ServerEvent::CorrectAnswer {
            is_answer_reveal: false,
            player: Some("alice".into()),
            answer: "2".into(),
        }
    );
    skip_events(&mut rx_b, 2).await;

    // The next question opens after the reveal delay.
    assert_eq!(
        as_question_text(next_event(&mut rx_a).await),
        "What is the capital of Japan?"
    );
    assert_eq!(
        as_question_text(next_event(&mut rx_b).await),
        "What is the capital of Japan?"
    );
}

#[tokio::test(start_paused = true)]
async fn test_answer_after_reveal_does_not_score() {
    let room = new_room("r1");
    let mut rx_a = join(&room, "alice").await;
    let mut rx_b = join(&room, "bob").await;
    skip_events(&mut rx_a, 2).await;
    skip_events(&mut rx_b, 1).await;

    room.start().await.unwrap();
    skip_events(&mut rx_a, 1).await;
    skip_events(&mut rx_b, 1).await;

    room.answer("alice", "2").await.unwrap();
    // Bob's correct answer lands after the reveal: ignored entirely.
    room.answer("bob", "2").await.unwrap();
    skip_events(&mut rx_a, 2).await; // update_scores, correct_answer
    skip_events(&mut rx_b, 2).await;

    // Next event is question 2, not a second score update.
    assert_eq!(
        as_question_text(next_event(&mut rx_b).await),
        "What is the capital of Japan?"
    );
    skip_events(&mut rx_a, 1).await;

    // Bob answers question 2 correctly: the point lands on question 2,
    // proving the late submission never scored.
    room.answer("bob", "Tokyo").await.unwrap();
    assert_eq!(
        as_scores(next_event(&mut rx_b).await),
        vec![entry("alice", 1), entry("bob", 1)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_wrong_retry_gets_private_rejection() {
    let room = new_room("r1");
    let mut rx_a = join(&room, "alice").await;
    let mut rx_b = join(&room, "bob").await;
    skip_events(&mut rx_a, 2).await;
    skip_events(&mut rx_b, 1).await;

    room.start().await.unwrap();
    skip_events(&mut rx_a, 1).await;
    skip_events(&mut rx_b, 1).await;

    room.answer("alice", "1").await.unwrap();
    let wrong = ServerEvent::WrongAnswer { player: "alice".into(), answer: "1".into() };
    assert_eq!(next_event(&mut rx_a).await, wrong);
    assert_eq!(next_event(&mut rx_b).await, wrong);

    // Second try on the same question: rejected, and only the
    // submitter hears about it.
    room.answer("alice", "3").await.unwrap();
    settle(&room).await;
    assert_eq!(
        rx_a.try_recv().unwrap(),
        ServerEvent::AlreadyAnswered {
            message: "You already answered this question!".into(),
        }
    );
    assert_no_event(&mut rx_b);
}

#[tokio::test(start_paused = true)]
async fn test_everyone_wrong_forces_reveal_without_scoring() {
    let room = new_room("r1");
    let mut rx_a = join(&room, "alice").await;
    let mut rx_b = join(&room, "bob").await;
    skip_events(&mut rx_a, 2).await;
    skip_events(&mut rx_b, 1).await;

    room.start().await.unwrap();
    skip_events(&mut rx_a, 1).await;
    skip_events(&mut rx_b, 1).await;

    room.answer("alice", "1").await.unwrap();
    skip_events(&mut rx_a, 1).await; // wrong_answer alice
    skip_events(&mut rx_b, 1).await;

    room.answer("bob", "4").await.unwrap();
    assert_eq!(
        next_event(&mut rx_a).await,
        ServerEvent::WrongAnswer { player: "bob".into(), answer: "4".into() }
    );
    // Everyone has missed: forced reveal, nobody scores.
    assert_eq!(
        next_event(&mut rx_a).await,
        ServerEvent::CorrectAnswer {
            is_answer_reveal: true,
            player: None,
            answer: "2".into(),
        }
    );
    skip_events(&mut rx_b, 2).await;

    // Straight to question 2 with no update_scores in between.
    assert_eq!(
        as_question_text(next_event(&mut rx_a).await),
        "What is the capital of Japan?"
    );
}

#[tokio::test(start_paused = true)]
async fn test_timeout_forces_reveal_after_full_countdown() {
    let room = new_room("r1");
    let mut rx = join(&room, "alice").await;
    skip_events(&mut rx, 1).await;

    room.start().await.unwrap();
    skip_events(&mut rx, 1).await; // question

    // 30 ticks: 29 down to 1, then the zero tick.
    let mut seen = Vec::new();
    loop {
        match next_event(&mut rx).await {
            ServerEvent::TimerUpdate { seconds_left } => seen.push(seconds_left),
            other => panic!("expected timer_update, got {other:?}"),
        }
        if seen.last() == Some(&0) {
            break;
        }
    }
    let expected: Vec<u64> = (0..30).rev().collect();
    assert_eq!(seen, expected);

    assert_eq!(
        next_event(&mut rx).await,
        ServerEvent::CorrectAnswer {
            is_answer_reveal: true,
            player: None,
            answer: "2".into(),
        }
    );
    assert_eq!(
        as_question_text(next_event(&mut rx).await),
        "What is the capital of Japan?"
    );
}

#[tokio::test(start_paused = true)]
async fn test_quiz_ends_after_last_question() {
    let room = new_room("r1");
    let mut rx = join(&room, "alice").await;
    skip_events(&mut rx, 1).await;

    room.start().await.unwrap();
    for answer in ["2", "Tokyo", "Everest"] {
        skip_events(&mut rx, 1).await; // question
        room.answer("alice", answer).await.unwrap();
        skip_events(&mut rx, 2).await; // update_scores, correct_answer
    }

    assert_eq!(
        next_event(&mut rx).await,
        ServerEvent::EndQuiz { message: "The quiz is over!".into() }
    );
    let info = room.info().await.unwrap();
    assert_eq!(info.phase, QuizPhase::Finished);

    // Finished is quiet: no stray ticks or questions follow.
    let quiet = timeout(Duration::from_secs(120), rx.recv()).await;
    assert!(quiet.is_err(), "finished quiz must emit nothing, got {quiet:?}");
}

#[tokio::test(start_paused = true)]
async fn test_restart_reopens_first_question_keeping_scores() {
    let room = new_room("r1");
    let mut rx = join(&room, "alice").await;
    skip_events(&mut rx, 1).await;

    room.start().await.unwrap();
    for answer in ["2", "Tokyo", "Everest"] {
        skip_events(&mut rx, 1).await;
        room.answer("alice", answer).await.unwrap();
        skip_events(&mut rx, 2).await;
    }
    skip_events(&mut rx, 1).await; // end_quiz

    room.start().await.unwrap();
    assert_eq!(as_question_text(next_event(&mut rx).await), "What is 1+1?");

    // Scores carry across runs; the wrong-answer ledger does not.
    room.answer("alice", "2").await.unwrap();
    assert_eq!(as_scores(next_event(&mut rx).await), vec![entry("alice", 4)]);
}

#[tokio::test(start_paused = true)]
async fn test_answer_in_lobby_is_ignored() {
    let room = new_room("r1");
    let mut rx = join(&room, "alice").await;
    skip_events(&mut rx, 1).await;

    room.answer("alice", "2").await.unwrap();
    settle(&room).await;
    assert_no_event(&mut rx);

    let info = room.info().await.unwrap();
    assert_eq!(info.phase, QuizPhase::Lobby);
}

#[tokio::test(start_paused = true)]
async fn test_leave_shrinks_everyone_wrong_denominator() {
    let room = new_room("r1");
    let mut rx_a = join(&room, "alice").await;
    let mut rx_b = join(&room, "bob").await;
    let mut rx_c = join(&room, "carol").await;
    skip_events(&mut rx_a, 3).await;
    skip_events(&mut rx_b, 2).await;
    skip_events(&mut rx_c, 1).await;

    room.start().await.unwrap();
    skip_events(&mut rx_a, 1).await;
    skip_events(&mut rx_b, 1).await;
    skip_events(&mut rx_c, 1).await;

    room.answer("alice", "1").await.unwrap();
    skip_events(&mut rx_a, 1).await;
    skip_events(&mut rx_b, 1).await;

    // Carol leaves without answering; the roster rebroadcast drops her.
    room.leave("carol").await.unwrap();
    assert_eq!(
        as_player_list(next_event(&mut rx_a).await),
        vec![entry("alice", 0), entry("bob", 0)]
    );
    skip_events(&mut rx_b, 1).await;

    // With carol gone, bob's miss makes it everyone-wrong.
    room.answer("bob", "3").await.unwrap();
    skip_events(&mut rx_a, 1).await; // wrong_answer bob
    assert_eq!(
        next_event(&mut rx_a).await,
        ServerEvent::CorrectAnswer {
            is_answer_reveal: true,
            player: None,
            answer: "2".into(),
        }
    );
}

// =========================================================================
// Registry
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_get_or_create_reuses_existing_room() {
    let mut registry = new_registry();
    let first = registry.get_or_create(&RoomId::from("r1"));
    let second = registry.get_or_create(&RoomId::from("r1"));

    assert_eq!(registry.room_count(), 1);
    assert_eq!(first.room_id(), second.room_id());

    // Both handles reach the same session.
    let _rx = join(&first, "alice").await;
    let info = second.info().await.unwrap();
    assert_eq!(info.player_count, 1);
}

#[tokio::test(start_paused = true)]
async fn test_get_unknown_room_returns_none() {
    let registry = new_registry();
    assert!(registry.get(&RoomId::from("nowhere")).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_destroy_room() {
    let mut registry = new_registry();
    let handle = registry.get_or_create(&RoomId::from("r1"));

    registry.destroy_room(&RoomId::from("r1")).await.unwrap();
    assert_eq!(registry.room_count(), 0);
    assert!(handle.info().await.is_err());

    let result = registry.destroy_room(&RoomId::from("r1")).await;
    assert!(matches!(result, Err(RoomError::NotFound(_))));
}

#[tokio::test(start_paused = true)]
async fn test_idle_sweep_evicts_only_empty_idle_rooms() {
    let config = QuizConfig {
        idle_timeout: Duration::from_secs(5),
        ..QuizConfig::default()
    };
    let mut registry = RoomRegistry::new(bank(), config);

    let _empty = registry.get_or_create(&RoomId::from("empty"));
    let busy = registry.get_or_create(&RoomId::from("busy"));
    let _rx = join(&busy, "alice").await;

    // A room whose last player left becomes sweepable too.
    let vacated = registry.get_or_create(&RoomId::from("vacated"));
    let _rx2 = join(&vacated, "bob").await;
    vacated.leave("bob").await.unwrap();

    tokio::time::advance(Duration::from_secs(10)).await;

    let evicted = registry.sweep_idle().await;
    assert_eq!(evicted, 2);
    assert!(registry.get(&RoomId::from("empty")).is_none());
    assert!(registry.get(&RoomId::from("vacated")).is_none());
    assert!(registry.get(&RoomId::from("busy")).is_some());
}

#[tokio::test(start_paused = true)]
async fn test_idle_sweep_spares_recently_active_rooms() {
    let config = QuizConfig {
        idle_timeout: Duration::from_secs(5),
        ..QuizConfig::default()
    };
    let mut registry = RoomRegistry::new(bank(), config);
    let _fresh = registry.get_or_create(&RoomId::from("fresh"));

    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(registry.sweep_idle().await, 0);
    assert_eq!(registry.room_count(), 1);
}
