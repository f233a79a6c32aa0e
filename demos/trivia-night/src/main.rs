//! Trivia Night: a ready-to-run Quizcast server with a built-in
//! three-question bank.
//!
//! ```text
//! trivia-night [path/to/questions.json]
//! ```
//!
//! With no argument the built-in bank is used. Set `RUST_LOG` to
//! control log verbosity (defaults to `info`).

use std::sync::Arc;

use quizcast::{QuestionBank, QuestionRecord, QuizServer};
use tracing_subscriber::EnvFilter;

const BIND_ADDR: &str = "0.0.0.0:3310";

fn default_bank() -> Result<QuestionBank, quizcast::BankError> {
    QuestionBank::new(vec![
        QuestionRecord {
            text: "What is the capital of Japan?".into(),
            choices: vec![
                "Osaka".into(),
                "Tokyo".into(),
                "Kyoto".into(),
                "Sapporo".into(),
            ],
            answer: "Tokyo".into(),
        },
        QuestionRecord {
            text: "What is 1+1?".into(),
            choices: vec!["1".into(), "2".into(), "3".into(), "4".into()],
            answer: "2".into(),
        },
        QuestionRecord {
            text: "What is the tallest mountain in the world?".into(),
            choices: vec![
                "K2".into(),
                "Everest".into(),
                "Fuji".into(),
                "Denali".into(),
            ],
            answer: "Everest".into(),
        },
    ])
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let bank = match std::env::args().nth(1) {
        Some(path) => {
            tracing::info!(%path, "loading question bank");
            QuestionBank::from_path(&path)?
        }
        None => default_bank()?,
    };
    tracing::info!(questions = bank.len(), "question bank ready");

    let server = QuizServer::builder()
        .bind(BIND_ADDR)
        .build(Arc::new(bank))
        .await?;
    tracing::info!(addr = BIND_ADDR, "trivia night is on");

    server.run().await?;
    Ok(())
}
