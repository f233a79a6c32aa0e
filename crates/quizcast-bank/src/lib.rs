//! The question bank: an immutable, ordered sequence of quiz questions.
//!
//! A [`QuestionBank`] is loaded once at startup, validated, wrapped in an
//! `Arc`, and shared by reference across every room — all rooms play the
//! same sequence. Nothing here is mutable after construction.
//!
//! Banks can be built in code ([`QuestionBank::new`]) or loaded from a
//! JSON file ([`QuestionBank::from_path`]):
//!
//! ```json
//! [
//!   { "text": "What is 1+1?", "choices": ["1", "2", "3", "4"], "answer": "2" }
//! ]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors that can occur while loading or validating a question bank.
#[derive(Debug, thiserror::Error)]
pub enum BankError {
    /// The bank contains no questions.
    #[error("question bank is empty")]
    Empty,

    /// A question offers fewer than two choices.
    #[error("question {index} has {count} choices, need at least 2")]
    TooFewChoices { index: usize, count: usize },

    /// A question's answer string does not appear among its choices, so
    /// no player could ever submit it. Answers are matched by exact,
    /// case-sensitive string equality.
    #[error("question {index}: answer {answer:?} is not one of the choices")]
    AnswerNotInChoices { index: usize, answer: String },

    /// Reading the bank file failed.
    #[error("failed to read bank file: {0}")]
    Io(#[from] std::io::Error),

    /// The bank file is not valid JSON of the expected shape.
    #[error("failed to parse bank: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One quiz question: prompt text, the choices shown to players, and the
/// correct answer (which must be one of the choices).
///
/// The answer never travels to clients inside a `question` event; only
/// reveal events disclose it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// The question prompt shown to players.
    pub text: String,
    /// The choices, in display order.
    pub choices: Vec<String>,
    /// The correct answer. Compared case-sensitively against submissions.
    pub answer: String,
}

/// An immutable ordered list of questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<QuestionRecord>,
}

impl QuestionBank {
    /// Builds a bank from an in-memory question list, validating it.
    ///
    /// # Errors
    /// Returns [`BankError::Empty`], [`BankError::TooFewChoices`], or
    /// [`BankError::AnswerNotInChoices`] if the content is unusable.
    pub fn new(questions: Vec<QuestionRecord>) -> Result<Self, BankError> {
        if questions.is_empty() {
            return Err(BankError::Empty);
        }
        for (index, q) in questions.iter().enumerate() {
            if q.choices.len() < 2 {
                return Err(BankError::TooFewChoices {
                    index,
                    count: q.choices.len(),
                });
            }
            if !q.choices.contains(&q.answer) {
                return Err(BankError::AnswerNotInChoices {
                    index,
                    answer: q.answer.clone(),
                });
            }
        }
        Ok(Self { questions })
    }

    /// Parses and validates a bank from JSON bytes.
    pub fn from_json_slice(data: &[u8]) -> Result<Self, BankError> {
        let questions: Vec<QuestionRecord> = serde_json::from_slice(data)?;
        Self::new(questions)
    }

    /// Reads, parses, and validates a bank from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, BankError> {
        let data = std::fs::read(path)?;
        Self::from_json_slice(&data)
    }

    /// The question at `index`, or `None` past the end of the sequence.
    pub fn question(&self, index: usize) -> Option<&QuestionRecord> {
        self.questions.get(index)
    }

    /// Total number of questions.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the bank has no questions. Construction rejects empty
    /// banks, so this is always `false` on a built bank.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(text: &str, choices: &[&str], answer: &str) -> QuestionRecord {
        QuestionRecord {
            text: text.into(),
            choices: choices.iter().map(|c| (*c).to_string()).collect(),
            answer: answer.into(),
        }
    }

    #[test]
    fn test_new_accepts_valid_bank() {
        let bank = QuestionBank::new(vec![
            q("What is 1+1?", &["1", "2"], "2"),
            q("Capital of Japan?", &["Osaka", "Tokyo"], "Tokyo"),
        ])
        .unwrap();

        assert_eq!(bank.len(), 2);
        assert_eq!(bank.question(0).unwrap().answer, "2");
        assert_eq!(bank.question(1).unwrap().text, "Capital of Japan?");
        assert!(bank.question(2).is_none());
    }

    #[test]
    fn test_new_rejects_empty_bank() {
        let result = QuestionBank::new(vec![]);
        assert!(matches!(result, Err(BankError::Empty)));
    }

    #[test]
    fn test_new_rejects_single_choice() {
        let result = QuestionBank::new(vec![q("Only one?", &["yes"], "yes")]);
        assert!(matches!(
            result,
            Err(BankError::TooFewChoices { index: 0, count: 1 })
        ));
    }

    #[test]
    fn test_new_rejects_answer_missing_from_choices() {
        let result =
            QuestionBank::new(vec![q("What is 1+1?", &["1", "3"], "2")]);
        assert!(matches!(
            result,
            Err(BankError::AnswerNotInChoices { index: 0, .. })
        ));
    }

    #[test]
    fn test_answer_match_is_case_sensitive() {
        // "tokyo" != "Tokyo": this bank is invalid because players could
        // never reproduce the stored answer string.
        let result = QuestionBank::new(vec![q(
            "Capital of Japan?",
            &["Osaka", "Tokyo"],
            "tokyo",
        )]);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_json_slice() {
        let json = br#"[
            { "text": "What is 1+1?", "choices": ["1", "2", "3", "4"], "answer": "2" }
        ]"#;
        let bank = QuestionBank::from_json_slice(json).unwrap();
        assert_eq!(bank.len(), 1);
        assert_eq!(bank.question(0).unwrap().choices.len(), 4);
    }

    #[test]
    fn test_from_json_slice_rejects_malformed() {
        let result = QuestionBank::from_json_slice(b"{ not json");
        assert!(matches!(result, Err(BankError::Parse(_))));
    }

    #[test]
    fn test_from_path_missing_file() {
        let result = QuestionBank::from_path("/definitely/not/here.json");
        assert!(matches!(result, Err(BankError::Io(_))));
    }
}
