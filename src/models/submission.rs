// src/models/submission.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'submissions' table: one attempt session of one user on one
/// quiz. The triple (quiz_id, user_id, attempt_number) is unique.
///
/// `score` is written only by the score aggregator; handlers never touch it.
/// `in_progress` flips true -> false exactly once, when the session's answer
/// set has been recorded.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub quiz_id: i64,
    pub user_id: i64,
    pub score: i64,
    pub attempt_number: i32,
    pub in_progress: bool,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// One ledger entry in the 'question_attempts' table: a user's answer to one
/// question within a submission. Immutable once written; corrections insert a
/// new row with the next attempt_number.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuestionAttempt {
    pub id: i64,
    pub submission_id: i64,
    pub question_id: i64,
    pub selected_answer_id: Option<i64>,
    pub is_correct: bool,
    pub attempt_number: i32,
    pub attempted_at: chrono::DateTime<chrono::Utc>,
}

/// Insert payload for a ledger entry. The id and timestamp are assigned by
/// the store.
#[derive(Debug, Clone)]
pub struct NewQuestionAttempt {
    pub submission_id: i64,
    pub question_id: i64,
    pub selected_answer_id: Option<i64>,
    pub is_correct: bool,
    pub attempt_number: i32,
}

/// One ranked leaderboard row. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub score: i64,
    pub attempt_number: i32,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for submitting a batch of answers to a quiz.
///
/// Key: question id. Value: selected answer id, or null for a blank answer.
/// `complete` marks the session finished; send false to keep the submission
/// open for re-attempting questions under the same attempt number.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAnswersRequest {
    #[validate(custom(function = validate_answers))]
    pub answers: HashMap<i64, Option<i64>>,

    #[serde(default = "default_complete")]
    pub complete: bool,
}

fn default_complete() -> bool {
    true
}

fn validate_answers(
    answers: &HashMap<i64, Option<i64>>,
) -> Result<(), validator::ValidationError> {
    if answers.is_empty() {
        return Err(validator::ValidationError::new("answers_cannot_be_empty"));
    }
    if answers.len() > 200 {
        return Err(validator::ValidationError::new("too_many_answers"));
    }
    Ok(())
}
