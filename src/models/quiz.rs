// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;
use crate::models::submission::QuestionAttempt;

/// How repeated attempts at the same question are condensed into a point
/// value. The set is closed: unknown tags in quiz configuration are rejected
/// when the quiz row is loaded, never defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringPolicy {
    Best,
    First,
    Last,
}

impl ScoringPolicy {
    pub fn parse(tag: &str) -> Result<Self, AppError> {
        match tag {
            "best" => Ok(Self::Best),
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            other => Err(AppError::Config(format!(
                "unknown scoring policy '{other}'"
            ))),
        }
    }

    /// Point value for one question, given that question's attempts for a
    /// single submission in canonical order (attempt_number, attempted_at, id).
    pub fn compute(&self, attempts: &[QuestionAttempt]) -> i64 {
        match self {
            Self::Best => i64::from(attempts.iter().any(|a| a.is_correct)),
            Self::First => attempts.first().map_or(0, |a| i64::from(a.is_correct)),
            Self::Last => attempts.last().map_or(0, |a| i64::from(a.is_correct)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn parse(tag: &str) -> Result<Self, AppError> {
        match tag {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            other => Err(AppError::Config(format!("unknown visibility '{other}'"))),
        }
    }
}

/// Quiz configuration. Read-only to this service: authoring happens in the
/// external admin surface.
///
/// When `allow_multiple_attempts` is false, `max_attempts` is irrelevant and
/// the quota evaluator treats the quiz as single-attempt.
#[derive(Debug, Clone, Serialize)]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub creator_id: i64,
    pub is_published: bool,
    pub visibility: Visibility,
    pub allow_multiple_attempts: bool,
    pub max_attempts: Option<i32>,
    pub scoring_policy: ScoringPolicy,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,

    /// The text content of the question.
    pub text: String,
}

/// Represents the 'answers' table in the database.
///
/// `is_correct` is the answer key and is never serialized to clients.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub question_id: i64,
    pub text: String,

    #[serde(skip)]
    pub is_correct: bool,
}

/// DTO for sending an answer option to clients (excludes the key).
#[derive(Debug, Serialize)]
pub struct AnswerOption {
    pub id: i64,
    pub text: String,
}

impl From<Answer> for AnswerOption {
    fn from(a: Answer) -> Self {
        Self { id: a.id, text: a.text }
    }
}

/// DTO for the quiz detail endpoint: the quiz plus its questions and options.
#[derive(Debug, Serialize)]
pub struct QuizDetail {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub questions: Vec<QuestionDetail>,
}

#[derive(Debug, Serialize)]
pub struct QuestionDetail {
    pub id: i64,
    pub text: String,
    pub answers: Vec<AnswerOption>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(is_correct: bool) -> QuestionAttempt {
        QuestionAttempt {
            id: 0,
            submission_id: 1,
            question_id: 1,
            selected_answer_id: None,
            is_correct,
            attempt_number: 1,
            attempted_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn best_policy_scores_any_correct_attempt() {
        let policy = ScoringPolicy::Best;
        assert_eq!(policy.compute(&[attempt(false), attempt(true)]), 1);
        assert_eq!(policy.compute(&[attempt(false), attempt(false)]), 0);
        assert_eq!(policy.compute(&[]), 0);
    }

    #[test]
    fn first_policy_scores_only_the_first_attempt() {
        let policy = ScoringPolicy::First;
        assert_eq!(policy.compute(&[attempt(true), attempt(false)]), 1);
        assert_eq!(policy.compute(&[attempt(false), attempt(true)]), 0);
        assert_eq!(policy.compute(&[]), 0);
    }

    #[test]
    fn last_policy_scores_only_the_last_attempt() {
        let policy = ScoringPolicy::Last;
        assert_eq!(policy.compute(&[attempt(true), attempt(false)]), 0);
        assert_eq!(policy.compute(&[attempt(false), attempt(true)]), 1);
        assert_eq!(policy.compute(&[]), 0);
    }

    #[test]
    fn unknown_policy_tag_is_a_config_error() {
        assert!(ScoringPolicy::parse("best").is_ok());
        assert!(ScoringPolicy::parse("highest").is_err());
        assert!(Visibility::parse("friends-only").is_err());
    }
}
