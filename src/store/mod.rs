// src/store/mod.rs

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::quiz::{Answer, Question, Quiz};
use crate::models::submission::{
    LeaderboardEntry, NewQuestionAttempt, QuestionAttempt, Submission,
};

pub use memory::MemStore;
pub use postgres::PgStore;

/// Persistence boundary for the scoring engine.
///
/// The engine treats the question-attempt ledger as the source of truth and
/// the stored submission score as a cached projection, so the contract is
/// deliberately narrow: unique-constraint-guarded submission creation,
/// append-only ledger inserts, point score/completion updates, and the range
/// reads the quota evaluator and leaderboard need.
#[async_trait]
pub trait QuizStore: Send + Sync {
    async fn quiz_by_id(&self, quiz_id: i64) -> Result<Option<Quiz>, AppError>;

    /// Published, public quizzes for the listing endpoint, newest first.
    async fn published_quizzes(&self) -> Result<Vec<Quiz>, AppError>;

    async fn questions_for_quiz(&self, quiz_id: i64) -> Result<Vec<Question>, AppError>;

    async fn answers_for_question(&self, question_id: i64) -> Result<Vec<Answer>, AppError>;

    /// Whether `answer_id` is the correct answer of `question_id`. An answer
    /// belonging to a different question is never correct.
    async fn is_correct_answer(&self, question_id: i64, answer_id: i64)
    -> Result<bool, AppError>;

    /// Submission rows a user has for a quiz, regardless of `in_progress`.
    /// Abandoned sessions still count against quota.
    async fn submission_count(&self, quiz_id: i64, user_id: i64) -> Result<i64, AppError>;

    /// The user's open (in-progress) submission for the quiz, if any.
    async fn in_progress_submission(
        &self,
        quiz_id: i64,
        user_id: i64,
    ) -> Result<Option<Submission>, AppError>;

    /// Get-or-create on the unique (quiz, user, attempt_number) triple.
    /// Concurrent duplicate creation must collapse to a single row; the
    /// second writer gets the existing row back. The bool is true when this
    /// call created the row.
    async fn get_or_create_submission(
        &self,
        quiz_id: i64,
        user_id: i64,
        attempt_number: i32,
    ) -> Result<(Submission, bool), AppError>;

    async fn submission_by_id(&self, submission_id: i64)
    -> Result<Option<Submission>, AppError>;

    async fn submissions_for_user(&self, user_id: i64) -> Result<Vec<Submission>, AppError>;

    /// Append one immutable ledger entry.
    async fn insert_question_attempt(
        &self,
        attempt: NewQuestionAttempt,
    ) -> Result<QuestionAttempt, AppError>;

    /// All ledger entries of a submission in canonical scoring order:
    /// (question_id, attempt_number, attempted_at, id) ascending. The id
    /// tiebreak keeps the order total when timestamps collide.
    async fn attempts_for_submission(
        &self,
        submission_id: i64,
    ) -> Result<Vec<QuestionAttempt>, AppError>;

    /// Number of ledger entries for one question within a submission.
    async fn question_attempt_count(
        &self,
        submission_id: i64,
        question_id: i64,
    ) -> Result<i64, AppError>;

    /// Point update of the cached score projection.
    async fn update_score(&self, submission_id: i64, score: i64) -> Result<(), AppError>;

    /// Marks the submission completed (`in_progress = false`).
    async fn complete_submission(&self, submission_id: i64) -> Result<(), AppError>;

    /// Completed submissions of a quiz ranked for the leaderboard: score
    /// descending, earlier `submitted_at` winning ties, joined to usernames.
    async fn completed_submissions(
        &self,
        quiz_id: i64,
        limit: i64,
    ) -> Result<Vec<LeaderboardEntry>, AppError>;
}
