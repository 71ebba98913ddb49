// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use crate::error::AppError;
use crate::models::quiz::{Answer, Question, Quiz, ScoringPolicy, Visibility};
use crate::models::submission::{
    LeaderboardEntry, NewQuestionAttempt, QuestionAttempt, Submission,
};
use crate::store::QuizStore;

/// Postgres-backed store used by the running service.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Raw quiz row; the policy and visibility tags are validated when the row is
/// converted into the domain type, so a bad tag fails the load instead of
/// leaking into scoring.
#[derive(FromRow)]
struct QuizRow {
    id: i64,
    title: String,
    description: String,
    creator_id: i64,
    is_published: bool,
    visibility: String,
    allow_multiple_attempts: bool,
    max_attempts: Option<i32>,
    scoring_policy: String,
    created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl TryFrom<QuizRow> for Quiz {
    type Error = AppError;

    fn try_from(row: QuizRow) -> Result<Self, AppError> {
        Ok(Quiz {
            id: row.id,
            title: row.title,
            description: row.description,
            creator_id: row.creator_id,
            is_published: row.is_published,
            visibility: Visibility::parse(&row.visibility)?,
            allow_multiple_attempts: row.allow_multiple_attempts,
            max_attempts: row.max_attempts,
            scoring_policy: ScoringPolicy::parse(&row.scoring_policy)?,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl QuizStore for PgStore {
    async fn quiz_by_id(&self, quiz_id: i64) -> Result<Option<Quiz>, AppError> {
        let row = sqlx::query_as::<_, QuizRow>(
            "SELECT id, title, description, creator_id, is_published, visibility, \
                    allow_multiple_attempts, max_attempts, scoring_policy, created_at \
             FROM quizzes WHERE id = $1",
        )
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Quiz::try_from).transpose()
    }

    async fn published_quizzes(&self) -> Result<Vec<Quiz>, AppError> {
        let rows = sqlx::query_as::<_, QuizRow>(
            "SELECT id, title, description, creator_id, is_published, visibility, \
                    allow_multiple_attempts, max_attempts, scoring_policy, created_at \
             FROM quizzes \
             WHERE is_published = TRUE AND visibility = 'public' \
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Quiz::try_from).collect()
    }

    async fn questions_for_quiz(&self, quiz_id: i64) -> Result<Vec<Question>, AppError> {
        let questions = sqlx::query_as::<_, Question>(
            "SELECT id, quiz_id, text FROM questions WHERE quiz_id = $1 ORDER BY id",
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(questions)
    }

    async fn answers_for_question(&self, question_id: i64) -> Result<Vec<Answer>, AppError> {
        let answers = sqlx::query_as::<_, Answer>(
            "SELECT id, question_id, text, is_correct FROM answers \
             WHERE question_id = $1 ORDER BY id",
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(answers)
    }

    async fn is_correct_answer(
        &self,
        question_id: i64,
        answer_id: i64,
    ) -> Result<bool, AppError> {
        let correct = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS( \
                SELECT 1 FROM answers \
                WHERE id = $1 AND question_id = $2 AND is_correct = TRUE)",
        )
        .bind(answer_id)
        .bind(question_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(correct)
    }

    async fn submission_count(&self, quiz_id: i64, user_id: i64) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM submissions WHERE quiz_id = $1 AND user_id = $2",
        )
        .bind(quiz_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn in_progress_submission(
        &self,
        quiz_id: i64,
        user_id: i64,
    ) -> Result<Option<Submission>, AppError> {
        let submission = sqlx::query_as::<_, Submission>(
            "SELECT id, quiz_id, user_id, score, attempt_number, in_progress, submitted_at \
             FROM submissions \
             WHERE quiz_id = $1 AND user_id = $2 AND in_progress = TRUE \
             ORDER BY attempt_number DESC \
             LIMIT 1",
        )
        .bind(quiz_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(submission)
    }

    async fn get_or_create_submission(
        &self,
        quiz_id: i64,
        user_id: i64,
        attempt_number: i32,
    ) -> Result<(Submission, bool), AppError> {
        // The unique constraint arbitrates concurrent creation: the losing
        // writer's insert becomes a no-op and it fetches the winner's row.
        let inserted = sqlx::query_as::<_, Submission>(
            "INSERT INTO submissions (quiz_id, user_id, attempt_number) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (quiz_id, user_id, attempt_number) DO NOTHING \
             RETURNING id, quiz_id, user_id, score, attempt_number, in_progress, submitted_at",
        )
        .bind(quiz_id)
        .bind(user_id)
        .bind(attempt_number)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(submission) = inserted {
            return Ok((submission, true));
        }

        let existing = sqlx::query_as::<_, Submission>(
            "SELECT id, quiz_id, user_id, score, attempt_number, in_progress, submitted_at \
             FROM submissions \
             WHERE quiz_id = $1 AND user_id = $2 AND attempt_number = $3",
        )
        .bind(quiz_id)
        .bind(user_id)
        .bind(attempt_number)
        .fetch_one(&self.pool)
        .await?;

        Ok((existing, false))
    }

    async fn submission_by_id(
        &self,
        submission_id: i64,
    ) -> Result<Option<Submission>, AppError> {
        let submission = sqlx::query_as::<_, Submission>(
            "SELECT id, quiz_id, user_id, score, attempt_number, in_progress, submitted_at \
             FROM submissions WHERE id = $1",
        )
        .bind(submission_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(submission)
    }

    async fn submissions_for_user(&self, user_id: i64) -> Result<Vec<Submission>, AppError> {
        let submissions = sqlx::query_as::<_, Submission>(
            "SELECT id, quiz_id, user_id, score, attempt_number, in_progress, submitted_at \
             FROM submissions WHERE user_id = $1 ORDER BY submitted_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(submissions)
    }

    async fn insert_question_attempt(
        &self,
        attempt: NewQuestionAttempt,
    ) -> Result<QuestionAttempt, AppError> {
        let inserted = sqlx::query_as::<_, QuestionAttempt>(
            "INSERT INTO question_attempts \
                (submission_id, question_id, selected_answer_id, is_correct, attempt_number) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, submission_id, question_id, selected_answer_id, is_correct, \
                       attempt_number, attempted_at",
        )
        .bind(attempt.submission_id)
        .bind(attempt.question_id)
        .bind(attempt.selected_answer_id)
        .bind(attempt.is_correct)
        .bind(attempt.attempt_number)
        .fetch_one(&self.pool)
        .await?;

        Ok(inserted)
    }

    async fn attempts_for_submission(
        &self,
        submission_id: i64,
    ) -> Result<Vec<QuestionAttempt>, AppError> {
        let attempts = sqlx::query_as::<_, QuestionAttempt>(
            "SELECT id, submission_id, question_id, selected_answer_id, is_correct, \
                    attempt_number, attempted_at \
             FROM question_attempts \
             WHERE submission_id = $1 \
             ORDER BY question_id, attempt_number, attempted_at, id",
        )
        .bind(submission_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attempts)
    }

    async fn question_attempt_count(
        &self,
        submission_id: i64,
        question_id: i64,
    ) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM question_attempts \
             WHERE submission_id = $1 AND question_id = $2",
        )
        .bind(submission_id)
        .bind(question_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn update_score(&self, submission_id: i64, score: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE submissions SET score = $2 WHERE id = $1")
            .bind(submission_id)
            .bind(score)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn complete_submission(&self, submission_id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE submissions SET in_progress = FALSE WHERE id = $1")
            .bind(submission_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn completed_submissions(
        &self,
        quiz_id: i64,
        limit: i64,
    ) -> Result<Vec<LeaderboardEntry>, AppError> {
        let entries = sqlx::query_as::<_, LeaderboardEntry>(
            "SELECT u.username, s.score, s.attempt_number, s.submitted_at \
             FROM submissions s \
             JOIN users u ON u.id = s.user_id \
             WHERE s.quiz_id = $1 AND s.in_progress = FALSE \
             ORDER BY s.score DESC, s.submitted_at ASC \
             LIMIT $2",
        )
        .bind(quiz_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
