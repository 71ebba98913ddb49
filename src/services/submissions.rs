// src/services/submissions.rs

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::AppError;
use crate::metrics::MetricsSink;
use crate::models::quiz::Quiz;
use crate::models::submission::{NewQuestionAttempt, Submission};
use crate::services::leaderboard::Leaderboard;
use crate::services::quota::remaining_attempts;
use crate::services::scoring::recompute_score;
use crate::store::QuizStore;

/// Orchestrates the submission state machine:
/// absent -> in_progress -> completed.
///
/// Every ledger write triggers, in order and synchronously: score
/// recomputation, leaderboard cache invalidation, and a fire-and-forget
/// publish. The chain is explicit calls so it stays visible and testable.
#[derive(Clone)]
pub struct SubmissionService {
    store: Arc<dyn QuizStore>,
    leaderboard: Leaderboard,
    metrics: Arc<dyn MetricsSink>,
}

impl SubmissionService {
    pub fn new(
        store: Arc<dyn QuizStore>,
        leaderboard: Leaderboard,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            store,
            leaderboard,
            metrics,
        }
    }

    /// Records a batch of answers for `user_id` on `quiz`.
    ///
    /// Attaches to the user's open submission if one exists; otherwise starts
    /// a new attempt session, subject to quota. With `complete` the session
    /// is sealed afterwards and its attempt number becomes terminal.
    ///
    /// The quota check and the session insert are deliberately not one atomic
    /// unit; under heavy contention a user can overshoot the cap by one
    /// session, which is accepted.
    pub async fn submit_answers(
        &self,
        user_id: i64,
        quiz: &Quiz,
        answers: &HashMap<i64, Option<i64>>,
        complete: bool,
    ) -> Result<Submission, AppError> {
        let known: HashSet<i64> = self
            .store
            .questions_for_quiz(quiz.id)
            .await?
            .into_iter()
            .map(|q| q.id)
            .collect();
        for question_id in answers.keys() {
            if !known.contains(question_id) {
                return Err(AppError::BadRequest(format!(
                    "Question {question_id} does not belong to this quiz"
                )));
            }
        }

        let submission = self.open_submission(user_id, quiz).await?;

        for (&question_id, &selected_answer_id) in answers {
            self.record_answer(&submission, question_id, selected_answer_id)
                .await?;
        }

        if complete {
            self.store.complete_submission(submission.id).await?;
            // Completion changes leaderboard membership; evict so the next
            // read sees the completed run without waiting out the TTL.
            self.leaderboard.invalidate(submission.quiz_id);
        }

        self.store
            .submission_by_id(submission.id)
            .await?
            .ok_or_else(|| {
                AppError::InternalServerError("Submission disappeared mid-request".to_string())
            })
    }

    pub async fn remaining(&self, user_id: i64, quiz_id: i64) -> Result<i64, AppError> {
        remaining_attempts(self.store.as_ref(), user_id, quiz_id).await
    }

    /// Returns the submission new answers should attach to. Completed
    /// sessions are terminal: once none is open, a new attempt number is
    /// allocated, and only if quota remains.
    async fn open_submission(&self, user_id: i64, quiz: &Quiz) -> Result<Submission, AppError> {
        if let Some(open) = self
            .store
            .in_progress_submission(quiz.id, user_id)
            .await?
        {
            return Ok(open);
        }

        if remaining_attempts(self.store.as_ref(), user_id, quiz.id).await? <= 0 {
            return Err(AppError::Conflict(
                "No attempts remaining for this quiz".to_string(),
            ));
        }

        let attempt_number = self.store.submission_count(quiz.id, user_id).await? as i32 + 1;
        let (submission, created) = self
            .store
            .get_or_create_submission(quiz.id, user_id, attempt_number)
            .await?;
        if created {
            self.metrics.submission_created(quiz.id);
        }
        Ok(submission)
    }

    /// Appends one ledger entry and runs the downstream chain.
    async fn record_answer(
        &self,
        submission: &Submission,
        question_id: i64,
        selected_answer_id: Option<i64>,
    ) -> Result<(), AppError> {
        let is_correct = match selected_answer_id {
            Some(answer_id) => {
                self.store
                    .is_correct_answer(question_id, answer_id)
                    .await?
            }
            None => false,
        };

        let attempt_number = self
            .store
            .question_attempt_count(submission.id, question_id)
            .await? as i32
            + 1;

        self.store
            .insert_question_attempt(NewQuestionAttempt {
                submission_id: submission.id,
                question_id,
                selected_answer_id,
                is_correct,
                attempt_number,
            })
            .await?;
        self.metrics.question_attempt_recorded(question_id, is_correct);

        let score = recompute_score(self.store.as_ref(), submission.id).await?;
        self.metrics.score_recomputed(submission.id, score);

        self.leaderboard.invalidate(submission.quiz_id);
        self.leaderboard.publish_in_background(submission.quiz_id);

        Ok(())
    }
}
